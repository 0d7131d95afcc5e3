use anyhow::{anyhow, Result};
use chrono::{Days, NaiveDate};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::io::{self, Write};

use crate::app::DELETE_PROMPT;
use crate::database::{Database, TASKS_KEY};
use crate::models::{Filter, Priority, Task, TaskInput};
use crate::settings::{Settings, KNOWN_KEYS};
use crate::store::TaskStore;
use crate::view::{self, CalendarView, MonthCursor, Progress, WEEKDAYS};

fn ask_yes_no(prompt: &str) -> Result<bool> {
    print!("{} (y/n): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date '{}': expected YYYY-MM-DD", value))
}

pub fn parse_month(value: &str) -> Result<MonthCursor> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month '{}': expected YYYY-MM", value))?;
    Ok(MonthCursor::containing(first))
}

#[derive(Debug, PartialEq)]
pub enum TaskMatch {
    Exact(u64),
    Suggested(u64, String),
    Missing,
}

/// Numeric id first, then exact name (ignoring case), then the best fuzzy hit.
pub fn find_task(tasks: &[Task], query: &str) -> TaskMatch {
    let query = query.trim();
    if let Ok(id) = query.parse::<u64>() {
        if tasks.iter().any(|t| t.id == id) {
            return TaskMatch::Exact(id);
        }
    }
    if let Some(task) = tasks.iter().find(|t| t.name.eq_ignore_ascii_case(query)) {
        return TaskMatch::Exact(task.id);
    }
    match rank_tasks(tasks, query).first() {
        Some((_, task)) => TaskMatch::Suggested(task.id, task.name.clone()),
        None => TaskMatch::Missing,
    }
}

/// Tasks whose names fuzzy-match the query, best score first.
pub fn rank_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<(i64, &'a Task)> {
    let matcher = SkimMatcherV2::default();
    let mut hits: Vec<(i64, &Task)> = tasks
        .iter()
        .filter_map(|t| matcher.fuzzy_match(&t.name, query).map(|score| (score, t)))
        .collect();
    hits.sort_by(|a, b| b.0.cmp(&a.0));
    hits
}

fn resolve_task(store: &TaskStore, query: &str) -> Result<Option<u64>> {
    match find_task(store.tasks(), query) {
        TaskMatch::Exact(id) => Ok(Some(id)),
        TaskMatch::Suggested(id, name) => {
            if ask_yes_no(&format!("'{}' not found. Did you mean '{}'?", query, name))? {
                Ok(Some(id))
            } else {
                println!("Operation cancelled.");
                Ok(None)
            }
        }
        TaskMatch::Missing => {
            println!("Task '{}' not found.", query);
            Ok(None)
        }
    }
}

pub fn print_dashboard(store: &TaskStore, today: NaiveDate) {
    let dashboard = view::dashboard(store.tasks(), today);

    println!(
        "Completed: {}   In progress: {}   Due in {} days: {}",
        dashboard.completed_count,
        dashboard.in_progress_count,
        view::UPCOMING_WINDOW_DAYS,
        dashboard.upcoming_count
    );
    match dashboard.progress {
        Progress::NotApplicable => println!("Progress: {}", dashboard.progress),
        Progress::Percent(_) => println!(
            "Progress: {} [{}]",
            dashboard.progress,
            text_bar(dashboard.progress.bar_percent(), 20)
        ),
    }

    println!("\nUpcoming tasks:");
    if dashboard.upcoming.is_empty() {
        println!("  Nothing open.");
    }
    for row in &dashboard.upcoming {
        println!(
            "  {:<8} {:<40} {:<14} {}",
            format!("[{}]", row.priority),
            row.name,
            row.due,
            row.status.label()
        );
    }
}

fn text_bar(percent: u16, width: usize) -> String {
    let filled = (percent as usize * width) / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled.min(width)))
}

pub fn print_list(store: &TaskStore, filter: &str) -> Result<()> {
    let filter: Filter = filter.parse()?;
    let cards = view::task_list(store.tasks(), filter);

    if cards.is_empty() {
        println!("No {} tasks.", filter.as_str());
        return Ok(());
    }

    for card in cards {
        println!("{} [{}] {} ({})", card.id, card.priority, card.name, card.status.label());
        if !card.description.is_empty() {
            println!("    {}", card.description);
        }
        println!("    Due: {}", card.due);
        if let Some(progress) = card.subtasks {
            let percent = (progress.ratio() * 100.0).round() as u16;
            println!("    [{}] {}", text_bar(percent, 20), progress);
        }
        println!();
    }
    Ok(())
}

/// Month grid, Sunday first. Today is bracketed and days with tasks carry
/// a `*`, followed by the tasks due that month.
pub fn format_calendar(calendar: &CalendarView) -> String {
    let mut out = String::new();
    out.push_str(&calendar.title);
    out.push('\n');

    let header: String = WEEKDAYS.iter().map(|d| format!("{:^5}", d)).collect();
    out.push_str(header.trim_end());
    out.push('\n');

    for week in calendar.weeks() {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                None => "     ".to_string(),
                Some(day) => {
                    let (open, close) = if day.is_today { ('[', ']') } else { (' ', ' ') };
                    let mark = if day.has_tasks() { '*' } else { ' ' };
                    format!("{}{:>2}{}{}", open, day.day, close, mark)
                }
            })
            .collect();
        out.push_str(row.trim_end());
        out.push('\n');
    }

    let busy: Vec<_> = calendar.days.iter().filter(|d| d.has_tasks()).collect();
    if !busy.is_empty() {
        out.push('\n');
        for day in busy {
            for task in &day.dots {
                out.push_str(&format!(
                    "{:>4}  {:<8} {} (id {})\n",
                    day.day,
                    format!("[{}]", task.priority),
                    task.name,
                    task.id
                ));
            }
            if day.overflow > 0 {
                out.push_str(&format!("{:>4}  +{} more\n", day.day, day.overflow));
            }
        }
    }
    out
}

pub fn print_calendar(store: &TaskStore, month: Option<&str>, today: NaiveDate) -> Result<()> {
    let month = match month {
        Some(value) => parse_month(value)?,
        None => MonthCursor::containing(today),
    };
    print!("{}", format_calendar(&view::calendar(store.tasks(), month, today)));
    Ok(())
}

pub fn show_task(store: &TaskStore, query: &str) -> Result<()> {
    let Some(id) = resolve_task(store, query)? else {
        return Ok(());
    };
    let Some(task) = store.get(id) else {
        return Ok(());
    };
    let detail = view::detail(task);

    println!("{} (id {})", detail.name, detail.id);
    if !detail.description.is_empty() {
        println!("{}", detail.description);
    }
    println!("Due: {}", detail.due);
    println!("Priority: {}", detail.priority);
    println!("Status: {}", detail.status.label());
    println!("\nSubtasks:");
    if detail.subtasks.is_empty() {
        println!("  {}", view::NO_SUBTASKS);
    }
    for subtask in &detail.subtasks {
        let mark = if subtask.completed { "x" } else { " " };
        println!("  [{}] {} {}", mark, subtask.id, subtask.name);
    }
    Ok(())
}

pub struct AddArgs {
    pub name: String,
    pub description: String,
    pub priority: String,
    pub due: Option<String>,
    pub subtasks: Vec<String>,
}

pub fn add_task(store: &mut TaskStore, args: AddArgs, today: NaiveDate) -> Result<()> {
    let name = args.name.trim().to_string();
    if name.is_empty() {
        println!("Error: task name is required.");
        return Ok(());
    }
    let due_date = match args.due {
        Some(value) => parse_date(&value)?,
        None => today.checked_add_days(Days::new(1)).unwrap_or(today),
    };
    let input = TaskInput {
        name,
        description: args.description.trim().to_string(),
        priority: args.priority.parse()?,
        due_date,
        subtasks: args.subtasks.join("\n"),
    };

    let id = store.create(input)?;
    println!("Task added successfully! (id {})", id);
    Ok(())
}

pub struct EditArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub subtasks: Vec<String>,
    pub clear_subtasks: bool,
}

pub fn edit_task(store: &mut TaskStore, query: &str, args: EditArgs) -> Result<()> {
    let Some(id) = resolve_task(store, query)? else {
        return Ok(());
    };
    let Some(current) = store.get(id) else {
        return Ok(());
    };

    let name = args.name.unwrap_or_else(|| current.name.clone()).trim().to_string();
    if name.is_empty() {
        println!("Error: task name is required.");
        return Ok(());
    }
    let priority: Priority = match args.priority {
        Some(value) => value.parse()?,
        None => current.priority,
    };
    let due_date = match args.due {
        Some(value) => parse_date(&value)?,
        None => current.due_date,
    };
    let subtasks = if args.clear_subtasks {
        String::new()
    } else if args.subtasks.is_empty() {
        current.subtasks.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join("\n")
    } else {
        args.subtasks.join("\n")
    };
    let input = TaskInput {
        name,
        description: args
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|| current.description.clone()),
        priority,
        due_date,
        subtasks,
    };

    if store.update(id, input)? {
        println!("Task updated successfully!");
    }
    Ok(())
}

pub fn toggle_task(store: &mut TaskStore, query: &str) -> Result<()> {
    let Some(id) = resolve_task(store, query)? else {
        return Ok(());
    };
    if let Some(status) = store.toggle_status(id)? {
        println!("Task marked as {}!", status);
    }
    Ok(())
}

pub fn toggle_subtask(store: &mut TaskStore, query: &str, subtask_id: u64) -> Result<()> {
    let Some(id) = resolve_task(store, query)? else {
        return Ok(());
    };
    match store.toggle_subtask(id, subtask_id)? {
        Some(true) => println!("Subtask {} checked.", subtask_id),
        Some(false) => println!("Subtask {} unchecked.", subtask_id),
        None => println!("Subtask {} not found.", subtask_id),
    }
    Ok(())
}

pub fn delete_task(store: &mut TaskStore, query: &str, yes: bool) -> Result<()> {
    let Some(id) = resolve_task(store, query)? else {
        return Ok(());
    };
    let name = store.get(id).map(|t| t.name.clone()).unwrap_or_default();
    if !yes && !ask_yes_no(&format!("{} ({})", DELETE_PROMPT, name))? {
        println!("Task kept.");
        return Ok(());
    }
    if store.delete(id)? {
        println!("Task deleted.");
    }
    Ok(())
}

pub fn search_tasks(store: &TaskStore, query: &str) {
    let hits = rank_tasks(store.tasks(), query);
    if hits.is_empty() {
        println!("No tasks match '{}'.", query);
        return;
    }
    for (score, task) in hits {
        println!(
            "{:>5}  {} [{}] {} ({})",
            score,
            task.id,
            task.priority,
            task.name,
            view::format_date(task.due_date)
        );
    }
}

pub fn export_tasks(store: &TaskStore) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(store.tasks())?);
    Ok(())
}

pub fn reset_tasks(db: &Database, yes: bool) -> Result<()> {
    if !yes && !ask_yes_no("Remove all stored tasks? The demo tasks return on next start.")? {
        println!("Operation cancelled.");
        return Ok(());
    }
    if db.remove_item(TASKS_KEY)? {
        println!("Stored tasks removed.");
    } else {
        println!("Nothing stored yet.");
    }
    Ok(())
}

pub fn set_config(db: &Database, key: &str, value: &str) -> Result<()> {
    if let Err(e) = Settings::validate(key, value) {
        println!("Error: {}", e);
        return Ok(());
    }
    db.set_config(key, value, Settings::describe(key))?;
    println!("Set {} = {}", key, value);
    Ok(())
}

pub fn get_config(db: &Database, key: &str) -> Result<()> {
    match db.get_config(key)? {
        Some(value) => println!("{}", value),
        None => println!("Config '{}' is not set.", key),
    }
    Ok(())
}

pub fn list_configs(db: &Database) -> Result<()> {
    let configs = db.get_all_configs()?;
    if configs.is_empty() {
        println!("No config values set. Known keys:");
        for (key, description) in KNOWN_KEYS {
            println!("  {:<18} {}", key, description);
        }
        return Ok(());
    }
    for config in configs {
        println!("{} = {}", config.key_name, config.value);
        if let Some(description) = &config.description {
            println!("    {}", description);
        }
        println!("    created {}, updated {}", config.created_at, config.updated_at);
    }
    Ok(())
}

pub fn delete_config(db: &Database, key: &str) -> Result<()> {
    if db.delete_config(key)? {
        println!("Deleted config '{}'.", key);
    } else {
        println!("Config '{}' is not set.", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_tasks;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> TaskStore {
        TaskStore::load(Database::open_in_memory().unwrap())
    }

    #[test]
    fn find_task_by_id_then_name() {
        let tasks = seed_tasks();
        let first = &tasks[0];

        assert_eq!(find_task(&tasks, &first.id.to_string()), TaskMatch::Exact(first.id));
        assert_eq!(find_task(&tasks, &first.name.to_uppercase()), TaskMatch::Exact(first.id));
    }

    #[test]
    fn find_task_suggests_fuzzy_match() {
        let tasks = seed_tasks();
        let target = tasks.iter().find(|t| t.id == 1).unwrap();

        assert_eq!(
            find_task(&tasks, "proposal"),
            TaskMatch::Suggested(target.id, target.name.clone())
        );
        assert_eq!(find_task(&tasks, "zzzz"), TaskMatch::Missing);
    }

    #[test]
    fn unknown_numeric_id_is_not_exact() {
        let tasks = seed_tasks();
        assert_eq!(find_task(&tasks, "999999"), TaskMatch::Missing);
    }

    #[test]
    fn rank_puts_best_match_first() {
        let tasks = seed_tasks();
        let hits = rank_tasks(&tasks, "user");
        assert!(!hits.is_empty());
        assert_eq!(hits[0].1.name, "Conduct user testing");
        assert!(hits.windows(2).all(|w| w[0].0 >= w[1].0));
    }

    #[test]
    fn month_argument_parses() {
        let month = parse_month("2025-10").unwrap();
        assert_eq!((month.year(), month.month()), (2025, 10));
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("October").is_err());
    }

    #[test]
    fn calendar_text_marks_today_and_busy_days() {
        let tasks = seed_tasks();
        let month = MonthCursor::new(2025, 9).unwrap();
        let text = format_calendar(&view::calendar(&tasks, month, date(2025, 9, 1)));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "September 2025");
        assert!(lines[1].starts_with("  S    M"));
        // Sep 1 2025 is a Monday
        assert!(lines[2].starts_with("     [ 1]"));
        assert!(text.contains(" 15 *"));
        assert!(text.contains(" 30 *"));
        assert!(text.contains("Draft proposal for client"));
    }

    #[test]
    fn add_defaults_due_to_tomorrow() {
        let mut store = store();
        let args = AddArgs {
            name: "Write changelog".to_string(),
            description: String::new(),
            priority: "high".to_string(),
            due: None,
            subtasks: vec!["draft".to_string(), "review".to_string()],
        };
        add_task(&mut store, args, date(2026, 10, 19)).unwrap();

        let task = &store.tasks()[0];
        assert_eq!(task.name, "Write changelog");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, date(2026, 10, 20));
        assert_eq!(task.subtasks.len(), 2);
    }

    #[test]
    fn add_rejects_bad_priority() {
        let mut store = store();
        let before = store.tasks().len();
        let args = AddArgs {
            name: "Broken".to_string(),
            description: String::new(),
            priority: "urgent".to_string(),
            due: None,
            subtasks: Vec::new(),
        };
        assert!(add_task(&mut store, args, date(2026, 10, 19)).is_err());
        assert_eq!(store.tasks().len(), before);
    }

    #[test]
    fn edit_keeps_unspecified_fields_and_resets_subtasks() {
        let mut store = store();
        let task = store.tasks().iter().find(|t| !t.subtasks.is_empty()).unwrap().clone();
        assert!(task.subtasks.iter().any(|s| s.completed));

        let args = EditArgs {
            name: None,
            description: Some("Rewritten".to_string()),
            priority: None,
            due: Some("2026-01-02".to_string()),
            subtasks: Vec::new(),
            clear_subtasks: false,
        };
        edit_task(&mut store, &task.id.to_string(), args).unwrap();

        let edited = store.get(task.id).unwrap();
        assert_eq!(edited.name, task.name);
        assert_eq!(edited.description, "Rewritten");
        assert_eq!(edited.priority, task.priority);
        assert_eq!(edited.due_date, date(2026, 1, 2));
        assert_eq!(edited.subtasks.len(), task.subtasks.len());
        assert!(edited.subtasks.iter().all(|s| !s.completed));
    }

    #[test]
    fn add_and_edit_trim_description() {
        let mut store = store();
        let args = AddArgs {
            name: "Pay rent".to_string(),
            description: "  before the 5th \n".to_string(),
            priority: "low".to_string(),
            due: Some("2026-11-01".to_string()),
            subtasks: Vec::new(),
        };
        add_task(&mut store, args, date(2026, 10, 19)).unwrap();
        let id = store.tasks()[0].id;
        assert_eq!(store.get(id).unwrap().description, "before the 5th");

        let args = EditArgs {
            name: None,
            description: Some("   by transfer  ".to_string()),
            priority: None,
            due: None,
            subtasks: Vec::new(),
            clear_subtasks: false,
        };
        edit_task(&mut store, &id.to_string(), args).unwrap();
        assert_eq!(store.get(id).unwrap().description, "by transfer");
    }

    #[test]
    fn edit_can_clear_all_subtasks() {
        let mut store = store();
        assert!(!store.get(1).unwrap().subtasks.is_empty());

        let args = EditArgs {
            name: None,
            description: None,
            priority: None,
            due: None,
            subtasks: Vec::new(),
            clear_subtasks: true,
        };
        edit_task(&mut store, "1", args).unwrap();
        assert!(store.get(1).unwrap().subtasks.is_empty());
    }

    #[test]
    fn delete_with_yes_skips_prompt() {
        let mut store = store();
        let id = store.tasks()[0].id;
        delete_task(&mut store, &id.to_string(), true).unwrap();
        assert!(store.get(id).is_none());
    }

    #[test]
    fn set_config_rejects_unknown_key() {
        let db = Database::open_in_memory().unwrap();
        set_config(&db, "colour", "blue").unwrap();
        assert_eq!(db.get_config("colour").unwrap(), None);

        set_config(&db, "default_page", "calendar").unwrap();
        assert_eq!(db.get_config("default_page").unwrap().as_deref(), Some("calendar"));
    }

    #[test]
    fn text_bar_fills_proportionally() {
        assert_eq!(text_bar(50, 10), "#####-----");
        assert_eq!(text_bar(0, 4), "----");
        assert_eq!(text_bar(100, 4), "####");
    }
}
