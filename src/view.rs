//! Pure view-models for every page and dialog.
//!
//! Each function here takes the task list plus whatever page state it needs
//! (filter, displayed month, today's date) and returns plain data. Nothing in
//! this module knows about the terminal, so the terminal UI and the command
//! line print the same models.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

use crate::models::{Filter, Priority, Status, Task};

/// Most rows the dashboard lists.
pub const UPCOMING_LIMIT: usize = 5;
/// Days after today still counted as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;
/// Dots drawn per calendar day before collapsing into "+N".
pub const DOTS_PER_DAY: usize = 3;

pub const WEEKDAYS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

/// "Sep 30, 2025". Dates carry no time, so no zone shift can happen.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    NotApplicable,
    Percent(u32),
}

impl Progress {
    pub fn of(completed: usize, total: usize) -> Self {
        if total == 0 {
            return Progress::NotApplicable;
        }
        // round(100 * completed / total), halves rounding up
        let percent = (200 * completed + total) / (2 * total);
        Progress::Percent(percent as u32)
    }

    /// Width of the progress bar, zero when there is nothing to measure.
    pub fn bar_percent(self) -> u16 {
        match self {
            Progress::NotApplicable => 0,
            Progress::Percent(p) => p.min(100) as u16,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::NotApplicable => f.write_str("N/A"),
            Progress::Percent(p) => write!(f, "{}%", p),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingRow {
    pub id: u64,
    pub name: String,
    pub priority: Priority,
    pub due: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub upcoming: Vec<UpcomingRow>,
    pub completed_count: usize,
    pub in_progress_count: usize,
    pub upcoming_count: usize,
    pub progress: Progress,
}

pub fn dashboard(tasks: &[Task], today: NaiveDate) -> DashboardView {
    let mut open: Vec<&Task> = tasks.iter().filter(|t| t.status != Status::Completed).collect();
    open.sort_by_key(|t| t.due_date);

    let upcoming = open
        .iter()
        .take(UPCOMING_LIMIT)
        .map(|t| UpcomingRow {
            id: t.id,
            name: t.name.clone(),
            priority: t.priority,
            due: format_date(t.due_date),
            status: t.status,
        })
        .collect();

    let window_end = today + Duration::days(UPCOMING_WINDOW_DAYS);
    let completed_count = tasks.iter().filter(|t| t.status == Status::Completed).count();

    DashboardView {
        upcoming,
        completed_count,
        in_progress_count: tasks.iter().filter(|t| t.status == Status::InProgress).count(),
        upcoming_count: open
            .iter()
            .filter(|t| t.due_date >= today && t.due_date <= window_end)
            .count(),
        progress: Progress::of(completed_count, tasks.len()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskProgress {
    pub done: usize,
    pub total: usize,
}

impl SubtaskProgress {
    pub fn ratio(self) -> f64 {
        self.done as f64 / self.total as f64
    }
}

impl fmt::Display for SubtaskProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} subtasks completed", self.done, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due: String,
    /// None when the task has no subtasks at all.
    pub subtasks: Option<SubtaskProgress>,
    pub action_label: &'static str,
}

pub fn task_list(tasks: &[Task], filter: Filter) -> Vec<TaskCard> {
    tasks
        .iter()
        .filter(|t| filter.matches(t))
        .map(|t| TaskCard {
            id: t.id,
            name: t.name.clone(),
            description: t.description.clone(),
            priority: t.priority,
            status: t.status,
            due: format_date(t.due_date),
            subtasks: (!t.subtasks.is_empty()).then(|| SubtaskProgress {
                done: t.completed_subtasks(),
                total: t.subtasks.len(),
            }),
            action_label: if t.status == Status::Completed { "Completed" } else { "Complete" },
        })
        .collect()
}

/// The month shown on the calendar page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| MonthCursor { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        MonthCursor { year: date.year(), month: date.month() }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            MonthCursor { year: self.year + 1, month: 1 }
        } else {
            MonthCursor { year: self.year, month: self.month + 1 }
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            MonthCursor { year: self.year - 1, month: 12 }
        } else {
            MonthCursor { year: self.year, month: self.month - 1 }
        }
    }

    pub fn days_in_month(self) -> u32 {
        let next = self.next().first_day();
        (next - self.first_day()).num_days() as u32
    }

    /// "October 2026"
    pub fn title(self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayTask {
    pub id: u64,
    pub name: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub day: u32,
    pub is_today: bool,
    /// First few tasks due that day, in list order.
    pub dots: Vec<DayTask>,
    /// Tasks due that day beyond the drawn dots.
    pub overflow: usize,
}

impl CalendarDay {
    pub fn has_tasks(&self) -> bool {
        !self.dots.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarView {
    pub title: String,
    /// Empty cells before day 1 in a Sunday-first week.
    pub leading_blanks: usize,
    pub days: Vec<CalendarDay>,
}

impl CalendarView {
    /// Rows of seven cells, blanks as None.
    pub fn weeks(&self) -> Vec<Vec<Option<&CalendarDay>>> {
        let cells: Vec<Option<&CalendarDay>> = std::iter::repeat(None)
            .take(self.leading_blanks)
            .chain(self.days.iter().map(Some))
            .collect();
        cells.chunks(7).map(|week| week.to_vec()).collect()
    }
}

pub fn calendar(tasks: &[Task], month: MonthCursor, today: NaiveDate) -> CalendarView {
    let first = month.first_day();
    let days = (0..month.days_in_month())
        .map(|offset| {
            let date = first + Duration::days(offset as i64);
            let due: Vec<DayTask> = tasks
                .iter()
                .filter(|t| t.due_date == date)
                .map(|t| DayTask { id: t.id, name: t.name.clone(), priority: t.priority })
                .collect();
            CalendarDay {
                day: offset + 1,
                is_today: date == today,
                overflow: due.len().saturating_sub(DOTS_PER_DAY),
                dots: due.into_iter().take(DOTS_PER_DAY).collect(),
            }
        })
        .collect();

    CalendarView {
        title: month.title(),
        leading_blanks: first.weekday().num_days_from_sunday() as usize,
        days,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailSubtask {
    pub id: u64,
    pub name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub due: String,
    pub priority: Priority,
    pub status: Status,
    pub subtasks: Vec<DetailSubtask>,
    pub complete_label: &'static str,
}

pub const NO_SUBTASKS: &str = "No subtasks for this task.";

pub fn detail(task: &Task) -> DetailView {
    DetailView {
        id: task.id,
        name: task.name.clone(),
        description: task.description.clone(),
        due: format_date(task.due_date),
        priority: task.priority,
        status: task.status,
        subtasks: task
            .subtasks
            .iter()
            .map(|s| DetailSubtask { id: s.id, name: s.name.clone(), completed: s.completed })
            .collect(),
        complete_label: if task.status == Status::Completed {
            "Mark Incomplete"
        } else {
            "Mark Complete"
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{seed_tasks, Subtask};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: u64, status: Status, due: NaiveDate) -> Task {
        Task {
            id,
            name: format!("task {}", id),
            description: String::new(),
            priority: Priority::Low,
            status,
            due_date: due,
            subtasks: Vec::new(),
        }
    }

    #[test]
    fn dates_render_as_short_month_day_year() {
        assert_eq!(format_date(date(2025, 9, 30)), "Sep 30, 2025");
        assert_eq!(format_date(date(2025, 10, 5)), "Oct 5, 2025");
    }

    #[test]
    fn progress_is_na_for_empty_list() {
        let view = dashboard(&[], date(2026, 10, 19));
        assert_eq!(view.progress.to_string(), "N/A");
        assert_eq!(view.progress.bar_percent(), 0);
    }

    #[test]
    fn progress_rounds_to_whole_percent() {
        let today = date(2026, 10, 19);
        let tasks = vec![
            task(1, Status::Completed, today),
            task(2, Status::Pending, today),
            task(3, Status::Pending, today),
        ];
        assert_eq!(dashboard(&tasks, today).progress.to_string(), "33%");
        assert_eq!(Progress::of(2, 3).to_string(), "67%");
        assert_eq!(Progress::of(1, 2).to_string(), "50%");
    }

    #[test]
    fn upcoming_window_is_today_through_seven_days() {
        let today = date(2026, 10, 19);
        let tasks = vec![
            task(1, Status::Pending, today),
            task(2, Status::InProgress, today + Duration::days(7)),
            task(3, Status::Pending, today + Duration::days(8)),
            task(4, Status::Completed, today + Duration::days(1)),
            task(5, Status::Pending, today - Duration::days(1)),
        ];
        let view = dashboard(&tasks, today);
        assert_eq!(view.upcoming_count, 2);
        assert_eq!(view.completed_count, 1);
        assert_eq!(view.in_progress_count, 1);
    }

    #[test]
    fn dashboard_lists_five_open_tasks_by_due_date() {
        let today = date(2026, 10, 19);
        let tasks: Vec<Task> = (1..=7)
            .map(|i| task(i, Status::Pending, today + Duration::days(10 - i as i64)))
            .chain(std::iter::once(task(8, Status::Completed, today - Duration::days(30))))
            .collect();
        let ids: Vec<u64> = dashboard(&tasks, today).upcoming.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn filter_keeps_list_order() {
        let today = date(2026, 10, 19);
        let tasks = vec![
            task(3, Status::Pending, today),
            task(2, Status::Completed, today),
            task(1, Status::Pending, today),
        ];
        let completed = task_list(&tasks, Filter::Only(Status::Completed));
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, 2);
        assert_eq!(completed[0].action_label, "Completed");

        let pending: Vec<u64> = task_list(&tasks, Filter::Only(Status::Pending))
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(pending, vec![3, 1]);
        assert_eq!(task_list(&tasks, Filter::All).len(), 3);
    }

    #[test]
    fn cards_omit_progress_without_subtasks() {
        let cards = task_list(&seed_tasks(), Filter::All);
        assert_eq!(cards[0].subtasks, Some(SubtaskProgress { done: 2, total: 3 }));
        assert_eq!(cards[0].subtasks.unwrap().to_string(), "2/3 subtasks completed");
        assert_eq!(cards[2].subtasks, None);
    }

    #[test]
    fn month_starting_wednesday_has_three_blanks() {
        // 1 October 2025 is a Wednesday
        let month = MonthCursor::new(2025, 10).unwrap();
        let view = calendar(&[], month, date(2025, 10, 19));
        assert_eq!(view.leading_blanks, 3);
        assert_eq!(view.days.len(), 31);
        assert_eq!(view.title, "October 2025");
        assert!(view.days[18].is_today);
        assert_eq!(view.weeks()[0].iter().filter(|c| c.is_none()).count(), 3);
    }

    #[test]
    fn calendar_caps_dots_and_counts_overflow() {
        let due = date(2026, 2, 14);
        let tasks: Vec<Task> = (1..=5).map(|i| task(i, Status::Pending, due)).collect();
        let view = calendar(&tasks, MonthCursor::containing(due), date(2026, 1, 1));
        let day = &view.days[13];
        assert_eq!(day.dots.len(), 3);
        assert_eq!(day.overflow, 2);
        assert!(day.has_tasks());
        assert!(!view.days[12].has_tasks());
        assert_eq!(view.days.len(), 28);
    }

    #[test]
    fn month_cursor_rolls_over_years() {
        let dec = MonthCursor::new(2025, 12).unwrap();
        assert_eq!(dec.next(), MonthCursor::new(2026, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(MonthCursor::new(2026, 1).unwrap().prev(), dec);
        assert_eq!(MonthCursor::new(2024, 2).unwrap().days_in_month(), 29);
        assert!(MonthCursor::new(2026, 13).is_none());
    }

    #[test]
    fn detail_labels_follow_status() {
        let mut t = task(9, Status::Completed, date(2026, 3, 1));
        assert_eq!(detail(&t).complete_label, "Mark Incomplete");
        t.status = Status::InProgress;
        t.subtasks.push(Subtask { id: 1, name: "a".into(), completed: true });
        let view = detail(&t);
        assert_eq!(view.complete_label, "Mark Complete");
        assert!(view.subtasks[0].completed);
    }
}
