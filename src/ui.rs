use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

use crate::app::{App, DELETE_PROMPT};
use crate::form::{FormField, TaskForm};
use crate::models::{DialogMode, Filter, Page, Priority, Status};
use crate::view::{self, CalendarDay, DetailView};

const TICK: Duration = Duration::from_millis(250);

pub fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("TUI stopped with an error: {err:?}");
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.set_today(Local::now().date_naive());
        app.expire_notification(Instant::now());
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Routes one key press: delete prompt first, then the open dialog, then
/// the current page.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if app.pending_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm_delete(false),
            _ => {}
        }
        return;
    }

    match app.dialog {
        DialogMode::Add | DialogMode::Edit(_) => handle_form_key(app, key),
        DialogMode::Detail(id) => handle_detail_key(app, id, key),
        DialogMode::Closed => handle_page_key(app, key),
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            app.close_dialog();
            return;
        }
        KeyCode::Char('s') if ctrl => {
            app.submit_form();
            return;
        }
        _ => {}
    }

    let Some(form) = app.form.as_mut() else {
        return;
    };
    form.error = None;
    match key.code {
        KeyCode::Tab => form.focus_next(),
        KeyCode::BackTab => form.focus_previous(),
        _ if form.focus == FormField::Priority => match key.code {
            KeyCode::Left => form.priority = form.priority.previous(),
            KeyCode::Right | KeyCode::Char(' ') => form.priority = form.priority.next(),
            KeyCode::Char('l') | KeyCode::Char('L') => form.priority = Priority::Low,
            KeyCode::Char('m') | KeyCode::Char('M') => form.priority = Priority::Medium,
            KeyCode::Char('h') | KeyCode::Char('H') => form.priority = Priority::High,
            KeyCode::Enter => form.focus_next(),
            _ => {}
        },
        _ => edit_focused_field(form, key, ctrl),
    }
}

fn edit_focused_field(form: &mut TaskForm, key: KeyEvent, ctrl: bool) {
    let multiline = form.focused_editor().is_some_and(|e| e.multiline);
    if key.code == KeyCode::Enter && !multiline {
        form.focus_next();
        return;
    }
    let Some(editor) = form.focused_editor() else {
        return;
    };
    match key.code {
        KeyCode::Char(c) if !ctrl => editor.insert_char(c),
        KeyCode::Enter => editor.insert_newline(),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Left => editor.move_cursor_left(),
        KeyCode::Right => editor.move_cursor_right(),
        KeyCode::Up => editor.move_cursor_up(),
        KeyCode::Down => editor.move_cursor_down(),
        KeyCode::Home => editor.move_to_start_of_line(),
        KeyCode::End => editor.move_to_end_of_line(),
        _ => {}
    }
}

fn handle_detail_key(app: &mut App, id: u64, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_dialog(),
        KeyCode::Down | KeyCode::Char('j') => app.next_item(),
        KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_subtask(),
        KeyCode::Char('c') => app.complete_from_detail(),
        KeyCode::Char('e') => app.edit_from_detail(),
        KeyCode::Char('d') => app.request_delete(id),
        _ => {}
    }
}

fn handle_page_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => app.navigate(app.page.next()),
        KeyCode::BackTab => app.navigate(app.page.previous()),
        KeyCode::Char('1') => app.navigate(Page::Dashboard),
        KeyCode::Char('2') => app.navigate(Page::Tasks),
        KeyCode::Char('3') => app.navigate(Page::Calendar),
        KeyCode::Char('a') => app.open_add(),
        _ => match app.page {
            Page::Calendar => match key.code {
                KeyCode::Left | KeyCode::Char('h') => app.prev_month(),
                KeyCode::Right | KeyCode::Char('l') => app.next_month(),
                KeyCode::Char('t') => app.this_month(),
                _ => {}
            },
            Page::Dashboard | Page::Tasks => handle_list_key(app, key),
        },
    }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.next_item(),
        KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
        KeyCode::Char('f') if app.page == Page::Tasks => app.cycle_filter(),
        _ => {
            let Some(id) = app.selected_task_id() else {
                return;
            };
            match key.code {
                KeyCode::Enter => app.open_detail(id),
                KeyCode::Char('e') => app.open_edit(id),
                KeyCode::Char(' ') | KeyCode::Char('c') => app.toggle_status(id),
                KeyCode::Char('d') => app.request_delete(id),
                _ => {}
            }
        }
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Completed => Color::Green,
        Status::InProgress => Color::Yellow,
        Status::Pending => Color::Blue,
    }
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::LightGreen)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let titles: Vec<Line> = Page::ALL.iter().map(|p| Line::from(p.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("TaskMaster"))
        .select(app.page.index())
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Black),
        );
    f.render_widget(tabs, chunks[0]);

    match app.page {
        Page::Dashboard => render_dashboard(f, app, chunks[1]),
        Page::Tasks => render_tasks(f, app, chunks[1]),
        Page::Calendar => render_calendar(f, app, chunks[1]),
    }

    render_footer(f, app, chunks[2]);

    match app.dialog {
        DialogMode::Add | DialogMode::Edit(_) => render_form(f, app),
        DialogMode::Detail(_) => {
            if let Some(detail) = app.detail_view() {
                render_detail(f, app, &detail);
            }
        }
        DialogMode::Closed => {}
    }

    if app.pending_delete.is_some() {
        let area = centered_rect(40, 20, f.area());
        f.render_widget(Clear, area);
        let prompt = Paragraph::new(format!("{}\n\ny: Delete   n: Cancel", DELETE_PROMPT))
            .block(
                Block::default()
                    .title("Confirm")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::DarkGray)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::White));
        f.render_widget(prompt, area);
    }
}

// Helper function to create centered rectangles for popups
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.notification {
        Some(n) => Line::from(Span::styled(
            format!(" ✔ {}", n.message),
            Style::default().fg(Color::Black).bg(Color::Green),
        )),
        None => {
            let hints = match (app.dialog, app.page) {
                (DialogMode::Add | DialogMode::Edit(_), _) => {
                    "Tab: Next field | ←/→: Priority | Ctrl+S: Save | Esc: Cancel"
                }
                (DialogMode::Detail(_), _) => {
                    "↑/↓: Subtask | Space: Toggle subtask | c: Complete | e: Edit | d: Delete | Esc: Close"
                }
                (DialogMode::Closed, Page::Calendar) => {
                    "←/→: Month | t: Today | a: Add | Tab: Page | q: Quit"
                }
                (DialogMode::Closed, Page::Tasks) => {
                    "↑/↓: Select | Enter: View | e: Edit | Space: Complete | d: Delete | f: Filter | a: Add | q: Quit"
                }
                (DialogMode::Closed, Page::Dashboard) => {
                    "↑/↓: Select | Enter: View | e: Edit | Space: Complete | a: Add | Tab: Page | q: Quit"
                }
            };
            Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn stat_box(label: &str, value: usize, color: Color) -> Paragraph<'static> {
    Paragraph::new(vec![Line::from(Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(label.to_string()))
}

fn render_dashboard(f: &mut Frame, app: &mut App, area: Rect) {
    let dashboard = app.dashboard_view();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let stats = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)].as_ref())
        .split(rows[0]);
    f.render_widget(stat_box("Completed", dashboard.completed_count, Color::Green), stats[0]);
    f.render_widget(stat_box("In Progress", dashboard.in_progress_count, Color::Yellow), stats[1]);
    f.render_widget(stat_box("Due in 7 days", dashboard.upcoming_count, Color::Cyan), stats[2]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Overall Progress"))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .percent(dashboard.progress.bar_percent())
        .label(dashboard.progress.to_string());
    f.render_widget(gauge, rows[1]);

    let items: Vec<ListItem> = dashboard
        .upcoming
        .iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(priority_color(row.priority))),
                Span::styled(format!("{:<36} ", row.name), Style::default().fg(Color::White)),
                Span::styled(format!("{:<14} ", row.due), Style::default().fg(Color::Cyan)),
                Span::styled(format!("[{}]", row.status.label()), Style::default().fg(status_color(row.status))),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Upcoming Tasks"))
        .highlight_style(highlight())
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, rows[2], &mut app.upcoming_state);
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)].as_ref())
        .split(area);

    let mut filter_spans = vec![Span::raw(" Filter: ")];
    for filter in Filter::ALL {
        let style = if filter == app.filter {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        filter_spans.push(Span::styled(format!(" {} ", filter.as_str()), style));
        filter_spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(filter_spans)), chunks[0]);

    let items: Vec<ListItem> = app
        .task_cards()
        .into_iter()
        .map(|card| {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(card.name.clone(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    Span::styled(format!("[{}]", card.priority), Style::default().fg(priority_color(card.priority))),
                    Span::raw(" "),
                    Span::styled(format!("[{}]", card.status.label()), Style::default().fg(status_color(card.status))),
                ]),
                Line::from(Span::styled(format!("  {}", card.description), Style::default().fg(Color::Gray))),
                Line::from(vec![
                    Span::styled(format!("  Due {}", card.due), Style::default().fg(Color::Cyan)),
                    Span::styled(format!("   [{}]", card.action_label), Style::default().fg(Color::DarkGray)),
                ]),
            ];
            if let Some(progress) = card.subtasks {
                let width = 20usize;
                let filled = (progress.ratio() * width as f64).round() as usize;
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled("█".repeat(filled), Style::default().fg(Color::Green)),
                    Span::styled("░".repeat(width - filled), Style::default().fg(Color::DarkGray)),
                    Span::raw(format!(" {}", progress)),
                ]));
            }
            lines.push(Line::from(""));
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .highlight_style(highlight())
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, chunks[1], &mut app.task_list_state);
}

fn day_cell(day: &CalendarDay) -> Cell<'static> {
    let number_style = if day.is_today {
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut dots: Vec<Span> = day
        .dots
        .iter()
        .map(|t| Span::styled("● ", Style::default().fg(priority_color(t.priority))))
        .collect();
    if day.overflow > 0 {
        dots.push(Span::styled(format!("+{}", day.overflow), Style::default().fg(Color::Gray)));
    }
    Cell::from(vec![
        Line::from(Span::styled(format!("{:>2}", day.day), number_style)),
        Line::from(dots),
    ])
}

fn render_calendar(f: &mut Frame, app: &mut App, area: Rect) {
    let calendar = app.calendar_view();

    let header = Row::new(view::WEEKDAYS.iter().map(|d| Cell::from(*d)))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = calendar
        .weeks()
        .into_iter()
        .map(|week| {
            let cells: Vec<Cell> = week
                .into_iter()
                .map(|cell| match cell {
                    Some(day) => day_cell(day),
                    None => Cell::from(""),
                })
                .collect();
            Row::new(cells).height(3)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("◀ {} ▶", calendar.title)),
        );
    f.render_widget(table, area);
}

fn render_detail(f: &mut Frame, app: &mut App, detail: &DetailView) {
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(detail.name.clone())
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);

    let info = Paragraph::new(vec![
        Line::from(detail.description.clone()),
        Line::from(""),
        Line::from(vec![Span::raw("Due: "), Span::styled(detail.due.clone(), Style::default().fg(Color::Cyan))]),
        Line::from(vec![
            Span::raw("Priority: "),
            Span::styled(detail.priority.to_string(), Style::default().fg(priority_color(detail.priority))),
            Span::raw("   Status: "),
            Span::styled(detail.status.label(), Style::default().fg(status_color(detail.status))),
        ]),
    ])
    .wrap(Wrap { trim: false });
    f.render_widget(info, chunks[0]);

    let subtasks_block = Block::default().borders(Borders::TOP).title("Subtasks");
    if detail.subtasks.is_empty() {
        f.render_widget(Paragraph::new(view::NO_SUBTASKS).block(subtasks_block), chunks[1]);
    } else {
        let items: Vec<ListItem> = detail
            .subtasks
            .iter()
            .map(|s| {
                let (mark, style) = if s.completed {
                    ("[x] ", Style::default().fg(Color::Green).add_modifier(Modifier::CROSSED_OUT))
                } else {
                    ("[ ] ", Style::default().fg(Color::White))
                };
                ListItem::new(Line::from(vec![Span::raw(mark), Span::styled(s.name.clone(), style)]))
            })
            .collect();
        let list = List::new(items)
            .block(subtasks_block)
            .highlight_style(highlight())
            .highlight_symbol("> ");
        f.render_stateful_widget(list, chunks[1], &mut app.subtask_state);
    }

    let actions = Line::from(vec![
        Span::styled(format!("c: {}", detail.complete_label), Style::default().fg(Color::Green)),
        Span::raw("   e: Edit   d: Delete   Esc: Close"),
    ]);
    f.render_widget(Paragraph::new(actions), chunks[2]);
}

fn render_form(f: &mut Frame, app: &mut App) {
    let title = match app.dialog {
        DialogMode::Edit(_) => "Edit Task - Ctrl+S: Save Changes",
        _ => "Add New Task - Ctrl+S: Add Task",
    };
    let Some(form) = app.form.as_mut() else {
        return;
    };

    let area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, area);
    let title = if form.is_modified() { format!("{} [modified]", title) } else { title.to_string() };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(inner);

    let height = match form.focus {
        FormField::Description => chunks[1].height.saturating_sub(2),
        FormField::Subtasks => chunks[4].height.saturating_sub(2),
        _ => 1,
    };
    if let Some(editor) = form.focused_editor() {
        editor.adjust_scroll_with_height(height as usize);
    }

    for (field, area) in form.fields().into_iter().zip(chunks.iter().copied()) {
        let focused = form.focus == field;
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(field.label());
        let field_inner = block.inner(area);

        if field == FormField::Priority {
            let spans: Vec<Span> = Priority::ALL
                .iter()
                .map(|p| {
                    let style = if *p == form.priority {
                        Style::default().fg(Color::Black).bg(priority_color(*p)).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(priority_color(*p))
                    };
                    Span::styled(format!(" {} ", p), style)
                })
                .collect();
            f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
            continue;
        }

        let Some(editor) = form.editor(field) else {
            continue;
        };
        let visible = field_inner.height as usize;
        let start = editor.scroll_offset.min(editor.content.len().saturating_sub(1));
        let lines: Vec<Line> = editor
            .content
            .iter()
            .skip(start)
            .take(visible)
            .map(|l| Line::from(l.clone()))
            .collect();
        f.render_widget(Paragraph::new(lines).block(block), area);

        if focused {
            let x = field_inner.x + editor.cursor_col as u16;
            let y = field_inner.y + editor.cursor_row.saturating_sub(start) as u16;
            f.set_cursor_position((x.min(field_inner.right().saturating_sub(1)), y));
        }
    }

    if let Some(error) = &form.error {
        f.render_widget(
            Paragraph::new(Span::styled(error.clone(), Style::default().fg(Color::LightRed))),
            chunks[5],
        );
    }
}
