use anyhow::Result;
use chrono::{Days, Local, NaiveDate};
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};

use crate::form::TaskForm;
use crate::models::{DialogMode, Filter, Page, Task};
use crate::settings::Settings;
use crate::store::TaskStore;
use crate::view::{self, CalendarView, DashboardView, DetailView, MonthCursor, TaskCard};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub expires_at: Instant,
}

/// Controller: page, filter, month and dialog state around the task store.
/// Every intent that mutates the store persists, then the next draw renders
/// the current page from scratch.
pub struct App {
    store: TaskStore,
    pub page: Page,
    pub filter: Filter,
    pub month: MonthCursor,
    pub dialog: DialogMode,
    /// Present only while the add or edit dialog is open.
    pub form: Option<TaskForm>,
    /// Task waiting for a yes/no answer before deletion.
    pub pending_delete: Option<u64>,
    pub upcoming_state: ListState,
    pub task_list_state: ListState,
    pub subtask_state: ListState,
    pub notification: Option<Notification>,
    pub should_quit: bool,
    today: NaiveDate,
    notification_ttl: Duration,
}

fn ok_or_log<T>(result: Result<T>, action: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("{} failed: {:#}", action, e);
            None
        }
    }
}

fn step(state: &mut ListState, len: usize, forward: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => {
            if i + 1 >= len {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}

fn clamp(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        Some(_) => {}
    }
}

impl App {
    pub fn new(store: TaskStore, settings: &Settings) -> Self {
        Self::with_today(store, settings, Local::now().date_naive())
    }

    pub fn with_today(store: TaskStore, settings: &Settings, today: NaiveDate) -> Self {
        let mut app = App {
            store,
            page: settings.default_page,
            filter: settings.default_filter,
            month: MonthCursor::containing(today),
            dialog: DialogMode::Closed,
            form: None,
            pending_delete: None,
            upcoming_state: ListState::default(),
            task_list_state: ListState::default(),
            subtask_state: ListState::default(),
            notification: None,
            should_quit: false,
            today,
            notification_ttl: settings.notification,
        };
        app.refresh();
        app
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    /// Called once per frame so a session left open past midnight moves on.
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn dashboard_view(&self) -> DashboardView {
        view::dashboard(self.store.tasks(), self.today)
    }

    pub fn task_cards(&self) -> Vec<TaskCard> {
        view::task_list(self.store.tasks(), self.filter)
    }

    pub fn calendar_view(&self) -> CalendarView {
        view::calendar(self.store.tasks(), self.month, self.today)
    }

    pub fn detail_view(&self) -> Option<DetailView> {
        match self.dialog {
            DialogMode::Detail(id) => self.store.get(id).map(view::detail),
            _ => None,
        }
    }

    /// Keeps every selection inside the lists the current state renders.
    pub fn refresh(&mut self) {
        let upcoming = self.dashboard_view().upcoming.len();
        clamp(&mut self.upcoming_state, upcoming);
        let cards = self.task_cards().len();
        clamp(&mut self.task_list_state, cards);
        let subtasks = self.detail_view().map(|d| d.subtasks.len()).unwrap_or(0);
        clamp(&mut self.subtask_state, subtasks);
    }

    pub fn navigate(&mut self, page: Page) {
        log::debug!("Showing {} page", page.title());
        self.page = page;
        self.refresh();
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.task_list_state.select(None);
        self.refresh();
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.filter.next());
    }

    pub fn prev_month(&mut self) {
        self.month = self.month.prev();
    }

    pub fn next_month(&mut self) {
        self.month = self.month.next();
    }

    pub fn this_month(&mut self) {
        self.month = MonthCursor::containing(self.today);
    }

    pub fn next_item(&mut self) {
        self.move_selection(true);
    }

    pub fn previous_item(&mut self) {
        self.move_selection(false);
    }

    fn move_selection(&mut self, forward: bool) {
        if let DialogMode::Detail(_) = self.dialog {
            let len = self.detail_view().map(|d| d.subtasks.len()).unwrap_or(0);
            step(&mut self.subtask_state, len, forward);
            return;
        }
        match self.page {
            Page::Dashboard => {
                let len = self.dashboard_view().upcoming.len();
                step(&mut self.upcoming_state, len, forward);
            }
            Page::Tasks => {
                let len = self.task_cards().len();
                step(&mut self.task_list_state, len, forward);
            }
            Page::Calendar => {}
        }
    }

    /// Task under the cursor on the dashboard or task list.
    pub fn selected_task_id(&self) -> Option<u64> {
        match self.page {
            Page::Dashboard => self
                .upcoming_state
                .selected()
                .and_then(|i| self.dashboard_view().upcoming.get(i).map(|r| r.id)),
            Page::Tasks => self
                .task_list_state
                .selected()
                .and_then(|i| self.task_cards().get(i).map(|c| c.id)),
            Page::Calendar => None,
        }
    }

    fn reset_dialog_state(&mut self) {
        self.form = None;
        self.pending_delete = None;
        self.subtask_state = ListState::default();
    }

    pub fn open_add(&mut self) {
        self.reset_dialog_state();
        self.form = Some(TaskForm::blank(self.today + Days::new(1)));
        self.dialog = DialogMode::Add;
    }

    pub fn open_edit(&mut self, id: u64) {
        let Some(task) = self.store.get(id) else {
            return;
        };
        let form = TaskForm::for_task(task);
        self.reset_dialog_state();
        self.form = Some(form);
        self.dialog = DialogMode::Edit(id);
    }

    pub fn open_detail(&mut self, id: u64) {
        if self.store.get(id).is_none() {
            return;
        }
        self.reset_dialog_state();
        self.dialog = DialogMode::Detail(id);
        self.refresh();
    }

    /// Closes whatever dialog is open and drops unsaved input.
    pub fn close_dialog(&mut self) {
        self.reset_dialog_state();
        self.dialog = DialogMode::Closed;
        self.refresh();
    }

    /// Creates or updates depending on the open dialog. Invalid input keeps
    /// the dialog open with the reason shown on the form.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let input = match form.to_input() {
            Ok(input) => input,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };

        let message = match self.dialog {
            DialogMode::Edit(id) => {
                ok_or_log(self.store.update(id, input), "Updating task");
                "Task updated successfully!"
            }
            _ => {
                ok_or_log(self.store.create(input), "Creating task");
                "Task added successfully!"
            }
        };

        self.close_dialog();
        self.notify(message);
    }

    pub fn edit_from_detail(&mut self) {
        if let DialogMode::Detail(id) = self.dialog {
            self.close_dialog();
            self.open_edit(id);
        }
    }

    pub fn request_delete(&mut self, id: u64) {
        if self.store.get(id).is_some() {
            self.pending_delete = Some(id);
        }
    }

    /// Answers the delete prompt. Declining changes nothing.
    pub fn confirm_delete(&mut self, confirmed: bool) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        if !confirmed {
            return;
        }
        ok_or_log(self.store.delete(id), "Deleting task");
        self.close_dialog();
        self.notify("Task deleted.");
    }

    pub fn toggle_status(&mut self, id: u64) {
        if let Some(Some(status)) = ok_or_log(self.store.toggle_status(id), "Toggling task status") {
            self.refresh();
            self.notify(&format!("Task marked as {}!", status));
        }
    }

    pub fn complete_from_detail(&mut self) {
        if let DialogMode::Detail(id) = self.dialog {
            self.toggle_status(id);
            self.close_dialog();
        }
    }

    pub fn toggle_subtask(&mut self, task_id: u64, subtask_id: u64) {
        if let Some(Some(_)) = ok_or_log(self.store.toggle_subtask(task_id, subtask_id), "Toggling subtask") {
            self.refresh();
        }
    }

    pub fn toggle_selected_subtask(&mut self) {
        let Some(detail) = self.detail_view() else {
            return;
        };
        let selected = self.subtask_state.selected().and_then(|i| detail.subtasks.get(i));
        if let Some(subtask) = selected {
            self.toggle_subtask(detail.id, subtask.id);
        }
    }

    pub fn notify(&mut self, message: &str) {
        log::info!("{}", message);
        self.notification = Some(Notification {
            message: message.to_string(),
            expires_at: Instant::now()
                .checked_add(self.notification_ttl)
                .unwrap_or_else(|| Instant::now() + Settings::default().notification),
        });
    }

    /// Drops the notification once its time is up.
    pub fn expire_notification(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notification = None;
        }
    }
}
