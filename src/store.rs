use anyhow::{bail, Result};
use chrono::Utc;

use crate::database::{Database, TASKS_KEY};
use crate::models::{seed_tasks, Status, Subtask, Task, TaskInput};

/// Owns the task list and writes it back to storage after every mutation.
pub struct TaskStore {
    db: Database,
    tasks: Vec<Task>,
}

/// Builds subtasks from the form's text block, one per non-blank line.
pub fn parse_subtasks(block: &str, base_id: u64) -> Vec<Subtask> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, name)| Subtask {
            id: base_id + index as u64,
            name: name.to_string(),
            completed: false,
        })
        .collect()
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

impl TaskStore {
    /// Loads the stored list, falling back to the seed tasks when the blob is
    /// missing or unreadable.
    pub fn load(db: Database) -> Self {
        let tasks = match db.get_item(TASKS_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Task>>(&blob) {
                Ok(tasks) => {
                    log::info!("Loaded {} task(s) from storage", tasks.len());
                    tasks
                }
                Err(e) => {
                    log::warn!("Stored tasks are unreadable, using seed data: {}", e);
                    seed_tasks()
                }
            },
            Ok(None) => {
                log::info!("No stored tasks yet, using seed data");
                seed_tasks()
            }
            Err(e) => {
                log::warn!("Failed to read stored tasks, using seed data: {}", e);
                seed_tasks()
            }
        };

        TaskStore { db, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    #[cfg(test)]
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn next_id(&self) -> Result<u64> {
        let max_id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let Some(next) = max_id.checked_add(1) else {
            bail!("no task id left above {}", max_id);
        };
        Ok(now_millis().max(next))
    }

    /// Prepends a new pending task and returns its id.
    pub fn create(&mut self, input: TaskInput) -> Result<u64> {
        let id = self.next_id()?;
        let task = Task {
            id,
            name: input.name,
            description: input.description,
            priority: input.priority,
            status: Status::Pending,
            due_date: input.due_date,
            subtasks: parse_subtasks(&input.subtasks, now_millis()),
        };
        log::info!("Creating task {} '{}'", id, task.name);
        self.tasks.insert(0, task);
        self.persist()?;
        Ok(id)
    }

    /// Overwrites the task's fields and rebuilds its subtasks from the text
    /// block, so every subtask comes back uncompleted. Returns false when no
    /// task has this id.
    pub fn update(&mut self, id: u64, input: TaskInput) -> Result<bool> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            log::debug!("update: no task with id {}", id);
            return Ok(false);
        };
        task.name = input.name;
        task.description = input.description;
        task.priority = input.priority;
        task.due_date = input.due_date;
        task.subtasks = parse_subtasks(&input.subtasks, now_millis());
        log::info!("Updated task {}", id);
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: u64) -> Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            log::debug!("delete: no task with id {}", id);
            return Ok(false);
        }
        log::info!("Deleted task {}", id);
        self.persist()?;
        Ok(true)
    }

    /// Returns the new status, or None when no task has this id.
    pub fn toggle_status(&mut self, id: u64) -> Result<Option<Status>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            log::debug!("toggle_status: no task with id {}", id);
            return Ok(None);
        };
        task.status = task.status.toggled();
        let status = task.status;
        log::info!("Task {} is now {}", id, status);
        self.persist()?;
        Ok(Some(status))
    }

    /// Returns the subtask's new completion flag, or None on a miss.
    pub fn toggle_subtask(&mut self, task_id: u64, subtask_id: u64) -> Result<Option<bool>> {
        let subtask = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .and_then(|t| t.subtasks.iter_mut().find(|s| s.id == subtask_id));
        let Some(subtask) = subtask else {
            log::debug!("toggle_subtask: no subtask {} on task {}", subtask_id, task_id);
            return Ok(None);
        };
        subtask.completed = !subtask.completed;
        let completed = subtask.completed;
        self.persist()?;
        Ok(Some(completed))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.tasks)?)
    }

    pub fn persist(&self) -> Result<()> {
        let blob = self.to_json()?;
        if let Err(e) = self.db.set_item(TASKS_KEY, &blob) {
            log::error!("Failed to save {} task(s): {}", self.tasks.len(), e);
            return Err(e);
        }
        log::debug!("Saved {} task(s)", self.tasks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(name: &str, subtasks: &str) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: date(2026, 10, 20),
            subtasks: subtasks.to_string(),
        }
    }

    fn empty_store() -> TaskStore {
        let db = Database::open_in_memory().unwrap();
        db.set_item(TASKS_KEY, "[]").unwrap();
        TaskStore::load(db)
    }

    #[test]
    fn missing_blob_loads_seed() {
        let store = TaskStore::load(Database::open_in_memory().unwrap());
        assert_eq!(store.tasks(), seed_tasks().as_slice());
    }

    #[test]
    fn create_fails_when_ids_are_exhausted() {
        let db = Database::open_in_memory().unwrap();
        let blob = format!(
            r#"[{{"id":{},"name":"last","priority":"low","status":"pending","dueDate":"2026-01-02"}}]"#,
            u64::MAX
        );
        db.set_item(TASKS_KEY, &blob).unwrap();
        let mut store = TaskStore::load(db);
        assert_eq!(store.tasks()[0].id, u64::MAX);

        assert!(store.create(input("one more", "")).is_err());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn corrupt_blob_loads_seed() {
        let db = Database::open_in_memory().unwrap();
        db.set_item(TASKS_KEY, "{not json").unwrap();
        let store = TaskStore::load(db);
        assert_eq!(store.tasks().len(), 4);
    }

    #[test]
    fn empty_array_stays_empty() {
        assert!(empty_store().tasks().is_empty());
    }

    #[test]
    fn create_prepends_pending_task_with_fresh_id() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        let existing: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();

        let id = store.create(input("Write report", "  outline \n\n draft\n")).unwrap();

        assert!(!existing.contains(&id));
        let task = &store.tasks()[0];
        assert_eq!(task.id, id);
        assert_eq!(task.status, Status::Pending);
        let names: Vec<&str> = task.subtasks.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["outline", "draft"]);
        assert!(task.subtasks.iter().all(|s| !s.completed));
        assert_ne!(task.subtasks[0].id, task.subtasks[1].id);
    }

    #[test]
    fn back_to_back_creates_get_distinct_ids() {
        let mut store = empty_store();
        let a = store.create(input("a", "")).unwrap();
        let b = store.create(input("b", "")).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.tasks()[0].id, b);
    }

    #[test]
    fn editing_resets_subtask_completion() {
        let mut store = empty_store();
        let id = store.create(input("Ship", "Test")).unwrap();
        let sub_id = store.get(id).unwrap().subtasks[0].id;
        assert_eq!(store.toggle_subtask(id, sub_id).unwrap(), Some(true));

        assert!(store.update(id, input("Ship it", "Test")).unwrap());

        let task = store.get(id).unwrap();
        assert_eq!(task.name, "Ship it");
        assert_eq!(task.subtasks.len(), 1);
        assert_eq!(task.subtasks[0].name, "Test");
        assert!(!task.subtasks[0].completed);
    }

    #[test]
    fn update_keeps_status() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        assert!(store.update(2, input("Design", "")).unwrap());
        assert_eq!(store.get(2).unwrap().status, Status::Completed);
    }

    #[test]
    fn toggle_status_is_two_state() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        assert_eq!(store.get(1).unwrap().status, Status::InProgress);
        assert_eq!(store.toggle_status(1).unwrap(), Some(Status::Completed));
        assert_eq!(store.toggle_status(1).unwrap(), Some(Status::Pending));
        assert_eq!(store.toggle_status(1).unwrap(), Some(Status::Completed));
    }

    #[test]
    fn subtask_toggle_does_not_touch_task_status() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        assert_eq!(store.toggle_subtask(1, 3).unwrap(), Some(true));
        let task = store.get(1).unwrap();
        assert_eq!(task.completed_subtasks(), 3);
        assert_eq!(task.status, Status::InProgress);
    }

    #[test]
    fn lookup_misses_are_silent_no_ops() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        let before = store.tasks().to_vec();

        assert!(!store.update(999, input("x", "")).unwrap());
        assert!(!store.delete(999).unwrap());
        assert_eq!(store.toggle_status(999).unwrap(), None);
        assert_eq!(store.toggle_subtask(999, 1).unwrap(), None);
        assert_eq!(store.toggle_subtask(1, 999).unwrap(), None);

        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.database().get_item(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn delete_removes_only_the_matching_task() {
        let mut store = TaskStore::load(Database::open_in_memory().unwrap());
        assert!(store.delete(3).unwrap());
        let ids: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn every_mutation_persists_and_reload_is_identical() {
        let mut store = empty_store();
        store.create(input("one", "a\nb")).unwrap();
        store.create(input("two", "")).unwrap();
        let id = store.tasks()[1].id;
        store.toggle_status(id).unwrap();

        let saved = store.tasks().to_vec();
        let blob = store.database().get_item(TASKS_KEY).unwrap().unwrap();

        let db = Database::open_in_memory().unwrap();
        db.set_item(TASKS_KEY, &blob).unwrap();
        let reloaded = TaskStore::load(db);
        assert_eq!(reloaded.tasks(), saved.as_slice());
    }
}
