use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Priority::Low => Priority::High,
            Priority::Medium => Priority::Low,
            Priority::High => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(anyhow!("invalid priority '{}': expected low, medium or high", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
        }
    }

    /// Human label, "in progress" rather than "in-progress".
    pub fn label(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in progress",
            Status::Completed => "completed",
        }
    }

    /// Completed flips back to pending; every other status jumps to completed.
    pub fn toggled(self) -> Self {
        match self {
            Status::Completed => Status::Pending,
            Status::Pending | Status::InProgress => Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "in-progress" | "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            other => Err(anyhow!(
                "invalid status '{}': expected pending, in-progress or completed",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    pub name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }
}

/// Field values submitted from the add/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInput {
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    /// Newline separated subtask names; blank lines are ignored.
    pub subtasks: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Only(Status),
}

impl Filter {
    pub const ALL: [Filter; 4] = [
        Filter::All,
        Filter::Only(Status::Pending),
        Filter::Only(Status::InProgress),
        Filter::Only(Status::Completed),
    ];

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(status) => task.status == status,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Only(status) => status.as_str(),
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Filter::All);
        }
        s.parse::<Status>()
            .map(Filter::Only)
            .map_err(|_| anyhow!("invalid filter '{}': expected all, pending, in-progress or completed", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Tasks,
    Calendar,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Dashboard, Page::Tasks, Page::Calendar];

    pub fn index(self) -> usize {
        match self {
            Page::Dashboard => 0,
            Page::Tasks => 1,
            Page::Calendar => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Tasks => "Tasks",
            Page::Calendar => "Calendar",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % 3]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + 2) % 3]
    }
}

impl FromStr for Page {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dashboard" => Ok(Page::Dashboard),
            "tasks" => Ok(Page::Tasks),
            "calendar" => Ok(Page::Calendar),
            other => Err(anyhow!("invalid page '{}': expected dashboard, tasks or calendar", other)),
        }
    }
}

/// Which dialog is open. Only one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Closed,
    Add,
    Edit(u64),
    Detail(u64),
}

#[derive(Debug, Clone)]
pub struct ConfigItem {
    pub key_name: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn seed_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn seed_subtasks(items: &[(&str, bool)]) -> Vec<Subtask> {
    items
        .iter()
        .enumerate()
        .map(|(i, (name, completed))| Subtask {
            id: i as u64 + 1,
            name: name.to_string(),
            completed: *completed,
        })
        .collect()
}

/// Demo tasks used when nothing usable is stored yet.
pub fn seed_tasks() -> Vec<Task> {
    vec![
        Task {
            id: 1,
            name: "Draft proposal for client".into(),
            description: "Create a detailed proposal, including scope, timeline, and budget.".into(),
            priority: Priority::High,
            status: Status::InProgress,
            due_date: seed_date(2025, 9, 30),
            subtasks: seed_subtasks(&[
                ("Research market trends", true),
                ("Define project scope", true),
                ("Create timeline", false),
            ]),
        },
        Task {
            id: 2,
            name: "Design new mockups".into(),
            description: "Create high-fidelity mockups for the new dashboard design.".into(),
            priority: Priority::Medium,
            status: Status::Completed,
            due_date: seed_date(2025, 9, 15),
            subtasks: seed_subtasks(&[("Wireframe layouts", true), ("Update design system", true)]),
        },
        Task {
            id: 3,
            name: "Develop dashboard features".into(),
            description: "Implement new dashboard features based on user feedback.".into(),
            priority: Priority::High,
            status: Status::InProgress,
            due_date: seed_date(2025, 10, 5),
            subtasks: Vec::new(),
        },
        Task {
            id: 4,
            name: "Conduct user testing".into(),
            description: "Organize and conduct user testing sessions for the new features.".into(),
            priority: Priority::Medium,
            status: Status::Pending,
            due_date: seed_date(2025, 10, 10),
            subtasks: Vec::new(),
        },
    ]
}
