use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

use crate::editor::TextEditor;
use crate::models::{Priority, Task, TaskInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Description,
    Priority,
    DueDate,
    Subtasks,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Name,
        FormField::Description,
        FormField::Priority,
        FormField::DueDate,
        FormField::Subtasks,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Task Name",
            FormField::Description => "Description",
            FormField::Priority => "Priority",
            FormField::DueDate => "Due Date (YYYY-MM-DD)",
            FormField::Subtasks => "Subtasks (one per line)",
        }
    }
}

/// Transient add/edit form state. A fresh form is built every time the
/// dialog opens, so nothing carries over between openings.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub name: TextEditor,
    pub description: TextEditor,
    pub priority: Priority,
    pub due_date: TextEditor,
    pub subtasks: TextEditor,
    pub focus: FormField,
    pub error: Option<String>,
}

impl TaskForm {
    /// Empty form with the due date preset to `default_due`.
    pub fn blank(default_due: NaiveDate) -> Self {
        TaskForm {
            name: TextEditor::single_line(""),
            description: TextEditor::multi_line(""),
            priority: Priority::Medium,
            due_date: TextEditor::single_line(&default_due.format("%Y-%m-%d").to_string()),
            subtasks: TextEditor::multi_line(""),
            focus: FormField::Name,
            error: None,
        }
    }

    /// Form prefilled from an existing task; subtask names only, one per line.
    pub fn for_task(task: &Task) -> Self {
        let subtask_names: Vec<&str> = task.subtasks.iter().map(|s| s.name.as_str()).collect();
        TaskForm {
            name: TextEditor::single_line(&task.name),
            description: TextEditor::multi_line(&task.description),
            priority: task.priority,
            due_date: TextEditor::single_line(&task.due_date.format("%Y-%m-%d").to_string()),
            subtasks: TextEditor::multi_line(&subtask_names.join("\n")),
            focus: FormField::Name,
            error: None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Editor under focus, None while the priority selector has focus.
    pub fn focused_editor(&mut self) -> Option<&mut TextEditor> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Description => Some(&mut self.description),
            FormField::Priority => None,
            FormField::DueDate => Some(&mut self.due_date),
            FormField::Subtasks => Some(&mut self.subtasks),
        }
    }

    pub fn editor(&self, field: FormField) -> Option<&TextEditor> {
        match field {
            FormField::Name => Some(&self.name),
            FormField::Description => Some(&self.description),
            FormField::Priority => None,
            FormField::DueDate => Some(&self.due_date),
            FormField::Subtasks => Some(&self.subtasks),
        }
    }

    /// True once any text field has been typed into.
    pub fn is_modified(&self) -> bool {
        [&self.name, &self.description, &self.due_date, &self.subtasks]
            .iter()
            .any(|editor| editor.is_dirty)
    }

    pub fn fields(&self) -> [FormField; 5] {
        FormField::ORDER
    }

    /// Validates and trims the fields into a `TaskInput`.
    pub fn to_input(&self) -> Result<TaskInput> {
        let name = self.name.get_content().trim().to_string();
        if name.is_empty() {
            bail!("Task name is required");
        }
        let due_text = self.due_date.get_content();
        let due_date = NaiveDate::parse_from_str(due_text.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("Due date must be a date like 2026-10-20"))?;

        Ok(TaskInput {
            name,
            description: self.description.get_content().trim().to_string(),
            priority: self.priority,
            due_date,
            subtasks: self.subtasks.get_content(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_tasks;

    fn type_into(editor: &mut TextEditor, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                editor.insert_newline();
            } else {
                editor.insert_char(c);
            }
        }
    }

    #[test]
    fn blank_form_defaults() {
        let due = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let form = TaskForm::blank(due);
        assert_eq!(form.due_date.get_content(), "2026-10-20");
        assert_eq!(form.subtasks.get_content(), "");
        assert_eq!(form.priority, Priority::Medium);
        assert_eq!(form.focus, FormField::Name);
        assert!(!form.is_modified());
    }

    #[test]
    fn typing_marks_form_modified() {
        let mut form = TaskForm::for_task(&seed_tasks()[1]);
        assert!(!form.is_modified());
        form.focus_next();
        if let Some(editor) = form.focused_editor() {
            editor.insert_char('!');
        }
        assert!(form.is_modified());
    }

    #[test]
    fn edit_form_lists_subtask_names() {
        let form = TaskForm::for_task(&seed_tasks()[0]);
        assert_eq!(
            form.subtasks.get_content(),
            "Research market trends\nDefine project scope\nCreate timeline"
        );
        assert_eq!(form.name.get_content(), "Draft proposal for client");
        assert_eq!(form.priority, Priority::High);
    }

    #[test]
    fn to_input_trims_and_validates() {
        let due = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let mut form = TaskForm::blank(due);
        assert!(form.to_input().is_err());

        type_into(&mut form.name, "  Plan sprint  ");
        type_into(&mut form.subtasks, "a\n\nb");
        let input = form.to_input().unwrap();
        assert_eq!(input.name, "Plan sprint");
        assert_eq!(input.due_date, due);
        assert_eq!(input.subtasks, "a\n\nb");

        form.focus = FormField::DueDate;
        let editor = form.focused_editor().unwrap();
        for _ in 0..3 {
            editor.delete_char();
        }
        assert_eq!(form.due_date.get_content(), "2026-10");
        assert!(form.to_input().is_err());
    }

    #[test]
    fn focus_wraps_both_ways() {
        assert_eq!(FormField::Subtasks.next(), FormField::Name);
        assert_eq!(FormField::Name.previous(), FormField::Subtasks);
    }
}
