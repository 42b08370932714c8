use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task as handed over by the todo store.
///
/// The timeline reads tasks and never mutates them directly; date edits are
/// reported back through the engine's date-change callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    /// Parent task for subtasks.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Nesting depth; 0 for top-level tasks.
    #[serde(default)]
    pub level: u32,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    /// Hides this task's subtasks.
    #[serde(default)]
    pub collapsed: bool,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        project_id: Uuid,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            project_id,
            parent_id: None,
            level: 0,
            start_date,
            due_date,
            completed: false,
            collapsed: false,
        }
    }

    /// Create a subtask one level below `parent`, in the same project.
    pub fn subtask_of(
        parent: &Task,
        name: impl Into<String>,
        start_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            parent_id: Some(parent.id),
            level: parent.level + 1,
            ..Self::new(name, parent.project_id, start_date, due_date)
        }
    }

    pub fn is_subtask(&self) -> bool {
        self.level > 0
    }

    /// Inclusive length in days.
    pub fn duration_days(&self) -> i64 {
        (self.due_date - self.start_date).num_days().abs() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtask_inherits_project_and_depth() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let parent = Task::new("Design", Uuid::new_v4(), start, start);
        let child = Task::subtask_of(&parent, "Wireframes", start, start);
        assert_eq!(child.project_id, parent.project_id);
        assert_eq!(child.parent_id, Some(parent.id));
        assert_eq!(child.level, 1);
        assert!(child.is_subtask());
        assert_eq!(child.duration_days(), 1);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let json = r#"{
            "id": "6f1c1c64-5d0a-4c56-9a53-0d1b8a2f3e10",
            "name": "Ship",
            "project_id": "9a0e4b4e-3c59-4d7f-8f64-3f5d2f4b0c11",
            "start_date": "2024-05-01",
            "due_date": "2024-05-03"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.level, 0);
        assert!(task.parent_id.is_none());
        assert!(!task.completed);
        assert_eq!(task.duration_days(), 3);
    }
}
