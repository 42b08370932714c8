use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Project, Task};

/// Projects and tasks in display order, as read from `tasks.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskBoard {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskBoard {
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Apply a date edit. Returns `false` if the task is unknown.
    pub fn set_task_dates(&mut self, id: Uuid, start: NaiveDate, due: NaiveDate) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.start_date = start;
                task.due_date = due;
                true
            }
            None => false,
        }
    }

    /// Flip the collapsed flag of a project or task with this id.
    pub fn toggle_collapsed(&mut self, id: Uuid) -> bool {
        if let Some(project) = self.projects.iter_mut().find(|p| p.id == id) {
            project.collapsed = !project.collapsed;
            return true;
        }
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.collapsed = !task.collapsed;
            return true;
        }
        false
    }

    /// A small board spread around `today`, used when no `tasks.json` exists.
    pub fn sample(today: NaiveDate) -> Self {
        let day = |offset: i64| today + Duration::days(offset);

        let website = Project::new("Website Relaunch", "#4682B4");
        let garden = Project::new("Garden", "#3CB371");
        let taxes = Project::new("Taxes", "#D2691E");

        let design = Task::new("Design mockups", website.id, day(-10), day(2));
        let review = Task::subtask_of(&design, "Stakeholder review", day(0), day(2));
        let build = Task::new("Build pages", website.id, day(3), day(24));
        let header = Task::subtask_of(&build, "Header and navigation", day(3), day(8));
        let content = Task::subtask_of(&build, "Content migration", day(9), day(20));
        let launch = Task::new("Launch", website.id, day(25), day(25));

        let mut beds = Task::new("Prepare beds", garden.id, day(-20), day(-5));
        beds.completed = true;
        let seeds = Task::new("Sow seeds", garden.id, day(-4), day(10));
        let fence = Task::new("Repair fence", garden.id, day(30), day(44));

        let receipts = Task::new("Collect receipts", taxes.id, day(-30), day(14));
        let filing = Task::new("File return", taxes.id, day(40), day(60));

        Self {
            projects: vec![website, garden, taxes],
            tasks: vec![
                design, review, build, header, content, launch, beds, seeds, fence, receipts,
                filing,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_board_is_consistent() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let board = TaskBoard::sample(today);
        assert_eq!(board.projects.len(), 3);
        for task in &board.tasks {
            assert!(board.project(task.project_id).is_some());
            assert!(task.start_date <= task.due_date);
            if let Some(parent) = task.parent_id {
                assert_eq!(board.task(parent).unwrap().level + 1, task.level);
            }
        }
    }

    #[test]
    fn edits_by_id() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let mut board = TaskBoard::sample(today);
        let id = board.tasks[0].id;
        assert!(board.set_task_dates(id, today, today));
        assert_eq!(board.task(id).unwrap().due_date, today);
        assert!(!board.set_task_dates(Uuid::new_v4(), today, today));

        let project = board.projects[1].id;
        assert!(board.toggle_collapsed(project));
        assert!(board.project(project).unwrap().collapsed);
    }
}
