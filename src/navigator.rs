use std::io::{BufRead, Write};

use crate::app::Tracker;
use crate::domain::{
    Activity, LedgerError, Project, ValidationError, activity_mut_or_err, find_activity,
};
use crate::error::AppError;

/// How the project view was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorExit {
    Back,
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectInput {
    AddTask,
    DeleteTask,
    ShowTasks,
    Back,
    Quit,
    Other,
}

impl ProjectInput {
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "add" | "a" => Self::AddTask,
            "delete" | "del" | "d" => Self::DeleteTask,
            "show" | "s" => Self::ShowTasks,
            "back" | "b" => Self::Back,
            "quit" | "q" | "00" => Self::Quit,
            _ => Self::Other,
        }
    }
}

const PROJECT_HELP: [&str; 5] = [
    "--> Type 'add' or 'a' to add a task <--",
    "--> Type 'delete' or 'd' to delete a task <--",
    "--> Type 'show' or 's' to list tasks <--",
    "--> Type 'back' or 'b' to return to the activity <--",
    "--> Type 'quit' or 'q' to end the activity <--",
];

impl<R: BufRead, W: Write> Tracker<R, W> {
    /// Picks a project of the running activity and works on its tasks.
    ///
    /// The project is tracked by name, which is unique across the document,
    /// and looked up again in every fresh load.
    pub(crate) fn navigate_projects(&mut self, activity_id: u64) -> Result<NavigatorExit, AppError> {
        let activities = self.store.load_or_empty();
        let Some(activity) = find_activity(&activities, activity_id) else {
            self.recover(LedgerError::ActivityNotFound(activity_id).into())?;
            return Ok(NavigatorExit::Back);
        };
        if activity.projects.is_empty() {
            self.console.notice("No projects yet, add one with 'add'")?;
            return Ok(NavigatorExit::Back);
        }

        self.print_projects(activity)?;
        let Some(index) = self.prompt_index("Project index?", activity.projects.len())? else {
            return Ok(NavigatorExit::Back);
        };
        let project_name = activity.projects[index].name.clone();
        self.console
            .heading(format!("\n--->> Project {project_name} <<---"))?;

        loop {
            self.console.blank()?;
            for line in PROJECT_HELP {
                self.console.line(line)?;
            }
            self.console.blank()?;

            let input = self.console.ask()?;
            let still_there = match ProjectInput::parse(&input) {
                ProjectInput::AddTask => self.add_task(activity_id, &project_name)?,
                ProjectInput::DeleteTask => self.delete_task(activity_id, &project_name)?,
                ProjectInput::ShowTasks => self.show_tasks(activity_id, &project_name)?,
                ProjectInput::Back => return Ok(NavigatorExit::Back),
                ProjectInput::Quit => return Ok(NavigatorExit::EndSession),
                ProjectInput::Other => {
                    self.console.notice(format!("Unknown command: {input}"))?;
                    true
                }
            };

            if !still_there {
                return Ok(NavigatorExit::Back);
            }
        }
    }

    fn add_task(&mut self, activity_id: u64, project_name: &str) -> Result<bool, AppError> {
        let description = loop {
            let input = self.console.prompt("Task?")?;
            if !input.is_empty() {
                break input;
            }
            self.console.failure(ValidationError::Empty("task"))?;
        };

        let added = self.persist(|activities| {
            let project = project_mut_or_err(activities, activity_id, project_name)?;
            Ok(project.add_task(description.clone()))
        })?;

        if let Some(index) = added {
            tracing::info!(project = %project_name, index, "added task");
            self.console
                .success(format!("--->> Task {index}: {description} added <<---"))?;
        }
        Ok(added.is_some())
    }

    fn delete_task(&mut self, activity_id: u64, project_name: &str) -> Result<bool, AppError> {
        let Some(project) = self.load_project(activity_id, project_name)? else {
            return Ok(false);
        };
        if project.tasks.is_empty() {
            self.console.notice("No tasks to delete")?;
            return Ok(true);
        }

        self.print_tasks(&project)?;
        let Some(index) = self.prompt_index("Task index?", project.tasks.len())? else {
            return Ok(true);
        };
        if !self
            .console
            .confirm(&format!("Delete task {index}: {}?", project.tasks[index]))?
        {
            self.console.notice("Task kept")?;
            return Ok(true);
        }

        let removed = self.persist(|activities| {
            let project = project_mut_or_err(activities, activity_id, project_name)?;
            Ok(project.remove_task(index)?)
        })?;

        if let Some(task) = removed {
            tracing::info!(project = %project_name, index, "deleted task");
            self.console
                .success(format!("--->> Task {task} deleted <<---"))?;
        }
        Ok(true)
    }

    fn show_tasks(&mut self, activity_id: u64, project_name: &str) -> Result<bool, AppError> {
        let Some(project) = self.load_project(activity_id, project_name)? else {
            return Ok(false);
        };
        self.print_tasks(&project)?;
        Ok(true)
    }

    fn print_tasks(&mut self, project: &Project) -> Result<(), AppError> {
        if project.tasks.is_empty() {
            return self.console.notice(format!("{} has no tasks yet", project.name));
        }
        for (index, task) in project.tasks.iter().enumerate() {
            self.console.line(format!("{index}: {task}"))?;
        }
        Ok(())
    }

    /// Fresh copy of the project, or `None` after reporting that it is gone.
    fn load_project(&mut self, activity_id: u64, project_name: &str) -> Result<Option<Project>, AppError> {
        let activities = self.store.load_or_empty();
        let found = find_activity(&activities, activity_id)
            .ok_or(LedgerError::ActivityNotFound(activity_id))
            .and_then(|activity| {
                activity
                    .project(project_name)
                    .cloned()
                    .ok_or_else(|| LedgerError::ProjectNotFound(project_name.to_string()))
            });

        match found {
            Ok(project) => Ok(Some(project)),
            Err(err) => {
                self.recover(err.into())?;
                Ok(None)
            }
        }
    }
}

fn project_mut_or_err<'a>(
    activities: &'a mut [Activity],
    activity_id: u64,
    project_name: &str,
) -> Result<&'a mut Project, LedgerError> {
    activity_mut_or_err(activities, activity_id)?
        .project_mut(project_name)
        .ok_or_else(|| LedgerError::ProjectNotFound(project_name.to_string()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::app::test_support::{scripted, seed, stored};
    use crate::domain::{Activity, Project};

    use super::ProjectInput;

    fn writing_with(projects: Vec<Project>) -> Activity {
        let mut writing = Activity::new(0, "writing", "w");
        writing.projects = projects;
        writing
    }

    fn project_with(name: &str, tasks: &[&str]) -> Project {
        let mut project = Project::new(name);
        for task in tasks {
            project.add_task(*task);
        }
        project
    }

    #[test]
    fn parses_project_tokens() {
        assert_eq!(ProjectInput::parse("a"), ProjectInput::AddTask);
        assert_eq!(ProjectInput::parse("del"), ProjectInput::DeleteTask);
        assert_eq!(ProjectInput::parse("s"), ProjectInput::ShowTasks);
        assert_eq!(ProjectInput::parse("b"), ProjectInput::Back);
        assert_eq!(ProjectInput::parse("00"), ProjectInput::Quit);
        assert_eq!(ProjectInput::parse("p"), ProjectInput::Other);
    }

    #[test]
    fn add_then_delete_task_leaves_project_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(vec![Project::new("draft")])]);

        let input = "w\ns\n0\na\noutline\ns\nd\n0\ny\nb\nq\nno\n";
        let mut tracker = scripted(&path, input, &[0, 1, 2]);
        tracker.run().expect("run");
        let output = tracker.into_output();

        assert!(output.contains("0: outline"));
        assert_eq!(stored(&path)[0].projects, vec![Project::new("draft")]);
    }

    #[test]
    fn empty_task_is_rejected_and_asked_again() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(vec![Project::new("draft")])]);

        let input = "w\ns\n0\na\n\nfix\nb\nq\nno\n";
        let mut tracker = scripted(&path, input, &[0, 1, 2]);
        tracker.run().expect("run");
        let output = tracker.into_output();

        assert!(output.contains("Error: task must not be empty"));
        assert_eq!(stored(&path)[0].projects[0].tasks, vec!["fix"]);
    }

    #[test]
    fn out_of_range_task_index_is_asked_again() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(vec![project_with("draft", &["outline", "intro"])])]);

        let input = "w\ns\n0\nd\n5\nx\n1\nn\nb\nq\nno\n";
        let mut tracker = scripted(&path, input, &[0, 1, 2]);
        tracker.run().expect("run");
        let output = tracker.into_output();

        assert_eq!(stored(&path)[0].projects[0].tasks, vec!["outline", "intro"]);
        assert!(output.contains("Error: index 5 is out of range (0..2)"));
        assert!(output.contains("Error: x is not a number"));
        assert!(output.contains("Task kept"));
    }

    #[test]
    fn deleting_shifts_later_task_indices() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(vec![project_with("draft", &["a", "b", "c"])])]);

        let input = "w\ns\n0\nd\n0\ny\nd\n0\ny\nb\nq\nno\n";
        let mut tracker = scripted(&path, input, &[0, 1, 2]);
        tracker.run().expect("run");

        assert_eq!(stored(&path)[0].projects[0].tasks, vec!["c"]);
    }

    #[test]
    fn invalid_project_index_is_asked_again_and_back_keeps_the_session() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(vec![Project::new("draft")])]);

        // start, "s", "q"
        let input = "w\ns\n1\n-1\n0\nb\nq\n\n";
        let mut tracker = scripted(&path, input, &[0, 1, 40]);
        tracker.run().expect("run");
        let output = tracker.into_output();

        assert!(output.contains("Error: index 1 is out of range (0..1)"));
        assert!(output.contains("Error: index -1 is out of range (0..1)"));
        let activity = &stored(&path)[0];
        assert_eq!((activity.hours, activity.minutes), (0, 40));
    }

    #[test]
    fn quit_inside_a_project_ends_the_activity_session() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(vec![Project::new("draft")])]);

        // start, "s", then the navigator quit
        let mut tracker = scripted(&path, "w\ns\n0\nq\n\n", &[0, 5, 30]);
        tracker.run().expect("run");

        let activity = &stored(&path)[0];
        assert_eq!((activity.hours, activity.minutes), (0, 30));
    }

    #[test]
    fn selecting_without_projects_returns_to_the_session() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        seed(&path, &[writing_with(Vec::new())]);

        let mut tracker = scripted(&path, "w\ns\nq\nno\n", &[0, 1, 2]);
        tracker.run().expect("run");

        assert!(tracker.into_output().contains("No projects yet"));
    }
}
