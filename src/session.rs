use std::io::{BufRead, Write};

use chrono::{DateTime, Duration, Local};

use crate::app::Tracker;
use crate::domain::{
    Activity, LedgerError, Project, activity_mut_or_err, find_activity, format_duration,
    round_minutes, validate_project_name,
};
use crate::error::AppError;
use crate::navigator::NavigatorExit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    SelectingProject,
    ShowingElapsed,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    AddProject,
    DeleteProject,
    ListProjects,
    SelectProject,
    Pause,
    End,
    Other,
}

impl SessionInput {
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "add" | "a" => Self::AddProject,
            "delete" | "del" | "d" => Self::DeleteProject,
            "projects" | "p" => Self::ListProjects,
            "select" | "s" => Self::SelectProject,
            "pause" | "+" => Self::Pause,
            "quit" | "q" | "00" | "done" | "0" => Self::End,
            _ => Self::Other,
        }
    }
}

/// Clock bookkeeping for one running activity.
///
/// Elapsed time always counts from `started_at`; pauses are only tallied in
/// `pause_minutes` and subtracted when the session is committed.
#[derive(Debug, Clone)]
pub struct ActivitySession {
    activity_id: u64,
    name: String,
    started_at: DateTime<Local>,
    paused_at: Option<DateTime<Local>>,
    pause_minutes: i64,
    state: SessionState,
}

impl ActivitySession {
    pub fn start(activity: &Activity, now: DateTime<Local>) -> Self {
        Self {
            activity_id: activity.id,
            name: activity.name.clone(),
            started_at: now,
            paused_at: None,
            pause_minutes: 0,
            state: SessionState::Running,
        }
    }

    pub fn activity_id(&self) -> u64 {
        self.activity_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pause_minutes(&self) -> i64 {
        self.pause_minutes
    }

    pub fn elapsed(&self, now: DateTime<Local>) -> Duration {
        now - self.started_at
    }

    pub fn pause(&mut self, now: DateTime<Local>) {
        self.paused_at = Some(now);
        self.state = SessionState::Paused;
    }

    /// Ends the pause and returns its length. Rounded minutes are added to the
    /// pause tally.
    pub fn resume(&mut self, now: DateTime<Local>) -> Duration {
        let pause = self
            .paused_at
            .take()
            .map_or_else(Duration::zero, |paused_at| now - paused_at);
        self.pause_minutes += round_minutes(pause);
        self.state = SessionState::Running;
        pause
    }

    pub fn select_project(&mut self) {
        self.state = SessionState::SelectingProject;
    }

    pub fn show_elapsed(&mut self) {
        self.state = SessionState::ShowingElapsed;
    }

    pub fn back_to_running(&mut self) {
        self.state = SessionState::Running;
    }

    pub fn end(&mut self) {
        self.state = SessionState::Ending;
    }
}

const SESSION_HELP: [&str; 7] = [
    "--> Press enter to see elapsed time! <--",
    "--> Type 'add' or 'a' to add a project <--",
    "--> Type 'delete' or 'd' to delete a project <--",
    "--> Type 'projects' or 'p' to see projects <--",
    "--> Type 'select' or 's' to open a project <--",
    "--> Type 'pause' or '+' to pause <--",
    "--> Type 'quit' or 'q' to end <--",
];

impl<R: BufRead, W: Write> Tracker<R, W> {
    /// Drives one activity from start to the save-or-discard question.
    pub(crate) fn run_session(&mut self, activity_id: u64) -> Result<(), AppError> {
        let activities = self.store.load_or_empty();
        let Some(activity) = find_activity(&activities, activity_id) else {
            let err = LedgerError::ActivityNotFound(activity_id);
            tracing::warn!(error = %err, "cannot start session");
            return self.console.failure(err);
        };

        let mut session = ActivitySession::start(activity, self.clock.now());
        tracing::info!(id = activity_id, name = %activity.name, "session started");
        self.console.blank()?;
        self.console.heading(format!(
            "<--- Starting {} at {} --->",
            session.name(),
            session.started_at().format("%d.%m.%Y %H:%M:%S")
        ))?;
        self.console.line(format!(
            "\n<--- Total time spent on this activity: {} hours {} minutes --->",
            activity.hours, activity.minutes
        ))?;
        self.console.line(format!("\nMy Projects: {}", activity.projects.len()))?;

        let mut show_help = true;
        let elapsed = loop {
            if show_help {
                self.console.blank()?;
                for line in SESSION_HELP {
                    self.console.line(line)?;
                }
            }
            show_help = true;

            self.console.blank()?;
            let input = self.console.ask()?;
            let now = self.clock.now();
            let mut elapsed = session.elapsed(now);

            match SessionInput::parse(&input) {
                SessionInput::AddProject => self.add_project(activity_id)?,
                SessionInput::DeleteProject => self.delete_project(activity_id)?,
                SessionInput::ListProjects => self.list_projects(activity_id)?,
                SessionInput::SelectProject => {
                    session.select_project();
                    if self.navigate_projects(activity_id)? == NavigatorExit::EndSession {
                        session.end();
                        elapsed = session.elapsed(self.clock.now());
                    } else {
                        session.back_to_running();
                    }
                }
                SessionInput::Pause => {
                    session.pause(now);
                    self.console
                        .notice(format!("\n--> {} Paused! Press enter to continue! <--", session.name()))?;
                    self.console.read_line()?;
                    let pause = session.resume(self.clock.now());
                    self.console
                        .line(format!("--> Unpaused [Pausetime: {}] <--", format_duration(pause)))?;
                    show_help = false;
                }
                SessionInput::End => session.end(),
                SessionInput::Other => {
                    session.show_elapsed();
                    self.console.clear()?;
                    self.console.line(format!(
                        "---> ({}) Elapsed Time: {} since start [{}] <---",
                        session.name(),
                        format_duration(elapsed),
                        session.started_at().format("%H:%M:%S")
                    ))?;
                    session.back_to_running();
                }
            }

            tracing::debug!(id = activity_id, state = ?session.state(), "session input handled");
            if session.state() == SessionState::Ending {
                break elapsed;
            }
        };

        self.finish_session(&session, elapsed)
    }

    fn finish_session(&mut self, session: &ActivitySession, elapsed: Duration) -> Result<(), AppError> {
        self.console
            .line(format!("You have spent {}", format_duration(elapsed)))?;
        let answer = self
            .console
            .prompt("Do you want to save the time? (Press enter or type no)")?;

        if matches!(answer.to_ascii_lowercase().as_str(), "no" | "n") {
            tracing::info!(id = session.activity_id(), "session discarded");
            return self.console.notice("===>> Last Time NOT SAVED <<===");
        }

        let activity_id = session.activity_id();
        let pause_minutes = session.pause_minutes();
        let committed = self.persist(|activities| {
            let activity = activity_mut_or_err(activities, activity_id)?;
            Ok(activity.commit_time(elapsed, pause_minutes))
        })?;

        if let Some(net_minutes) = committed {
            if net_minutes < 0 {
                tracing::warn!(
                    id = activity_id,
                    net_minutes,
                    pause_minutes,
                    "pause exceeded elapsed time, total reduced"
                );
            }
            tracing::info!(id = activity_id, net_minutes, "session saved");
            self.console.success("===>> Last Time has been SAVED <<===")?;
        }
        Ok(())
    }

    fn list_projects(&mut self, activity_id: u64) -> Result<(), AppError> {
        let activities = self.store.load_or_empty();
        let Some(activity) = find_activity(&activities, activity_id) else {
            return self.recover(LedgerError::ActivityNotFound(activity_id).into());
        };
        self.print_projects(activity)
    }

    pub(crate) fn print_projects(&mut self, activity: &Activity) -> Result<(), AppError> {
        if activity.projects.is_empty() {
            return self.console.notice("No projects yet, add one with 'add'");
        }
        for (index, project) in activity.projects.iter().enumerate() {
            self.console
                .line(format!("{index}: {} ({})", project.name, project.tasks.len()))?;
        }
        Ok(())
    }

    fn add_project(&mut self, activity_id: u64) -> Result<(), AppError> {
        let name = loop {
            let input = self.console.prompt("Project name?")?;
            let activities = self.store.load_or_empty();
            match validate_project_name(&activities, &input) {
                Ok(name) => break name,
                Err(err) => self.console.failure(err)?,
            }
        };

        let added = self.persist(|activities| {
            validate_project_name(activities, &name)?;
            activity_mut_or_err(activities, activity_id)?
                .projects
                .push(Project::new(name.clone()));
            Ok(())
        })?;

        if added.is_some() {
            tracing::info!(id = activity_id, project = %name, "added project");
            self.console
                .success(format!("\n--->> Project {name} added to db! <<---"))?;
        }
        Ok(())
    }

    fn delete_project(&mut self, activity_id: u64) -> Result<(), AppError> {
        let activities = self.store.load_or_empty();
        let Some(activity) = find_activity(&activities, activity_id) else {
            return self.recover(LedgerError::ActivityNotFound(activity_id).into());
        };
        if activity.projects.is_empty() {
            return self.console.notice("No projects to delete");
        }

        self.print_projects(activity)?;
        let Some(index) = self.prompt_index("Project index?", activity.projects.len())? else {
            return Ok(());
        };

        let project = &activity.projects[index];
        let question = format!(
            "Delete project {} with {} task(s)?",
            project.name,
            project.tasks.len()
        );
        if !self.console.confirm(&question)? {
            return self.console.notice("Project kept");
        }

        let name = project.name.clone();
        let removed = self.persist(|activities| {
            let activity = activity_mut_or_err(activities, activity_id)?;
            let index = activity
                .projects
                .iter()
                .position(|project| project.name == name)
                .ok_or_else(|| LedgerError::ProjectNotFound(name.clone()))?;
            Ok(activity.remove_project(index)?)
        })?;

        if removed.is_some() {
            tracing::info!(id = activity_id, project = %name, "deleted project");
            self.console
                .success(format!("--->> Project {name} deleted <<---"))?;
        }
        Ok(())
    }
}
