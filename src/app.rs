use std::io::{BufRead, Write};

use chrono::Local;

use crate::clock::Clock;
use crate::command::{Command, Registry, builtin_help};
use crate::config::Settings;
use crate::console::Console;
use crate::domain::{
    Activity, LedgerError, next_activity_id, parse_id, parse_index, validate_activity_label,
};
use crate::error::AppError;
use crate::report::{render_top, time_left, top_activities};
use crate::storage::Store;

const CANCEL_WORDS: [&str; 2] = ["back", "b"];

enum Flow {
    Continue,
    Quit,
}

/// Top-level command loop. Owns the store, the console and the session clock.
pub struct Tracker<R, W> {
    pub(crate) store: Store,
    pub(crate) console: Console<R, W>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) settings: Settings,
}

impl<R: BufRead, W: Write> Tracker<R, W> {
    pub fn new(store: Store, console: Console<R, W>, clock: Box<dyn Clock>, settings: Settings) -> Self {
        Self {
            store,
            console,
            clock,
            settings,
        }
    }

    /// Runs until the user quits or input is closed.
    pub fn run(&mut self) -> Result<(), AppError> {
        self.print_menu()?;

        loop {
            let flow = self.console.ask().and_then(|input| self.handle(&input));
            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => {
                    self.console.clear()?;
                    return Ok(());
                }
                Err(AppError::InputClosed) => {
                    tracing::debug!("input closed, leaving command loop");
                    return Ok(());
                }
                Err(err) => self.recover(err)?,
            }
        }
    }

    fn handle(&mut self, input: &str) -> Result<Flow, AppError> {
        let activities = self.store.load_or_empty();
        let command = match Registry::build(&activities).dispatch(input) {
            Ok(command) => command,
            Err(err) => {
                self.console.failure(err)?;
                return Ok(Flow::Continue);
            }
        };

        tracing::debug!(?command, "dispatching");
        match command {
            Command::RunActivity(id) => {
                self.console.clear()?;
                self.run_session(id)?;
            }
            Command::ShowTop => self.show_top()?,
            Command::AddActivity => self.add_activity()?,
            Command::DeleteActivity => self.delete_activity()?,
            Command::Quit => return Ok(Flow::Quit),
        }

        self.print_menu()?;
        Ok(Flow::Continue)
    }

    /// Logs and reports a recoverable failure; anything else is passed back.
    pub(crate) fn recover(&mut self, err: AppError) -> Result<(), AppError> {
        if !err.is_recoverable() {
            return Err(err);
        }
        tracing::error!(error = %err, "operation failed");
        self.console.failure(err)
    }

    /// Runs one reload, mutate, save cycle. Storage and lookup failures are
    /// reported and yield `None`.
    pub(crate) fn persist<T>(
        &mut self,
        apply: impl FnOnce(&mut Vec<Activity>) -> Result<T, AppError>,
    ) -> Result<Option<T>, AppError> {
        match self.store.update(apply) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.recover(err)?;
                Ok(None)
            }
        }
    }

    /// Asks for a positional index until it is in range. `back` cancels.
    pub(crate) fn prompt_index(&mut self, question: &str, len: usize) -> Result<Option<usize>, AppError> {
        loop {
            let input = self.console.prompt(question)?;
            if CANCEL_WORDS.contains(&input.as_str()) {
                return Ok(None);
            }
            match parse_index(&input, len) {
                Ok(index) => return Ok(Some(index)),
                Err(err) => self.console.failure(err)?,
            }
        }
    }

    fn print_menu(&mut self) -> Result<(), AppError> {
        let activities = self.store.load_or_empty();

        self.console.heading(format!(
            "\n<================== timeledger v{} ==================>",
            env!("CARGO_PKG_VERSION")
        ))?;
        if let Ok(day_end) = self.settings.day_end() {
            let (hours, minutes) = time_left(Local::now().time(), day_end);
            self.console.line(format!(
                "\n<--- You have {hours} hours and {minutes} minutes left till {} --->\n",
                day_end.format("%H:%M")
            ))?;
        }

        if activities.is_empty() {
            self.console.notice("<--- WARNING: No data in database --->")?;
        } else {
            self.console.line("=> What do you want to do now?")?;
            for activity in &activities {
                self.console.line(format!(
                    "-> [{}h:{}m] {} || {} ({})",
                    activity.hours, activity.minutes, activity.name, activity.short_name, activity.id
                ))?;
            }
        }

        self.console.line("\n=> Commands:")?;
        for help in builtin_help() {
            self.console.line(format!("-> {help}"))?;
        }
        self.console.blank()
    }

    fn show_top(&mut self) -> Result<(), AppError> {
        let activities = self.store.load_or_empty();
        let entries = top_activities(&activities, self.settings.top_limit());
        match render_top(&entries) {
            Ok(rendered) => self.console.line(rendered)?,
            Err(err) => {
                tracing::error!(error = %err, "failed to render top activities");
                self.console.failure(err)?;
            }
        }

        self.console.prompt("---> Press enter to go back to commandline <---")?;
        Ok(())
    }

    fn add_activity(&mut self) -> Result<(), AppError> {
        let name = self.ask_activity_label("Activity name?", "activity name")?;
        let short_name = self.ask_activity_label("Activity short name?", "short name")?;

        let added = self.persist(|activities| {
            // Labels are checked again against the document being written.
            validate_activity_label(activities, &name, "activity name")?;
            validate_activity_label(activities, &short_name, "short name")?;
            let id = next_activity_id(activities);
            activities.push(Activity::new(id, name.clone(), short_name.clone()));
            Ok(id)
        })?;

        self.console.clear()?;
        if let Some(id) = added {
            tracing::info!(id, name = %name, "added activity");
            self.console.success(format!("--->> Activity {name} ({id}) added to db! <<---"))?;
        }
        Ok(())
    }

    fn ask_activity_label(&mut self, question: &str, field: &'static str) -> Result<String, AppError> {
        loop {
            let input = self.console.prompt(question)?;
            let activities = self.store.load_or_empty();
            match validate_activity_label(&activities, &input, field) {
                Ok(label) => return Ok(label),
                Err(err) => self.console.failure(err)?,
            }
        }
    }

    fn delete_activity(&mut self) -> Result<(), AppError> {
        let id = loop {
            let input = self.console.prompt("--> ID:")?;
            if CANCEL_WORDS.contains(&input.as_str()) {
                return Ok(());
            }
            match parse_id(&input) {
                Ok(id) => break id,
                Err(err) => self.console.failure(err)?,
            }
        };

        self.console.clear()?;
        let removed = self.persist(|activities| {
            let index = activities
                .iter()
                .position(|activity| activity.id == id)
                .ok_or(LedgerError::ActivityNotFound(id))?;
            Ok(activities.remove(index))
        })?;

        if let Some(activity) = removed {
            tracing::info!(id, name = %activity.name, "deleted activity");
            self.console
                .success(format!("--->> Activity {} ({id}) deleted <<---", activity.name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
impl<R: BufRead> Tracker<R, Vec<u8>> {
    pub(crate) fn into_output(self) -> String {
        String::from_utf8(self.console.into_writer()).expect("console output should be utf8")
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;
    use std::path::Path;

    use crate::clock::ScriptedClock;
    use crate::config::Settings;
    use crate::console::{Console, ConsoleStyle};
    use crate::domain::Activity;
    use crate::storage::Store;

    use super::Tracker;

    pub type ScriptedTracker = Tracker<Cursor<Vec<u8>>, Vec<u8>>;

    /// Tracker fed from a scripted input. `clock_minutes` are the instants
    /// the session clock returns, as minute offsets, in call order.
    pub fn scripted(data_path: &Path, input: impl AsRef<[u8]>, clock_minutes: &[i64]) -> ScriptedTracker {
        let store = Store::new(data_path);
        store.ensure_initialized().expect("store should initialize");
        Tracker::new(
            store,
            Console::new(Cursor::new(input.as_ref().to_vec()), Vec::new(), ConsoleStyle::plain()),
            Box::new(ScriptedClock::from_minutes(clock_minutes)),
            Settings::default(),
        )
    }

    pub fn seed(data_path: &Path, activities: &[Activity]) {
        Store::new(data_path).save(activities).expect("seed should save");
    }

    pub fn stored(data_path: &Path) -> Vec<Activity> {
        Store::new(data_path).load().expect("stored document should load")
    }
}
