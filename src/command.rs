use crate::domain::Activity;

/// What a top-level input line resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RunActivity(u64),
    ShowTop,
    AddActivity,
    DeleteActivity,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no such command: {0}")]
    NoSuchCommand(String),
}

struct Builtin {
    command: Command,
    words: &'static [&'static str],
}

const BUILTINS: [Builtin; 4] = [
    Builtin {
        command: Command::ShowTop,
        words: &["top", "t"],
    },
    Builtin {
        command: Command::AddActivity,
        words: &["add", "a"],
    },
    Builtin {
        command: Command::DeleteActivity,
        words: &["delete", "del"],
    },
    Builtin {
        command: Command::Quit,
        words: &["quit", "q", "00"],
    },
];

pub fn is_reserved_word(word: &str) -> bool {
    BUILTINS
        .iter()
        .any(|builtin| builtin.words.contains(&word))
}

/// Help lines for the built-in commands, in dispatch order.
pub fn builtin_help() -> Vec<String> {
    BUILTINS
        .iter()
        .map(|builtin| {
            let quoted = builtin
                .words
                .iter()
                .map(|word| format!("'{word}'"))
                .collect::<Vec<_>>();
            format!("{:<8} {}", label(builtin.command), quoted.join(" or "))
        })
        .collect()
}

fn label(command: Command) -> &'static str {
    match command {
        Command::RunActivity(_) => "start",
        Command::ShowTop => "top",
        Command::AddActivity => "add",
        Command::DeleteActivity => "delete",
        Command::Quit => "quit",
    }
}

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    name: String,
    short_name: String,
}

/// Stored activities followed by the built-in commands. Matching walks this
/// order and the first hit wins.
#[derive(Debug, Clone)]
pub struct Registry {
    activities: Vec<Entry>,
}

impl Registry {
    pub fn build(activities: &[Activity]) -> Self {
        Self {
            activities: activities
                .iter()
                .map(|activity| Entry {
                    id: activity.id,
                    name: activity.name.clone(),
                    short_name: activity.short_name.clone(),
                })
                .collect(),
        }
    }

    pub fn dispatch(&self, input: &str) -> Result<Command, DispatchError> {
        let token = input.trim();

        let activity = self.activities.iter().find(|entry| {
            entry.name == token || entry.short_name == token || entry.id.to_string() == token
        });
        if let Some(entry) = activity {
            return Ok(Command::RunActivity(entry.id));
        }

        BUILTINS
            .iter()
            .find(|builtin| builtin.words.contains(&token))
            .map(|builtin| builtin.command)
            .ok_or_else(|| DispatchError::NoSuchCommand(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::Activity;

    use super::{Command, DispatchError, Registry, builtin_help, is_reserved_word};

    fn registry() -> Registry {
        Registry::build(&[
            Activity::new(0, "writing", "w"),
            Activity::new(3, "reading", "r"),
            Activity::new(7, "3", "x"),
        ])
    }

    #[test]
    fn matches_name_short_name_and_id() {
        let registry = registry();
        assert_eq!(registry.dispatch("writing"), Ok(Command::RunActivity(0)));
        assert_eq!(registry.dispatch("r"), Ok(Command::RunActivity(3)));
        assert_eq!(registry.dispatch("7"), Ok(Command::RunActivity(7)));
        assert_eq!(registry.dispatch(" w \r"), Ok(Command::RunActivity(0)));
    }

    #[test]
    fn first_match_in_registry_order_wins() {
        // "3" is both the id of "reading" and the name of the third activity.
        assert_eq!(registry().dispatch("3"), Ok(Command::RunActivity(3)));
    }

    #[test]
    fn resolves_builtins_after_activities() {
        let registry = registry();
        assert_eq!(registry.dispatch("t"), Ok(Command::ShowTop));
        assert_eq!(registry.dispatch("add"), Ok(Command::AddActivity));
        assert_eq!(registry.dispatch("del"), Ok(Command::DeleteActivity));
        assert_eq!(registry.dispatch("00"), Ok(Command::Quit));
        assert_eq!(registry.dispatch("quit"), Ok(Command::Quit));
    }

    #[test]
    fn unknown_input_is_an_explicit_error() {
        assert_eq!(
            registry().dispatch("swimming"),
            Err(DispatchError::NoSuchCommand("swimming".to_string()))
        );
        assert_eq!(
            Registry::build(&[]).dispatch(""),
            Err(DispatchError::NoSuchCommand(String::new()))
        );
    }

    #[test]
    fn reserved_words_cover_every_builtin() {
        for word in ["top", "t", "add", "a", "delete", "del", "quit", "q", "00"] {
            assert!(is_reserved_word(word), "{word} should be reserved");
        }
        assert!(!is_reserved_word("writing"));
        assert_eq!(builtin_help().len(), 4);
    }
}
