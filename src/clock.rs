use chrono::{DateTime, Local};

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hands out a fixed sequence of instants, repeating the last one when the
/// script runs out.
#[cfg(test)]
#[derive(Debug)]
pub struct ScriptedClock {
    instants: std::cell::RefCell<std::collections::VecDeque<DateTime<Local>>>,
    last: std::cell::Cell<Option<DateTime<Local>>>,
}

#[cfg(test)]
impl ScriptedClock {
    /// Instants given as minute offsets from a fixed local morning.
    pub fn from_minutes(offsets: &[i64]) -> Self {
        use chrono::TimeZone;

        let base = Local
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .earliest()
            .expect("base instant should exist");
        Self {
            instants: std::cell::RefCell::new(
                offsets
                    .iter()
                    .map(|offset| base + chrono::Duration::minutes(*offset))
                    .collect(),
            ),
            last: std::cell::Cell::new(Some(base)),
        }
    }
}

#[cfg(test)]
impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Local> {
        let next = self.instants.borrow_mut().pop_front();
        match next {
            Some(instant) => {
                self.last.set(Some(instant));
                instant
            }
            None => self.last.get().unwrap_or_else(Local::now),
        }
    }
}
