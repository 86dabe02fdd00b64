use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize};

use crate::command::is_reserved_word;

/// Identifier handed to the first activity of an empty document.
pub const FIRST_ACTIVITY_ID: u64 = 0;

const MINUTES_PER_HOUR: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn add_task(&mut self, description: impl Into<String>) -> usize {
        self.tasks.push(description.into());
        self.tasks.len() - 1
    }

    /// Removes the task at a positional index. Later tasks shift down by one.
    pub fn remove_task(&mut self, index: usize) -> Result<String, ValidationError> {
        if index >= self.tasks.len() {
            return Err(ValidationError::OutOfRange {
                index: index as i64,
                len: self.tasks.len(),
            });
        }
        Ok(self.tasks.remove(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(rename = "activity")]
    pub name: String,
    #[serde(rename = "short")]
    pub short_name: String,
    pub hours: i64,
    pub minutes: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<Project>,
}

impl Activity {
    pub fn new(id: u64, name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            short_name: short_name.into(),
            hours: 0,
            minutes: 0,
            projects: Vec::new(),
        }
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.name == name)
    }

    pub fn project_mut(&mut self, name: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|project| project.name == name)
    }

    pub fn remove_project(&mut self, index: usize) -> Result<Project, ValidationError> {
        if index >= self.projects.len() {
            return Err(ValidationError::OutOfRange {
                index: index as i64,
                len: self.projects.len(),
            });
        }
        Ok(self.projects.remove(index))
    }

    /// Folds a finished session into the running total and returns the net
    /// minutes that were added.
    ///
    /// Pause minutes are subtracted from the rounded elapsed minutes without
    /// clamping, so an over-paused session lowers the total. The carry uses
    /// floored division to keep `minutes` within `0..60`.
    pub fn commit_time(&mut self, elapsed: Duration, pause_minutes: i64) -> i64 {
        let net_minutes = round_minutes(elapsed) - pause_minutes;
        let total_minutes = self.minutes + net_minutes;
        let carry_hours = total_minutes.div_euclid(MINUTES_PER_HOUR);

        self.hours += carry_hours;
        self.minutes = total_minutes - carry_hours * MINUTES_PER_HOUR;
        net_minutes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} is a reserved command")]
    Reserved(String),
    #[error("{0} already exist in db")]
    DuplicateActivity(String),
    #[error("project {0} already exist in db")]
    DuplicateProject(String),
    #[error("{0} is not a number")]
    NotANumber(String),
    #[error("index {index} is out of range (0..{len})")]
    OutOfRange { index: i64, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("activity not found: {0}")]
    ActivityNotFound(u64),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
}

pub fn next_activity_id(activities: &[Activity]) -> u64 {
    activities
        .iter()
        .map(|activity| activity.id)
        .max()
        .map_or(FIRST_ACTIVITY_ID, |max| max + 1)
}

pub fn find_activity(activities: &[Activity], id: u64) -> Option<&Activity> {
    activities.iter().find(|activity| activity.id == id)
}

pub fn find_activity_mut(activities: &mut [Activity], id: u64) -> Option<&mut Activity> {
    activities.iter_mut().find(|activity| activity.id == id)
}

pub fn activity_mut_or_err(
    activities: &mut [Activity],
    id: u64,
) -> Result<&mut Activity, LedgerError> {
    find_activity_mut(activities, id).ok_or(LedgerError::ActivityNotFound(id))
}

/// Checks a proposed activity name or short name against every stored name,
/// every stored short name and the reserved command words.
pub fn validate_activity_label(
    activities: &[Activity],
    input: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    let candidate = input.trim();
    if candidate.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if is_reserved_word(candidate) {
        return Err(ValidationError::Reserved(candidate.to_string()));
    }
    let taken = activities
        .iter()
        .any(|activity| activity.name == candidate || activity.short_name == candidate);
    if taken {
        return Err(ValidationError::DuplicateActivity(candidate.to_string()));
    }
    Ok(candidate.to_string())
}

pub fn project_name_taken(activities: &[Activity], name: &str) -> bool {
    activities
        .iter()
        .flat_map(|activity| activity.projects.iter())
        .any(|project| project.name == name)
}

/// Project names are unique across the whole document, not only inside the
/// owning activity.
pub fn validate_project_name(activities: &[Activity], input: &str) -> Result<String, ValidationError> {
    let candidate = input.trim();
    if candidate.is_empty() {
        return Err(ValidationError::Empty("project name"));
    }
    if project_name_taken(activities, candidate) {
        return Err(ValidationError::DuplicateProject(candidate.to_string()));
    }
    Ok(candidate.to_string())
}

pub fn parse_id(input: &str) -> Result<u64, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))
}

pub fn parse_index(input: &str, len: usize) -> Result<usize, ValidationError> {
    let trimmed = input.trim();
    let index = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
    if index < 0 || index as u64 >= len as u64 {
        return Err(ValidationError::OutOfRange { index, len });
    }
    Ok(index as usize)
}

pub fn round_minutes(duration: Duration) -> i64 {
    (duration.num_milliseconds() as f64 / 60_000.0).round() as i64
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
