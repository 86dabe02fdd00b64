use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::domain::Activity;

const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopEntry {
    pub activity: String,
    pub hours: i64,
    pub minutes: i64,
}

/// Activities ordered by accumulated time, largest first.
pub fn top_activities(activities: &[Activity], limit: Option<usize>) -> Vec<TopEntry> {
    let mut rows = activities
        .iter()
        .map(|activity| TopEntry {
            activity: activity.name.clone(),
            hours: activity.hours,
            minutes: activity.minutes,
        })
        .collect::<Vec<_>>();

    rows.sort_by(|left, right| {
        right
            .hours
            .cmp(&left.hours)
            .then_with(|| right.minutes.cmp(&left.minutes))
    });
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

pub fn render_top(entries: &[TopEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

/// Hours and minutes from `now` until the next occurrence of `target`,
/// wrapping past midnight.
pub fn time_left(now: NaiveTime, target: NaiveTime) -> (i64, i64) {
    let now_minutes = i64::from(now.hour() * 60 + now.minute());
    let target_minutes = i64::from(target.hour() * 60 + target.minute());
    let left = (target_minutes - now_minutes).rem_euclid(MINUTES_PER_DAY);
    (left / 60, left % 60)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use crate::domain::Activity;

    use super::{render_top, time_left, top_activities};

    fn timed(id: u64, name: &str, hours: i64, minutes: i64) -> Activity {
        let mut activity = Activity::new(id, name, format!("{id}"));
        activity.hours = hours;
        activity.minutes = minutes;
        activity
    }

    #[test]
    fn orders_by_hours_then_minutes_and_limits() {
        let activities = (0..7)
            .map(|index| timed(index, &format!("a{index}"), (index % 3) as i64, index as i64))
            .collect::<Vec<_>>();

        let top = top_activities(&activities, Some(5));
        let names = top.iter().map(|entry| entry.activity.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a5", "a2", "a4", "a1", "a6"]);

        assert_eq!(top_activities(&activities, None).len(), 7);
    }

    #[test]
    fn renders_only_name_and_time() {
        let rendered = render_top(&top_activities(&[timed(0, "gym", 2, 15)], None)).expect("json");
        assert_eq!(
            rendered,
            "[\n  {\n    \"activity\": \"gym\",\n    \"hours\": 2,\n    \"minutes\": 15\n  }\n]"
        );
    }

    #[test]
    fn counts_down_to_day_end_and_wraps_after_it() {
        let target = NaiveTime::from_hms_opt(22, 0, 0).unwrap();
        assert_eq!(time_left(NaiveTime::from_hms_opt(20, 30, 0).unwrap(), target), (1, 30));
        assert_eq!(time_left(NaiveTime::from_hms_opt(22, 0, 0).unwrap(), target), (0, 0));
        assert_eq!(time_left(NaiveTime::from_hms_opt(23, 15, 0).unwrap(), target), (22, 45));
    }
}
