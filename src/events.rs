//! Event Projector: derives the user and time dimension tables from the
//! listening-event logs.

use tracing::{info, warn};

use crate::records::EventRecord;
use crate::tables::{dedup_sorted, TimeRow, UserRow};
use crate::timestamp::{clock_parts, is_weekend};

/// Retain only records that represent an actual song play. Navigation events
/// ("Home", "Logout", ...) contribute nothing downstream.
pub fn filter_plays(events: Vec<EventRecord>) -> Vec<EventRecord> {
    let total = events.len();
    let plays: Vec<EventRecord> = events
        .into_iter()
        .filter(|e| e.page == "NextSong")
        .collect();
    info!("Kept {} NextSong events of {} log records", plays.len(), total);
    plays
}

/// Project the users dimension. Dedup is full-row on purpose: a user whose
/// subscription level changed mid-dataset keeps one row per level.
pub fn build_users(plays: &[EventRecord]) -> Vec<UserRow> {
    let mut rows = Vec::with_capacity(plays.len());
    for event in plays {
        let (Some(user_id), Some(first_name), Some(last_name), Some(gender), Some(level)) = (
            event.user_id,
            event.first_name.as_ref(),
            event.last_name.as_ref(),
            event.gender.as_ref(),
            event.level.as_ref(),
        ) else {
            warn!(
                "Skipping user projection for event at ts {}: missing user fields",
                event.ts
            );
            continue;
        };
        rows.push(UserRow {
            user_id,
            first_name: first_name.clone(),
            last_name: last_name.clone(),
            gender: gender.clone(),
            level: level.clone(),
        });
    }

    let users = dedup_sorted(rows);
    info!("Projected {} user rows", users.len());
    users
}

/// Project the time dimension: one row per distinct event timestamp.
pub fn build_time(plays: &[EventRecord]) -> Vec<TimeRow> {
    let mut rows = Vec::with_capacity(plays.len());
    for event in plays {
        let parts = match clock_parts(event.ts) {
            Ok(parts) => parts,
            Err(e) => {
                warn!("Skipping time projection for event: {}", e);
                continue;
            }
        };
        rows.push(TimeRow {
            start_time: event.ts,
            hour: parts.hour,
            day: parts.day,
            week_of_year: parts.week_of_year,
            month: parts.month,
            year: parts.year,
            is_weekend: is_weekend(parts.weekday),
        });
    }

    let time = dedup_sorted(rows);
    info!("Projected {} time rows", time.len());
    time
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(ts: i64, user_id: i64, level: &str) -> EventRecord {
        EventRecord {
            page: "NextSong".to_string(),
            ts,
            user_id: Some(user_id),
            first_name: Some("Lily".to_string()),
            last_name: Some("Koch".to_string()),
            gender: Some("F".to_string()),
            level: Some(level.to_string()),
            song: Some("Help".to_string()),
            artist: Some("Beatles".to_string()),
            length: Some(137.44),
            session_id: Some(834),
            location: Some("Chicago, IL".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    fn navigation(ts: i64) -> EventRecord {
        EventRecord {
            page: "Home".to_string(),
            song: None,
            artist: None,
            length: None,
            ..play(ts, 15, "paid")
        }
    }

    #[test]
    fn non_play_events_are_filtered_out() {
        let plays = filter_plays(vec![play(1, 15, "paid"), navigation(2)]);
        assert_eq!(plays.len(), 1);
        assert_eq!(plays[0].ts, 1);
    }

    #[test]
    fn level_change_keeps_both_user_rows() {
        let plays = vec![play(1, 15, "free"), play(2, 15, "paid"), play(3, 15, "paid")];
        let users = build_users(&plays);
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|u| u.user_id == 15));
    }

    #[test]
    fn time_rows_are_unique_per_timestamp() {
        // 2018-11-03T05:00:00Z (Saturday) twice, 2018-11-06T00:00:00Z (Tuesday) once.
        let saturday = 1_541_221_200_000;
        let tuesday = 1_541_462_400_000;
        let plays = vec![play(saturday, 1, "paid"), play(saturday, 2, "paid"), play(tuesday, 3, "free")];
        let time = build_time(&plays);
        assert_eq!(time.len(), 2);
        assert_eq!(time[0].start_time, saturday);
        assert!(time[0].is_weekend);
        assert!(!time[1].is_weekend);
        assert_eq!(time[1].day, 6);
    }

    #[test]
    fn anonymous_event_is_skipped_in_users() {
        let mut anon = play(1, 15, "paid");
        anon.user_id = None;
        let users = build_users(&vec![anon, play(2, 15, "paid")]);
        assert_eq!(users.len(), 1);
    }
}
