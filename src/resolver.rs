//! Play Resolver: the left-outer entity-resolution join between listening
//! events and the song catalog, producing the songplays fact table.
//!
//! An event matches a catalog song when title, artist name, and the
//! whole-second duration all agree. Events without a match still produce a
//! fact row with null song/artist keys; events with several matches produce
//! one row per match, each with its own songplay_id.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::records::{EventRecord, SongRecord};
use crate::tables::{dedup_sorted, SongplayRow};
use crate::timestamp::{clock_parts, whole_secs};

/// Run-scoped songplay_id sequence. Ids are unique and monotonically
/// increasing within one run; no guarantee holds across runs.
#[derive(Debug, Default)]
pub struct SongplayIdGen {
    next: i64,
}

impl SongplayIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

type JoinKey<'a> = (&'a str, &'a str, i64);

fn catalog_index(catalog: &[SongRecord]) -> HashMap<JoinKey<'_>, Vec<&SongRecord>> {
    let mut index: HashMap<JoinKey<'_>, Vec<&SongRecord>> = HashMap::new();
    for song in catalog {
        index
            .entry((
                song.title.as_str(),
                song.artist_name.as_str(),
                whole_secs(song.duration),
            ))
            .or_default()
            .push(song);
    }
    index
}

/// Join filtered play events against the catalog and project the songplays
/// fact table.
pub fn resolve_plays(plays: &[EventRecord], catalog: &[SongRecord]) -> Vec<SongplayRow> {
    let index = catalog_index(catalog);
    let mut ids = SongplayIdGen::new();
    let mut rows = Vec::with_capacity(plays.len());
    let mut unmatched = 0usize;

    for event in plays {
        let parts = match clock_parts(event.ts) {
            Ok(parts) => parts,
            Err(e) => {
                warn!("Skipping songplay for event: {}", e);
                continue;
            }
        };
        let (Some(user_id), Some(level), Some(session_id), Some(location), Some(user_agent)) = (
            event.user_id,
            event.level.as_ref(),
            event.session_id,
            event.location.as_ref(),
            event.user_agent.as_ref(),
        ) else {
            warn!(
                "Skipping songplay for event at ts {}: missing required fields",
                event.ts
            );
            continue;
        };

        let matches = match (&event.song, &event.artist, event.length) {
            (Some(song), Some(artist), Some(length)) => index
                .get(&(song.as_str(), artist.as_str(), whole_secs(length)))
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            _ => &[],
        };

        let project = |ids: &mut SongplayIdGen, matched: Option<&SongRecord>| SongplayRow {
            songplay_id: ids.next_id(),
            start_time: event.ts,
            user_id,
            level: level.clone(),
            song_id: matched.map(|s| s.song_id.clone()),
            artist_id: matched.map(|s| s.artist_id.clone()),
            session_id,
            location: location.clone(),
            user_agent: user_agent.clone(),
            month: parts.month,
            year: parts.year,
        };

        if matches.is_empty() {
            unmatched += 1;
            rows.push(project(&mut ids, None));
        } else {
            for &matched in matches {
                rows.push(project(&mut ids, Some(matched)));
            }
        }
    }

    let songplays = dedup_sorted(rows);
    info!(
        "Resolved {} songplay rows from {} events ({} without a catalog match)",
        songplays.len(),
        plays.len(),
        unmatched
    );
    songplays
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(song_id: &str, title: &str, artist: &str, duration: f64) -> SongRecord {
        SongRecord {
            song_id: song_id.to_string(),
            title: title.to_string(),
            artist_id: format!("AR_{}", song_id),
            artist_name: artist.to_string(),
            artist_location: None,
            artist_latitude: None,
            artist_longitude: None,
            year: 1965,
            duration,
        }
    }

    fn play(song: &str, artist: &str, length: f64) -> EventRecord {
        EventRecord {
            page: "NextSong".to_string(),
            ts: 1_541_221_200_000,
            user_id: Some(15),
            first_name: Some("Lily".to_string()),
            last_name: Some("Koch".to_string()),
            gender: Some("F".to_string()),
            level: Some("paid".to_string()),
            song: Some(song.to_string()),
            artist: Some(artist.to_string()),
            length: Some(length),
            session_id: Some(834),
            location: Some("Chicago, IL".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    #[test]
    fn fuzzy_duration_match_resolves_song_and_artist() {
        let catalog = vec![song("SOHELP", "Help", "Beatles", 137.9)];
        let rows = resolve_plays(&[play("Help", "Beatles", 137.44)], &catalog);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].song_id.as_deref(), Some("SOHELP"));
        assert_eq!(rows[0].artist_id.as_deref(), Some("AR_SOHELP"));
        assert_eq!(rows[0].month, 11);
        assert_eq!(rows[0].year, 2018);
    }

    #[test]
    fn unmatched_event_still_produces_one_row() {
        let rows = resolve_plays(&[play("Yesterday", "Beatles", 125.0)], &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].song_id, None);
        assert_eq!(rows[0].artist_id, None);
        assert_eq!(rows[0].user_id, 15);
    }

    #[test]
    fn ambiguous_match_emits_one_row_per_candidate() {
        let catalog = vec![
            song("SOHELP1", "Help", "Beatles", 137.2),
            song("SOHELP2", "Help", "Beatles", 137.8),
        ];
        let rows = resolve_plays(&[play("Help", "Beatles", 137.44)], &catalog);
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].songplay_id, rows[1].songplay_id);
        let mut ids: Vec<_> = rows.iter().filter_map(|r| r.song_id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["SOHELP1", "SOHELP2"]);
    }

    #[test]
    fn songplay_ids_are_unique_and_increasing() {
        let rows = resolve_plays(
            &[
                play("A", "X", 10.0),
                play("B", "Y", 20.0),
                play("C", "Z", 30.0),
            ],
            &[],
        );
        let ids: Vec<i64> = rows.iter().map(|r| r.songplay_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn mismatched_duration_does_not_join() {
        // 136.9 truncates to 136, the event's 137.44 to 137.
        let catalog = vec![song("SOHELP", "Help", "Beatles", 136.9)];
        let rows = resolve_plays(&[play("Help", "Beatles", 137.44)], &catalog);
        assert_eq!(rows[0].song_id, None);
    }
}
