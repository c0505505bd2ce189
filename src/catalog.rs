//! Catalog Projector: derives the song and artist dimension tables from the
//! song-catalog records.

use tracing::info;

use crate::records::SongRecord;
use crate::tables::{dedup_sorted, ArtistRow, SongRow};

/// Project the songs dimension: one row per distinct catalog song.
pub fn build_songs(catalog: &[SongRecord]) -> Vec<SongRow> {
    let rows = catalog
        .iter()
        .map(|record| SongRow {
            song_id: record.song_id.clone(),
            title: record.title.clone(),
            artist_id: record.artist_id.clone(),
            year: record.year,
            duration: record.duration,
        })
        .collect();

    let songs = dedup_sorted(rows);
    info!(
        "Projected {} song rows from {} catalog records",
        songs.len(),
        catalog.len()
    );
    songs
}

/// Project the artists dimension. Multiple songs reference the same artist,
/// so this collapses far more than `build_songs`.
pub fn build_artists(catalog: &[SongRecord]) -> Vec<ArtistRow> {
    let rows = catalog
        .iter()
        .map(|record| ArtistRow {
            artist_id: record.artist_id.clone(),
            name: record.artist_name.clone(),
            location: record.artist_location.clone(),
            latitude: record.artist_latitude,
            longitude: record.artist_longitude,
        })
        .collect();

    let artists = dedup_sorted(rows);
    info!(
        "Projected {} artist rows from {} catalog records",
        artists.len(),
        catalog.len()
    );
    artists
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(song_id: &str, artist_id: &str) -> SongRecord {
        SongRecord {
            song_id: song_id.to_string(),
            title: format!("Title {}", song_id),
            artist_id: artist_id.to_string(),
            artist_name: format!("Artist {}", artist_id),
            artist_location: Some("Liverpool".to_string()),
            artist_latitude: Some(53.41),
            artist_longitude: Some(-2.98),
            year: 1969,
            duration: 201.5,
        }
    }

    #[test]
    fn songs_are_unique_and_sorted_by_song_id() {
        let catalog = vec![record("SOB", "AR1"), record("SOA", "AR1"), record("SOB", "AR1")];
        let songs = build_songs(&catalog);
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].song_id, "SOA");
        assert_eq!(songs[1].song_id, "SOB");
    }

    #[test]
    fn artists_collapse_across_songs() {
        let catalog = vec![record("SOA", "AR1"), record("SOB", "AR1")];
        let artists = build_artists(&catalog);
        // Same artist fields from both records except the derived name,
        // which differs per artist_id only; both records share AR1.
        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].artist_id, "AR1");
    }
}
