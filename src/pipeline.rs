//! Pipeline orchestration: read the two input collections, run the
//! projectors and the resolver, and persist the five tables.

use std::path::PathBuf;

use tracing::info;

use crate::catalog::{build_artists, build_songs};
use crate::error::EtlError;
use crate::events::{build_time, build_users, filter_plays};
use crate::reader::read_json_collection;
use crate::records::{parse_records, EventRecord, SongRecord};
use crate::resolver::resolve_plays;
use crate::tables::{ArtistRow, SongRow, SongplayRow, TimeRow, UserRow};
use crate::writer::TableWriter;

/// Everything one run needs, passed in explicitly. The core never reads the
/// process environment; credentials for remote destinations are resolved by
/// the writer collaborator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding `song_data/` and `log_data/`.
    pub input_root: PathBuf,
    /// Local directory or `s3://`/`gs://` URL the five tables are written
    /// under.
    pub output_root: String,
}

impl PipelineConfig {
    fn table_destination(&self, table: &str) -> String {
        if self.output_root.contains("://") {
            format!("{}/{}", self.output_root.trim_end_matches('/'), table)
        } else {
            PathBuf::from(&self.output_root)
                .join(table)
                .display()
                .to_string()
        }
    }
}

/// Row counts of the tables written by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}

pub struct EtlPipeline {
    config: PipelineConfig,
    writer: TableWriter,
}

impl EtlPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            writer: TableWriter::new(),
        }
    }

    /// Run the full transformation. Each table is an immutable snapshot
    /// computed fresh from this run's input; any I/O failure aborts the run.
    pub async fn run(&self) -> Result<RunSummary, EtlError> {
        info!(
            "Starting ETL run: {} -> {}",
            self.config.input_root.display(),
            self.config.output_root
        );

        let catalog: Vec<SongRecord> = parse_records(
            read_json_collection(&self.config.input_root.join("song_data"))?,
            "song",
        );
        let events: Vec<EventRecord> = parse_records(
            read_json_collection(&self.config.input_root.join("log_data"))?,
            "event",
        );
        let plays = filter_plays(events);

        let songs = build_songs(&catalog);
        let artists = build_artists(&catalog);
        let users = build_users(&plays);
        let time = build_time(&plays);
        let songplays = resolve_plays(&plays, &catalog);

        self.writer
            .write_table(
                SongRow::to_batch(&songs)?,
                &self.config.table_destination("songs"),
                &["year", "artist_id"],
            )
            .await?;
        self.writer
            .write_table(
                ArtistRow::to_batch(&artists)?,
                &self.config.table_destination("artists"),
                &[],
            )
            .await?;
        self.writer
            .write_table(
                UserRow::to_batch(&users)?,
                &self.config.table_destination("users"),
                &[],
            )
            .await?;
        self.writer
            .write_table(
                TimeRow::to_batch(&time)?,
                &self.config.table_destination("time"),
                &["year", "month"],
            )
            .await?;
        self.writer
            .write_table(
                SongplayRow::to_batch(&songplays)?,
                &self.config.table_destination("songplays"),
                &["year", "month"],
            )
            .await?;

        let summary = RunSummary {
            songs: songs.len(),
            artists: artists.len(),
            users: users.len(),
            time: time.len(),
            songplays: songplays.len(),
        };
        info!(
            "ETL run complete: {} songs, {} artists, {} users, {} time rows, {} songplays",
            summary.songs, summary.artists, summary.users, summary.time, summary.songplays
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_destinations_nest_under_output_root() {
        let config = PipelineConfig {
            input_root: PathBuf::from("/data"),
            output_root: "/warehouse".to_string(),
        };
        assert_eq!(config.table_destination("songs"), "/warehouse/songs");
    }

    #[test]
    fn remote_destinations_keep_the_url_scheme() {
        let config = PipelineConfig {
            input_root: PathBuf::from("/data"),
            output_root: "s3://lake/analytics/".to_string(),
        };
        assert_eq!(
            config.table_destination("songplays"),
            "s3://lake/analytics/songplays"
        );
    }
}
