//! Typed rows of the five output tables and their Arrow representation.
//!
//! Every projector produces plain row structs; conversion to a
//! `RecordBatch` happens once, at the writer boundary. Deduplication is
//! full-row by design: two rows are duplicates only when every column
//! matches (floats compared by total order).

use std::cmp::Ordering;
use std::sync::Arc;

use datafusion::arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int16Array, Int32Array, Int64Array, StringArray,
};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;

use crate::error::EtlError;

/// A row with a total order over all of its columns. Sorting with this order
/// and dropping adjacent equals implements full-row dedup with deterministic
/// output regardless of input ordering.
pub trait TableRow {
    fn cmp_row(&self, other: &Self) -> Ordering;
}

/// Sort rows by their full-column order and drop exact duplicates.
pub fn dedup_sorted<T: TableRow>(mut rows: Vec<T>) -> Vec<T> {
    rows.sort_by(T::cmp_row);
    rows.dedup_by(|a, b| a.cmp_row(b) == Ordering::Equal);
    rows
}

fn cmp_opt_f64(a: &Option<f64>, b: &Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

impl TableRow for SongRow {
    fn cmp_row(&self, other: &Self) -> Ordering {
        self.song_id
            .cmp(&other.song_id)
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.artist_id.cmp(&other.artist_id))
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| self.duration.total_cmp(&other.duration))
    }
}

impl SongRow {
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("duration", DataType::Float64, false),
        ]))
    }

    pub fn to_batch(rows: &[Self]) -> Result<RecordBatch, EtlError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.song_id.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.title.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.artist_id.as_str()),
            )),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.duration),
            )),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TableRow for ArtistRow {
    fn cmp_row(&self, other: &Self) -> Ordering {
        self.artist_id
            .cmp(&other.artist_id)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.location.cmp(&other.location))
            .then_with(|| cmp_opt_f64(&self.latitude, &other.latitude))
            .then_with(|| cmp_opt_f64(&self.longitude, &other.longitude))
    }
}

impl ArtistRow {
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("artist_id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new("location", DataType::Utf8, true),
            Field::new("latitude", DataType::Float64, true),
            Field::new("longitude", DataType::Float64, true),
        ]))
    }

    pub fn to_batch(rows: &[Self]) -> Result<RecordBatch, EtlError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.artist_id.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.name.as_str()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.location.as_deref()),
            )),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.latitude))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.longitude))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: String,
}

impl TableRow for UserRow {
    fn cmp_row(&self, other: &Self) -> Ordering {
        self.user_id
            .cmp(&other.user_id)
            .then_with(|| self.first_name.cmp(&other.first_name))
            .then_with(|| self.last_name.cmp(&other.last_name))
            .then_with(|| self.gender.cmp(&other.gender))
            .then_with(|| self.level.cmp(&other.level))
    }
}

impl UserRow {
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("user_id", DataType::Int64, false),
            Field::new("first_name", DataType::Utf8, false),
            Field::new("last_name", DataType::Utf8, false),
            Field::new("gender", DataType::Utf8, false),
            Field::new("level", DataType::Utf8, false),
        ]))
    }

    pub fn to_batch(rows: &[Self]) -> Result<RecordBatch, EtlError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.user_id))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.first_name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.last_name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.gender.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.level.as_str()),
            )),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: i64,
    pub hour: i16,
    pub day: i16,
    pub week_of_year: i16,
    pub month: i32,
    pub year: i32,
    pub is_weekend: bool,
}

impl TableRow for TimeRow {
    fn cmp_row(&self, other: &Self) -> Ordering {
        // start_time determines every derived column, so it alone orders
        // and dedups the table.
        self.start_time.cmp(&other.start_time)
    }
}

impl TimeRow {
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("start_time", DataType::Int64, false),
            Field::new("hour", DataType::Int16, false),
            Field::new("day", DataType::Int16, false),
            Field::new("week_of_year", DataType::Int16, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
            Field::new("is_weekend", DataType::Boolean, false),
        ]))
    }

    pub fn to_batch(rows: &[Self]) -> Result<RecordBatch, EtlError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.start_time),
            )),
            Arc::new(Int16Array::from_iter_values(rows.iter().map(|r| r.hour))),
            Arc::new(Int16Array::from_iter_values(rows.iter().map(|r| r.day))),
            Arc::new(Int16Array::from_iter_values(
                rows.iter().map(|r| r.week_of_year),
            )),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.is_weekend).collect::<Vec<_>>(),
            )),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongplayRow {
    pub songplay_id: i64,
    pub start_time: i64,
    pub user_id: i64,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: String,
    pub user_agent: String,
    pub month: i32,
    pub year: i32,
}

impl TableRow for SongplayRow {
    fn cmp_row(&self, other: &Self) -> Ordering {
        // songplay_id is unique per row within a run; the remaining columns
        // keep the order total even across runs.
        self.songplay_id
            .cmp(&other.songplay_id)
            .then_with(|| self.start_time.cmp(&other.start_time))
            .then_with(|| self.user_id.cmp(&other.user_id))
            .then_with(|| self.song_id.cmp(&other.song_id))
            .then_with(|| self.artist_id.cmp(&other.artist_id))
            .then_with(|| self.session_id.cmp(&other.session_id))
    }
}

impl SongplayRow {
    pub fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("songplay_id", DataType::Int64, false),
            Field::new("start_time", DataType::Int64, false),
            Field::new("user_id", DataType::Int64, false),
            Field::new("level", DataType::Utf8, false),
            Field::new("song_id", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
            Field::new("session_id", DataType::Int64, false),
            Field::new("location", DataType::Utf8, false),
            Field::new("user_agent", DataType::Utf8, false),
            Field::new("month", DataType::Int32, false),
            Field::new("year", DataType::Int32, false),
        ]))
    }

    pub fn to_batch(rows: &[Self]) -> Result<RecordBatch, EtlError> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.songplay_id),
            )),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.start_time),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.user_id))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.level.as_str()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.song_id.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.artist_id.as_deref()),
            )),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.session_id),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.location.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.user_agent.as_str()),
            )),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}
