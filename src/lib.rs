pub mod catalog;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod reader;
pub mod records;
pub mod resolver;
pub mod tables;
pub mod timestamp;
pub mod writer;

pub use error::EtlError;
pub use pipeline::{EtlPipeline, PipelineConfig, RunSummary};
pub use writer::TableWriter;
