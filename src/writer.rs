//! Table Writer collaborator: persists one table as partitioned Parquet,
//! overwriting whatever is already at the destination.
//!
//! Destinations are local directories or `s3://` / `gs://` URLs. Remote
//! stores are built from the URL and registered on the session; credentials
//! come from the environment and never touch the transformation core.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use datafusion::arrow::record_batch::RecordBatch;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::execution::context::SessionContext;
use datafusion::execution::object_store::ObjectStoreUrl;
use futures::StreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, ObjectStore};
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use crate::error::EtlError;

pub struct TableWriter {
    ctx: SessionContext,
    registered_stores: Arc<RwLock<HashSet<String>>>,
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableWriter {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
            registered_stores: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Write one table to `destination` as Parquet, partitioned hive-style
    /// by `partition_columns` when non-empty. Existing data at the
    /// destination is removed first, so a failed run never leaves a mix of
    /// old and new files behind.
    pub async fn write_table(
        &self,
        batch: RecordBatch,
        destination: &str,
        partition_columns: &[&str],
    ) -> Result<(), EtlError> {
        let rows = batch.num_rows();
        self.clear_destination(destination).await?;

        let df = self.ctx.read_batch(batch)?;
        let mut options = DataFrameWriteOptions::new();
        if !partition_columns.is_empty() {
            options = options
                .with_partition_by(partition_columns.iter().map(|c| c.to_string()).collect());
        }
        // Trailing slash keeps the destination a directory of part files
        // rather than a single file named after the table.
        let dest_dir = format!("{}/", destination.trim_end_matches('/'));
        df.write_parquet(&dest_dir, options, None).await?;

        info!(
            "Wrote {} rows to {} (partitioned by [{}])",
            rows,
            destination,
            partition_columns.join(", ")
        );
        Ok(())
    }

    fn is_remote(destination: &str) -> bool {
        destination.contains("://")
    }

    async fn clear_destination(&self, destination: &str) -> Result<(), EtlError> {
        if !Self::is_remote(destination) {
            let path = Path::new(destination);
            if path.is_dir() {
                std::fs::remove_dir_all(path)?;
            } else if path.exists() {
                std::fs::remove_file(path)?;
            }
            return Ok(());
        }

        let store = self.object_store_for(destination).await?;
        let url = Url::parse(destination).map_err(|e| EtlError::ConfigError {
            message: format!("Invalid destination URL {}: {}", destination, e),
        })?;
        let prefix = ObjectPath::from(url.path().trim_start_matches('/'));
        let mut listing = store.list(Some(&prefix));
        let mut removed = 0usize;
        while let Some(meta) = listing.next().await {
            let meta = meta?;
            store.delete(&meta.location).await?;
            removed += 1;
        }
        if removed > 0 {
            warn!("Removed {} stale objects under {}", removed, destination);
        }
        Ok(())
    }

    /// Build the object store for a remote destination and register it on
    /// the session so the Parquet writer can resolve the URL.
    async fn object_store_for(
        &self,
        destination: &str,
    ) -> Result<Arc<dyn ObjectStore>, EtlError> {
        let url = Url::parse(destination).map_err(|e| EtlError::ConfigError {
            message: format!("Invalid destination URL {}: {}", destination, e),
        })?;
        let bucket = url
            .host_str()
            .ok_or_else(|| EtlError::ConfigError {
                message: format!("Destination URL missing bucket: {}", destination),
            })?
            .to_string();
        let store_url = format!("{}://{}", url.scheme(), bucket);

        let object_store: Arc<dyn ObjectStore> = match url.scheme() {
            "s3" => {
                let s3_store = AmazonS3Builder::from_env()
                    .with_bucket_name(&bucket)
                    .build()
                    .map_err(|e| EtlError::ConfigError {
                        message: format!("Failed to create S3 client: {}", e),
                    })?;
                Arc::new(s3_store)
            }
            "gs" => {
                let gcs_store = GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(&bucket)
                    .build()
                    .map_err(|e| EtlError::ConfigError {
                        message: format!("Failed to create GCS client: {}", e),
                    })?;
                Arc::new(gcs_store)
            }
            scheme => {
                return Err(EtlError::ConfigError {
                    message: format!("Unsupported storage scheme: {}", scheme),
                });
            }
        };

        if self.registered_stores.read().await.contains(&store_url) {
            return Ok(object_store);
        }

        let object_store_url =
            ObjectStoreUrl::parse(&store_url).map_err(|e| EtlError::ConfigError {
                message: format!("Invalid object store URL {}: {}", store_url, e),
            })?;
        self.ctx
            .register_object_store(object_store_url.as_ref(), object_store.clone());
        self.registered_stores.write().await.insert(store_url);
        Ok(object_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::UserRow;

    fn users_batch() -> RecordBatch {
        UserRow::to_batch(&[UserRow {
            user_id: 15,
            first_name: "Lily".to_string(),
            last_name: "Koch".to_string(),
            gender: "F".to_string(),
            level: "paid".to_string(),
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("users");
        let stale = dest.join("stale.parquet");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(&stale, b"old run").unwrap();

        let writer = TableWriter::new();
        writer
            .write_table(users_batch(), dest.to_str().unwrap(), &[])
            .await
            .unwrap();

        assert!(!stale.exists());
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn unsupported_scheme_is_a_config_error() {
        let writer = TableWriter::new();
        let result = writer
            .write_table(users_batch(), "ftp://bucket/users", &[])
            .await;
        assert!(matches!(result, Err(EtlError::ConfigError { .. })));
    }
}
