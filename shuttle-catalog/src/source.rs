use async_trait::async_trait;
use std::path::PathBuf;

use crate::template::TripTemplate;
use crate::{CatalogError, CatalogResult};

/// Read-only access to the weekly timetable.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> CatalogResult<Vec<TripTemplate>>;
}

/// Timetable kept as a JSON array on disk, re-read on every load so edits
/// are picked up by the next synchronization cycle.
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonFileCatalog {
    async fn load(&self) -> CatalogResult<Vec<TripTemplate>> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CatalogError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let templates: Vec<TripTemplate> =
            serde_json::from_slice(&raw).map_err(|e| CatalogError::Malformed(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), templates = templates.len(), "Catalog loaded");
        Ok(templates)
    }
}

/// In-memory catalog fixture.
#[derive(Default)]
pub struct StaticCatalog {
    templates: std::sync::RwLock<Vec<TripTemplate>>,
}

impl StaticCatalog {
    pub fn new(templates: Vec<TripTemplate>) -> Self {
        Self {
            templates: std::sync::RwLock::new(templates),
        }
    }

    /// Swaps in a new timetable, as an operator editing the artifact would.
    pub fn replace(&self, templates: Vec<TripTemplate>) {
        *self
            .templates
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = templates;
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn load(&self) -> CatalogResult<Vec<TripTemplate>> {
        Ok(self
            .templates
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_file_catalog_reads_timetable() {
        let path = std::env::temp_dir().join(format!("shuttle-catalog-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"busNumber":"B1","from":"LNMIIT","to":"Ajmeri Gate","departureTime":"07:30 AM",
                 "arrivalTime":"08:15 AM","driver":"Ramesh","days":["Mon","Tue"],"seats":32}]"#,
        )
        .await
        .unwrap();

        let templates = JsonFileCatalog::new(&path).load().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].seat_count, Some(32));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_catalogs_fail() {
        let missing = JsonFileCatalog::new("/nonexistent/timetable.json");
        assert!(matches!(missing.load().await, Err(CatalogError::Unavailable(_))));

        let path = std::env::temp_dir().join(format!("shuttle-catalog-bad-{}.json", std::process::id()));
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let corrupt = JsonFileCatalog::new(&path);
        assert!(matches!(corrupt.load().await, Err(CatalogError::Malformed(_))));
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
