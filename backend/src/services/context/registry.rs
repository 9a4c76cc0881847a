//! Run-scoped cache of mapping tables.
//!
//! The registry sits in the Actix application state next to `JobsState`. The first request for
//! a form reads its mapping from disk; every later request, and every background job, shares
//! the same `Arc<MappingTable>`. Failed loads are not cached, so fixing a broken resource takes
//! effect on the next request.

use crate::services::context::loader::{MappingError, MappingLoader};
use std::collections::HashMap;
use std::sync::Arc;
use taxform_common::model::mapping::MappingTable;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct MappingRegistry {
    loader: MappingLoader,
    tables: Arc<RwLock<HashMap<String, Arc<MappingTable>>>>,
}

impl MappingRegistry {
    pub fn new(loader: MappingLoader) -> Self {
        Self {
            loader,
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the table for `form_id`, loading it on first use.
    ///
    /// The file is read without holding the lock. When two requests race on a cold form both
    /// read it, and the table inserted first is the one everybody gets.
    pub async fn get(&self, form_id: &str) -> Result<Arc<MappingTable>, MappingError> {
        if let Some(table) = self.tables.read().await.get(form_id) {
            return Ok(table.clone());
        }

        let loaded = Arc::new(self.loader.load(form_id)?);
        let mut tables = self.tables.write().await;
        let table = tables
            .entry(form_id.to_string())
            .or_insert(loaded)
            .clone();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reuses_loaded_table_without_rereading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("F1_mapping.json");
        fs::write(&path, r#"{ "F_A": { "path": "a" } }"#).unwrap();
        let registry = MappingRegistry::new(MappingLoader::new(dir.path()));

        let first = registry.get("F1").await.unwrap();
        fs::remove_file(&path).unwrap();
        let second = registry.get("F1").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn concurrent_first_loads_share_one_table() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("F2_mapping.json"), r#"{ "F_A": { "path": "a" } }"#).unwrap();
        let registry = MappingRegistry::new(MappingLoader::new(dir.path()));

        let (a, b) = tokio::join!(registry.get("F2"), registry.get("F2"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &registry.get("F2").await.unwrap()));
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let registry = MappingRegistry::new(MappingLoader::new(dir.path()));

        assert!(matches!(
            registry.get("LATE").await,
            Err(MappingError::ConfigurationMissing { .. })
        ));

        fs::write(dir.path().join("LATE_mapping.json"), r#"{ "F_A": { "path": "a" } }"#).unwrap();
        assert_eq!(registry.get("LATE").await.unwrap().len(), 1);
    }
}
