//! Reads mapping tables from the configuration directory.
//!
//! The resource for form `F` lives at `<mapping_dir>/F_mapping.json`. The loader only checks
//! that the file parses into a [`MappingTable`]; whether the paths exist in a record is the
//! resolver's business at build time.

use log::info;
use std::fs;
use std::io;
use std::path::PathBuf;
use taxform_common::model::mapping::MappingTable;
use thiserror::Error;

const MAPPING_SUFFIX: &str = "_mapping.json";

/// Configuration failures. All of them are fatal for the run that asked for the table.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("no mapping for form '{form_id}' (looked for {})", path.display())]
    ConfigurationMissing { form_id: String, path: PathBuf },

    #[error("mapping for form '{form_id}' at {} is malformed: {reason}", path.display())]
    ConfigurationMalformed {
        form_id: String,
        path: PathBuf,
        reason: String,
    },

    #[error("mapping for form '{form_id}' at {} could not be read: {source}", path.display())]
    ConfigurationUnreadable {
        form_id: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MappingError {
    pub fn form_id(&self) -> &str {
        match self {
            MappingError::ConfigurationMissing { form_id, .. }
            | MappingError::ConfigurationMalformed { form_id, .. }
            | MappingError::ConfigurationUnreadable { form_id, .. } => form_id,
        }
    }
}

/// Loads mapping tables from one directory.
#[derive(Debug, Clone)]
pub struct MappingLoader {
    mapping_dir: PathBuf,
}

impl MappingLoader {
    pub fn new(mapping_dir: impl Into<PathBuf>) -> Self {
        Self {
            mapping_dir: mapping_dir.into(),
        }
    }

    /// Where the resource for `form_id` is expected.
    pub fn resource_path(&self, form_id: &str) -> PathBuf {
        self.mapping_dir.join(format!("{}{}", form_id, MAPPING_SUFFIX))
    }

    /// Reads and parses the mapping for `form_id`.
    ///
    /// # Errors
    /// - `ConfigurationMissing` if no resource exists, or if `form_id` cannot name one
    ///   (empty, or containing anything besides letters, digits, `_` and `-`).
    /// - `ConfigurationMalformed` if the content is not a valid mapping table.
    /// - `ConfigurationUnreadable` if the file exists but reading it failed.
    pub fn load(&self, form_id: &str) -> Result<MappingTable, MappingError> {
        let path = self.resource_path(form_id);
        if !is_valid_form_id(form_id) {
            return Err(MappingError::ConfigurationMissing {
                form_id: form_id.to_string(),
                path,
            });
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MappingError::ConfigurationMissing {
                    form_id: form_id.to_string(),
                    path,
                });
            }
            Err(e) => {
                return Err(MappingError::ConfigurationUnreadable {
                    form_id: form_id.to_string(),
                    path,
                    source: e,
                });
            }
        };

        let table: MappingTable =
            serde_json::from_str(&raw).map_err(|e| MappingError::ConfigurationMalformed {
                form_id: form_id.to_string(),
                path: path.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "loaded {} mapping rules for form '{}' from {}",
            table.len(),
            form_id,
            path.display()
        );
        Ok(table)
    }
}

fn is_valid_form_id(form_id: &str) -> bool {
    !form_id.is_empty()
        && form_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxform_common::model::mapping::{FieldRule, FormatTag};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn loads_table_by_form_id() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "01_GTGT_2021_mapping.json",
            r#"{
                "F_NAME": { "path": "taxpayer.name" },
                "F_PERIOD": { "path": "tax_period", "format": "month_year" }
            }"#,
        );

        let table = MappingLoader::new(dir.path()).load("01_GTGT_2021").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("F_PERIOD"),
            Some(&FieldRule::new("tax_period").with_format(FormatTag::MonthYear))
        );
    }

    #[test]
    fn unregistered_form_is_missing_and_reports_path() {
        let dir = TempDir::new().unwrap();
        let err = MappingLoader::new(dir.path()).load("99_UNKNOWN").unwrap_err();

        match &err {
            MappingError::ConfigurationMissing { form_id, path } => {
                assert_eq!(form_id, "99_UNKNOWN");
                assert_eq!(path, &dir.path().join("99_UNKNOWN_mapping.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("99_UNKNOWN_mapping.json"));
    }

    #[test]
    fn form_id_with_path_segments_is_missing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "secret_mapping.json", "{}");
        let loader = MappingLoader::new(dir.path().join("nested"));

        for form_id in ["../secret", "", "a/b", ".."] {
            assert!(matches!(
                loader.load(form_id),
                Err(MappingError::ConfigurationMissing { .. })
            ));
        }
    }

    #[test]
    fn unreadable_resource_is_reported_with_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("DIR_mapping.json")).unwrap();

        let err = MappingLoader::new(dir.path()).load("DIR").unwrap_err();

        match &err {
            MappingError::ConfigurationUnreadable { form_id, path, .. } => {
                assert_eq!(form_id, "DIR");
                assert_eq!(path, &dir.path().join("DIR_mapping.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.form_id(), "DIR");
    }

    #[test]
    fn invalid_json_is_malformed() {
        let dir = TempDir::new().unwrap();
        write(&dir, "BROKEN_mapping.json", "{ not json");

        let err = MappingLoader::new(dir.path()).load("BROKEN").unwrap_err();
        assert!(matches!(err, MappingError::ConfigurationMalformed { .. }));
        assert_eq!(err.form_id(), "BROKEN");
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let dir = TempDir::new().unwrap();
        write(&dir, "LIST_mapping.json", r#"[{ "path": "a" }]"#);
        write(&dir, "NOPATH_mapping.json", r#"{ "F_A": { "format": "currency" } }"#);
        let loader = MappingLoader::new(dir.path());

        assert!(matches!(
            loader.load("LIST"),
            Err(MappingError::ConfigurationMalformed { .. })
        ));
        assert!(matches!(
            loader.load("NOPATH"),
            Err(MappingError::ConfigurationMalformed { .. })
        ));
    }

    #[test]
    fn duplicate_placeholder_is_malformed() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "DUP_mapping.json",
            r#"{ "F_A": { "path": "a" }, "F_A": { "path": "b" } }"#,
        );

        let err = MappingLoader::new(dir.path()).load("DUP").unwrap_err();
        match err {
            MappingError::ConfigurationMalformed { reason, .. } => assert!(reason.contains("F_A")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
