//! Mapping tables: which value goes into which template placeholder.
//!
//! A mapping resource is a JSON object keyed by placeholder name:
//!
//! ```json
//! {
//!   "F_04_ten_nguoi_nop_thue": { "path": "taxpayer.name" },
//!   "F_01_ky_tinh_thue": { "path": "tax_period", "format": "month_year" }
//! }
//! ```
//!
//! Placeholder names must be unique. Deserialization rejects a repeated key instead of silently
//! keeping the last one.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Formatter selected by a rule. A rule without a tag uses the default heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTag {
    /// `{month, year}` → "Tháng 12 năm 2024".
    MonthYear,
    /// `{quarter, year}` → "Quý 1 năm 2025".
    QuarterYear,
    /// A whole tax period; picks month or quarter phrasing from its `type`.
    Period,
    /// `month` / `quarter` → localized noun.
    PeriodType,
    /// Thousands-grouped integer amount.
    Currency,
}

/// How to find and display one placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    /// Dotted path into the record, e.g. `tax_calc.output_total.vat`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatTag>,
}

impl FieldRule {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: FormatTag) -> Self {
        self.format = Some(format);
        self
    }
}

/// Placeholder name → rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MappingTable {
    rules: BTreeMap<String, FieldRule>,
}

/// Error returned by [`MappingTable::insert`] when a placeholder is already present.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("placeholder '{0}' is defined more than once")]
pub struct DuplicatePlaceholder(pub String);

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        placeholder: impl Into<String>,
        rule: FieldRule,
    ) -> Result<(), DuplicatePlaceholder> {
        let placeholder = placeholder.into();
        if self.rules.contains_key(&placeholder) {
            return Err(DuplicatePlaceholder(placeholder));
        }
        self.rules.insert(placeholder, rule);
        Ok(())
    }

    pub fn get(&self, placeholder: &str) -> Option<&FieldRule> {
        self.rules.get(placeholder)
    }

    pub fn rules(&self) -> &BTreeMap<String, FieldRule> {
        &self.rules
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'de> Deserialize<'de> for MappingTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = MappingTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping placeholder names to rules")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MappingTable, A::Error> {
                let mut table = MappingTable::new();
                while let Some((placeholder, rule)) = access.next_entry::<String, FieldRule>()? {
                    table.insert(placeholder, rule).map_err(de::Error::custom)?;
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
