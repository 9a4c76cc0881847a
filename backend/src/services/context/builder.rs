//! Builds the flat placeholder context for one record.
//!
//! Each mapping entry is independent of the others: the path is resolved against the record,
//! the value is formatted according to the rule's tag, and the result is stored under the
//! placeholder name. The output always has exactly one entry per rule.

use crate::services::context::formatter::{format_value, Locale};
use crate::services::context::resolver::resolve;
use rayon::prelude::*;
use taxform_common::model::context::FlatContext;
use taxform_common::model::mapping::{FieldRule, MappingTable};
use taxform_common::model::record::Node;

/// Applies mapping tables to records using a fixed locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder {
    locale: Locale,
}

impl ContextBuilder {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Builds the context entry by entry on the calling thread.
    pub fn build(&self, record: Node<'_>, table: &MappingTable) -> FlatContext {
        table
            .rules()
            .iter()
            .map(|(placeholder, rule)| (placeholder.clone(), self.render_rule(record, rule)))
            .collect()
    }

    /// Same contents as [`ContextBuilder::build`], with entries evaluated on the rayon pool.
    pub fn build_par(&self, record: Node<'_>, table: &MappingTable) -> FlatContext {
        table
            .rules()
            .par_iter()
            .map(|(placeholder, rule)| (placeholder.clone(), self.render_rule(record, rule)))
            .collect()
    }

    fn render_rule(&self, record: Node<'_>, rule: &FieldRule) -> String {
        format_value(resolve(record, &rule.path), rule.format, &self.locale)
    }
}

/// Builds a context with the default (Vietnamese) locale.
pub fn build(record: Node<'_>, table: &MappingTable) -> FlatContext {
    ContextBuilder::default().build(record, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeSet;
    use taxform_common::model::declaration::Declaration;
    use taxform_common::model::mapping::FormatTag;
    use taxform_common::model::record::AsNode;

    fn table(entries: &[(&str, &str, Option<FormatTag>)]) -> MappingTable {
        let mut table = MappingTable::new();
        for (placeholder, path, format) in entries {
            let mut rule = FieldRule::new(*path);
            rule.format = *format;
            table.insert(*placeholder, rule).unwrap();
        }
        table
    }

    #[test]
    fn builds_name_and_period_phrase() {
        let record = json!({
            "taxpayer": { "name": "ACME" },
            "tax_period": { "type": "month", "month": 3, "year": 2025 }
        });
        let table = table(&[
            ("F_NAME", "taxpayer.name", None),
            ("F_PERIOD", "tax_period", Some(FormatTag::MonthYear)),
        ]);

        let context = build(Node::from(&record), &table);

        let expected: FlatContext = [
            ("F_NAME".to_string(), "ACME".to_string()),
            ("F_PERIOD".to_string(), "Tháng 3 năm 2025".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(context, expected);
    }

    #[test]
    fn output_keys_match_table_even_when_paths_miss() {
        let record = json!({ "taxpayer": { "name": "ACME" } });
        let table = table(&[
            ("F_NAME", "taxpayer.name", None),
            ("F_AGENCY", "agency.name", None),
            ("F_VAT", "tax_calc.vat_period", Some(FormatTag::Currency)),
            ("F_PERIOD", "tax_period", Some(FormatTag::MonthYear)),
        ]);

        let context = build(Node::from(&record), &table);

        let keys: BTreeSet<&str> = context.keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = table.placeholders().collect();
        assert_eq!(keys, expected);
        assert_eq!(context["F_AGENCY"], "");
        assert_eq!(context["F_VAT"], "");
        assert_eq!(context["F_PERIOD"], "");
    }

    #[test]
    fn empty_table_gives_empty_context() {
        let record = json!({ "a": 1 });
        assert!(build(Node::from(&record), &MappingTable::new()).is_empty());
    }

    #[test]
    fn building_twice_gives_identical_output() {
        let record = json!({ "tax_calc": { "vat_period": 1250000, "no_activity": null } });
        let table = table(&[
            ("F_36", "tax_calc.vat_period", None),
            ("F_21", "tax_calc.no_activity", None),
        ]);
        let builder = ContextBuilder::default();

        let first = builder.build(Node::from(&record), &table);
        let second = builder.build(Node::from(&record), &table);
        assert_eq!(first, second);
        assert_eq!(first["F_36"], "1.250.000");
        assert_eq!(first["F_21"], "");
    }

    #[test]
    fn parallel_build_matches_sequential_build() {
        let declaration = Declaration::from_value(json!({
            "declaration_type": "01_GTGT_2021",
            "tax_period": { "type": "quarter", "quarter": 3, "year": 2024 },
            "taxpayer": { "name": "ACME", "tax_code": "0101234567", "address": "Hà Nội" },
            "business": { "activity_name": "Thương mại", "scale": "small", "method": "deduction" },
            "tax_calc": {
                "deductible_previous": 300000,
                "input_purchases": { "value": 2000000, "vat": 200000 },
                "output_sales": { "vat_5": { "value": 1000000, "vat": 50000 } },
                "output_total": { "value": 1000000, "vat": 50000 }
            }
        }))
        .unwrap();
        let table = table(&[
            ("F_NAME", "taxpayer.name", None),
            ("F_PERIOD", "tax_period", Some(FormatTag::Period)),
            ("F_PERIOD_TYPE", "tax_period.type", Some(FormatTag::PeriodType)),
            ("F_22", "tax_calc.deductible_previous", None),
            ("F_23", "tax_calc.input_purchases.value", None),
            ("F_31", "tax_calc.output_sales.vat_5.vat", None),
            ("F_33", "tax_calc.output_sales.vat_10.vat", None),
            ("F_BRANCH", "branch.name", None),
        ]);
        let builder = ContextBuilder::default();

        let sequential = builder.build(declaration.as_node(), &table);
        let parallel = builder.build_par(declaration.as_node(), &table);

        assert_eq!(sequential, parallel);
        assert_eq!(sequential["F_PERIOD"], "Quý 3 năm 2024");
        assert_eq!(sequential["F_PERIOD_TYPE"], "Quý");
        assert_eq!(sequential["F_22"], "300.000");
        assert_eq!(sequential["F_23"], "2.000.000");
        assert_eq!(sequential["F_31"], "50.000");
        assert_eq!(sequential["F_33"], "0");
        assert_eq!(sequential["F_BRANCH"], "");
    }
}
