//! Display formatting for resolved values.
//!
//! Every function here is pure and total: unexpected input degrades to a pass-through string
//! instead of an error, and a [`Resolution::NotFound`] always renders as `""`.
//!
//! Amounts are whole currency units, so numbers are never printed with decimals. Grouping uses
//! the destination locale's separator (`.` for Vietnamese: `1.000.000`).

use crate::services::context::resolver::Resolution;
use log::debug;
use num_format::{CustomFormat, Grouping, ToFormattedString};
use taxform_common::model::mapping::FormatTag;
use taxform_common::model::record::Node;

/// Separators, phrase templates and labels of the language the document is printed in.
///
/// Phrase templates use `{month}`, `{quarter}` and `{year}` as slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub grouping_separator: &'static str,
    pub decimal_separator: &'static str,
    pub minus_sign: &'static str,
    pub month_year: &'static str,
    pub quarter_year: &'static str,
    pub month_label: &'static str,
    pub quarter_label: &'static str,
}

pub const VIETNAMESE: Locale = Locale {
    grouping_separator: ".",
    decimal_separator: ",",
    minus_sign: "-",
    month_year: "Tháng {month} năm {year}",
    quarter_year: "Quý {quarter} năm {year}",
    month_label: "Tháng",
    quarter_label: "Quý",
};

impl Default for Locale {
    fn default() -> Self {
        VIETNAMESE
    }
}

impl Locale {
    fn number_format(&self) -> Option<CustomFormat> {
        CustomFormat::builder()
            .grouping(Grouping::Standard)
            .separator(self.grouping_separator)
            .decimal(self.decimal_separator)
            .minus_sign(self.minus_sign)
            .build()
            .ok()
    }
}

/// Groups an integer amount by thousands: `1234567` → `1.234.567`, `0` → `0`.
pub fn format_amount(value: i64, locale: &Locale) -> String {
    match locale.number_format() {
        Some(format) => value.to_formatted_string(&format),
        None => {
            debug!("locale separators rejected by num-format, printing {} ungrouped", value);
            value.to_string()
        }
    }
}

/// Currency formatting of a resolved value.
///
/// Absent and `null` give `""`, numbers are grouped, anything else passes through.
pub fn format_currency(resolution: Resolution<'_>, locale: &Locale) -> String {
    match resolution {
        Resolution::NotFound | Resolution::Found(Node::Null) => String::new(),
        Resolution::Found(node) => match node.as_i64() {
            Some(value) => format_amount(value, locale),
            None => passthrough(node),
        },
    }
}

/// `{month: 12, year: 2024}` → `Tháng 12 năm 2024`.
pub fn format_month_year(resolution: Resolution<'_>, locale: &Locale) -> String {
    compose_period_phrase(resolution, "month", locale.month_year)
}

/// `{quarter: 1, year: 2025}` → `Quý 1 năm 2025`.
pub fn format_quarter_year(resolution: Resolution<'_>, locale: &Locale) -> String {
    compose_period_phrase(resolution, "quarter", locale.quarter_year)
}

/// Formats a whole tax period, choosing month or quarter phrasing from its `type`.
pub fn format_period(resolution: Resolution<'_>, locale: &Locale) -> String {
    let node = match resolution {
        Resolution::Found(node) if node.is_truthy() => node,
        _ => return String::new(),
    };
    match node.child("type").and_then(Node::as_str) {
        Some("month") => format_month_year(resolution, locale),
        Some("quarter") => format_quarter_year(resolution, locale),
        other => {
            debug!("period type {:?} has no phrase, passing value through", other);
            passthrough(node)
        }
    }
}

/// `month` → `Tháng`, `quarter` → `Quý`; unknown codes are returned unchanged.
pub fn translate_period(code: &str, locale: &Locale) -> String {
    match code {
        "month" => locale.month_label.to_string(),
        "quarter" => locale.quarter_label.to_string(),
        other => other.to_string(),
    }
}

/// Renders a node as-is: text verbatim, numbers plainly, containers as compact JSON.
pub fn passthrough(node: Node<'_>) -> String {
    match node {
        Node::Null => String::new(),
        Node::Bool(b) => b.to_string(),
        Node::Integer(v) => v.to_string(),
        Node::Float(v) => v.to_string(),
        Node::Text(s) => s.to_string(),
        Node::List(_) | Node::Keyed(_) | Node::Named(_) => node.to_value().to_string(),
    }
}

/// Applies the formatter selected by `tag`, or the default heuristic when there is none.
///
/// Default heuristic: numbers are formatted as currency, everything else passes through.
pub fn format_value(resolution: Resolution<'_>, tag: Option<FormatTag>, locale: &Locale) -> String {
    match tag {
        Some(FormatTag::MonthYear) => format_month_year(resolution, locale),
        Some(FormatTag::QuarterYear) => format_quarter_year(resolution, locale),
        Some(FormatTag::Period) => format_period(resolution, locale),
        Some(FormatTag::Currency) => format_currency(resolution, locale),
        Some(FormatTag::PeriodType) => match resolution {
            Resolution::NotFound => String::new(),
            Resolution::Found(Node::Text(code)) => translate_period(code, locale),
            Resolution::Found(node) => passthrough(node),
        },
        None => match resolution {
            Resolution::NotFound => String::new(),
            Resolution::Found(node) if node.is_numeric() => format_currency(resolution, locale),
            Resolution::Found(node) => passthrough(node),
        },
    }
}

fn compose_period_phrase(resolution: Resolution<'_>, part: &str, template: &str) -> String {
    let node = match resolution {
        Resolution::Found(node) if node.is_truthy() => node,
        _ => return String::new(),
    };

    let value = node.child(part).and_then(phrase_part);
    let year = node.child("year").and_then(phrase_part);
    match (value, year) {
        (Some(value), Some(year)) => template
            .replace(&format!("{{{}}}", part), &value)
            .replace("{year}", &year),
        _ => {
            debug!("value has no usable {} and year, passing it through", part);
            passthrough(node)
        }
    }
}

fn phrase_part(node: Node<'_>) -> Option<String> {
    match node {
        Node::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => node.as_i64().map(|v| v.to_string()),
    }
}
