use std::collections::BTreeMap;

/// Placeholder name → display-ready value, as handed to a template renderer.
///
/// Absent data is the empty string; a context never carries an error value.
pub type FlatContext = BTreeMap<String, String>;
