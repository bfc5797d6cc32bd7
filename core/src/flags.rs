//! Parsed flag sets and their projection into planner options.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::registry::{FLAG_ANALYZE, FLAG_EXPLAIN, FLAG_MAX_OUTPUT_ROWS_PER_TABLE, FlagRegistry};
use crate::scanner::scan_directives;
use crate::types::FlagValue;
use crate::validate::{DirectiveError, validate_directive};

/// Parses every directive in `script` against `registry`.
///
/// Directives are applied in source order; when a flag is set more than
/// once the last assignment wins.
///
/// # Errors
///
/// Returns the first [`DirectiveError`] encountered. No flags are returned
/// on failure.
///
/// # Examples
///
/// ```
/// use query_flags_core::{FlagRegistry, parse_query_flags};
///
/// let script = "#pl:set analyze=true\nt1 = dataframe(table='http_events')\n";
/// let flags = parse_query_flags(script, FlagRegistry::standard()).unwrap();
/// assert!(flags.get_bool("analyze"));
/// assert!(!flags.get_bool("explain"));
///
/// assert!(parse_query_flags("#pl:set analyze,true", FlagRegistry::standard()).is_err());
/// ```
pub fn parse_query_flags(
    script: &str,
    registry: &FlagRegistry,
) -> Result<QueryFlags, DirectiveError> {
    let mut values: BTreeMap<String, FlagValue> = BTreeMap::new();

    for directive in scan_directives(script) {
        debug!(
            line = directive.line,
            tokens = directive.tokens.len(),
            "Scanned query directive"
        );
        let assignments = validate_directive(&directive, registry).inspect_err(|err| {
            debug!(code = err.kind.code(), error = %err, "Rejected query directive");
        })?;

        for assignment in assignments {
            let name = assignment.spec.name.clone();
            if let Some(previous) = values.insert(name, assignment.value) {
                debug!(
                    flag = %assignment.spec.name,
                    previous = %previous,
                    line = directive.line,
                    "Flag set more than once, keeping the later value"
                );
            }
        }
    }

    Ok(QueryFlags { values })
}

/// Flags explicitly set by a script's directives.
///
/// Only flags that appeared in a directive are stored. Every accessor is
/// total: names that were never set, or are not registered at all, read
/// as the zero value of the requested type.
///
/// # Examples
///
/// ```
/// use query_flags_core::QueryFlags;
///
/// let flags = QueryFlags::parse("#pl:set max_output_rows_per_table=50").unwrap();
/// assert_eq!(flags.get_int("max_output_rows_per_table"), 50);
/// assert_eq!(flags.get_int("nonexistent"), 0);
/// assert_eq!(flags.len(), 1);
/// ```
///
/// A flag set only comes out of a parse; it cannot be assembled or
/// deserialized around the registry:
///
/// ```compile_fail
/// use query_flags_core::QueryFlags;
///
/// let flags: QueryFlags = serde_json::from_str(r#"{"ABCD":"efgh"}"#).unwrap();
/// ```
///
/// ```compile_fail
/// use std::collections::BTreeMap;
/// use query_flags_core::QueryFlags;
///
/// let flags = QueryFlags { values: BTreeMap::new() };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryFlags {
    values: BTreeMap<String, FlagValue>,
}

impl QueryFlags {
    /// Parses `script` against [`FlagRegistry::standard`].
    ///
    /// # Errors
    ///
    /// See [`parse_query_flags`].
    pub fn parse(script: &str) -> Result<Self, DirectiveError> {
        parse_query_flags(script, FlagRegistry::standard())
    }

    /// Explicitly set value, if any.
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.values.get(name)
    }

    /// Whether a directive set `name`.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Boolean value of `name`, or `false` when unset or not boolean.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(FlagValue::as_bool).unwrap_or(false)
    }

    /// Integer value of `name`, or `0` when unset or not an integer.
    pub fn get_int(&self, name: &str) -> i64 {
        self.get(name).and_then(FlagValue::as_int).unwrap_or(0)
    }

    /// String value of `name`, or `""` when unset or not a string.
    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(FlagValue::as_str).unwrap_or("")
    }

    /// Iterates explicitly set flags in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Planner options, using the standard registry's defaults for unset
    /// flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use query_flags_core::QueryFlags;
    ///
    /// let flags = QueryFlags::parse("#pl:set analyze=true").unwrap();
    /// let options = flags.get_plan_options();
    /// assert!(!options.explain);
    /// assert!(options.analyze);
    /// ```
    pub fn get_plan_options(&self) -> PlanOptions {
        self.plan_options_with(FlagRegistry::standard())
    }

    /// Planner options, using `registry`'s defaults for unset flags.
    ///
    /// A planner flag missing from `registry` falls back to its zero value.
    pub fn plan_options_with(&self, registry: &FlagRegistry) -> PlanOptions {
        let bool_flag = |name: &str| match self.get(name) {
            Some(_) => self.get_bool(name),
            None => registry
                .default_value(name)
                .and_then(FlagValue::as_bool)
                .unwrap_or(false),
        };
        let int_flag = |name: &str| match self.get(name) {
            Some(_) => self.get_int(name),
            None => registry
                .default_value(name)
                .and_then(FlagValue::as_int)
                .unwrap_or(0),
        };

        PlanOptions {
            explain: bool_flag(FLAG_EXPLAIN),
            analyze: bool_flag(FLAG_ANALYZE),
            max_output_rows_per_table: int_flag(FLAG_MAX_OUTPUT_ROWS_PER_TABLE),
        }
    }
}

/// Fixed-shape options handed to the query planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanOptions {
    /// Return the plan instead of executing it.
    pub explain: bool,
    /// Collect execution statistics.
    pub analyze: bool,
    /// Row cap for each output table.
    pub max_output_rows_per_table: i64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        QueryFlags::default().get_plan_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DEFAULT_MAX_OUTPUT_ROWS_PER_TABLE, FlagSpec};
    use crate::validate::DirectiveErrorKind;

    #[test]
    fn test_no_directives_yields_empty_flags() {
        let flags = QueryFlags::parse("t1 = dataframe(table='http_events')\n").unwrap();
        assert!(flags.is_empty());
        assert!(!flags.get_bool("analyze"));
        assert!(!flags.get_bool("explain"));
        assert!(!flags.get_bool("invalid_key"));
    }

    #[test]
    fn test_only_explicit_flags_are_stored() {
        let flags = QueryFlags::parse("#pl:set analyze=false").unwrap();
        assert!(flags.is_set("analyze"));
        assert!(!flags.is_set("explain"));
        assert_eq!(flags.get("analyze"), Some(&FlagValue::Bool(false)));
        assert_eq!(flags.get("explain"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let script = "#pl:set analyze=true\nx = 1\n#pl:set analyze=false explain=true analyze=true\n";
        let flags = QueryFlags::parse(script).unwrap();
        assert!(flags.get_bool("analyze"));
        assert!(flags.get_bool("explain"));

        let flags = QueryFlags::parse("#pl:set analyze=true\n#pl:set analyze=false").unwrap();
        assert!(!flags.get_bool("analyze"));
    }

    #[test]
    fn test_error_in_later_directive_discards_earlier_flags() {
        let err = QueryFlags::parse("#pl:set analyze=true\n#pl:set ABCD=efgh\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            DirectiveErrorKind::UnknownFlag {
                name: "ABCD".into()
            }
        );
    }

    #[test]
    fn test_typed_accessors_return_zero_on_type_mismatch() {
        let flags = QueryFlags::parse("#pl:set max_output_rows_per_table=7").unwrap();
        assert!(!flags.get_bool("max_output_rows_per_table"));
        assert_eq!(flags.get_str("max_output_rows_per_table"), "");
        assert_eq!(flags.get_int("max_output_rows_per_table"), 7);
    }

    #[test]
    fn test_iter_in_name_order() {
        let flags = QueryFlags::parse("#pl:set explain=true analyze=false").unwrap();
        let names: Vec<&str> = flags.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["analyze", "explain"]);
    }

    #[test]
    fn test_plan_options_defaults() {
        let options = PlanOptions::default();
        assert_eq!(
            options,
            PlanOptions {
                explain: false,
                analyze: false,
                max_output_rows_per_table: DEFAULT_MAX_OUTPUT_ROWS_PER_TABLE,
            }
        );
    }

    #[test]
    fn test_plan_options_from_explicit_flags() {
        let flags =
            QueryFlags::parse("#pl:set explain=true max_output_rows_per_table=100").unwrap();
        let options = flags.get_plan_options();
        assert!(options.explain);
        assert!(!options.analyze);
        assert_eq!(options.max_output_rows_per_table, 100);
    }

    #[test]
    fn test_plan_options_with_custom_registry_defaults() {
        let registry = FlagRegistry::builder()
            .flag(FlagSpec::boolean("analyze", true))
            .flag(FlagSpec::boolean("trace", false))
            .build()
            .unwrap();

        let flags = parse_query_flags("#pl:set trace=true", &registry).unwrap();
        let options = flags.plan_options_with(&registry);
        assert!(options.analyze);
        assert!(!options.explain);
        assert_eq!(options.max_output_rows_per_table, 0);
        assert!(flags.get_bool("trace"));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let flags = QueryFlags::parse("#pl:set analyze=true max_output_rows_per_table=3").unwrap();
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "analyze": true, "max_output_rows_per_table": 3 })
        );
    }
}
