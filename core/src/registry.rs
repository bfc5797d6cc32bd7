//! The closed table of flags a directive may set.
//!
//! A [`FlagRegistry`] is built once, validated at construction, and never
//! mutated afterwards. Parsers borrow it, so any number of parse calls can
//! share one registry across threads without locking.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CoercionRules, FlagType, FlagValue};

/// Flag requesting that the planner emit its plan instead of executing.
pub const FLAG_EXPLAIN: &str = "explain";
/// Flag requesting execution statistics alongside query results.
pub const FLAG_ANALYZE: &str = "analyze";
/// Flag capping the number of rows returned per output table.
pub const FLAG_MAX_OUTPUT_ROWS_PER_TABLE: &str = "max_output_rows_per_table";

/// Default row cap used by the standard registry.
pub const DEFAULT_MAX_OUTPUT_ROWS_PER_TABLE: i64 = 10_000;

static FLAG_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex must compile")
});

static STANDARD: LazyLock<FlagRegistry> = LazyLock::new(|| {
    FlagRegistry::builder()
        .flag(
            FlagSpec::boolean(FLAG_EXPLAIN, false)
                .with_description("Return the compiled query plan instead of executing it"),
        )
        .flag(
            FlagSpec::boolean(FLAG_ANALYZE, false)
                .with_description("Collect per-operator execution statistics"),
        )
        .flag(
            FlagSpec::int(
                FLAG_MAX_OUTPUT_ROWS_PER_TABLE,
                DEFAULT_MAX_OUTPUT_ROWS_PER_TABLE,
            )
            .with_description("Maximum number of rows returned for each output table"),
        )
        .build()
        .expect("standard registry must be valid")
});

/// Returns `true` if `name` is a syntactically valid flag name.
///
/// Flag names start with an ASCII letter or underscore, followed by ASCII
/// letters, digits or underscores.
///
/// # Examples
///
/// ```
/// use query_flags_core::is_valid_flag_name;
///
/// assert!(is_valid_flag_name("analyze"));
/// assert!(is_valid_flag_name("max_output_rows_per_table"));
/// assert!(!is_valid_flag_name("analyze,true"));
/// assert!(!is_valid_flag_name("9lives"));
/// ```
pub fn is_valid_flag_name(name: &str) -> bool {
    FLAG_NAME_RE.is_match(name)
}

/// Errors raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Flag name is not an identifier.
    #[error("invalid flag name: {0:?}")]
    InvalidFlagName(String),
    /// Two specs share a name.
    #[error("duplicate flag in registry: {0}")]
    DuplicateFlag(String),
    /// Default value does not match the declared type.
    #[error("default for flag `{flag}` is {found}, expected {expected}")]
    DefaultTypeMismatch {
        flag: String,
        expected: FlagType,
        found: FlagType,
    },
}

/// Declaration of one recognized flag.
///
/// # Examples
///
/// ```
/// use query_flags_core::{FlagSpec, FlagType, FlagValue};
///
/// let spec = FlagSpec::boolean("analyze", false)
///     .with_description("Collect execution statistics");
/// assert_eq!(spec.value_type, FlagType::Bool);
/// assert_eq!(spec.default, FlagValue::Bool(false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Case-sensitive flag name.
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type", default)]
    pub value_type: FlagType,
    /// Value reported when the flag is not set explicitly.
    pub default: FlagValue,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FlagSpec {
    /// Creates a boolean flag.
    pub fn boolean(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            value_type: FlagType::Bool,
            default: FlagValue::Bool(default),
            description: None,
        }
    }

    /// Creates an integer flag.
    pub fn int(name: &str, default: i64) -> Self {
        Self {
            name: name.to_string(),
            value_type: FlagType::Int,
            default: FlagValue::Int(default),
            description: None,
        }
    }

    /// Creates a string flag.
    pub fn string(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            value_type: FlagType::String,
            default: FlagValue::String(default.to_string()),
            description: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// Immutable table of recognized flags.
///
/// # Examples
///
/// ```
/// use query_flags_core::{FlagRegistry, FlagSpec, FlagType};
///
/// let registry = FlagRegistry::builder()
///     .flag(FlagSpec::boolean("analyze", false))
///     .flag(FlagSpec::int("limit", 100))
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.get("limit").unwrap().value_type, FlagType::Int);
/// assert!(registry.get("Analyze").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRegistry {
    flags: BTreeMap<String, FlagSpec>,
    rules: CoercionRules,
}

impl FlagRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in registry: `explain`, `analyze` and
    /// `max_output_rows_per_table`.
    ///
    /// # Examples
    ///
    /// ```
    /// use query_flags_core::FlagRegistry;
    ///
    /// let registry = FlagRegistry::standard();
    /// assert!(registry.contains("explain"));
    /// assert!(registry.contains("analyze"));
    /// ```
    pub fn standard() -> &'static FlagRegistry {
        &STANDARD
    }

    /// Looks up a flag by exact name.
    pub fn get(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Default value of a registered flag.
    pub fn default_value(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name).map(|spec| &spec.default)
    }

    /// Iterates flag specs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Coercion rules shared by every flag in this registry.
    pub fn rules(&self) -> CoercionRules {
        self.rules
    }

    /// Coerces `raw` into the declared type of `spec` under this registry's
    /// rules.
    pub fn coerce(&self, spec: &FlagSpec, raw: &str) -> Option<FlagValue> {
        spec.value_type.coercer().coerce(raw, self.rules)
    }
}

/// Builder for [`FlagRegistry`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    specs: Vec<FlagSpec>,
    rules: CoercionRules,
}

impl RegistryBuilder {
    /// Adds a flag.
    pub fn flag(mut self, spec: FlagSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Adds several flags.
    pub fn flags(mut self, specs: impl IntoIterator<Item = FlagSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Accept boolean literals regardless of ASCII case.
    pub fn case_insensitive_bools(mut self, enabled: bool) -> Self {
        self.rules.case_insensitive_bools = enabled;
        self
    }

    /// Validates names, uniqueness and default types.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] found, in insertion order.
    pub fn build(self) -> Result<FlagRegistry, RegistryError> {
        let mut flags = BTreeMap::new();
        for spec in self.specs {
            if !is_valid_flag_name(&spec.name) {
                return Err(RegistryError::InvalidFlagName(spec.name));
            }
            let found = spec.default.flag_type();
            if found != spec.value_type {
                return Err(RegistryError::DefaultTypeMismatch {
                    flag: spec.name,
                    expected: spec.value_type,
                    found,
                });
            }
            if flags.contains_key(&spec.name) {
                return Err(RegistryError::DuplicateFlag(spec.name));
            }
            flags.insert(spec.name.clone(), spec);
        }
        Ok(FlagRegistry {
            flags,
            rules: self.rules,
        })
    }
}
