//! Flag type definitions and per-type value coercion.
//!
//! A flag declares one [`FlagType`]; directive values are coerced into a
//! [`FlagValue`] of that type by the matching [`ValueCoercer`]. Adding a new
//! scalar type means adding a variant and a coercer here, the scanner and
//! validator stay untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared value type of a registered flag.
///
/// # Examples
///
/// ```
/// use query_flags_core::FlagType;
///
/// assert_eq!(FlagType::default(), FlagType::Bool);
/// assert_eq!(FlagType::Int.to_string(), "int");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlagType {
    /// `true` / `false` (the default).
    #[default]
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Free-form single-token text.
    String,
}

impl FlagType {
    /// Lowercase name used in diagnostics and registry files.
    pub fn as_str(self) -> &'static str {
        match self {
            FlagType::Bool => "bool",
            FlagType::Int => "int",
            FlagType::String => "string",
        }
    }

    /// Returns the coercer responsible for this type.
    pub fn coercer(self) -> &'static dyn ValueCoercer {
        match self {
            FlagType::Bool => &BoolCoercer,
            FlagType::Int => &IntCoercer,
            FlagType::String => &StringCoercer,
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved flag value.
///
/// Serialized untagged so registry files can write `default: false` or
/// `default: 10000` directly.
///
/// # Examples
///
/// ```
/// use query_flags_core::{FlagType, FlagValue};
///
/// let value = FlagValue::Int(42);
/// assert_eq!(value.flag_type(), FlagType::Int);
/// assert_eq!(value.as_int(), Some(42));
/// assert_eq!(value.as_bool(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl FlagValue {
    /// Type of the contained value.
    pub fn flag_type(&self) -> FlagType {
        match self {
            FlagValue::Bool(_) => FlagType::Bool,
            FlagValue::Int(_) => FlagType::Int,
            FlagValue::String(_) => FlagType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(value) => write!(f, "{value}"),
            FlagValue::Int(value) => write!(f, "{value}"),
            FlagValue::String(value) => f.write_str(value),
        }
    }
}

/// Registry-wide rules that influence coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoercionRules {
    /// Accept `TRUE`, `False`, ... in addition to lowercase literals.
    pub case_insensitive_bools: bool,
}

/// Converts the raw text of a directive value into a typed [`FlagValue`].
///
/// Returns `None` when the text is not a valid literal for the type.
pub trait ValueCoercer: Send + Sync {
    fn coerce(&self, raw: &str, rules: CoercionRules) -> Option<FlagValue>;
}

/// Accepts exactly `true` and `false`, optionally ignoring ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCoercer;

impl ValueCoercer for BoolCoercer {
    fn coerce(&self, raw: &str, rules: CoercionRules) -> Option<FlagValue> {
        let matches = |literal: &str| {
            if rules.case_insensitive_bools {
                raw.eq_ignore_ascii_case(literal)
            } else {
                raw == literal
            }
        };
        if matches("true") {
            Some(FlagValue::Bool(true))
        } else if matches("false") {
            Some(FlagValue::Bool(false))
        } else {
            None
        }
    }
}

/// Accepts base-10 signed integers that fit in an `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntCoercer;

impl ValueCoercer for IntCoercer {
    fn coerce(&self, raw: &str, _rules: CoercionRules) -> Option<FlagValue> {
        raw.parse::<i64>().ok().map(FlagValue::Int)
    }
}

/// Accepts any non-empty token verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCoercer;

impl ValueCoercer for StringCoercer {
    fn coerce(&self, raw: &str, _rules: CoercionRules) -> Option<FlagValue> {
        (!raw.is_empty()).then(|| FlagValue::String(raw.to_string()))
    }
}
