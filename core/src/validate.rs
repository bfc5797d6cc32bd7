//! Directive token validation.
//!
//! Each token must be a single `name=value` pair naming a registered flag
//! whose value coerces to the declared type. Validation stops at the first
//! failing token.
//!
//! Diagnostic codes are stable:
//! - `QF0001`: [`DirectiveErrorKind::MalformedToken`]
//! - `QF0002`: [`DirectiveErrorKind::UnknownFlag`]
//! - `QF0003`: [`DirectiveErrorKind::InvalidValue`]
//! - `QF0004`: [`DirectiveErrorKind::EmptyDirective`]

use thiserror::Error;

use crate::registry::{FlagRegistry, FlagSpec, is_valid_flag_name};
use crate::scanner::{Directive, Token};
use crate::types::{FlagType, FlagValue};

/// What went wrong with a directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveErrorKind {
    /// Token is not exactly one `name=value` pair.
    #[error("malformed flag token `{token}`, expected `name=value`")]
    MalformedToken { token: String },
    /// Name is not in the registry.
    #[error("unknown flag `{name}`")]
    UnknownFlag { name: String },
    /// Value cannot be coerced into the flag's declared type.
    #[error("invalid value `{value}` for {expected} flag `{name}`")]
    InvalidValue {
        name: String,
        value: String,
        expected: FlagType,
    },
    /// Marker with nothing after it.
    #[error("directive does not set any flags")]
    EmptyDirective,
}

impl DirectiveErrorKind {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            DirectiveErrorKind::MalformedToken { .. } => "QF0001",
            DirectiveErrorKind::UnknownFlag { .. } => "QF0002",
            DirectiveErrorKind::InvalidValue { .. } => "QF0003",
            DirectiveErrorKind::EmptyDirective => "QF0004",
        }
    }
}

/// A directive rejected during parsing, with enough context for a
/// compiler-style diagnostic.
///
/// # Examples
///
/// ```
/// use query_flags_core::{FlagRegistry, parse_query_flags};
///
/// let err = parse_query_flags("#pl:set ABCD=efgh", FlagRegistry::standard()).unwrap_err();
/// assert_eq!(err.line, 1);
/// assert_eq!(err.kind.code(), "QF0002");
/// assert_eq!(err.token.as_deref(), Some("ABCD=efgh"));
/// assert_eq!(err.to_string(), "line 1: unknown flag `ABCD`");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct DirectiveError {
    pub kind: DirectiveErrorKind,
    /// 1-based line number of the directive.
    pub line: usize,
    /// 1-based column of the offending token, when there is one.
    pub column: Option<usize>,
    /// Full text of the offending line.
    pub source_line: String,
    /// Offending token, when there is one.
    pub token: Option<String>,
}

impl DirectiveError {
    fn at(directive: &Directive<'_>, token: Option<&Token<'_>>, kind: DirectiveErrorKind) -> Self {
        Self {
            kind,
            line: directive.line,
            column: token.map(|t| t.column),
            source_line: directive.source.to_string(),
            token: token.map(|t| t.text.to_string()),
        }
    }

    /// Renders the error as a multi-line diagnostic.
    ///
    /// `origin` names the script (a path, or `<stdin>`).
    ///
    /// # Examples
    ///
    /// ```
    /// use query_flags_core::{parse_query_flags, FlagRegistry};
    ///
    /// let err = parse_query_flags("\n#pl:set analyze,true", FlagRegistry::standard()).unwrap_err();
    /// let rendered = err.render("query.pxl");
    /// assert!(rendered.starts_with("error[QF0001]: malformed flag token `analyze,true`"));
    /// assert!(rendered.contains("--> query.pxl:2:9"));
    /// ```
    pub fn render(&self, origin: &str) -> String {
        let line_label = self.line.to_string();
        let gutter = " ".repeat(line_label.len());
        let location = match self.column {
            Some(column) => format!("{origin}:{}:{column}", self.line),
            None => format!("{origin}:{}", self.line),
        };

        let mut out = format!("error[{}]: {}\n", self.kind.code(), self.kind);
        out.push_str(&format!("{gutter}--> {location}\n"));
        out.push_str(&format!("{gutter} |\n"));
        out.push_str(&format!("{line_label} | {}\n", self.source_line));
        if let (Some(column), Some(token)) = (self.column, &self.token) {
            let pad: String = self
                .source_line
                .chars()
                .take(column.saturating_sub(1))
                .map(|ch| if ch == '\t' { '\t' } else { ' ' })
                .collect();
            let carets = "^".repeat(token.chars().count().max(1));
            out.push_str(&format!("{gutter} | {pad}{carets}\n"));
        }
        out
    }
}

/// A validated assignment from one directive token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagAssignment<'r> {
    pub spec: &'r FlagSpec,
    pub value: FlagValue,
}

/// Splits a token into `(name, value)`.
///
/// Exactly one `=` is allowed; name and value must both be non-empty and the
/// name must be a valid flag identifier.
///
/// # Examples
///
/// ```
/// use query_flags_core::split_token;
///
/// assert_eq!(split_token("analyze=true"), Some(("analyze", "true")));
/// assert_eq!(split_token("analyze,true"), None);
/// assert_eq!(split_token("a=b=c"), None);
/// assert_eq!(split_token("extra"), None);
/// ```
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    let (name, value) = token.split_once('=')?;
    if value.is_empty() || value.contains('=') || !is_valid_flag_name(name) {
        return None;
    }
    Some((name, value))
}

/// Validates every token of a directive against `registry`.
///
/// # Errors
///
/// Returns a [`DirectiveError`] for the first token that is malformed,
/// names an unknown flag, or carries an invalid value. A directive without
/// tokens yields [`DirectiveErrorKind::EmptyDirective`].
pub fn validate_directive<'r>(
    directive: &Directive<'_>,
    registry: &'r FlagRegistry,
) -> Result<Vec<FlagAssignment<'r>>, DirectiveError> {
    if directive.tokens.is_empty() {
        return Err(DirectiveError::at(
            directive,
            None,
            DirectiveErrorKind::EmptyDirective,
        ));
    }

    directive
        .tokens
        .iter()
        .map(|token| validate_token(directive, token, registry))
        .collect()
}

fn validate_token<'r>(
    directive: &Directive<'_>,
    token: &Token<'_>,
    registry: &'r FlagRegistry,
) -> Result<FlagAssignment<'r>, DirectiveError> {
    let Some((name, raw)) = split_token(token.text) else {
        return Err(DirectiveError::at(
            directive,
            Some(token),
            DirectiveErrorKind::MalformedToken {
                token: token.text.to_string(),
            },
        ));
    };

    let Some(spec) = registry.get(name) else {
        return Err(DirectiveError::at(
            directive,
            Some(token),
            DirectiveErrorKind::UnknownFlag {
                name: name.to_string(),
            },
        ));
    };

    let Some(value) = registry.coerce(spec, raw) else {
        return Err(DirectiveError::at(
            directive,
            Some(token),
            DirectiveErrorKind::InvalidValue {
                name: name.to_string(),
                value: raw.to_string(),
                expected: spec.value_type,
            },
        ));
    };

    Ok(FlagAssignment { spec, value })
}
