//! Query script directive parsing.
//!
//! Query scripts can carry pragma lines that tune how the script is planned:
//!
//! ```text
//! #pl:set analyze=true max_output_rows_per_table=500
//! t1 = dataframe(table='http_events')
//! ```
//!
//! This crate finds those lines, validates them against a closed
//! [`FlagRegistry`], and produces an immutable [`QueryFlags`] set plus the
//! fixed-shape [`PlanOptions`] a planner consumes:
//!
//! - [`scan_directives`] — locates directive lines and splits their tokens.
//! - [`validate_directive`] — checks `name=value` shape, resolves names and
//!   coerces values through the type's [`ValueCoercer`].
//! - [`parse_query_flags`] — runs both over a whole script, fail-fast.
//! - [`RegistryConfig`] — loads a custom registry from YAML.
//!
//! # Example
//!
//! ```
//! use query_flags_core::*;
//!
//! let script = "#pl:set analyze=true\nt1 = dataframe(table='http_events')\n";
//! let flags = parse_query_flags(script, FlagRegistry::standard()).unwrap();
//! assert!(flags.get_bool("analyze"));
//! assert!(!flags.get_bool("not_a_flag"));
//!
//! let options = flags.get_plan_options();
//! assert!(options.analyze && !options.explain);
//!
//! let err = parse_query_flags("#pl:set analyze=true extra", FlagRegistry::standard())
//!     .unwrap_err();
//! assert!(matches!(err.kind, DirectiveErrorKind::MalformedToken { .. }));
//! ```

mod config;
mod flags;
mod output;
mod registry;
mod scanner;
mod types;
mod validate;

pub use config::{ConfigError, RegistryConfig};
pub use flags::{PlanOptions, QueryFlags, parse_query_flags};
pub use output::{CheckReport, OutputFormat, format_check_report, format_registry};
pub use registry::{
    DEFAULT_MAX_OUTPUT_ROWS_PER_TABLE, FLAG_ANALYZE, FLAG_EXPLAIN, FLAG_MAX_OUTPUT_ROWS_PER_TABLE,
    FlagRegistry, FlagSpec, RegistryBuilder, RegistryError, is_valid_flag_name,
};
pub use scanner::{DIRECTIVE_MARKER, Directive, Token, scan_directives};
pub use types::{
    BoolCoercer, CoercionRules, FlagType, FlagValue, IntCoercer, StringCoercer, ValueCoercer,
};
pub use validate::{
    DirectiveError, DirectiveErrorKind, FlagAssignment, split_token, validate_directive,
};
