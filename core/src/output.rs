//! Output formatting for parse results and registries.

use serde::Serialize;

use crate::flags::{PlanOptions, QueryFlags};
use crate::registry::FlagRegistry;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// Result of checking one script: the explicit flags and the derived
/// planner options.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport<'a> {
    pub flags: &'a QueryFlags,
    pub plan_options: PlanOptions,
}

impl<'a> CheckReport<'a> {
    pub fn new(flags: &'a QueryFlags, registry: &FlagRegistry) -> Self {
        Self {
            flags,
            plan_options: flags.plan_options_with(registry),
        }
    }
}

/// Formats a check report in the requested output format.
pub fn format_check_report(
    report: &CheckReport<'_>,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(check_report_to_table(report)),
    }
}

/// Formats a registry listing in the requested output format.
pub fn format_registry(registry: &FlagRegistry, format: OutputFormat) -> Result<String, String> {
    let specs: Vec<_> = registry.iter().collect();
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&specs)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&specs).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(registry_to_table(registry)),
    }
}

fn check_report_to_table(report: &CheckReport<'_>) -> String {
    let mut out = String::new();

    if report.flags.is_empty() {
        out.push_str("No flags set.\n");
    } else {
        let width = name_width(report.flags.iter().map(|(name, _)| name));
        out.push_str(&format!("{:<width$}  VALUE\n", "FLAG"));
        for (name, value) in report.flags.iter() {
            out.push_str(&format!("{name:<width$}  {value}\n"));
        }
    }

    let options = &report.plan_options;
    out.push_str("\nPlan options:\n");
    out.push_str(&format!("  explain: {}\n", options.explain));
    out.push_str(&format!("  analyze: {}\n", options.analyze));
    out.push_str(&format!(
        "  max_output_rows_per_table: {}\n",
        options.max_output_rows_per_table
    ));
    out
}

fn registry_to_table(registry: &FlagRegistry) -> String {
    let width = name_width(registry.iter().map(|spec| spec.name.as_str()));
    let mut out = format!("{:<width$}  {:<6}  {:<8}  DESCRIPTION\n", "FLAG", "TYPE", "DEFAULT");
    for spec in registry.iter() {
        let default = spec.default.to_string();
        let desc = spec.description.as_deref().unwrap_or("");
        out.push_str(
            format!(
                "{:<width$}  {:<6}  {:<8}  {desc}",
                spec.name,
                spec.value_type.as_str(),
                default
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(|name| name.chars().count()).max().unwrap_or(0).max(4)
}
