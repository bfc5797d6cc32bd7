use std::sync::Arc;
use std::thread;

use query_flags_core::{
    DirectiveErrorKind, FlagRegistry, FlagSpec, FlagType, FlagValue, PlanOptions, QueryFlags,
    parse_query_flags,
};

const QUERY_WITH_FLAG: &str = r#"
#pl:set analyze=true

t1 = dataframe(table='http_events').range(start='-30s')

t1['service'] = t1.ctx['service']
t1['http_resp_latency_ms'] = t1['http_resp_latency_ns'] / 1.0E6
t1['failure'] = t1['http_resp_status'] >= 400
"#;

const QUERY_WITHOUT_FLAG: &str = r#"
t1 = dataframe(table='http_events').range(start='-30s')

t1['service'] = t1.ctx['service']
t1['http_resp_latency_ms'] = t1['http_resp_latency_ns'] / 1.0E6
t1['failure'] = t1['http_resp_status'] >= 400
"#;

const TRAILING_TOKEN: &str = "\n#pl:set analyze=true extra\n";
const WRONG_SEPARATOR: &str = "\n#pl:set analyze,true\n";
const NONEXISTENT_FLAG: &str = "\n#pl:set ABCD=efgh\n";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_parse_with_flag() {
    let flags = QueryFlags::parse(QUERY_WITH_FLAG).expect("script should parse");
    assert!(flags.get_bool("analyze"));
    assert!(!flags.get_bool("explain"));
    assert!(!flags.get_bool("invalid_key"));
}

#[test]
fn test_parse_without_flag() {
    let flags = QueryFlags::parse(QUERY_WITHOUT_FLAG).expect("script should parse");
    assert!(flags.is_empty());
    for name in ["analyze", "explain", "invalid_key", ""] {
        assert!(!flags.get_bool(name), "{name:?} should read as false");
    }
}

#[test]
fn test_parse_rejects_invalid_directives() {
    let err = QueryFlags::parse(TRAILING_TOKEN).unwrap_err();
    assert_eq!(
        err.kind,
        DirectiveErrorKind::MalformedToken {
            token: "extra".into()
        }
    );
    assert_eq!(err.line, 2);
    assert_eq!(err.source_line, "#pl:set analyze=true extra");

    let err = QueryFlags::parse(WRONG_SEPARATOR).unwrap_err();
    assert_eq!(
        err.kind,
        DirectiveErrorKind::MalformedToken {
            token: "analyze,true".into()
        }
    );

    let err = QueryFlags::parse(NONEXISTENT_FLAG).unwrap_err();
    assert_eq!(
        err.kind,
        DirectiveErrorKind::UnknownFlag {
            name: "ABCD".into()
        }
    );
}

#[test]
fn test_parse_rejects_non_integer_row_cap() {
    let err = parse_query_flags(
        "#pl:set analyze=true max_output_rows_per_table=abc\n",
        FlagRegistry::standard(),
    )
    .unwrap_err();
    assert_eq!(
        err.kind,
        DirectiveErrorKind::InvalidValue {
            name: "max_output_rows_per_table".into(),
            value: "abc".into(),
            expected: FlagType::Int,
        }
    );
    assert_eq!(err.kind.code(), "QF0003");
    assert_eq!(err.token.as_deref(), Some("max_output_rows_per_table=abc"));
    assert_eq!(err.column, Some(22));
}

#[test]
fn test_plan_options_from_parsed_script() {
    let flags = QueryFlags::parse(QUERY_WITH_FLAG).expect("script should parse");
    let options = flags.get_plan_options();
    assert!(!options.explain);
    assert!(options.analyze);
    assert_eq!(
        options.max_output_rows_per_table,
        PlanOptions::default().max_output_rows_per_table
    );
}

#[test]
fn test_directive_after_query_body_still_applies() {
    let script = format!("{QUERY_WITHOUT_FLAG}#pl:set explain=true\n");
    let flags = QueryFlags::parse(&script).unwrap();
    assert!(flags.get_plan_options().explain);
}

// ---------------------------------------------------------------------------
// Custom registries
// ---------------------------------------------------------------------------

#[test]
fn test_custom_registry_from_yaml() {
    let yaml = r#"
case_insensitive_bools: true
flags:
  - name: analyze
    type: bool
    default: false
  - name: engine
    type: string
    default: vectorized
"#;
    let registry = FlagRegistry::from_yaml_str(yaml).unwrap();

    let flags = parse_query_flags("#pl:set analyze=TRUE engine=row", &registry).unwrap();
    assert!(flags.get_bool("analyze"));
    assert_eq!(flags.get_str("engine"), "row");
    assert_eq!(flags.get("engine"), Some(&FlagValue::String("row".into())));

    let err = parse_query_flags("#pl:set explain=true", &registry).unwrap_err();
    assert_eq!(err.kind.code(), "QF0002");
}

#[test]
fn test_standard_registry_rejects_uppercase_bool() {
    let err = QueryFlags::parse("#pl:set analyze=TRUE").unwrap_err();
    assert_eq!(err.kind.code(), "QF0003");
}

#[test]
fn test_shared_registry_across_threads() {
    let registry = Arc::new(
        FlagRegistry::builder()
            .flag(FlagSpec::boolean("analyze", false))
            .flag(FlagSpec::int("limit", 10))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let script = format!("#pl:set limit={i} analyze=true");
                let flags = parse_query_flags(&script, &registry).unwrap();
                flags.get_int("limit")
            })
        })
        .collect();

    let mut limits: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    limits.sort_unstable();
    assert_eq!(limits, (0..8).collect::<Vec<_>>());
}
