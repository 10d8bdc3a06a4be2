use pretty_assertions::assert_eq;

use phase_rules::config::{
    AggregateFn, ConfigValidator, FilterOp, TableConfig, default_config, load_config_from_path, load_first_available,
    parse_config_str,
};
use phase_rules::types::{ObjectType, ValueType};

fn fixture(name: &str) -> TableConfig {
    load_config_from_path(format!("tests/fixtures/{name}")).unwrap()
}

#[test]
fn fixture_config_validates_with_only_the_legacy_notice() {
    let outcome = ConfigValidator::new().validate(Some(&fixture("phase_table.json")));

    let keys: Vec<&str> = outcome.value.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "phase_number",
            "phase_name",
            "profiles",
            "main_profile",
            "max_weight",
            "object_count",
            "profile",
            "min_weight",
            "in_stock",
            "exclude_existing",
            "exclude_gratings",
        ]
    );
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics.as_slice()[0].contains("legacy criteria targetAttribute 'exclude_existing'"));

    let phase_number = outcome.value.column("phase_number").unwrap();
    assert_eq!(phase_number.filter_ops, vec!["equals", "in", "range"]);
    assert_eq!(FilterOp::parse("eq"), Some(FilterOp::Equals));

    let gratings = outcome.value.column("exclude_gratings").unwrap();
    assert_eq!(gratings.target_object_type, Some(ObjectType::Assembly));
    assert_eq!(gratings.value_type, ValueType::Boolean);
    assert_eq!(outcome.value.actions, vec!["select", "show_only"]);
}

#[test]
fn duplicate_keys_keep_first_occurrence() {
    let outcome = ConfigValidator::new().validate(Some(&fixture("duplicate_keys.json")));

    let keys: Vec<&str> = outcome.value.columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["material", "profile"]);
    assert_eq!(outcome.value.column("profile").unwrap().attribute, "profile");
    assert_eq!(
        outcome.diagnostics.into_vec(),
        vec![
            "config skipped duplicate column key: Profile".to_string(),
            "config skipped duplicate column key: PROFILE".to_string(),
        ]
    );
}

#[test]
fn validation_is_idempotent() {
    let validator = ConfigValidator::new();
    for raw in [fixture("phase_table.json"), fixture("duplicate_keys.json"), default_config()] {
        let once = validator.validate(Some(&raw)).value;
        let twice = validator.validate(Some(&once)).value;
        assert_eq!(twice, once);
    }
}

#[test]
fn wrong_version_and_empty_columns_fall_back_to_defaults() {
    let validator = ConfigValidator::new();

    let old = TableConfig {
        version: 1,
        ..fixture("phase_table.json")
    };
    let outcome = validator.validate(Some(&old));
    assert_eq!(outcome.value, default_config());
    assert!(outcome.diagnostics.contains("version 1 is not supported"));

    let outcome = validator.validate(Some(&TableConfig::default()));
    assert_eq!(outcome.value, default_config());
    assert!(outcome.diagnostics.contains("no valid columns"));
}

#[test]
fn loader_prefers_first_existing_candidate() {
    let outcome = load_first_available(
        ["tests/fixtures/missing.json", "tests/fixtures/duplicate_keys.json", "tests/fixtures/phase_table.json"],
        &ConfigValidator::new(),
    );
    assert_eq!(outcome.value.columns.len(), 2);
    assert_eq!(outcome.diagnostics.len(), 2);
}

#[test]
fn enum_settings_are_case_insensitive_and_unknown_values_drop_only_their_column() {
    let raw = parse_config_str(
        r#"{
            "version": 2,
            "columns": [
                { "key": "profile", "objectType": "PART", "attribute": "profile", "aggregate": "DISTINCT" },
                { "key": "beam_mark", "objectType": "Beam", "attribute": "mark" },
                { "key": "weight", "type": "number", "objectType": "ASSEMBLY", "attribute": "WEIGHT",
                  "aggregate": "Median" },
                { "key": "phase_number", "type": "INTEGER", "objectType": "phase", "attribute": "number" }
            ]
        }"#,
    )
    .unwrap();

    let outcome = ConfigValidator::new().validate(Some(&raw));
    assert_eq!(
        outcome.diagnostics.into_vec(),
        vec![
            "config skipped column beam_mark: unsupported objectType 'Beam'.".to_string(),
            "config skipped column weight: unsupported aggregate 'Median'.".to_string(),
        ]
    );

    let columns = &outcome.value.columns;
    let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["phase_number", "profile"]);
    assert_eq!(columns[0].value_type, ValueType::Integer);
    assert_eq!(columns[0].object_type, Some(ObjectType::Phase));
    assert_eq!(columns[1].object_type, Some(ObjectType::Part));
    assert_eq!(columns[1].aggregate, AggregateFn::Distinct);
}
