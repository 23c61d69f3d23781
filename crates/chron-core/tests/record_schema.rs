//! Serde roundtrip and JsonSchema validation tests for persisted types.

use chrono::Utc;
use schemars::schema_for;
use serde_json::json;
use uuid::Uuid;

use chron_core::{
    ActivityRecord, EntityRef, EntitySnapshot, FieldAuditEntry, Properties, RecordHandle,
};

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn properties(value: serde_json::Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

roundtrip_and_validate!(
    update_record_roundtrip,
    ActivityRecord,
    ActivityRecord {
        id: "act-0123456789abcdef".into(),
        log_name: "content".into(),
        description: "updated Article \"Hello\"".into(),
        subject: Some(EntityRef::new("blog::Article", "7")),
        causer: Some(EntityRef::new("User", "1")),
        event: Some("updated".into()),
        properties: properties(json!({
            "changes": {"old": {"title": "A"}, "new": {"title": "B"}},
            "batch_uuid": "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
        })),
        context: properties(json!({"ip": "127.0.0.1"})),
        template: None,
        batch_id: Some(Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap()),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    manual_record_roundtrip,
    ActivityRecord,
    ActivityRecord {
        id: "act-fedcba9876543210".into(),
        log_name: "default".into(),
        description: "Exported report".into(),
        subject: None,
        causer: None,
        event: None,
        properties: Properties::new(),
        context: Properties::new(),
        template: Some("{causer} exported {properties.format}".into()),
        batch_id: None,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    record_handle_roundtrip,
    RecordHandle,
    RecordHandle {
        id: "act-0000000000000000".into(),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    field_audit_entry_roundtrip,
    FieldAuditEntry,
    FieldAuditEntry::new(EntityRef::new("blog::Article", "7"), "status", "draft", "live")
        .with_causer(Some(EntityRef::new("User", "1")))
        .with_description("bulk publish")
);

roundtrip_and_validate!(
    unattributed_field_audit_roundtrip,
    FieldAuditEntry,
    FieldAuditEntry::new(EntityRef::new("Tag", "3"), "name", serde_json::Value::Null, "rust")
);

roundtrip_and_validate!(
    entity_snapshot_roundtrip,
    EntitySnapshot,
    EntitySnapshot::new(EntityRef::new("User", "1")).with_attribute("name", "Ann")
);

#[test]
fn record_without_maps_deserializes_with_empty_maps() {
    let json = r#"{"id":"act-0000000000000000","log_name":"default","description":"x","subject":null,"causer":null,"event":null,"template":null,"batch_id":null,"created_at":"2026-02-08T12:00:00Z"}"#;
    let record: ActivityRecord = serde_json::from_str(json).unwrap();
    assert!(record.properties.is_empty());
    assert!(record.context.is_empty());
}

#[test]
fn property_order_is_preserved() {
    let mut props = Properties::new();
    props.insert("zeta".into(), json!(1));
    props.insert("alpha".into(), json!(2));
    let json = serde_json::to_string(&props).unwrap();
    assert_eq!(json, r#"{"zeta":1,"alpha":2}"#);
}
