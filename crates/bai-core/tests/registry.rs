mod common;

use bai_core::params::{ParamError, ParameterRegistry, Value, ValueType, UNIT_ADDRESS_PARAM_ID};
use bai_core::protocol::Address;
use pretty_assertions::assert_eq;

/// A value one step outside a bound, in the parameter's own type
fn step(value: &Value, delta: i64) -> Option<Value> {
    match value {
        Value::Int(v) => Some(Value::Int(v + delta)),
        Value::Float(v) => Some(Value::Float(v + delta as f64)),
        Value::Char(c) => u8::try_from(i64::from(*c) + delta).ok().map(Value::Char),
        Value::Str(_) => None,
    }
}

#[test]
fn test_standard_registry_shape() {
    let registry = ParameterRegistry::standard();
    assert_eq!(registry.len(), 84);
    assert!(registry.iter().all(|spec| spec.validate(&spec.default).is_ok()));
}

#[test]
fn test_bounds_survive_a_drive_round_trip() {
    let registry = common::registry();
    for spec in registry.iter() {
        let (Some(min), Some(max)) = (spec.min(), spec.max()) else {
            continue;
        };
        for bound in [min, max] {
            let mut drive = common::fake_drive();
            drive
                .write_parameter(spec, &bound, None, true)
                .unwrap_or_else(|e| panic!("writing {} = {}: {}", spec, bound, e));

            let address = match (spec.id, &bound) {
                (UNIT_ADDRESS_PARAM_ID, Value::Char(c)) => Some(Address::new(*c).unwrap()),
                _ => None,
            };
            let read = drive.read_parameter(spec, address).unwrap();
            assert_eq!(read, bound, "{}", spec);
        }
    }
}

#[test]
fn test_string_parameter_round_trip() {
    let registry = common::registry();
    let boot = registry.lookup("boot program").unwrap();
    let mut drive = common::fake_drive();
    let name = Value::Str("HOMEANDRUN12".into());
    drive.write_parameter(boot, &name, None, true).unwrap();
    assert_eq!(drive.read_parameter(boot, None).unwrap(), name);
}

#[test]
fn test_validate_boundaries_for_every_ordered_parameter() {
    let registry = ParameterRegistry::standard();
    for spec in registry.iter() {
        let (Some(min), Some(max)) = (spec.min(), spec.max()) else {
            continue;
        };
        assert!(spec.validate(&min).is_ok(), "{} min", spec);
        assert!(spec.validate(&max).is_ok(), "{} max", spec);

        if let Some(below) = step(&min, -1) {
            assert!(
                matches!(spec.validate(&below), Err(ParamError::OutOfRange { .. })),
                "{} accepted {}",
                spec,
                below
            );
        }
        if let Some(above) = step(&max, 1) {
            assert!(
                matches!(spec.validate(&above), Err(ParamError::OutOfRange { .. })),
                "{} accepted {}",
                spec,
                above
            );
        }
    }
}

#[test]
fn test_baud_rate_must_be_allowed() {
    let registry = ParameterRegistry::standard();
    let rate = registry.lookup("baudrate").unwrap();
    for allowed in registry.allowed_baud_rates() {
        assert!(rate.prepare(&Value::Int(i64::from(*allowed))).is_ok());
    }
    assert!(rate.prepare(&Value::Str("14400".into())).is_err());
}

#[test]
fn test_listing_serialises_to_json() {
    let registry = ParameterRegistry::standard();
    let listing = registry.listing();
    assert_eq!(listing.len(), registry.len());

    let json = serde_json::to_value(&listing[0]).unwrap();
    assert_eq!(json["id"], 0);
    assert_eq!(json["name"], "KP");
    assert_eq!(json["type"], "int");
    assert_eq!(json["default"], "750000");
    assert!(json.get("allowed").is_none());

    let boot = listing.iter().find(|row| row.name == "boot program").unwrap();
    assert_eq!(boot.value_type, ValueType::Str);
    assert_eq!(boot.max_len, Some(12));
    assert_eq!(boot.min, None);
}
