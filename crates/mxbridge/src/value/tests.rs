//! Unit tests for protocol values and coercion.

use rstest::rstest;

use super::*;

// ---------------------------------------------------------------------------
// Type names
// ---------------------------------------------------------------------------

#[rstest]
#[case::string(ScalarType::String, "mxbridge.lang.String")]
#[case::integer(ScalarType::Integer, "mxbridge.lang.Integer")]
#[case::void(ScalarType::Void, "mxbridge.lang.Void")]
fn scalar_qualified_name(#[case] scalar: ScalarType, #[case] expected: &str) {
    assert_eq!(scalar.qualified_name(), expected);
    assert_eq!(ValueType::from(scalar).to_string(), expected);
}

#[test]
fn array_type_reports_element_namespace_and_suffixed_name() {
    let array = ArrayType::new(ValueType::STRING);
    assert_eq!(array.namespace(), ScalarType::String.namespace());
    assert_eq!(array.name(), format!("{}[]", ScalarType::String.name()));
}

#[test]
fn nested_array_names_stack_suffixes() {
    let nested = ValueType::array_of(ValueType::array_of(ScalarType::Integer));
    assert_eq!(nested.name(), "Integer[][]");
    assert_eq!(nested.qualified_name(), "mxbridge.lang.Integer[][]");
}

// ---------------------------------------------------------------------------
// Scalar coercion
// ---------------------------------------------------------------------------

#[rstest]
#[case::integer_to_string(ValueType::STRING, Value::Integer(7), Value::from("7"))]
#[case::bool_to_string(ValueType::STRING, Value::Boolean(true), Value::from("true"))]
#[case::string_to_integer(ValueType::INTEGER, Value::from(" 42 "), Value::Integer(42))]
#[case::long_to_integer(ValueType::INTEGER, Value::Long(9), Value::Integer(9))]
#[case::integer_to_long(ValueType::LONG, Value::Integer(-3), Value::Long(-3))]
#[case::integer_to_double(ValueType::DOUBLE, Value::Integer(2), Value::Double(2.0))]
#[case::string_to_double(ValueType::DOUBLE, Value::from("1.5"), Value::Double(1.5))]
#[case::string_to_bool(ValueType::BOOLEAN, Value::from("TRUE"), Value::Boolean(true))]
#[case::null_passes(ValueType::INTEGER, Value::Null, Value::Null)]
#[case::void_discards(ValueType::VOID, Value::from("ignored"), Value::Null)]
fn coerce_accepts(#[case] target: ValueType, #[case] input: Value, #[case] expected: Value) {
    assert_eq!(target.coerce(input).expect("coercion succeeds"), expected);
}

#[rstest]
#[case::bool_to_integer(ValueType::INTEGER, Value::Boolean(true))]
#[case::array_to_string(ValueType::STRING, Value::from(vec!["a"]))]
#[case::double_to_long(ValueType::LONG, Value::Double(1.5))]
fn coerce_rejects_mismatched_kinds(#[case] target: ValueType, #[case] input: Value) {
    let err = target.coerce(input).expect_err("coercion should fail");
    assert!(matches!(err, CoercionError::Mismatch { .. }), "got {err}");
}

#[test]
fn coerce_rejects_integer_overflow() {
    let err = ValueType::INTEGER
        .coerce(Value::Long(i64::from(i32::MAX) + 1))
        .expect_err("overflow should fail");
    assert!(matches!(err, CoercionError::OutOfRange { .. }));
}

#[rstest]
#[case::integer(ValueType::INTEGER, "forty-two")]
#[case::boolean(ValueType::BOOLEAN, "yes")]
fn coerce_rejects_unparsable_text(#[case] target: ValueType, #[case] input: &str) {
    let err = target
        .coerce(Value::from(input))
        .expect_err("parse should fail");
    assert!(matches!(err, CoercionError::Unparsable { .. }));
    assert!(err.to_string().contains(input));
}

// ---------------------------------------------------------------------------
// Array coercion
// ---------------------------------------------------------------------------

#[test]
fn array_coercion_converts_each_element() {
    let array = ArrayType::new(ValueType::STRING);
    let coerced = array
        .coerce(Value::from(vec![Value::Integer(1), Value::Boolean(false)]))
        .expect("coercion succeeds");

    let items = coerced.as_array().expect("array value");
    assert_eq!(items.len(), 2);
    assert_eq!(items.element_type(), Some(&ValueType::STRING));
    assert_eq!(items.items(), &[Value::from("1"), Value::from("false")]);
}

#[test]
fn array_coercion_fails_on_bad_element() {
    let array = ArrayType::new(ValueType::INTEGER);
    let err = array
        .coerce(Value::from(vec!["1", "two"]))
        .expect_err("second element should fail");
    assert!(matches!(err, CoercionError::Unparsable { .. }));
}

#[test]
fn array_coercion_rejects_scalars() {
    let err = ArrayType::new(ValueType::STRING)
        .coerce(Value::from("solo"))
        .expect_err("scalar is not a sequence");
    assert!(err.to_string().contains("String[]"));
}

// ---------------------------------------------------------------------------
// Truthiness and rendering
// ---------------------------------------------------------------------------

#[rstest]
#[case::null(Value::Null, false)]
#[case::empty_string(Value::from(""), false)]
#[case::text(Value::from("x"), true)]
#[case::zero(Value::Integer(0), false)]
#[case::false_flag(Value::Boolean(false), false)]
#[case::empty_array(Value::from(Vec::<Value>::new()), false)]
#[case::array(Value::from(vec![1]), true)]
fn truthiness(#[case] value: Value, #[case] expected: bool) {
    assert_eq!(value.is_truthy(), expected);
}

#[test]
fn option_none_becomes_null() {
    assert_eq!(Value::from(None::<String>), Value::Null);
    assert_eq!(Value::from(Some(3)), Value::Integer(3));
}

#[test]
fn value_serialises_with_type_tag() {
    let json = serde_json::to_string(&Value::Integer(5)).expect("serialise");
    assert_eq!(json, r#"{"type":"integer","value":5}"#);
}
