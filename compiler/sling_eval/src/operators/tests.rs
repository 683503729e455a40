#![expect(clippy::unwrap_used, reason = "Tests use unwrap_err for brevity")]

use pretty_assertions::assert_eq;

use super::*;

fn binary(left: impl Into<Value>, right: impl Into<Value>, op: BinaryOp) -> EvalResult {
    evaluate_binary(&left.into(), &right.into(), op)
}

#[test]
fn int_arithmetic() {
    assert_eq!(binary(7_i64, 3_i64, BinaryOp::Add), Ok(Value::Int(10)));
    assert_eq!(binary(7_i64, 3_i64, BinaryOp::Sub), Ok(Value::Int(4)));
    assert_eq!(binary(7_i64, 3_i64, BinaryOp::Mul), Ok(Value::Int(21)));
    assert_eq!(binary(2_i64, 10_i64, BinaryOp::Pow), Ok(Value::Int(1024)));
}

#[test]
fn true_division_yields_float() {
    assert_eq!(binary(7_i64, 2_i64, BinaryOp::Div), Ok(Value::Float(3.5)));
}

#[test]
fn floor_division_and_modulo_follow_divisor_sign() {
    assert_eq!(binary(-7_i64, 2_i64, BinaryOp::FloorDiv), Ok(Value::Int(-4)));
    assert_eq!(binary(-7_i64, 2_i64, BinaryOp::Mod), Ok(Value::Int(1)));
    assert_eq!(binary(7_i64, -2_i64, BinaryOp::Mod), Ok(Value::Int(-1)));
    assert_eq!(binary(7.5, 2_i64, BinaryOp::FloorDiv), Ok(Value::Float(3.0)));
}

#[test]
fn division_by_zero_is_typed() {
    let err = binary(1_i64, 0_i64, BinaryOp::Div).unwrap_err();
    assert_eq!(err.exception_type(), "ZeroDivisionError");
    let err = binary(1_i64, 0_i64, BinaryOp::Mod).unwrap_err();
    assert_eq!(err.message, "integer modulo by zero");
    let err = binary(1.0, 0.0, BinaryOp::Div).unwrap_err();
    assert_eq!(err.message, "float division by zero");
}

#[test]
fn overflow_is_an_error() {
    let err = binary(i64::MAX, 1_i64, BinaryOp::Add).unwrap_err();
    assert_eq!(err.exception_type(), "OverflowError");
    let err = binary(i64::MIN, -1_i64, BinaryOp::FloorDiv).unwrap_err();
    assert_eq!(err.exception_type(), "OverflowError");
    let err = binary(1_i64, 63_i64, BinaryOp::Shl).unwrap_err();
    assert_eq!(err.exception_type(), "OverflowError");
}

#[test]
fn mixed_numbers_widen() {
    assert_eq!(binary(1_i64, 0.5, BinaryOp::Add), Ok(Value::Float(1.5)));
    assert_eq!(binary(true, 2_i64, BinaryOp::Add), Ok(Value::Int(3)));
    assert_eq!(binary(2_i64, -1_i64, BinaryOp::Pow), Ok(Value::Float(0.5)));
}

#[test]
fn sequences_concatenate_and_repeat() {
    assert_eq!(binary("ab", "cd", BinaryOp::Add), Ok(Value::string("abcd")));
    assert_eq!(binary("ab", 3_i64, BinaryOp::Mul), Ok(Value::string("ababab")));
    assert_eq!(binary("ab", -1_i64, BinaryOp::Mul), Ok(Value::string("")));
    let list = Value::list(vec![Value::Int(1)]);
    assert_eq!(
        evaluate_binary(&list, &Value::Int(2), BinaryOp::Mul),
        Ok(Value::list(vec![Value::Int(1), Value::Int(1)]))
    );
}

#[test]
fn unsupported_operands_name_both_types() {
    let err = binary("a", 1_i64, BinaryOp::Add).unwrap_err();
    assert_eq!(err.message, "unsupported operand type(s) for +: 'str' and 'int'");
    assert_eq!(err.exception_type(), "TypeError");
}

#[test]
fn unary_operators() {
    assert_eq!(evaluate_unary(&Value::Int(3), UnaryOp::Neg), Ok(Value::Int(-3)));
    assert_eq!(evaluate_unary(&Value::Int(0), UnaryOp::Not), Ok(Value::Bool(true)));
    assert_eq!(evaluate_unary(&Value::Int(5), UnaryOp::Invert), Ok(Value::Int(-6)));
    let err = evaluate_unary(&Value::string("x"), UnaryOp::Neg).unwrap_err();
    assert_eq!(err.message, "bad operand type for unary -: 'str'");
}

#[test]
fn comparisons() {
    let cmp = |l: Value, r: Value, op| evaluate_compare(&l, &r, op);
    assert_eq!(cmp(Value::Int(1), Value::Float(1.0), CompareOp::Eq), Ok(true));
    assert_eq!(cmp(Value::Int(1), Value::Int(2), CompareOp::Lt), Ok(true));
    assert_eq!(cmp(Value::string("b"), Value::string("a"), CompareOp::Gt), Ok(true));
    assert_eq!(
        cmp(Value::Float(f64::NAN), Value::Float(1.0), CompareOp::LtEq),
        Ok(false)
    );
    let left = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
    let right = Value::tuple(vec![Value::Int(1), Value::Int(3)]);
    assert_eq!(cmp(left, right, CompareOp::Lt), Ok(true));
}

#[test]
fn ordering_mismatched_types_is_a_type_error() {
    let err = evaluate_compare(&Value::Int(1), &Value::string("a"), CompareOp::Lt).unwrap_err();
    assert_eq!(
        err.message,
        "'<' not supported between instances of 'int' and 'str'"
    );
}

#[test]
fn membership() {
    let list = Value::list(vec![Value::Int(1), Value::string("x")]);
    assert_eq!(evaluate_compare(&Value::string("x"), &list, CompareOp::In), Ok(true));
    assert_eq!(evaluate_compare(&Value::Int(2), &list, CompareOp::NotIn), Ok(true));
    assert_eq!(
        evaluate_compare(&Value::string("ell"), &Value::string("hello"), CompareOp::In),
        Ok(true)
    );
    let dict = Value::dict([("k".to_string(), Value::Null)].into_iter().collect());
    assert_eq!(evaluate_compare(&Value::string("k"), &dict, CompareOp::In), Ok(true));
    assert!(evaluate_compare(&Value::Int(1), &Value::Int(2), CompareOp::In).is_err());
}

#[test]
fn identity() {
    let list = Value::list(Vec::new());
    let same = list.clone();
    assert_eq!(evaluate_compare(&list, &same, CompareOp::Is), Ok(true));
    assert_eq!(
        evaluate_compare(&list, &Value::list(Vec::new()), CompareOp::Is),
        Ok(false)
    );
    assert_eq!(evaluate_compare(&Value::Null, &Value::Null, CompareOp::Is), Ok(true));
}
