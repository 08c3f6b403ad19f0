use super::val::{almost_equal, determine_result_type, Value, ValueKind};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

pub type BinaryOp = fn(Value, Value) -> Result<Value>;
pub type UnaryOp = fn(Value) -> Result<Value>;

/// ## Operators
///
/// Name-keyed tables for the evaluator. Rank is the precedence: smaller
/// binds tighter, equal ranks reduce left to right.

pub struct Operation {}

impl Operation {
    pub fn binary(oper: &str) -> Option<BinaryOp> {
        match oper {
            "*" => Some(Self::multiply),
            "/" => Some(Self::divide),
            "+" => Some(Self::sum),
            "-" => Some(Self::subtract),
            "^" => Some(Self::power),
            "%" => Some(Self::modulo),
            "=" => Some(Self::equal),
            "<" => Some(Self::less),
            "<=" => Some(Self::less_equal),
            ">" => Some(Self::greater),
            ">=" => Some(Self::greater_equal),
            "AND" => Some(Self::and),
            "OR" => Some(Self::or),
            _ => None,
        }
    }

    pub fn unary(oper: &str) -> Option<UnaryOp> {
        match oper {
            "NEG" => Some(Self::negate),
            _ => None,
        }
    }

    pub fn rank(oper: &str) -> Result<u8> {
        match oper {
            "NEG" => Ok(1),
            "^" => Ok(2),
            "*" | "/" => Ok(3),
            "+" | "-" | "%" => Ok(4),
            ">>" | "<<" => Ok(5),
            "<" | "<=" | ">" | ">=" => Ok(6),
            "=" => Ok(7),
            "AND" => Ok(8),
            "OR" => Ok(9),
            _ => Err(error!(Fatal; "Unknown operator '{}' passed to rank", oper)),
        }
    }

    pub fn negate(val: Value) -> Result<Value> {
        match val {
            Value::Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Integer overflow in negation")),
            },
            Value::Real(n) => Ok(Value::Real(-n)),
            _ => Err(error!(Syntax; "Attempt to apply a negative sign to a non-number")),
        }
    }

    pub fn multiply(lhs: Value, rhs: Value) -> Result<Value> {
        match determine_result_type(lhs.kind(), rhs.kind()) {
            ValueKind::Integer => match lhs.to_integer()?.checked_mul(rhs.to_integer()?) {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Integer overflow in multiplication")),
            },
            ValueKind::Real => Ok(Value::Real(lhs.to_numeric()? * rhs.to_numeric()?)),
            _ => Err(error!(Syntax; "Attempt to multiply non-numeric types")),
        }
    }

    pub fn divide(lhs: Value, rhs: Value) -> Result<Value> {
        match determine_result_type(lhs.kind(), rhs.kind()) {
            ValueKind::Integer => match lhs.to_integer()?.checked_div(rhs.to_integer()?) {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Division by zero")),
            },
            ValueKind::Real => Ok(Value::Real(lhs.to_numeric()? / rhs.to_numeric()?)),
            _ => Err(error!(Syntax; "Attempt to divide non-numeric types")),
        }
    }

    pub fn sum(lhs: Value, rhs: Value) -> Result<Value> {
        match determine_result_type(lhs.kind(), rhs.kind()) {
            ValueKind::Integer => match lhs.to_integer()?.checked_add(rhs.to_integer()?) {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Integer overflow in addition")),
            },
            ValueKind::Real => Ok(Value::Real(lhs.to_numeric()? + rhs.to_numeric()?)),
            ValueKind::String => Ok(Value::String(format!("{}{}", lhs, rhs))),
            _ => Err(error!(Syntax; "Attempt to add non-numeric types")),
        }
    }

    pub fn subtract(lhs: Value, rhs: Value) -> Result<Value> {
        match determine_result_type(lhs.kind(), rhs.kind()) {
            ValueKind::Integer => match lhs.to_integer()?.checked_sub(rhs.to_integer()?) {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Integer overflow in subtraction")),
            },
            ValueKind::Real => Ok(Value::Real(lhs.to_numeric()? - rhs.to_numeric()?)),
            _ => Err(error!(Syntax; "Attempt to subtract non-numeric types")),
        }
    }

    pub fn power(lhs: Value, rhs: Value) -> Result<Value> {
        let result_type = determine_result_type(lhs.kind(), rhs.kind());
        let result = lhs.to_numeric_or_syntax()?.powf(rhs.to_numeric_or_syntax()?);
        match result_type {
            ValueKind::Integer => Ok(Value::Integer(result as i32)),
            ValueKind::Real => Ok(Value::Real(result)),
            _ => Err(error!(Syntax; "Attempt to raise non-numeric types")),
        }
    }

    pub fn modulo(lhs: Value, rhs: Value) -> Result<Value> {
        match determine_result_type(lhs.kind(), rhs.kind()) {
            ValueKind::Integer => match lhs.to_integer()?.checked_rem(rhs.to_integer()?) {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Division by zero")),
            },
            _ => Err(error!(Syntax; "Attempt to do modular arithmetic with non-integers")),
        }
    }

    pub fn and(lhs: Value, rhs: Value) -> Result<Value> {
        Ok(Value::Boolean(lhs.to_boolean()? && rhs.to_boolean()?))
    }

    pub fn or(lhs: Value, rhs: Value) -> Result<Value> {
        Ok(Value::Boolean(lhs.to_boolean()? || rhs.to_boolean()?))
    }

    pub fn equal(lhs: Value, rhs: Value) -> Result<Value> {
        Self::compare(lhs, rhs, |o| o == std::cmp::Ordering::Equal, true)
    }

    pub fn less(lhs: Value, rhs: Value) -> Result<Value> {
        Self::compare(lhs, rhs, |o| o == std::cmp::Ordering::Less, false)
    }

    pub fn less_equal(lhs: Value, rhs: Value) -> Result<Value> {
        Self::compare(lhs, rhs, |o| o != std::cmp::Ordering::Greater, true)
    }

    pub fn greater(lhs: Value, rhs: Value) -> Result<Value> {
        Self::compare(lhs, rhs, |o| o == std::cmp::Ordering::Greater, false)
    }

    pub fn greater_equal(lhs: Value, rhs: Value) -> Result<Value> {
        Self::compare(lhs, rhs, |o| o != std::cmp::Ordering::Less, true)
    }

    /// Shared relational core. `empty_result` is the answer when both sides
    /// are EMPTY; comparing EMPTY to anything else never works.
    fn compare(
        lhs: Value,
        rhs: Value,
        accept: fn(std::cmp::Ordering) -> bool,
        empty_result: bool,
    ) -> Result<Value> {
        use std::cmp::Ordering;
        let ordering = match determine_result_type(lhs.kind(), rhs.kind()) {
            ValueKind::Boolean => lhs.to_boolean()?.cmp(&rhs.to_boolean()?),
            ValueKind::Integer => lhs.to_integer()?.cmp(&rhs.to_integer()?),
            ValueKind::Real => {
                let l = lhs.to_numeric()?;
                let r = rhs.to_numeric()?;
                if almost_equal(l, r) {
                    Ordering::Equal
                } else if l < r {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            ValueKind::String => lhs.to_string().cmp(&rhs.to_string()),
            ValueKind::Empty => {
                if lhs.kind() == rhs.kind() {
                    return Ok(Value::Boolean(empty_result));
                }
                return Err(error!(Syntax;
                    "Attempt to compare different types {} and {}",
                    lhs.kind(),
                    rhs.kind()
                ));
            }
        };
        Ok(Value::Boolean(accept(ordering)))
    }
}

impl Value {
    /// Numeric conversion for operator contexts where the failure is the
    /// user's, not the engine's.
    fn to_numeric_or_syntax(&self) -> Result<f64> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Real(n) => Ok(*n),
            _ => Err(error!(Syntax; "Expected a number, found {}", self.kind())),
        }
    }
}

/// Lexical helper used by the evaluator: true when the text at `pos`
/// spells the word operator (upper-cased) followed by whitespace.
pub fn is_word_operator(word: &str, value: &str, pos: usize) -> bool {
    let end = pos + word.len();
    if end >= value.len() {
        return false;
    }
    let window = &value.as_bytes()[pos..end];
    if !window.eq_ignore_ascii_case(word.as_bytes()) {
        return false;
    }
    matches!(value.as_bytes()[end], b' ' | b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            Operation::multiply(Value::Integer(6), Value::Integer(7)).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            Operation::divide(Value::Integer(10), Value::Integer(4)).unwrap(),
            Value::Integer(2)
        );
        assert_eq!(
            Operation::divide(Value::Real(10.0), Value::Integer(4)).unwrap(),
            Value::Real(2.5)
        );
        assert_eq!(
            Operation::modulo(Value::Integer(10), Value::Integer(3)).unwrap(),
            Value::Integer(1)
        );
        assert!(Operation::divide(Value::Integer(1), Value::Integer(0)).is_err());
        assert!(Operation::modulo(Value::Real(1.0), Value::Integer(2)).is_err());
    }

    #[test]
    fn test_power() {
        assert_eq!(
            Operation::power(Value::Integer(2), Value::Integer(10)).unwrap(),
            Value::Integer(1024)
        );
        assert_eq!(
            Operation::power(Value::Real(9.0), Value::Real(0.5)).unwrap(),
            Value::Real(3.0)
        );
    }

    #[test]
    fn test_sum_concatenates_strings() {
        assert_eq!(
            Operation::sum(Value::String("AB".into()), Value::Integer(3)).unwrap(),
            Value::String("AB3".into())
        );
        assert!(Operation::sum(Value::Integer(1), Value::Empty).is_err());
        assert!(Operation::sum(Value::Boolean(true), Value::Integer(1)).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            Operation::equal(Value::Integer(3), Value::Integer(3)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Operation::less(Value::Integer(3), Value::Real(3.5)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Operation::less(Value::String("A".into()), Value::String("B".into())).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Operation::greater_equal(Value::Real(2.0), Value::Integer(2)).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_empty_comparisons() {
        assert_eq!(
            Operation::equal(Value::Empty, Value::Empty).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Operation::less(Value::Empty, Value::Empty).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            Operation::less_equal(Value::Empty, Value::Empty).unwrap(),
            Value::Boolean(true)
        );
        assert!(Operation::equal(Value::Empty, Value::Integer(0)).is_err());
    }

    #[test]
    fn test_logic() {
        assert_eq!(
            Operation::and(Value::Boolean(true), Value::Boolean(false)).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            Operation::or(Value::Boolean(true), Value::Boolean(false)).unwrap(),
            Value::Boolean(true)
        );
        assert!(Operation::and(Value::Integer(1), Value::Boolean(true))
            .unwrap_err()
            .is_fatal());
    }

    #[test]
    fn test_rank_order() {
        assert!(Operation::rank("NEG").unwrap() < Operation::rank("^").unwrap());
        assert!(Operation::rank("*").unwrap() < Operation::rank("+").unwrap());
        assert!(Operation::rank("+").unwrap() < Operation::rank("<").unwrap());
        assert!(Operation::rank("<").unwrap() < Operation::rank("=").unwrap());
        assert!(Operation::rank("=").unwrap() < Operation::rank("AND").unwrap());
        assert!(Operation::rank("AND").unwrap() < Operation::rank("OR").unwrap());
        assert!(Operation::rank("??").is_err());
    }

    #[test]
    fn test_word_operator_window() {
        assert!(is_word_operator("AND", "TRUE and FALSE", 5));
        assert!(!is_word_operator("AND", "ANDERSON ", 0));
        assert!(!is_word_operator("AND", "X AND", 2));
    }
}
