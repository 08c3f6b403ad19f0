use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Typed values
///
/// Everything the evaluator touches is one of these. Arrays are not values;
/// they live in their own table and only their cells flow through here.

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Empty,
    Boolean,
    Integer,
    Real,
    String,
}

/// Decimal point for literal classification; the host locale is not
/// consulted.
const DECIMAL_POINT: u8 = b'.';

/// Lexical kind of a literal, judged purely by shape: an optional leading
/// `-`, digits, at most one interior decimal point. Anything else reads as
/// a string.
pub fn classify(value: &str) -> ValueKind {
    let value = value.trim();
    if value.is_empty() {
        return ValueKind::Empty;
    }
    let bytes = value.as_bytes();
    let start = if bytes[0] == b'-' { 1 } else { 0 };
    if start == bytes.len() {
        return ValueKind::String;
    }
    let mut has_decimal = false;
    for pos in start..bytes.len() {
        match bytes[pos] {
            b'-' => return ValueKind::String,
            b if b == DECIMAL_POINT => {
                if has_decimal || pos + 1 == bytes.len() {
                    return ValueKind::String;
                }
                has_decimal = true;
            }
            b if !b.is_ascii_digit() => return ValueKind::String,
            _ => {}
        }
    }
    if has_decimal {
        ValueKind::Real
    } else {
        ValueKind::Integer
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::String(_) => ValueKind::String,
        }
    }

    /// Build a numeric value from a literal that classified as one.
    pub fn from_numeric(text: &str) -> Result<Value> {
        let text = text.trim();
        match classify(text) {
            ValueKind::Integer => match text.parse::<i32>() {
                Ok(n) => Ok(Value::Integer(n)),
                Err(_) => Err(error!(Syntax; "Integer '{}' is out of range", text)),
            },
            ValueKind::Real => match text.parse::<f64>() {
                Ok(n) => Ok(Value::Real(n)),
                Err(_) => Err(error!(Syntax; "Number '{}' is out of range", text)),
            },
            _ => Err(error!(Fatal; "Attempt to create a numeric value from a non-numeric string")),
        }
    }

    pub fn to_numeric(&self) -> Result<f64> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Real(n) => Ok(*n),
            _ => Err(error!(Fatal; "Cannot convert non-numeric types to a number")),
        }
    }

    pub fn to_integer(&self) -> Result<i32> {
        match self {
            Value::Integer(n) => Ok(*n),
            _ => Err(error!(Syntax; "Expected an Integer value, found {}", self.kind())),
        }
    }

    pub fn to_boolean(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(error!(Fatal; "Attempt to convert a non-boolean to a boolean")),
        }
    }
}

/// Result type of a binary operation, per the coercion table. EMPTY marks
/// the combinations that never mix.
pub fn determine_result_type(lhs: ValueKind, rhs: ValueKind) -> ValueKind {
    use ValueKind::*;
    match (lhs, rhs) {
        (Integer, Integer) => Integer,
        (Integer, Real) | (Real, Integer) | (Real, Real) => Real,
        (Integer, String) | (Real, String) => String,
        (String, Integer) | (String, Real) | (String, String) => String,
        (Boolean, Boolean) => Boolean,
        _ => Empty,
    }
}

/// Equality for reals, one rounding error wide.
pub fn almost_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= a.abs().max(b.abs()) * f64::EPSILON
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            ValueKind::Empty => "Empty",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Real => "Real",
            ValueKind::String => "String",
        };
        write!(f, "{}", s)
    }
}
