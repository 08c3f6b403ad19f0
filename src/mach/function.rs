use super::operation::Operation;
use super::val::{classify, determine_result_type, Value, ValueKind};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

pub type BasicFunction = fn(Vec<Value>) -> Result<Value>;

/// ## Builtin functions
///
/// Every function validates its own arity and argument types; a mismatch is
/// the caller's SYNTAX error, never a panic.

pub struct Function {}

/// The functions registered at engine start: name, description for the
/// FUNCTIONS listing, and the callable.
pub fn builtins() -> Vec<(&'static str, &'static str, BasicFunction)> {
    vec![
        (
            "COS",
            "COS( Angle ) -> Returns the cosine of angle in radians",
            Function::cos,
        ),
        (
            "SIN",
            "SIN( Angle ) -> Returns the sine of angle in radians",
            Function::sin,
        ),
        (
            "TAN",
            "TAN( Angle ) -> Returns the tangent of angle in radians",
            Function::tan,
        ),
        (
            "ATN",
            "ATN( Angle ) -> Returns the arctangent of angle in radians",
            Function::atn,
        ),
        (
            "EXP",
            "EXP( Exponent ) -> Returns e raised to the power of exponent",
            Function::exp,
        ),
        (
            "LOG",
            "LOG( x ) -> Returns the natural logarithm of x",
            Function::log,
        ),
        (
            "SQR",
            "SQR( x ) -> Returns the square root of x",
            Function::sqr,
        ),
        (
            "SQUARE",
            "SQUARE( x ) -> Returns x squared",
            Function::square,
        ),
        (
            "ABS",
            "ABS( x ) -> Returns the absolute value of x",
            Function::abs,
        ),
        (
            "SGN",
            "SGN( x ) -> Returns the sign of x (-1, 0, or 1)",
            Function::sgn,
        ),
        (
            "INT",
            "INT( x ) -> Returns the greatest integer less than or equal to x",
            Function::int,
        ),
        (
            "POW",
            "POW( base, exponent ) -> Returns base raised to the power exponent",
            Function::pow,
        ),
        (
            "NEG",
            "NEG( x ) -> Returns the negated number",
            Function::neg,
        ),
        (
            "RND",
            "RND( [seed] ) -> Returns a random number between 0.0 and 1.0",
            Function::rnd,
        ),
        ("NOT", "NOT( b ) -> Boolean negation", Function::not),
        (
            "LEN",
            "LEN( s ) -> Returns the length of string s",
            Function::len,
        ),
        (
            "LEFT$",
            "LEFT$( string, len ) -> Returns the left side of the string up to len characters",
            Function::left,
        ),
        (
            "RIGHT$",
            "RIGHT$( string, len ) -> Returns the right side of the string up to len characters",
            Function::right,
        ),
        (
            "MID$",
            "MID$( string, start, len ) -> Returns len characters starting at start (1-based)",
            Function::mid,
        ),
        (
            "STR$",
            "STR$( x ) -> Converts a number to a string",
            Function::str,
        ),
        (
            "VAL",
            "VAL( s ) -> Converts a string to a number",
            Function::val,
        ),
        (
            "ASC",
            "ASC( s ) -> Returns the character code of the first character of a string",
            Function::asc,
        ),
        (
            "CHR$",
            "CHR$( x ) -> Returns a string with the character of the specified code",
            Function::chr,
        ),
    ]
}

fn require(args: &[Value], name: &str, arity: usize) -> Result<()> {
    if args.len() != arity {
        let plural = if arity == 1 { "parameter" } else { "parameters" };
        return Err(error!(Syntax; "{} requires {} {}", name, arity, plural));
    }
    Ok(())
}

fn numeric_arg(value: &Value, name: &str) -> Result<f64> {
    match value {
        Value::Integer(n) => Ok(*n as f64),
        Value::Real(n) => Ok(*n),
        _ => Err(error!(Syntax; "{} only works on numeric data", name)),
    }
}

fn string_arg(value: &Value, name: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(error!(Syntax; "{} only works on string data", name)),
    }
}

fn length_arg(value: &Value, name: &str) -> Result<usize> {
    match value {
        Value::Integer(n) if *n >= 0 => Ok(*n as usize),
        Value::Integer(_) => {
            Err(error!(Syntax; "The len parameter of {} must not be negative", name))
        }
        _ => Err(error!(Syntax; "The len parameter of {} must be an integer", name)),
    }
}

impl Function {
    pub fn cos(args: Vec<Value>) -> Result<Value> {
        require(&args, "COS", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "COS")?.cos()))
    }

    pub fn sin(args: Vec<Value>) -> Result<Value> {
        require(&args, "SIN", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "SIN")?.sin()))
    }

    pub fn tan(args: Vec<Value>) -> Result<Value> {
        require(&args, "TAN", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "TAN")?.tan()))
    }

    pub fn atn(args: Vec<Value>) -> Result<Value> {
        require(&args, "ATN", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "ATN")?.atan()))
    }

    pub fn exp(args: Vec<Value>) -> Result<Value> {
        require(&args, "EXP", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "EXP")?.exp()))
    }

    pub fn log(args: Vec<Value>) -> Result<Value> {
        require(&args, "LOG", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "LOG")?.ln()))
    }

    pub fn sqr(args: Vec<Value>) -> Result<Value> {
        require(&args, "SQR", 1)?;
        Ok(Value::Real(numeric_arg(&args[0], "SQR")?.sqrt()))
    }

    pub fn square(args: Vec<Value>) -> Result<Value> {
        require(&args, "SQUARE", 1)?;
        match &args[0] {
            Value::Integer(n) => match n.checked_mul(*n) {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Integer overflow in SQUARE")),
            },
            value => {
                let n = numeric_arg(value, "SQUARE")?;
                Ok(Value::Real(n * n))
            }
        }
    }

    pub fn abs(args: Vec<Value>) -> Result<Value> {
        require(&args, "ABS", 1)?;
        match &args[0] {
            Value::Integer(n) => match n.checked_abs() {
                Some(n) => Ok(Value::Integer(n)),
                None => Err(error!(Syntax; "Integer overflow in ABS")),
            },
            value => Ok(Value::Real(numeric_arg(value, "ABS")?.abs())),
        }
    }

    pub fn sgn(args: Vec<Value>) -> Result<Value> {
        require(&args, "SGN", 1)?;
        let n = numeric_arg(&args[0], "SGN")?;
        let sign = if n > 0.0 {
            1
        } else if n < 0.0 {
            -1
        } else {
            0
        };
        match args[0] {
            Value::Integer(_) => Ok(Value::Integer(sign)),
            _ => Ok(Value::Real(sign as f64)),
        }
    }

    pub fn int(args: Vec<Value>) -> Result<Value> {
        require(&args, "INT", 1)?;
        match args[0] {
            Value::Integer(n) => Ok(Value::Integer(n)),
            Value::Real(n) => {
                let floored = n.floor();
                if floored < i32::MIN as f64 || floored > i32::MAX as f64 {
                    return Err(error!(Syntax; "Integer overflow in INT"));
                }
                Ok(Value::Integer(floored as i32))
            }
            _ => Err(error!(Syntax; "INT only works on numeric data")),
        }
    }

    pub fn pow(args: Vec<Value>) -> Result<Value> {
        require(&args, "POW", 2)?;
        let result_type = determine_result_type(args[0].kind(), args[1].kind());
        let base = numeric_arg(&args[0], "POW")?;
        let exponent = numeric_arg(&args[1], "POW")?;
        let result = base.powf(exponent);
        match result_type {
            ValueKind::Integer => Ok(Value::Integer(result as i32)),
            _ => Ok(Value::Real(result)),
        }
    }

    pub fn neg(args: Vec<Value>) -> Result<Value> {
        require(&args, "NEG", 1)?;
        let mut args = args;
        Operation::subtract(Value::Integer(0), args.remove(0))
    }

    pub fn rnd(_args: Vec<Value>) -> Result<Value> {
        Err(error!(Syntax; "Not implemented"))
    }

    pub fn not(args: Vec<Value>) -> Result<Value> {
        require(&args, "NOT", 1)?;
        match args[0] {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            _ => Err(error!(Syntax; "NOT only works on boolean data")),
        }
    }

    pub fn len(args: Vec<Value>) -> Result<Value> {
        require(&args, "LEN", 1)?;
        let s = string_arg(&args[0], "LEN")?;
        Ok(Value::Integer(s.chars().count() as i32))
    }

    pub fn left(args: Vec<Value>) -> Result<Value> {
        require(&args, "LEFT$", 2)?;
        let s = string_arg(&args[0], "LEFT$")?;
        let len = length_arg(&args[1], "LEFT$")?;
        Ok(Value::String(s.chars().take(len).collect()))
    }

    pub fn right(args: Vec<Value>) -> Result<Value> {
        require(&args, "RIGHT$", 2)?;
        let s = string_arg(&args[0], "RIGHT$")?;
        let len = length_arg(&args[1], "RIGHT$")?;
        let count = s.chars().count();
        Ok(Value::String(s.chars().skip(count.saturating_sub(len)).collect()))
    }

    pub fn mid(args: Vec<Value>) -> Result<Value> {
        require(&args, "MID$", 3)?;
        let s = string_arg(&args[0], "MID$")?;
        let start = match args[1] {
            Value::Integer(n) if n >= 1 => n as usize,
            Value::Integer(_) => {
                return Err(error!(Syntax; "The start parameter of MID$ must be at least 1"));
            }
            _ => return Err(error!(Syntax; "The start parameter of MID$ must be an integer")),
        };
        let len = length_arg(&args[2], "MID$")?;
        Ok(Value::String(s.chars().skip(start - 1).take(len).collect()))
    }

    pub fn str(args: Vec<Value>) -> Result<Value> {
        require(&args, "STR$", 1)?;
        match args[0] {
            Value::Integer(_) | Value::Real(_) => Ok(Value::String(args[0].to_string())),
            _ => Err(error!(Syntax; "STR$ only works on numeric data")),
        }
    }

    pub fn val(args: Vec<Value>) -> Result<Value> {
        require(&args, "VAL", 1)?;
        let s = string_arg(&args[0], "VAL")?;
        match classify(&s) {
            ValueKind::Integer | ValueKind::Real => Value::from_numeric(&s),
            _ => Err(error!(Syntax; "Attempt to convert a string of non-numbers to a number")),
        }
    }

    pub fn asc(args: Vec<Value>) -> Result<Value> {
        require(&args, "ASC", 1)?;
        let s = string_arg(&args[0], "ASC")?;
        match s.chars().next() {
            Some(ch) => Ok(Value::Integer(ch as i32)),
            None => Err(error!(Syntax; "ASC requires a non-empty string")),
        }
    }

    pub fn chr(args: Vec<Value>) -> Result<Value> {
        require(&args, "CHR$", 1)?;
        let code = match args[0] {
            Value::Integer(n) => n,
            _ => return Err(error!(Syntax; "CHR$ only works on integer data")),
        };
        if !(0..=255).contains(&code) {
            return Err(error!(Syntax; "Specified character code must be between 0 and 255"));
        }
        Ok(Value::String(char::from(code as u8).to_string()))
    }
}
