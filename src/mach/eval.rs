use super::operation::{is_word_operator, Operation};
use super::symbol::Symbols;
use super::val::{classify, Value, ValueKind};
use crate::error;
use crate::lang::{scan, Error};

type Result<T> = std::result::Result<T, Error>;

/// ## Expression evaluation
///
/// A shunting-yard pass over the source text: one stack of values, one of
/// operator names. Operators reduce while the incoming rank does not bind
/// tighter than the stack top, so equal ranks associate left.

impl Symbols {
    pub fn evaluate(&self, value: &str) -> Result<Value> {
        let bytes = value.as_bytes();
        let mut operands: Vec<Value> = Vec::new();
        let mut operators: Vec<String> = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => {
                    let end = scan::find_end_of_string(&value[pos..])?;
                    let literal = scan::remove_outer_quotes(&value[pos..=pos + end]);
                    operands.push(Value::String(scan::unescape_quotes(literal)));
                    pos += end;
                }
                b'(' => {
                    let end = pos + scan::find_end_of_bracket(&value[pos..])?;
                    operands.push(self.evaluate(&value[pos + 1..end])?);
                    pos = end;
                }
                b' ' | b'\t' => {
                    while pos + 1 < bytes.len() && matches!(bytes[pos + 1], b' ' | b'\t') {
                        pos += 1;
                    }
                }
                _ => {
                    match next_operator(value, pos, &operands, &operators)? {
                        Some((oper, skip)) => {
                            pos += skip;
                            reduce(&mut operands, &mut operators, Some(oper.as_str()))?;
                            operators.push(oper);
                        }
                        None => {
                            let end = scan::find_end_of_operand(&value[pos..])?;
                            operands.push(self.operand(&value[pos..=pos + end])?);
                            pos += end;
                        }
                    }
                }
            }
            pos += 1;
        }
        reduce(&mut operands, &mut operators, None)?;
        let result = match operands.pop() {
            Some(value) => value,
            None => return Ok(Value::Empty),
        };
        if !operands.is_empty() {
            return Err(error!(Syntax; "Unparsed values left at end of evaluation"));
        }
        Ok(result)
    }

    /// Evaluate a comma-separated parameter list, outer brackets allowed.
    pub fn evaluate_parameters(&self, value: &str) -> Result<Vec<Value>> {
        let value = scan::remove_outer_bracket(value.trim());
        let mut values = Vec::new();
        for part in scan::split_parameters(value)? {
            values.push(self.evaluate(part)?);
        }
        Ok(values)
    }

    pub fn exec_function(&self, name: &str, arguments: Vec<Value>) -> Result<Value> {
        match self.function(name) {
            Some(entry) => (entry.func)(arguments),
            None => Err(error!(Fatal; "Expected function '{}' to exist", name)),
        }
    }

    /// Resolve one operand token: a call or array subscript when it carries
    /// brackets, otherwise a variable, constant, or numeric literal.
    fn operand(&self, operand: &str) -> Result<Value> {
        if let Some(bracket) = operand.find('(') {
            let name = operand[..bracket].trim();
            let close = match operand.rfind(')') {
                Some(close) => close,
                None => return Err(error!(Syntax; "Unclosed bracket on '{}'", operand)),
            };
            let arguments = self.evaluate_parameters(&operand[bracket + 1..close])?;
            if self.is_function(name) {
                return self.exec_function(name, arguments);
            }
            if self.is_array(name) {
                let indices = convert_indices(arguments)?;
                return self.array_fetch(name, &indices);
            }
            return Err(error!(Syntax; "Unknown symbol name '{}'", name));
        }
        if self.is_variable(operand) {
            return self.fetch_variable_constant(operand);
        }
        match classify(operand) {
            ValueKind::Integer | ValueKind::Real => Value::from_numeric(operand),
            _ => Err(error!(Syntax; "Unknown symbol '{}'", operand)),
        }
    }
}

/// Array subscripts and dimensions arrive as values; they must be
/// non-negative integers.
pub fn convert_indices(values: Vec<Value>) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(values.len());
    for value in values {
        let index = value.to_integer()?;
        if index < 0 {
            return Err(error!(Syntax; "Array subscripts must not be negative"));
        }
        indices.push(index as usize);
    }
    Ok(indices)
}

/// Recognise an operator starting at `pos`. Returns the operator name and
/// how many extra bytes it consumed. A `-` is unary negation when nothing
/// is pending, or when a binary operator is still waiting for its right
/// operand (odd operand count).
fn next_operator(
    value: &str,
    pos: usize,
    operands: &[Value],
    operators: &[String],
) -> Result<Option<(String, usize)>> {
    let bytes = value.as_bytes();
    let current = bytes[pos];
    match current {
        b'%' | b'^' | b'*' | b'/' | b'+' | b'-' | b'<' | b'>' | b'=' => {
            let mut oper = (current as char).to_string();
            let mut skip = 0;
            if current == b'-'
                && ((operators.is_empty() && operands.is_empty())
                    || (!operators.is_empty() && operands.len() % 2 == 1))
            {
                oper = "NEG".to_string();
            }
            if current == b'<' || current == b'>' {
                if pos + 1 >= bytes.len() {
                    return Err(error!(Syntax; "Binary operator with only left hand side"));
                }
                if bytes[pos + 1] == b'=' {
                    oper.push('=');
                    skip = 1;
                }
            }
            Ok(Some((oper, skip)))
        }
        _ if is_word_operator("AND", value, pos) => Ok(Some(("AND".to_string(), 2))),
        _ if is_word_operator("OR", value, pos) => Ok(Some(("OR".to_string(), 1))),
        _ => Ok(None),
    }
}

/// Apply pending operators. With an incoming operator, stop once the stack
/// top binds looser; with none, drain the stack.
fn reduce(
    operands: &mut Vec<Value>,
    operators: &mut Vec<String>,
    incoming: Option<&str>,
) -> Result<()> {
    while let Some(top) = operators.last() {
        if let Some(incoming) = incoming {
            if Operation::rank(incoming)? < Operation::rank(top)? {
                break;
            }
        }
        let oper = match operators.pop() {
            Some(oper) => oper,
            None => break,
        };
        apply(operands, &oper)?;
    }
    Ok(())
}

fn apply(operands: &mut Vec<Value>, oper: &str) -> Result<()> {
    let rhs = match operands.pop() {
        Some(value) => value,
        None => return Err(error!(Syntax; "Missing operand")),
    };
    if let Some(unary) = Operation::unary(oper) {
        operands.push(unary(rhs)?);
        return Ok(());
    }
    if let Some(binary) = Operation::binary(oper) {
        let lhs = match operands.pop() {
            Some(value) => value,
            None => return Err(error!(Syntax; "Missing operand")),
        };
        operands.push(binary(lhs, rhs)?);
        return Ok(());
    }
    Err(error!(Syntax; "Unknown operator {}", oper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::function::Function;

    fn symbols() -> Symbols {
        let mut symbols = Symbols::new();
        symbols
            .add_constant("TRUE", "", Value::Boolean(true))
            .unwrap();
        symbols
            .add_constant("FALSE", "", Value::Boolean(false))
            .unwrap();
        symbols.add_function("ABS", "", Function::abs).unwrap();
        symbols.add_function("POW", "", Function::pow).unwrap();
        symbols.add_function("LEN", "", Function::len).unwrap();
        symbols
    }

    #[test]
    fn test_precedence() {
        let symbols = symbols();
        assert_eq!(symbols.evaluate("1+2*3").unwrap(), Value::Integer(7));
        assert_eq!(symbols.evaluate("(1+2)*3").unwrap(), Value::Integer(9));
        assert_eq!(symbols.evaluate("2^3^2").unwrap(), Value::Integer(64));
    }

    #[test]
    fn test_nested_brackets() {
        let symbols = symbols();
        assert_eq!(symbols.evaluate("((1+2))*3").unwrap(), Value::Integer(9));
        assert_eq!(
            symbols.evaluate("((2*(3+4)))").unwrap(),
            Value::Integer(14)
        );
    }

    #[test]
    fn test_unary_minus() {
        let symbols = symbols();
        assert_eq!(symbols.evaluate("-5").unwrap(), Value::Integer(-5));
        assert_eq!(symbols.evaluate("2*-3").unwrap(), Value::Integer(-6));
        assert_eq!(symbols.evaluate("1--2").unwrap(), Value::Integer(3));
        assert_eq!(symbols.evaluate("-2+5").unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_string_literals() {
        let symbols = symbols();
        assert_eq!(
            symbols.evaluate(r#""AB" + "CD""#).unwrap(),
            Value::String("ABCD".into())
        );
        assert_eq!(
            symbols.evaluate(r#""SAY \"HI\"""#).unwrap(),
            Value::String(r#"SAY "HI""#.into())
        );
    }

    #[test]
    fn test_word_operators() {
        let symbols = symbols();
        assert_eq!(
            symbols.evaluate("TRUE AND FALSE").unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            symbols.evaluate("TRUE OR FALSE").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            symbols.evaluate("1=1 AND 2>1").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            symbols.evaluate("1=2 OR 1<2 AND TRUE").unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_function_calls() {
        let symbols = symbols();
        assert_eq!(symbols.evaluate("ABS(-7)").unwrap(), Value::Integer(7));
        assert_eq!(
            symbols.evaluate("POW(2, 3) + 1").unwrap(),
            Value::Integer(9)
        );
        assert_eq!(
            symbols.evaluate("POW(ABS(-2), LEN(\"ABC\"))").unwrap(),
            Value::Integer(8)
        );
        assert_eq!(symbols.evaluate("abs(-1)").unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_comparisons() {
        let symbols = symbols();
        assert_eq!(symbols.evaluate("1 <= 1").unwrap(), Value::Boolean(true));
        assert_eq!(symbols.evaluate("2 >= 3").unwrap(), Value::Boolean(false));
        assert_eq!(symbols.evaluate("1 < 2").unwrap(), Value::Boolean(true));
        assert_eq!(
            symbols.evaluate(r#""A" < "B""#).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_empty_source() {
        let symbols = symbols();
        assert_eq!(symbols.evaluate("").unwrap(), Value::Empty);
        assert_eq!(symbols.evaluate("   ").unwrap(), Value::Empty);
    }

    #[test]
    fn test_errors() {
        let symbols = symbols();
        assert!(symbols.evaluate("NOPE").is_err());
        assert!(symbols.evaluate("NOPE(1)").is_err());
        assert!(symbols.evaluate("1+").is_err());
        assert!(symbols.evaluate("(1+2").is_err());
        assert!(symbols.evaluate(r#""unterminated"#).is_err());
    }

    #[test]
    fn test_parameter_lists() {
        let symbols = symbols();
        let values = symbols.evaluate_parameters("(1, 2+3, \"X\")").unwrap();
        assert_eq!(
            values,
            vec![
                Value::Integer(1),
                Value::Integer(5),
                Value::String("X".into())
            ]
        );
        assert!(symbols.evaluate_parameters("").unwrap().is_empty());
    }

    #[test]
    fn test_convert_indices() {
        assert_eq!(
            convert_indices(vec![Value::Integer(1), Value::Integer(0)]).unwrap(),
            vec![1, 0]
        );
        assert!(convert_indices(vec![Value::Integer(-1)]).is_err());
        assert!(convert_indices(vec![Value::Real(1.5)]).is_err());
    }
}
