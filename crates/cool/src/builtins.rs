//! Implementations of the built-in methods of `Object`, `IO`, and `String`.
//!
//! The symbol table pre-registers these methods with a synthesized
//! `Builtin(tag)` body; runtime dispatch routes such bodies here instead of
//! evaluating them.

use std::rc::Rc;

use strum::{Display, IntoStaticStr};

use crate::{
    diagnostics::Position,
    eval::Machine,
    exception::{RunError, RunResult},
    symbols::OBJECT,
    value::Value,
};

/// Identifies one built-in method implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub(crate) enum BuiltinMethod {
    Abort,
    TypeName,
    Copy,
    OutString,
    OutInt,
    InString,
    InInt,
    Length,
    Concat,
    Substr,
}

/// Runs the built-in `tag` on `receiver` with already-evaluated arguments.
pub(crate) fn invoke(
    machine: &mut Machine<'_>,
    tag: BuiltinMethod,
    receiver: &Value,
    args: &[Value],
    position: &Position,
) -> RunResult<Value> {
    match tag {
        BuiltinMethod::Abort => {
            let class_name = receiver.dynamic_class_name().unwrap_or(OBJECT);
            machine.write_output(&format!("Abort called from class {class_name}\n"));
            Err(RunError::abort_called(class_name))
        }
        BuiltinMethod::TypeName => {
            let class_name = receiver.dynamic_class_name().unwrap_or(OBJECT);
            Ok(Value::Str(Rc::from(class_name)))
        }
        BuiltinMethod::Copy => Ok(match receiver {
            Value::Object(instance) => Value::Object(Rc::new(instance.shallow_copy())),
            other => other.clone(),
        }),
        BuiltinMethod::OutString => {
            let text = expect_str(args, 0, position)?;
            machine.write_output(&text);
            Ok(receiver.clone())
        }
        BuiltinMethod::OutInt => {
            let value = expect_int(args, 0, position)?;
            machine.write_output(&value.to_string());
            Ok(receiver.clone())
        }
        BuiltinMethod::InString => {
            let line = machine.read_input_line().unwrap_or_default();
            Ok(Value::Str(Rc::from(line.as_str())))
        }
        BuiltinMethod::InInt => {
            let line = machine.read_input_line().unwrap_or_default();
            Ok(Value::Int(parse_leading_int(&line)))
        }
        BuiltinMethod::Length => {
            let text = receiver_str(receiver, position)?;
            Ok(Value::Int(text.len() as i64))
        }
        BuiltinMethod::Concat => {
            let left = receiver_str(receiver, position)?;
            let right = expect_str(args, 0, position)?;
            Ok(Value::Str(Rc::from(format!("{left}{right}").as_str())))
        }
        BuiltinMethod::Substr => {
            let text = receiver_str(receiver, position)?;
            let start = expect_int(args, 0, position)?;
            let length = expect_int(args, 1, position)?;
            substr(&text, start, length, position)
        }
    }
}

fn substr(text: &str, start: i64, length: i64, position: &Position) -> RunResult<Value> {
    let total = text.len() as i64;
    let out_of_range = start < 0
        || length < 0
        || start.checked_add(length).is_none_or(|end| end > total);
    if out_of_range {
        return Err(RunError::substr_out_of_range(
            format!("substr({start}, {length}) is out of range for a string of length {total}"),
            position,
        ));
    }
    let bytes = &text.as_bytes()[start as usize..(start + length) as usize];
    Ok(Value::Str(Rc::from(String::from_utf8_lossy(bytes).as_ref())))
}

/// Extracts the leading optionally-signed decimal integer; 0 when the line
/// does not start with one (after leading whitespace) or does not fit.
fn parse_leading_int(line: &str) -> i64 {
    let trimmed = line.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}

fn receiver_str(receiver: &Value, position: &Position) -> RunResult<Rc<str>> {
    match receiver {
        Value::Str(text) => Ok(Rc::clone(text)),
        other => Err(RunError::internal(
            format!("String built-in invoked on a {} receiver", other.kind_name()),
            position,
        )),
    }
}

fn expect_str(args: &[Value], index: usize, position: &Position) -> RunResult<Rc<str>> {
    match args.get(index) {
        Some(Value::Str(text)) => Ok(Rc::clone(text)),
        other => Err(RunError::internal(
            format!(
                "built-in expected a String argument at position {index}, found {}",
                other.map_or("nothing", |v| v.kind_name())
            ),
            position,
        )),
    }
}

fn expect_int(args: &[Value], index: usize, position: &Position) -> RunResult<i64> {
    match args.get(index) {
        Some(Value::Int(value)) => Ok(*value),
        other => Err(RunError::internal(
            format!(
                "built-in expected an Int argument at position {index}, found {}",
                other.map_or("nothing", |v| v.kind_name())
            ),
            position,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_int_parsing() {
        assert_eq!(parse_leading_int("42"), 42);
        assert_eq!(parse_leading_int("  -17 trailing"), -17);
        assert_eq!(parse_leading_int("+8"), 8);
        assert_eq!(parse_leading_int("x42"), 0);
        assert_eq!(parse_leading_int(""), 0);
        assert_eq!(parse_leading_int("99999999999999999999"), 0);
    }

    #[test]
    fn substr_bounds() {
        let position = Position::none();
        assert!(matches!(substr("hello", 0, 5, &position), Ok(Value::Str(s)) if &*s == "hello"));
        assert!(matches!(substr("hello", 5, 0, &position), Ok(Value::Str(s)) if s.is_empty()));
        assert!(substr("hello", 0, 6, &position).is_err());
        assert!(substr("hello", -1, 1, &position).is_err());
        assert!(substr("hello", 1, -1, &position).is_err());
    }
}
