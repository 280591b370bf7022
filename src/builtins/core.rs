//! `print`, `println`, `scan`, `int`, `len` — the I/O and scalar-conversion
//! built-ins every Tiny program has in scope.

use std::io::{self, Write};

use crate::error::TinyError;
use crate::value::Value;

use super::BuiltinRegistry;

pub fn register(registry: &mut BuiltinRegistry) {
    registry.insert("print", print);
    registry.insert("println", println);
    registry.insert("scan", scan);
    registry.insert("int", int);
    registry.insert("len", len);
}

/// Emits space-separated renderings of its arguments with no trailing
/// newline.
fn print(args: &[Value]) -> Result<Value, TinyError> {
    let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    print!("{}", rendered.join(" "));
    let _ = io::stdout().flush();
    Ok(Value::Unit)
}

/// Like `print`, but with a trailing newline.
fn println(args: &[Value]) -> Result<Value, TinyError> {
    let rendered: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    std::println!("{}", rendered.join(" "));
    Ok(Value::Unit)
}

/// Reads one line from standard input and returns it as a `Str`, with the
/// trailing newline stripped.
fn scan(_args: &[Value]) -> Result<Value, TinyError> {
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| TinyError::type_error("scan", format!("failed to read stdin: {e}")))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::Str(line))
}

/// Converts its argument to an `Int`: truncates a `Double`, parses a `Str`.
fn int(args: &[Value]) -> Result<Value, TinyError> {
    let [arg] = args else {
        return Err(TinyError::arity_error("int", 1, args.len()));
    };
    match arg {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Double(n) => Ok(Value::Int(*n as i64)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| TinyError::type_error("int", format!("cannot parse {s:?} as int"))),
        other => Err(TinyError::type_error(
            "int",
            format!("cannot convert {} to int", other.type_name()),
        )),
    }
}

/// Yields an array's declared size.
fn len(args: &[Value]) -> Result<Value, TinyError> {
    let [arg] = args else {
        return Err(TinyError::arity_error("len", 1, args.len()));
    };
    match arg {
        Value::Array(cells) => Ok(Value::Int(cells.borrow().len() as i64)),
        other => Err(TinyError::type_error(
            "len",
            format!("expected an array, got {}", other.type_name()),
        )),
    }
}
