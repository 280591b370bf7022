//! `sin`, `cos`, `sqrt`, `floor`, `random` — the math utilities an
//! implementation of this language chooses to expose as builtins.

use rand::Rng;

use crate::error::TinyError;
use crate::value::Value;

use super::BuiltinRegistry;

pub fn register(registry: &mut BuiltinRegistry) {
    registry.insert("sin", sin);
    registry.insert("cos", cos);
    registry.insert("sqrt", sqrt);
    registry.insert("floor", floor);
    registry.insert("random", random);
}

fn as_f64_arg(args: &[Value], name: &str) -> Result<f64, TinyError> {
    let [arg] = args else {
        return Err(TinyError::arity_error(name, 1, args.len()));
    };
    match arg {
        Value::Int(n) => Ok(*n as f64),
        Value::Double(n) => Ok(*n),
        other => Err(TinyError::type_error(
            name,
            format!("expected a numeric argument, got {}", other.type_name()),
        )),
    }
}

fn sin(args: &[Value]) -> Result<Value, TinyError> {
    Ok(Value::Double(as_f64_arg(args, "sin")?.sin()))
}

fn cos(args: &[Value]) -> Result<Value, TinyError> {
    Ok(Value::Double(as_f64_arg(args, "cos")?.cos()))
}

fn sqrt(args: &[Value]) -> Result<Value, TinyError> {
    let x = as_f64_arg(args, "sqrt")?;
    if x < 0.0 {
        return Err(TinyError::type_error("sqrt", "argument must be non-negative"));
    }
    Ok(Value::Double(x.sqrt()))
}

fn floor(args: &[Value]) -> Result<Value, TinyError> {
    Ok(Value::Int(as_f64_arg(args, "floor")?.floor() as i64))
}

/// Returns a `Double` uniformly distributed in `[0, 1)`.
fn random(args: &[Value]) -> Result<Value, TinyError> {
    if !args.is_empty() {
        return Err(TinyError::arity_error("random", 0, args.len()));
    }
    Ok(Value::Double(rand::thread_rng().gen_range(0.0..1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_of_negative_is_a_type_error() {
        assert!(sqrt(&[Value::Int(-1)]).is_err());
    }

    #[test]
    fn floor_truncates_towards_negative_infinity() {
        assert!(matches!(floor(&[Value::Double(-1.5)]), Ok(Value::Int(-2))));
    }

    #[test]
    fn random_is_within_unit_interval() {
        for _ in 0..100 {
            if let Ok(Value::Double(n)) = random(&[]) {
                assert!((0.0..1.0).contains(&n));
            } else {
                panic!("random did not return a Double");
            }
        }
    }

    #[test]
    fn sin_wrong_arity_is_an_error() {
        assert!(sin(&[]).is_err());
    }
}
