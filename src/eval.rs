// ABOUTME: Tree-walking evaluator: AST + environment -> values / side effects

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::ast::{AssignTarget, BinOp, Expr, RelOp, Stmt};
use crate::builtins::BuiltinRegistry;
use crate::env::{Environment, FrameId};
use crate::error::TinyError;
use crate::value::{FunctionValue, Value};

/// A sink for non-fatal evaluator diagnostics — currently only the
/// "variable read defaulted to 0" notice (spec design note: keep the
/// permissive default for source fidelity, but make the warning
/// configurable rather than silent by construction).
pub trait Diagnostics {
    fn warn(&self, message: &str);
}

/// The default: diagnostics are dropped. Used when a caller hasn't opted
/// into `--warn-undefined`.
pub struct NullDiagnostics;
impl Diagnostics for NullDiagnostics {
    fn warn(&self, _message: &str) {}
}

/// Prints diagnostics to stderr; wired in by the CLI when `--warn-undefined`
/// is passed.
pub struct StderrDiagnostics;
impl Diagnostics for StderrDiagnostics {
    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }
}

/// Collects diagnostics in memory; used by tests that assert a warning
/// fired without coupling the assertion to stderr.
#[derive(Default)]
pub struct CollectingDiagnostics(pub RefCell<Vec<String>>);
impl Diagnostics for CollectingDiagnostics {
    fn warn(&self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}

/// The result of evaluating a statement: an ordinary value, or a `return`
/// in flight. Replaces the "first non-unit value wins" rule with an
/// explicit control-flow signal, per design notes — only a genuine `return`
/// now stops a `Compound`/`While`/`For` early.
#[derive(Debug, Clone)]
pub enum Flow {
    Value(Value),
    Return(Value),
}

impl Flow {
    fn into_value(self) -> Value {
        match self {
            Flow::Value(v) | Flow::Return(v) => v,
        }
    }
}

static LAMBDA_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_lambda_name() -> String {
    format!("<lambda#{}>", LAMBDA_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Evaluates a whole program, unwrapping a trailing `return` (if any) to a
/// plain value just like a function call boundary would.
pub fn eval_program(
    program: &Stmt,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    diagnostics: &dyn Diagnostics,
) -> Result<Value, TinyError> {
    let flow = eval_stmt(program, env, builtins, None, diagnostics)?;
    Ok(flow.into_value())
}

fn eval_stmt(
    stmt: &Stmt,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<Flow, TinyError> {
    match stmt {
        Stmt::Assign(target, expr) => {
            let value = eval_expr(expr, env, builtins, frame, diag)?;
            assign(target, value, env, builtins, frame, diag)?;
            Ok(Flow::Value(Value::Unit))
        }
        Stmt::Compound(left, right) => match eval_stmt(left, env, builtins, frame, diag)? {
            Flow::Return(v) => Ok(Flow::Return(v)),
            Flow::Value(_) => eval_stmt(right, env, builtins, frame, diag),
        },
        Stmt::If(cond, then_branch, else_branch) => {
            if eval_bool(cond, env, builtins, frame, diag)? {
                eval_stmt(then_branch, env, builtins, frame, diag)
            } else if let Some(else_branch) = else_branch {
                eval_stmt(else_branch, env, builtins, frame, diag)
            } else {
                Ok(Flow::Value(Value::Unit))
            }
        }
        Stmt::While(cond, body) => {
            while eval_bool(cond, env, builtins, frame, diag)? {
                if let Flow::Return(v) = eval_stmt(body, env, builtins, frame, diag)? {
                    return Ok(Flow::Return(v));
                }
            }
            Ok(Flow::Value(Value::Unit))
        }
        Stmt::For(init, cond, post, body) => {
            if let Some(init) = init {
                eval_stmt(init, env, builtins, frame, diag)?;
            }
            loop {
                if let Some(cond) = cond {
                    if !eval_bool(cond, env, builtins, frame, diag)? {
                        break;
                    }
                }
                if let Flow::Return(v) = eval_stmt(body, env, builtins, frame, diag)? {
                    return Ok(Flow::Return(v));
                }
                if let Some(post) = post {
                    eval_stmt(post, env, builtins, frame, diag)?;
                }
            }
            Ok(Flow::Value(Value::Unit))
        }
        Stmt::FuncDecl(name, params, body) => {
            let func = Value::Function(Rc::new(FunctionValue {
                name: name.clone(),
                params: params.clone(),
                body: body.clone(),
                defining_scope: frame,
            }));
            env.define(frame, name.clone(), func.clone());
            Ok(Flow::Value(func))
        }
        Stmt::LambdaDecl(params, body) => {
            let func = Value::Function(Rc::new(FunctionValue {
                name: next_lambda_name(),
                params: params.clone(),
                body: body.clone(),
                defining_scope: frame,
            }));
            Ok(Flow::Value(func))
        }
        Stmt::Call(name, args) => {
            let value = eval_call(name, args, env, builtins, frame, diag)?;
            Ok(Flow::Value(value))
        }
        Stmt::Return(expr) => {
            let value = eval_expr(expr, env, builtins, frame, diag)?;
            Ok(Flow::Return(value))
        }
        Stmt::Expr(expr) => {
            let value = eval_expr(expr, env, builtins, frame, diag)?;
            Ok(Flow::Value(value))
        }
    }
}

fn eval_bool(
    expr: &Expr,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<bool, TinyError> {
    let value = eval_expr(expr, env, builtins, frame, diag)?;
    value
        .as_bool()
        .ok_or_else(|| TinyError::type_error("condition", format!("expected bool, got {}", value.type_name())))
}

fn assign(
    target: &AssignTarget,
    value: Value,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<(), TinyError> {
    match target {
        AssignTarget::Name(name) => {
            env.assign(frame, name, value);
            Ok(())
        }
        AssignTarget::Subscript(name, indices) => {
            assign_subscript(name, indices, value, env, builtins, frame, diag)
        }
    }
}

fn assign_subscript(
    name: &str,
    indices: &[Expr],
    value: Value,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<(), TinyError> {
    let container = env
        .get(frame, name)
        .ok_or_else(|| TinyError::type_error("[]", format!("`{name}` is not an array")))?;
    let mut cell = match container {
        Value::Array(cell) => cell,
        other => {
            return Err(TinyError::type_error(
                "[]",
                format!("cannot index into {}", other.type_name()),
            ))
        }
    };

    let mut idx_values = Vec::with_capacity(indices.len());
    for idx_expr in indices {
        idx_values.push(eval_index(idx_expr, env, builtins, frame, diag)?);
    }

    for &idx in &idx_values[..idx_values.len() - 1] {
        let next = {
            let borrowed = cell.borrow();
            let len = borrowed.len();
            if idx < 0 || idx as usize >= len {
                return Err(TinyError::IndexError { index: idx, len });
            }
            match &borrowed[idx as usize] {
                Value::Array(inner) => inner.clone(),
                other => {
                    return Err(TinyError::type_error(
                        "[]",
                        format!("cannot index into {}", other.type_name()),
                    ))
                }
            }
        };
        cell = next;
    }

    let last_idx = *idx_values.last().expect("subscript has at least one index");
    let mut borrowed = cell.borrow_mut();
    let len = borrowed.len();
    if last_idx < 0 || last_idx as usize >= len {
        return Err(TinyError::IndexError { index: last_idx, len });
    }
    borrowed[last_idx as usize] = value;
    Ok(())
}

fn eval_index(
    expr: &Expr,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<i64, TinyError> {
    let value = eval_expr(expr, env, builtins, frame, diag)?;
    match value {
        Value::Int(n) => Ok(n),
        other => Err(TinyError::type_error(
            "[]",
            format!("index must be an int, got {}", other.type_name()),
        )),
    }
}

fn eval_expr(
    expr: &Expr,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<Value, TinyError> {
    match expr {
        Expr::IntLit(n) => Ok(Value::Int(*n)),
        Expr::DoubleLit(n) => Ok(Value::Double(*n)),
        Expr::StrLit(s) => Ok(Value::Str(s.clone())),
        Expr::BoolLit(b) => Ok(Value::Bool(*b)),
        Expr::Var(name) => match env.get(frame, name) {
            Some(v) => Ok(v),
            None => {
                diag.warn(&format!(
                    "variable `{name}` is undefined; defaulting to 0"
                ));
                Ok(Value::Int(0))
            }
        },
        Expr::Subscript(name, indices) => {
            let container = env
                .get(frame, name)
                .ok_or_else(|| TinyError::type_error("[]", format!("`{name}` is not an array")))?;
            let mut current = container;
            for idx_expr in indices {
                let idx = eval_index(idx_expr, env, builtins, frame, diag)?;
                let cell = match current {
                    Value::Array(cell) => cell,
                    other => {
                        return Err(TinyError::type_error(
                            "[]",
                            format!("cannot index into {}", other.type_name()),
                        ))
                    }
                };
                let borrowed = cell.borrow();
                let len = borrowed.len();
                if idx < 0 || idx as usize >= len {
                    return Err(TinyError::IndexError { index: idx, len });
                }
                current = borrowed[idx as usize].clone();
            }
            Ok(current)
        }
        Expr::BinOp(op, l, r) => {
            let lv = eval_expr(l, env, builtins, frame, diag)?;
            let rv = eval_expr(r, env, builtins, frame, diag)?;
            eval_binop(*op, lv, rv)
        }
        Expr::RelOp(op, l, r) => {
            let lv = eval_expr(l, env, builtins, frame, diag)?;
            let rv = eval_expr(r, env, builtins, frame, diag)?;
            eval_relop(*op, lv, rv)
        }
        Expr::And(l, r) => {
            let lv = eval_expr(l, env, builtins, frame, diag)?;
            let rv = eval_expr(r, env, builtins, frame, diag)?;
            bool_op("andalso", lv, rv, |a, b| a && b)
        }
        Expr::Or(l, r) => {
            let lv = eval_expr(l, env, builtins, frame, diag)?;
            let rv = eval_expr(r, env, builtins, frame, diag)?;
            bool_op("orelse", lv, rv, |a, b| a || b)
        }
        Expr::Xor(l, r) => {
            let lv = eval_expr(l, env, builtins, frame, diag)?;
            let rv = eval_expr(r, env, builtins, frame, diag)?;
            bool_op("xor", lv, rv, |a, b| a ^ b)
        }
        Expr::Not(e) => {
            let v = eval_expr(e, env, builtins, frame, diag)?;
            match v {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(TinyError::type_error(
                    "not",
                    format!("expected bool, got {}", other.type_name()),
                )),
            }
        }
        Expr::Neg(e) => {
            let v = eval_expr(e, env, builtins, frame, diag)?;
            match v {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Double(n) => Ok(Value::Double(-n)),
                other => Err(TinyError::type_error(
                    "~",
                    format!("expected numeric operand, got {}", other.type_name()),
                )),
            }
        }
        Expr::Call(name, args) => eval_call(name, args, env, builtins, frame, diag),
        Expr::ArrayInit(size, init) => {
            let size_v = eval_expr(size, env, builtins, frame, diag)?;
            let n = match size_v {
                Value::Int(n) if n >= 0 => n as usize,
                other => {
                    return Err(TinyError::type_error(
                        "array",
                        format!("size must be a non-negative int, got {}", other.type_name()),
                    ))
                }
            };
            let cells = match init {
                None => vec![Value::Int(0); n],
                Some(init_expr) => {
                    let init_v = eval_expr(init_expr, env, builtins, frame, diag)?;
                    (0..n).map(|_| deep_clone(&init_v)).collect()
                }
            };
            Ok(Value::Array(Rc::new(RefCell::new(cells))))
        }
    }
}

/// Deep-copies nested arrays so each cell of an `array(n, array(m, 0))`
/// initializer is an independently owned array, never an alias.
fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Array(cell) => Value::Array(Rc::new(RefCell::new(
            cell.borrow().iter().map(deep_clone).collect(),
        ))),
        other => other.clone(),
    }
}

fn bool_op(
    operator: &str,
    l: Value,
    r: Value,
    f: impl Fn(bool, bool) -> bool,
) -> Result<Value, TinyError> {
    match (l, r) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(f(a, b))),
        (l, r) => Err(TinyError::type_error(
            operator,
            format!("expected two bools, got {} and {}", l.type_name(), r.type_name()),
        )),
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Double(n) => Some(*n),
        _ => None,
    }
}

fn as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(n) => Some(*n),
        _ => None,
    }
}

fn eval_binop(op: BinOp, l: Value, r: Value) -> Result<Value, TinyError> {
    let op_name = |op: BinOp| match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::FloorDiv => "div",
        BinOp::Mod => "%",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "shl",
        BinOp::Shr => "shr",
    };
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul => {
            if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
                return Ok(Value::Int(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    _ => unreachable!(),
                }));
            }
            let a = as_f64(&l).ok_or_else(|| {
                TinyError::type_error(op_name(op), format!("unsupported operand {}", l.type_name()))
            })?;
            let b = as_f64(&r).ok_or_else(|| {
                TinyError::type_error(op_name(op), format!("unsupported operand {}", r.type_name()))
            })?;
            Ok(Value::Double(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                _ => unreachable!(),
            }))
        }
        BinOp::Div => {
            let a = as_f64(&l).ok_or_else(|| TinyError::type_error("/", "operand must be numeric"))?;
            let b = as_f64(&r).ok_or_else(|| TinyError::type_error("/", "operand must be numeric"))?;
            if b == 0.0 {
                return Err(TinyError::DivideByZero { operator: "/".to_string() });
            }
            Ok(Value::Double(a / b))
        }
        BinOp::FloorDiv => {
            let a = as_i64(&l).ok_or_else(|| TinyError::type_error("div", "operands must be int"))?;
            let b = as_i64(&r).ok_or_else(|| TinyError::type_error("div", "operands must be int"))?;
            if b == 0 {
                return Err(TinyError::DivideByZero { operator: "div".to_string() });
            }
            let q = a / b;
            let floor_q = if (a % b != 0) && ((a < 0) != (b < 0)) { q - 1 } else { q };
            Ok(Value::Int(floor_q))
        }
        BinOp::Mod => {
            if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
                if *b == 0 {
                    return Err(TinyError::DivideByZero { operator: "%".to_string() });
                }
                let r = a % b;
                let floor_r = if r != 0 && (r < 0) != (*b < 0) { r + b } else { r };
                return Ok(Value::Int(floor_r));
            }
            let a = as_f64(&l).ok_or_else(|| TinyError::type_error("%", "operand must be numeric"))?;
            let b = as_f64(&r).ok_or_else(|| TinyError::type_error("%", "operand must be numeric"))?;
            if b == 0.0 {
                return Err(TinyError::DivideByZero { operator: "%".to_string() });
            }
            let r = a % b;
            let floor_r = if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r };
            Ok(Value::Double(floor_r))
        }
        BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => {
            let a = as_i64(&l).ok_or_else(|| {
                TinyError::type_error(op_name(op), "bitwise operands must be int")
            })?;
            let b = as_i64(&r).ok_or_else(|| {
                TinyError::type_error(op_name(op), "bitwise operands must be int")
            })?;
            Ok(Value::Int(match op {
                BinOp::BitAnd => a & b,
                BinOp::BitOr => a | b,
                BinOp::BitXor => a ^ b,
                BinOp::Shl => a << b,
                BinOp::Shr => a >> b,
                _ => unreachable!(),
            }))
        }
    }
}

fn eval_relop(op: RelOp, l: Value, r: Value) -> Result<Value, TinyError> {
    if let (Some(a), Some(b)) = (as_f64(&l), as_f64(&r)) {
        return Ok(Value::Bool(match op {
            RelOp::Gt => a > b,
            RelOp::Lt => a < b,
            RelOp::Ge => a >= b,
            RelOp::Le => a <= b,
            RelOp::Eq => a == b,
            RelOp::Ne => a != b,
        }));
    }
    if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
        return Ok(Value::Bool(match op {
            RelOp::Gt => a > b,
            RelOp::Lt => a < b,
            RelOp::Ge => a >= b,
            RelOp::Le => a <= b,
            RelOp::Eq => a == b,
            RelOp::Ne => a != b,
        }));
    }
    if let (Value::Bool(a), Value::Bool(b)) = (&l, &r) {
        return match op {
            RelOp::Eq => Ok(Value::Bool(a == b)),
            RelOp::Ne => Ok(Value::Bool(a != b)),
            _ => Err(TinyError::type_error("relop", "bool only supports = and !=")),
        };
    }
    Err(TinyError::type_error(
        "relop",
        format!("cannot compare {} and {}", l.type_name(), r.type_name()),
    ))
}

fn eval_call(
    name: &str,
    args: &[Expr],
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    frame: Option<FrameId>,
    diag: &dyn Diagnostics,
) -> Result<Value, TinyError> {
    let arg_values: Vec<Value> = args
        .iter()
        .map(|a| eval_expr(a, env, builtins, frame, diag))
        .collect::<Result<_, _>>()?;

    if let Some(builtin) = builtins.get(name) {
        return builtin(&arg_values);
    }

    let func_value = env
        .get(frame, name)
        .ok_or_else(|| TinyError::NameError(name.to_string()))?;
    let func = match func_value {
        Value::Function(f) => f,
        _ => return Err(TinyError::NameError(name.to_string())),
    };
    if func.params.len() != arg_values.len() {
        return Err(TinyError::arity_error(name, func.params.len(), arg_values.len()));
    }

    let call_frame = env.push_frame(func.defining_scope);
    env.define(Some(call_frame), func.name.clone(), Value::Function(func.clone()));
    for (param, value) in func.params.iter().zip(arg_values) {
        env.define(Some(call_frame), param.clone(), value);
    }

    let flow = eval_stmt(&func.body, env, builtins, Some(call_frame), diag)?;
    Ok(flow.into_value())
}
