//! The Tin value model.
//!
//! Values are dynamically typed and classified at use:
//! - `Int`: literal integers and int-typed results
//! - `Float`: results of division and mixed arithmetic
//! - `Str`: quoted literals `'…'`
//! - `Bool`: results of predicates
//! - `Array`: dense n-dimensional numeric arrays
//!
//! Binary operations take their first operand from the top of the stack,
//! so `A B op` computes `B op A`.

use crate::array::NumArray;
use crate::error::TinError;
use std::fmt;

/// Arithmetic operator selector shared by the scalar and array paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Comparison operator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Gt,
}

/// A single stack cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Array(NumArray),
}

impl Value {
    /// Short type name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
        }
    }

    /// Truthiness: zero, empty string and empty array are falsy. Arrays
    /// defer to their single element and are ambiguous with more.
    pub fn truthy(&self) -> Result<bool, TinError> {
        match self {
            Value::Int(n) => Ok(*n != 0),
            Value::Float(x) => Ok(*x != 0.0),
            Value::Bool(b) => Ok(*b),
            Value::Str(s) => Ok(!s.is_empty()),
            Value::Array(a) => match a.size() {
                0 => Ok(false),
                1 => a.index(0)?.truthy(),
                _ => Err(TinError::Type {
                    op: "truth".into(),
                    msg: "truth value of a multi-element array is ambiguous".into(),
                }),
            },
        }
    }

    /// Integer view of a numeric scalar (bools count as 0/1, floats
    /// truncate). None for strings and arrays.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(x) => Some(*x as i64),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Float view of a numeric scalar. None for strings and arrays.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Bool(b) => Some(*b as i64 as f64),
            _ => None,
        }
    }

    /// Strict integer operand (no float truncation), for index-like ops.
    pub fn as_index(&self, op: &str) -> Result<i64, TinError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(*b as i64),
            other => Err(TinError::Type {
                op: op.into(),
                msg: format!("expected an integer, got {}", other.kind()),
            }),
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }
}

/// Binary arithmetic. `x` is the first popped operand (the stack top).
pub fn arith(op: ArithOp, x: &Value, y: &Value) -> Result<Value, TinError> {
    // Array on either side: broadcast elementwise.
    if matches!(x, Value::Array(_)) || matches!(y, Value::Array(_)) {
        let ax = NumArray::from_scalar(x)?;
        let ay = NumArray::from_scalar(y)?;
        return Ok(Value::Array(NumArray::elementwise(op, &ax, &ay)?));
    }

    match (x, y) {
        (Value::Str(a), Value::Str(b)) if op == ArithOp::Add => {
            Ok(Value::Str(format!("{}{}", a, b)))
        }
        (Value::Str(s), n) | (n, Value::Str(s))
            if op == ArithOp::Mul && n.as_i64().is_some() && !matches!(n, Value::Float(_)) =>
        {
            let count = n.as_i64().expect("checked above").max(0) as usize;
            Ok(Value::Str(s.repeat(count)))
        }
        _ => {
            let (a, b) = match (x.as_f64(), y.as_f64()) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(TinError::Type {
                        op: glyph_of(op).into(),
                        msg: format!("cannot combine {} and {}", x.kind(), y.kind()),
                    })
                }
            };
            if op == ArithOp::Div {
                // True division: always float, zero divisors yield inf/nan.
                return Ok(Value::Float(a / b));
            }
            if x.is_float() || y.is_float() {
                Ok(Value::Float(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Rem => a - b * (a / b).floor(),
                    ArithOp::Div => unreachable!(),
                }))
            } else {
                let (a, b) = (
                    x.as_i64().expect("numeric scalar"),
                    y.as_i64().expect("numeric scalar"),
                );
                Ok(Value::Int(match op {
                    ArithOp::Add => a.wrapping_add(b),
                    ArithOp::Sub => a.wrapping_sub(b),
                    ArithOp::Mul => a.wrapping_mul(b),
                    ArithOp::Rem => {
                        if b == 0 {
                            return Err(TinError::DivisionByZero);
                        }
                        let r = a.wrapping_rem(b);
                        if r != 0 && (r < 0) != (b < 0) {
                            r + b
                        } else {
                            r
                        }
                    }
                    ArithOp::Div => unreachable!(),
                }))
            }
        }
    }
}

/// Ordered comparison. `x` is the first popped operand (the stack top).
pub fn compare(op: CmpOp, x: &Value, y: &Value) -> Result<Value, TinError> {
    if matches!(x, Value::Array(_)) || matches!(y, Value::Array(_)) {
        let ax = NumArray::from_scalar(x)?;
        let ay = NumArray::from_scalar(y)?;
        return Ok(Value::Array(NumArray::compare(op, &ax, &ay)?));
    }
    match (x, y) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(match op {
            CmpOp::Lt => a < b,
            CmpOp::Gt => a > b,
        })),
        _ => match (x.as_f64(), y.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Bool(match op {
                CmpOp::Lt => a < b,
                CmpOp::Gt => a > b,
            })),
            _ => Err(TinError::Type {
                op: match op {
                    CmpOp::Lt => "<".into(),
                    CmpOp::Gt => ">".into(),
                },
                msg: format!("cannot compare {} and {}", x.kind(), y.kind()),
            }),
        },
    }
}

fn glyph_of(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "·",
        ArithOp::Div => "/",
        ArithOp::Rem => "%",
    }
}

/// Format a float the way the reference output does: integral values keep
/// one decimal place so they remain visibly floats.
pub fn fmt_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", fmt_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(a) => write!(f, "{}", a),
        }
    }
}

/// Render a whole stack, bottom first.
pub fn format_stack(stack: &[Value]) -> String {
    let items: Vec<String> = stack.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}
