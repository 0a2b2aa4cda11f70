//! Evaluation of the pure fixed-arity intrinsics.
//!
//! The engine pops `arity()` values (first pop = first argument, i.e. the
//! stack top arrives first) and pushes the result when one is produced.
//! `$` is the single intrinsic with a side effect and no result.

use crate::array::NumArray;
use crate::error::TinError;
use crate::token::Intrinsic;
use crate::value::{self, ArithOp, CmpOp, Value};

fn type_err(op: Intrinsic, v: &Value) -> TinError {
    TinError::Type {
        op: op.glyph().into(),
        msg: format!("unsupported operand {}", v.kind()),
    }
}

/// Apply an intrinsic to its popped arguments.
pub fn apply(op: Intrinsic, args: &[Value]) -> Result<Option<Value>, TinError> {
    use Intrinsic::*;
    let result = match op {
        Add => Some(value::arith(ArithOp::Add, &args[0], &args[1])?),
        Sub => Some(value::arith(ArithOp::Sub, &args[0], &args[1])?),
        Mul => Some(value::arith(ArithOp::Mul, &args[0], &args[1])?),
        Div => Some(value::arith(ArithOp::Div, &args[0], &args[1])?),
        Rem => Some(value::arith(ArithOp::Rem, &args[0], &args[1])?),

        Inc => Some(value::arith(ArithOp::Add, &args[0], &Value::Int(1))?),
        Dec => Some(value::arith(ArithOp::Sub, &args[0], &Value::Int(1))?),

        ToBool => Some(match &args[0] {
            Value::Array(a) => Value::Array(a.to_bool()),
            v => Value::Bool(v.truthy()?),
        }),

        Lt => Some(value::compare(CmpOp::Lt, &args[0], &args[1])?),
        Gt => Some(value::compare(CmpOp::Gt, &args[0], &args[1])?),

        Any => Some(Value::Bool(match &args[0] {
            Value::Array(a) => a.any(),
            v => v.truthy()?,
        })),
        NoneOf => Some(Value::Bool(match &args[0] {
            Value::Array(a) => !a.any(),
            v => !v.truthy()?,
        })),
        All => Some(Value::Bool(match &args[0] {
            Value::Array(a) => a.all(),
            v => v.truthy()?,
        })),

        Print => {
            println!("{}", args[0]);
            None
        }

        Range => Some(Value::Array(NumArray::arange(&args[0])?)),
        Wrap => Some(Value::Array(NumArray::wrap(&args[0])?)),
        Replicate => {
            let n = args[0].as_index("R")?;
            Some(Value::Array(NumArray::replicate(n, &args[1])?))
        }
        Index => {
            let i = args[0].as_index("↓")?;
            match &args[1] {
                Value::Array(a) => Some(a.index(i)?),
                Value::Str(s) => {
                    let len = s.chars().count();
                    let idx = if i < 0 { i + len as i64 } else { i };
                    let c = if idx >= 0 { s.chars().nth(idx as usize) } else { None };
                    Some(Value::Str(
                        c.ok_or(TinError::Index { index: i, len })?.to_string(),
                    ))
                }
                other => return Err(type_err(op, other)),
            }
        }
        Assign => {
            let i = args[0].as_index("↑")?;
            match &args[2] {
                Value::Array(a) => Some(Value::Array(a.clone().assign(i, &args[1])?)),
                other => return Err(type_err(op, other)),
            }
        }

        Sum => Some(match &args[0] {
            Value::Array(a) => a.sum(),
            v if v.as_f64().is_some() => v.clone(),
            other => return Err(type_err(op, other)),
        }),
        Product => Some(match &args[0] {
            Value::Array(a) => a.product(),
            v if v.as_f64().is_some() => v.clone(),
            other => return Err(type_err(op, other)),
        }),

        DropFirst => Some(match &args[0] {
            Value::Array(a) => Value::Array(a.drop_first()),
            Value::Str(s) => Value::Str(s.chars().skip(1).collect()),
            other => return Err(type_err(op, other)),
        }),
        DropLast => Some(match &args[0] {
            Value::Array(a) => Value::Array(a.drop_last()),
            Value::Str(s) => {
                let n = s.chars().count().saturating_sub(1);
                Value::Str(s.chars().take(n).collect())
            }
            other => return Err(type_err(op, other)),
        }),

        Length => Some(match &args[0] {
            Value::Array(a) => Value::Int(a.len_axis0() as i64),
            Value::Str(s) => Value::Int(s.chars().count() as i64),
            other => return Err(type_err(op, other)),
        }),
        Count => match &args[1] {
            Value::Array(a) => Some(Value::Int(a.count(&args[0])?)),
            other => return Err(type_err(op, other)),
        },
    };
    Ok(result)
}
