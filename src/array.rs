//! Dense n-dimensional numeric arrays.
//!
//! `NumArray` is the array half of the value model: an `ndarray`-backed
//! container with one of three dtypes (int64, float64, bool) and
//! numpy-style promotion rules:
//! - arithmetic between int-like operands stays int64, any float operand
//!   promotes the result to float64, and bools count as 0/1;
//! - true division always produces float64;
//! - comparisons produce bool arrays;
//! - binary operations broadcast shapes (right-aligned, size-1 axes
//!   stretch), with scalars entering as 0-d arrays.

use crate::error::TinError;
use crate::value::{ArithOp, CmpOp, Value};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Slice, Zip};
use std::fmt;

/// An n-dimensional array with a dynamic numeric dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum NumArray {
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
    Bool(ArrayD<bool>),
}

/// Broadcast two shapes together (right-aligned, 1s stretch).
fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>, TinError> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0usize; ndim];
    for i in 0..ndim {
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        out[i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(TinError::Shape(format!("{:?} vs {:?}", a, b)));
        };
    }
    Ok(out)
}

/// Broadcast both operands to a common shape and combine elementwise.
fn zip_broadcast<T, U, F>(a: &ArrayD<T>, b: &ArrayD<T>, f: F) -> Result<ArrayD<U>, TinError>
where
    T: Clone,
    U: Clone,
    F: Fn(&T, &T) -> U,
{
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let mismatch = || TinError::Shape(format!("{:?} vs {:?}", a.shape(), b.shape()));
    let av: ArrayViewD<T> = a.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
    let bv: ArrayViewD<T> = b.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
    Ok(Zip::from(&av).and(&bv).map_collect(|x, y| f(x, y)))
}

/// Floored integer modulo: the result takes the divisor's sign.
/// The divisor must be checked non-zero by the caller.
fn imod(x: i64, y: i64) -> i64 {
    let r = x.wrapping_rem(y);
    if r != 0 && (r < 0) != (y < 0) {
        r + y
    } else {
        r
    }
}

/// Floored float modulo: `x - y * floor(x / y)`.
fn fmod(x: f64, y: f64) -> f64 {
    x - y * (x / y).floor()
}

impl NumArray {
    /// Lift a scalar into a 0-d array so it can broadcast against any shape.
    pub fn from_scalar(v: &Value) -> Result<NumArray, TinError> {
        match v {
            Value::Int(n) => Ok(NumArray::Int(ArrayD::from_elem(IxDyn(&[]), *n))),
            Value::Float(x) => Ok(NumArray::Float(ArrayD::from_elem(IxDyn(&[]), *x))),
            Value::Bool(b) => Ok(NumArray::Bool(ArrayD::from_elem(IxDyn(&[]), *b))),
            Value::Array(a) => Ok(a.clone()),
            Value::Str(_) => Err(TinError::Type {
                op: "array".into(),
                msg: "strings do not participate in array arithmetic".into(),
            }),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            NumArray::Int(a) => a.shape(),
            NumArray::Float(a) => a.shape(),
            NumArray::Bool(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Length of the leading axis. 0-d arrays have length 1 (they hold a
    /// single scalar).
    pub fn len_axis0(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    fn is_float(&self) -> bool {
        matches!(self, NumArray::Float(_))
    }

    fn to_i64(&self) -> ArrayD<i64> {
        match self {
            NumArray::Int(a) => a.clone(),
            NumArray::Float(a) => a.mapv(|x| x as i64),
            NumArray::Bool(a) => a.mapv(|b| b as i64),
        }
    }

    fn to_f64(&self) -> ArrayD<f64> {
        match self {
            NumArray::Int(a) => a.mapv(|n| n as f64),
            NumArray::Float(a) => a.clone(),
            NumArray::Bool(a) => a.mapv(|b| if b { 1.0 } else { 0.0 }),
        }
    }

    /// Elementwise arithmetic with broadcasting. `x` is the first operand
    /// (the one popped first, i.e. the stack top) and `y` the second, so
    /// the result is `x OP y`.
    pub fn elementwise(op: ArithOp, x: &NumArray, y: &NumArray) -> Result<NumArray, TinError> {
        // True division always goes through float64.
        if op == ArithOp::Div {
            let r = zip_broadcast(&x.to_f64(), &y.to_f64(), |a, b| a / b)?;
            return Ok(NumArray::Float(r));
        }

        if x.is_float() || y.is_float() {
            let xf = x.to_f64();
            let yf = y.to_f64();
            let r = match op {
                ArithOp::Add => zip_broadcast(&xf, &yf, |a, b| a + b)?,
                ArithOp::Sub => zip_broadcast(&xf, &yf, |a, b| a - b)?,
                ArithOp::Mul => zip_broadcast(&xf, &yf, |a, b| a * b)?,
                ArithOp::Rem => zip_broadcast(&xf, &yf, |a, b| fmod(*a, *b))?,
                ArithOp::Div => unreachable!(),
            };
            Ok(NumArray::Float(r))
        } else {
            let xi = x.to_i64();
            let yi = y.to_i64();
            let r = match op {
                ArithOp::Add => zip_broadcast(&xi, &yi, |a, b| a.wrapping_add(*b))?,
                ArithOp::Sub => zip_broadcast(&xi, &yi, |a, b| a.wrapping_sub(*b))?,
                ArithOp::Mul => zip_broadcast(&xi, &yi, |a, b| a.wrapping_mul(*b))?,
                ArithOp::Rem => {
                    if yi.iter().any(|&d| d == 0) {
                        return Err(TinError::DivisionByZero);
                    }
                    zip_broadcast(&xi, &yi, |a, b| imod(*a, *b))?
                }
                ArithOp::Div => unreachable!(),
            };
            Ok(NumArray::Int(r))
        }
    }

    /// Elementwise comparison with broadcasting; result dtype is bool.
    pub fn compare(op: CmpOp, x: &NumArray, y: &NumArray) -> Result<NumArray, TinError> {
        let r = if x.is_float() || y.is_float() {
            let xf = x.to_f64();
            let yf = y.to_f64();
            match op {
                CmpOp::Lt => zip_broadcast(&xf, &yf, |a, b| a < b)?,
                CmpOp::Gt => zip_broadcast(&xf, &yf, |a, b| a > b)?,
            }
        } else {
            let xi = x.to_i64();
            let yi = y.to_i64();
            match op {
                CmpOp::Lt => zip_broadcast(&xi, &yi, |a, b| a < b)?,
                CmpOp::Gt => zip_broadcast(&xi, &yi, |a, b| a > b)?,
            }
        };
        Ok(NumArray::Bool(r))
    }

    /// Elementwise truthiness (`𝔹`).
    pub fn to_bool(&self) -> NumArray {
        match self {
            NumArray::Int(a) => NumArray::Bool(a.mapv(|n| n != 0)),
            NumArray::Float(a) => NumArray::Bool(a.mapv(|x| x != 0.0)),
            NumArray::Bool(a) => NumArray::Bool(a.clone()),
        }
    }

    /// Any element truthy. False on empty.
    pub fn any(&self) -> bool {
        match self {
            NumArray::Int(a) => a.iter().any(|&n| n != 0),
            NumArray::Float(a) => a.iter().any(|&x| x != 0.0),
            NumArray::Bool(a) => a.iter().any(|&b| b),
        }
    }

    /// All elements truthy. True on empty.
    pub fn all(&self) -> bool {
        match self {
            NumArray::Int(a) => a.iter().all(|&n| n != 0),
            NumArray::Float(a) => a.iter().all(|&x| x != 0.0),
            NumArray::Bool(a) => a.iter().all(|&b| b),
        }
    }

    /// Sum of all elements. Bool arrays sum to the count of set elements.
    pub fn sum(&self) -> Value {
        match self {
            NumArray::Int(a) => Value::Int(a.iter().fold(0i64, |s, &n| s.wrapping_add(n))),
            NumArray::Float(a) => Value::Float(a.iter().sum()),
            NumArray::Bool(a) => Value::Int(a.iter().filter(|&&b| b).count() as i64),
        }
    }

    /// Product of all elements. The empty product is 1.
    pub fn product(&self) -> Value {
        match self {
            NumArray::Int(a) => Value::Int(a.iter().fold(1i64, |p, &n| p.wrapping_mul(n))),
            NumArray::Float(a) => Value::Float(a.iter().product()),
            NumArray::Bool(a) => Value::Int(a.iter().fold(1i64, |p, &b| p * b as i64)),
        }
    }

    /// `ι`: the half-open range `[0, n)` as a 1-d array. A float bound
    /// produces float steps; a negative bound produces an empty array.
    pub fn arange(v: &Value) -> Result<NumArray, TinError> {
        match v {
            Value::Int(n) => {
                let n = (*n).max(0);
                Ok(NumArray::Int(
                    ArrayD::from_shape_vec(IxDyn(&[n as usize]), (0..n).collect())
                        .expect("range data matches shape"),
                ))
            }
            Value::Bool(b) => Self::arange(&Value::Int(*b as i64)),
            Value::Float(x) => {
                let count = if *x > 0.0 { x.ceil() as i64 } else { 0 };
                Ok(NumArray::Float(
                    ArrayD::from_shape_vec(
                        IxDyn(&[count as usize]),
                        (0..count).map(|i| i as f64).collect(),
                    )
                    .expect("range data matches shape"),
                ))
            }
            _ => Err(TinError::Type {
                op: "ι".into(),
                msg: format!("cannot build a range from {}", v.kind()),
            }),
        }
    }

    /// `□`: wrap a value in a length-1 leading axis. Scalars become 1-d
    /// single-element arrays; arrays gain an outer dimension.
    pub fn wrap(v: &Value) -> Result<NumArray, TinError> {
        match v {
            Value::Int(n) => Ok(NumArray::Int(
                ArrayD::from_shape_vec(IxDyn(&[1]), vec![*n]).expect("one element"),
            )),
            Value::Float(x) => Ok(NumArray::Float(
                ArrayD::from_shape_vec(IxDyn(&[1]), vec![*x]).expect("one element"),
            )),
            Value::Bool(b) => Ok(NumArray::Bool(
                ArrayD::from_shape_vec(IxDyn(&[1]), vec![*b]).expect("one element"),
            )),
            Value::Array(a) => {
                let mut shape = vec![1];
                shape.extend_from_slice(a.shape());
                Ok(match a {
                    NumArray::Int(a) => NumArray::Int(
                        ArrayD::from_shape_vec(IxDyn(&shape), a.iter().cloned().collect())
                            .expect("same element count"),
                    ),
                    NumArray::Float(a) => NumArray::Float(
                        ArrayD::from_shape_vec(IxDyn(&shape), a.iter().cloned().collect())
                            .expect("same element count"),
                    ),
                    NumArray::Bool(a) => NumArray::Bool(
                        ArrayD::from_shape_vec(IxDyn(&shape), a.iter().cloned().collect())
                            .expect("same element count"),
                    ),
                })
            }
            Value::Str(_) => Err(TinError::Type {
                op: "□".into(),
                msg: "cannot wrap a string into a numeric array".into(),
            }),
        }
    }

    /// `R`: `n` copies of `item` along a new leading axis. A non-positive
    /// count yields an empty float array, mirroring the host library's
    /// default dtype for an empty literal.
    pub fn replicate(n: i64, item: &Value) -> Result<NumArray, TinError> {
        if n <= 0 {
            return Ok(NumArray::Float(
                ArrayD::from_shape_vec(IxDyn(&[0]), vec![]).expect("empty"),
            ));
        }
        let n = n as usize;
        match item {
            Value::Int(v) => Ok(NumArray::Int(
                ArrayD::from_shape_vec(IxDyn(&[n]), vec![*v; n]).expect("n elements"),
            )),
            Value::Float(v) => Ok(NumArray::Float(
                ArrayD::from_shape_vec(IxDyn(&[n]), vec![*v; n]).expect("n elements"),
            )),
            Value::Bool(v) => Ok(NumArray::Bool(
                ArrayD::from_shape_vec(IxDyn(&[n]), vec![*v; n]).expect("n elements"),
            )),
            Value::Array(a) => {
                let mut shape = vec![n];
                shape.extend_from_slice(a.shape());
                fn tile<T: Clone>(a: &ArrayD<T>, n: usize, shape: &[usize]) -> ArrayD<T> {
                    let mut data = Vec::with_capacity(a.len() * n);
                    for _ in 0..n {
                        data.extend(a.iter().cloned());
                    }
                    ArrayD::from_shape_vec(IxDyn(shape), data).expect("tiled data matches shape")
                }
                Ok(match a {
                    NumArray::Int(a) => NumArray::Int(tile(a, n, &shape)),
                    NumArray::Float(a) => NumArray::Float(tile(a, n, &shape)),
                    NumArray::Bool(a) => NumArray::Bool(tile(a, n, &shape)),
                })
            }
            Value::Str(_) => Err(TinError::Type {
                op: "R".into(),
                msg: "cannot replicate a string into a numeric array".into(),
            }),
        }
    }

    /// Aggregate a run of stack values into one array (the storer `)`).
    ///
    /// Dtype inference follows the host library: any float promotes the
    /// whole array to float64, otherwise any int gives int64, otherwise an
    /// all-bool run stays bool. An empty run is an empty float array.
    /// Stacking arrays requires equal shapes and adds a leading axis.
    pub fn from_values(items: &[Value]) -> Result<NumArray, TinError> {
        if items.is_empty() {
            return Ok(NumArray::Float(
                ArrayD::from_shape_vec(IxDyn(&[0]), vec![]).expect("empty"),
            ));
        }
        if items.iter().any(|v| matches!(v, Value::Str(_))) {
            return Err(TinError::Type {
                op: ")".into(),
                msg: "cannot aggregate strings into a numeric array".into(),
            });
        }

        let arrays: Vec<&NumArray> = items
            .iter()
            .filter_map(|v| match v {
                Value::Array(a) => Some(a),
                _ => None,
            })
            .collect();

        if arrays.is_empty() {
            // All scalars: one promoted 1-d array.
            let any_float = items.iter().any(|v| matches!(v, Value::Float(_)));
            let any_int = items.iter().any(|v| matches!(v, Value::Int(_)));
            let n = items.len();
            if any_float {
                let data = items.iter().map(|v| v.as_f64().expect("numeric")).collect();
                Ok(NumArray::Float(
                    ArrayD::from_shape_vec(IxDyn(&[n]), data).expect("n elements"),
                ))
            } else if any_int {
                let data = items.iter().map(|v| v.as_i64().expect("numeric")).collect();
                Ok(NumArray::Int(
                    ArrayD::from_shape_vec(IxDyn(&[n]), data).expect("n elements"),
                ))
            } else {
                let data = items
                    .iter()
                    .map(|v| matches!(v, Value::Bool(true)))
                    .collect();
                Ok(NumArray::Bool(
                    ArrayD::from_shape_vec(IxDyn(&[n]), data).expect("n elements"),
                ))
            }
        } else if arrays.len() == items.len() {
            // All arrays: stack along a new leading axis.
            let first_shape = arrays[0].shape().to_vec();
            if arrays.iter().any(|a| a.shape() != first_shape.as_slice()) {
                return Err(TinError::Shape(
                    "cannot stack arrays of differing shapes".into(),
                ));
            }
            let mut shape = vec![arrays.len()];
            shape.extend_from_slice(&first_shape);

            let any_float = arrays.iter().any(|a| a.is_float());
            let any_int = arrays.iter().any(|a| matches!(a, NumArray::Int(_)));
            if any_float {
                let mut data = Vec::new();
                for a in &arrays {
                    data.extend(a.to_f64().iter().cloned());
                }
                Ok(NumArray::Float(
                    ArrayD::from_shape_vec(IxDyn(&shape), data).expect("stacked data"),
                ))
            } else if any_int {
                let mut data = Vec::new();
                for a in &arrays {
                    data.extend(a.to_i64().iter().cloned());
                }
                Ok(NumArray::Int(
                    ArrayD::from_shape_vec(IxDyn(&shape), data).expect("stacked data"),
                ))
            } else {
                let mut data = Vec::new();
                for a in &arrays {
                    if let NumArray::Bool(a) = a {
                        data.extend(a.iter().cloned());
                    }
                }
                Ok(NumArray::Bool(
                    ArrayD::from_shape_vec(IxDyn(&shape), data).expect("stacked data"),
                ))
            }
        } else {
            Err(TinError::Shape(
                "cannot mix scalars and arrays in one aggregate".into(),
            ))
        }
    }

    fn resolve_index(&self, i: i64, op: &str) -> Result<usize, TinError> {
        if self.ndim() == 0 {
            return Err(TinError::Type {
                op: op.into(),
                msg: "cannot index a 0-d array".into(),
            });
        }
        let len = self.shape()[0];
        let idx = if i < 0 { i + len as i64 } else { i };
        if idx < 0 || idx as usize >= len {
            return Err(TinError::Index { index: i, len });
        }
        Ok(idx as usize)
    }

    /// `↓`: element `i` along the leading axis. Negative indices count
    /// from the end. On a 1-d array this yields a scalar, otherwise the
    /// sub-array at that position.
    pub fn index(&self, i: i64) -> Result<Value, TinError> {
        let idx = self.resolve_index(i, "↓")?;
        if self.ndim() == 1 {
            Ok(match self {
                NumArray::Int(a) => Value::Int(a[[idx]]),
                NumArray::Float(a) => Value::Float(a[[idx]]),
                NumArray::Bool(a) => Value::Bool(a[[idx]]),
            })
        } else {
            Ok(Value::Array(match self {
                NumArray::Int(a) => NumArray::Int(a.index_axis(Axis(0), idx).to_owned()),
                NumArray::Float(a) => NumArray::Float(a.index_axis(Axis(0), idx).to_owned()),
                NumArray::Bool(a) => NumArray::Bool(a.index_axis(Axis(0), idx).to_owned()),
            }))
        }
    }

    /// `↑`: assign `elem` at position `i` along the leading axis and
    /// return the array. The array keeps its dtype; the element is cast
    /// into it (floats truncate into int arrays, numbers collapse to
    /// truthiness in bool arrays).
    pub fn assign(mut self, i: i64, elem: &Value) -> Result<NumArray, TinError> {
        let idx = self.resolve_index(i, "↑")?;
        if self.ndim() == 1 {
            match (&mut self, elem) {
                (NumArray::Int(a), v) => a[[idx]] = v.as_i64().ok_or_else(|| cast_err(v))?,
                (NumArray::Float(a), v) => a[[idx]] = v.as_f64().ok_or_else(|| cast_err(v))?,
                (NumArray::Bool(a), v) => {
                    a[[idx]] = v.as_f64().ok_or_else(|| cast_err(v))? != 0.0
                }
            }
            Ok(self)
        } else {
            let sub = match elem {
                Value::Array(a) => a,
                other => {
                    return Err(TinError::Type {
                        op: "↑".into(),
                        msg: format!("cannot assign {} into a {}-d array row", other.kind(), self.ndim()),
                    })
                }
            };
            if sub.shape() != &self.shape()[1..] {
                return Err(TinError::Shape(format!(
                    "{:?} into row of {:?}",
                    sub.shape(),
                    self.shape()
                )));
            }
            match &mut self {
                NumArray::Int(a) => a.index_axis_mut(Axis(0), idx).assign(&sub.to_i64()),
                NumArray::Float(a) => a.index_axis_mut(Axis(0), idx).assign(&sub.to_f64()),
                NumArray::Bool(a) => {
                    let b = sub.to_f64().mapv(|x| x != 0.0);
                    a.index_axis_mut(Axis(0), idx).assign(&b)
                }
            }
            Ok(self)
        }
    }

    fn slice_axis0(&self, start: usize, end: usize) -> NumArray {
        let s = Slice::from(start..end);
        match self {
            NumArray::Int(a) => NumArray::Int(a.slice_axis(Axis(0), s).to_owned()),
            NumArray::Float(a) => NumArray::Float(a.slice_axis(Axis(0), s).to_owned()),
            NumArray::Bool(a) => NumArray::Bool(a.slice_axis(Axis(0), s).to_owned()),
        }
    }

    /// `` ` ``: everything after the first element. Empty stays empty.
    pub fn drop_first(&self) -> NumArray {
        let len = self.len_axis0();
        self.slice_axis0(1.min(len), len)
    }

    /// `´`: everything before the last element. Empty stays empty.
    pub fn drop_last(&self) -> NumArray {
        let len = self.len_axis0();
        self.slice_axis0(0, len.saturating_sub(1))
    }

    /// `#`: number of elements equal to `elem`.
    pub fn count(&self, elem: &Value) -> Result<i64, TinError> {
        let needle = elem.as_f64().ok_or_else(|| TinError::Type {
            op: "#".into(),
            msg: format!("cannot count occurrences of {}", elem.kind()),
        })?;
        let n = match self {
            NumArray::Int(a) => a.iter().filter(|&&v| v as f64 == needle).count(),
            NumArray::Float(a) => a.iter().filter(|&&v| v == needle).count(),
            NumArray::Bool(a) => {
                a.iter().filter(|&&v| (v as i64 as f64) == needle).count()
            }
        };
        Ok(n as i64)
    }

}

fn cast_err(v: &Value) -> TinError {
    TinError::Type {
        op: "↑".into(),
        msg: format!("cannot store {} in a numeric array", v.kind()),
    }
}

fn fmt_rec<T: Copy, F: Fn(&mut fmt::Formatter<'_>, T) -> fmt::Result>(
    f: &mut fmt::Formatter<'_>,
    a: &ArrayD<T>,
    one: &F,
) -> fmt::Result {
    if a.ndim() <= 1 {
        write!(f, "[")?;
        for (i, v) in a.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            one(f, *v)?;
        }
        write!(f, "]")
    } else {
        write!(f, "[")?;
        for i in 0..a.shape()[0] {
            if i > 0 {
                write!(f, " ")?;
            }
            fmt_rec(f, &a.index_axis(Axis(0), i).to_owned(), one)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for NumArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumArray::Int(a) => fmt_rec(f, a, &|f, v: i64| write!(f, "{}", v)),
            NumArray::Float(a) => {
                fmt_rec(f, a, &|f, v: f64| write!(f, "{}", crate::value::fmt_float(v)))
            }
            NumArray::Bool(a) => fmt_rec(f, a, &|f, v: bool| write!(f, "{}", v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: Vec<i64>) -> NumArray {
        let n = v.len();
        NumArray::Int(ArrayD::from_shape_vec(IxDyn(&[n]), v).unwrap())
    }

    #[test]
    fn arange_builds_half_open_range() {
        assert_eq!(NumArray::arange(&Value::Int(4)).unwrap(), ints(vec![0, 1, 2, 3]));
        assert_eq!(NumArray::arange(&Value::Int(0)).unwrap(), ints(vec![]));
        assert_eq!(NumArray::arange(&Value::Int(-3)).unwrap(), ints(vec![]));
    }

    #[test]
    fn int_arithmetic_stays_int() {
        let a = ints(vec![1, 2, 3]);
        let one = NumArray::from_scalar(&Value::Int(1)).unwrap();
        let r = NumArray::elementwise(ArithOp::Add, &a, &one).unwrap();
        assert_eq!(r, ints(vec![2, 3, 4]));
    }

    #[test]
    fn division_promotes_to_float() {
        let a = ints(vec![1, 2]);
        let two = NumArray::from_scalar(&Value::Int(2)).unwrap();
        match NumArray::elementwise(ArithOp::Div, &a, &two).unwrap() {
            NumArray::Float(r) => assert_eq!(r.as_slice().unwrap(), &[0.5, 1.0]),
            other => panic!("expected float array, got {:?}", other),
        }
    }

    #[test]
    fn modulo_takes_divisor_sign() {
        let a = ints(vec![-7, 7]);
        let three = NumArray::from_scalar(&Value::Int(3)).unwrap();
        let r = NumArray::elementwise(ArithOp::Rem, &a, &three).unwrap();
        assert_eq!(r, ints(vec![2, 1]));
    }

    #[test]
    fn modulo_by_zero_is_an_error() {
        let a = ints(vec![1, 2]);
        let zero = NumArray::from_scalar(&Value::Int(0)).unwrap();
        assert_eq!(
            NumArray::elementwise(ArithOp::Rem, &a, &zero),
            Err(TinError::DivisionByZero)
        );
    }

    #[test]
    fn scalar_modulo_empty_is_empty() {
        let n = NumArray::from_scalar(&Value::Int(7)).unwrap();
        let empty = ints(vec![]);
        let r = NumArray::elementwise(ArithOp::Rem, &n, &empty).unwrap();
        assert_eq!(r, ints(vec![]));
    }

    #[test]
    fn broadcast_rejects_incompatible_shapes() {
        let a = ints(vec![1, 2, 3]);
        let b = ints(vec![1, 2]);
        assert!(matches!(
            NumArray::elementwise(ArithOp::Add, &a, &b),
            Err(TinError::Shape(_))
        ));
    }

    #[test]
    fn reductions_on_empty() {
        let empty = ints(vec![]);
        assert!(!empty.any());
        assert!(empty.all());
        assert_eq!(empty.sum(), Value::Int(0));
        assert_eq!(empty.product(), Value::Int(1));
    }

    #[test]
    fn bool_sum_counts() {
        let b = NumArray::Bool(
            ArrayD::from_shape_vec(IxDyn(&[3]), vec![true, false, true]).unwrap(),
        );
        assert_eq!(b.sum(), Value::Int(2));
    }

    #[test]
    fn from_values_promotes_dtypes() {
        let r = NumArray::from_values(&[Value::Int(1), Value::Float(2.5)]).unwrap();
        match r {
            NumArray::Float(a) => assert_eq!(a.as_slice().unwrap(), &[1.0, 2.5]),
            other => panic!("expected float array, got {:?}", other),
        }

        let r = NumArray::from_values(&[Value::Bool(true), Value::Int(2)]).unwrap();
        assert_eq!(r, ints(vec![1, 2]));

        let r = NumArray::from_values(&[Value::Bool(true), Value::Bool(false)]).unwrap();
        assert!(matches!(r, NumArray::Bool(_)));
    }

    #[test]
    fn from_values_stacks_rows_into_a_matrix() {
        let rows = vec![
            Value::Array(ints(vec![1, 0])),
            Value::Array(ints(vec![0, 1])),
        ];
        let m = NumArray::from_values(&rows).unwrap();
        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m.index(1).unwrap(), Value::Array(ints(vec![0, 1])));
    }

    #[test]
    fn from_values_rejects_mixing_scalars_and_arrays() {
        let items = vec![Value::Int(1), Value::Array(ints(vec![1]))];
        assert!(matches!(
            NumArray::from_values(&items),
            Err(TinError::Shape(_))
        ));
    }

    #[test]
    fn indexing_supports_negative_positions() {
        let a = ints(vec![10, 20, 30]);
        assert_eq!(a.index(0).unwrap(), Value::Int(10));
        assert_eq!(a.index(-1).unwrap(), Value::Int(30));
        assert!(matches!(a.index(3), Err(TinError::Index { .. })));
    }

    #[test]
    fn assign_keeps_array_dtype() {
        let a = ints(vec![0, 0, 0]);
        let a = a.assign(1, &Value::Int(5)).unwrap();
        assert_eq!(a, ints(vec![0, 5, 0]));
        // Floats truncate into an int array.
        let a = a.assign(2, &Value::Float(2.9)).unwrap();
        assert_eq!(a, ints(vec![0, 5, 2]));
    }

    #[test]
    fn drop_first_and_last_are_empty_safe() {
        let a = ints(vec![1, 2, 3]);
        assert_eq!(a.drop_first(), ints(vec![2, 3]));
        assert_eq!(a.drop_last(), ints(vec![1, 2]));
        let empty = ints(vec![]);
        assert_eq!(empty.drop_first(), ints(vec![]));
        assert_eq!(empty.drop_last(), ints(vec![]));
    }

    #[test]
    fn replicate_array_gains_an_axis() {
        let row = Value::Array(ints(vec![1, 2]));
        let r = NumArray::replicate(3, &row).unwrap();
        assert_eq!(r.shape(), &[3, 2]);
    }

    #[test]
    fn count_matches_across_dtypes() {
        let a = ints(vec![1, 2, 2, 3]);
        assert_eq!(a.count(&Value::Int(2)).unwrap(), 2);
        assert_eq!(a.count(&Value::Float(2.0)).unwrap(), 2);
        assert_eq!(a.count(&Value::Int(9)).unwrap(), 0);
    }
}
