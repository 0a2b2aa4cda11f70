//! Prelude of user-level words.
//!
//! A small library of definitions expressed as ordinary Tin source and
//! installed into a `TokenTable` on request. Nothing here is special to
//! the runtime; these are exactly the words a user could define.

use crate::error::TinError;
use crate::lexer::{self, TokenTable};

/// One source string per definition: the greedy definition pattern would
/// swallow everything between the first and last pipe of a combined
/// string.
///
/// `μ` is the mean of an array (duplicate, length, sum, divide) and `²`
/// is the square (duplicate, multiply).
pub const PRELUDE: &[&str] = &["|!⍴↶∑/|→|μ|", "|!·|→|²|"];

/// Install the prelude words into `table`.
pub fn install(table: &mut TokenTable) -> Result<(), TinError> {
    for def in PRELUDE {
        lexer::compile(def, table)?;
    }
    Ok(())
}

/// A fresh table with the prelude already installed.
pub fn table() -> TokenTable {
    let mut table = TokenTable::new();
    install(&mut table).expect("prelude source is well-formed");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Tin;
    use crate::value::Value;

    #[test]
    fn mean_of_an_array() {
        let mut t = table();
        let tin = Tin::with_table("μ", &mut t).expect("compiles");
        let arr = crate::array::NumArray::from_values(&[
            Value::Int(2),
            Value::Int(4),
            Value::Int(6),
            Value::Int(8),
        ])
        .expect("array builds");
        let out = tin.execute(vec![Value::Array(arr)]).expect("runs");
        assert_eq!(out, vec![Value::Float(5.0)]);
    }

    #[test]
    fn square() {
        let mut t = table();
        let tin = Tin::with_table("5²", &mut t).expect("compiles");
        assert_eq!(tin.execute(vec![]).expect("runs"), vec![Value::Int(25)]);
    }
}
