//! Runtime values held in VM memory cells and constant-table entries.

use std::fmt;

/// A literal value as interned in the constant table.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Str(String),
}

/// A single flat-memory cell.
///
/// Unlike the teacher's register `union` (which reinterprets the same
/// bit pattern as `i32`/`u32`/`f32` because real machine registers are a
/// fixed width), Patito's segments are type-homogeneous by construction
/// -- an `int` cell never holds a `float` -- so a plain tagged enum is
/// both simpler and safer than bit-reinterpretation here.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, "<uninitialized>"),
            Cell::Int(v) => write!(f, "{}", v),
            // Rust's `f64` `Display` drops the fractional part for whole
            // numbers (`2.0` -> `"2"`); the ground-truth Python
            // interpreter always prints a trailing `.0` for a float, so
            // whole numbers are formatted with one explicit decimal.
            Cell::Float(v) => {
                if v.fract() == 0.0 {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Cell::Bool(v) => write!(f, "{}", v),
            Cell::Str(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn whole_number_float_prints_with_trailing_decimal() {
        assert_eq!(Cell::Float(2.0).to_string(), "2.0");
        assert_eq!(Cell::Float(-4.0).to_string(), "-4.0");
        assert_eq!(Cell::Float(0.0).to_string(), "0.0");
    }

    #[test]
    fn fractional_float_prints_unchanged() {
        assert_eq!(Cell::Float(3.5).to_string(), "3.5");
        assert_eq!(Cell::Float(7.0 / 2.0).to_string(), "3.5");
    }

    #[test]
    fn int_and_bool_printing_is_unaffected() {
        assert_eq!(Cell::Int(2).to_string(), "2");
        assert_eq!(Cell::Bool(true).to_string(), "true");
    }
}

impl From<ConstValue> for Cell {
    fn from(value: ConstValue) -> Cell {
        match value {
            ConstValue::Int(v) => Cell::Int(v),
            ConstValue::Float(v) => Cell::Float(v),
            ConstValue::Str(v) => Cell::Str(v),
        }
    }
}
