use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Serialize, Serializer};

use super::table::ParameterTable;
use crate::error::ParameterError;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }

    fn is_additive(self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }
}

/// Arithmetic expression over named quantities.
///
/// Geometry positions and sizes are stored as expressions so that the engine
/// receives `storage_depth-storage_height` rather than a baked number.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Param(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// A reference to a named quantity.
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Evaluates the expression in SI units against the table.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced name is undefined or the result is not
    /// finite.
    pub fn eval(&self, table: &ParameterTable) -> Result<f64, ParameterError> {
        let value = self.eval_inner(table)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ParameterError::Precondition {
                parameter: "expression",
                reason: format!("'{self}' does not evaluate to a finite number"),
            })
        }
    }

    fn eval_inner(&self, table: &ParameterTable) -> Result<f64, ParameterError> {
        match self {
            Self::Literal(v) => Ok(*v),
            Self::Param(name) => table.si_value(name),
            Self::Neg(inner) => Ok(-inner.eval_inner(table)?),
            Self::Binary { op, lhs, rhs } => {
                let (a, b) = (lhs.eval_inner(table)?, rhs.eval_inner(table)?);
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                })
            }
        }
    }

    /// Names of all quantities the expression references.
    #[must_use]
    pub fn params(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Literal(_) => {}
            Self::Param(name) => out.push(name),
            Self::Neg(inner) => inner.collect_params(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_params(out);
                rhs.collect_params(out);
            }
        }
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v}"),
            Self::Param(name) => f.write_str(name),
            Self::Neg(inner) => match inner.as_ref() {
                Self::Binary { .. } => write!(f, "-({inner})"),
                _ => write!(f, "-{inner}"),
            },
            Self::Binary { op, lhs, rhs } => {
                let wrap_lhs = !op.is_additive()
                    && matches!(lhs.as_ref(), Self::Binary { op: l, .. } if l.is_additive());
                let wrap_rhs = match rhs.as_ref() {
                    Self::Binary { op: r, .. } => *op != BinaryOp::Add || !r.is_additive() && *op == BinaryOp::Div,
                    _ => false,
                };
                if wrap_lhs {
                    write!(f, "({lhs})")?;
                } else {
                    write!(f, "{lhs}")?;
                }
                write!(f, "{}", op.symbol())?;
                if wrap_rhs {
                    write!(f, "({rhs})")
                } else {
                    write!(f, "{rhs}")
                }
            }
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Self::param(name)
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, self, rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::params::{ParameterGroup, Quantity, Unit};

    fn table() -> ParameterTable {
        let mut group = ParameterGroup::new("par1", "geometry");
        group.push(Quantity::new("storage_depth", -100.0, Unit::Meter));
        group.push(Quantity::new("storage_height", 55.0, Unit::Meter));
        group.push(Quantity::new("arc_length", 15.0, Unit::Meter));
        ParameterTable::from_groups(vec![group]).unwrap()
    }

    #[test]
    fn renders_engine_syntax() {
        let e = Expr::param("storage_depth") - Expr::param("storage_height") + Expr::param("arc_length");
        assert_eq!(e.to_string(), "storage_depth-storage_height+arc_length");
        assert_eq!((-Expr::param("H_model")).to_string(), "-H_model");
        let nested = Expr::param("a") - (Expr::param("b") - Expr::param("c"));
        assert_eq!(nested.to_string(), "a-(b-c)");
    }

    #[test]
    fn evaluates_against_table() {
        let e = Expr::param("storage_depth") - Expr::param("storage_height") + Expr::param("arc_length");
        assert!((e.eval(&table()).unwrap() - (-140.0)).abs() < 1e-12);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = Expr::param("W_model").eval(&table()).unwrap_err();
        assert!(matches!(err, ParameterError::Undefined(name) if name == "W_model"));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        let e = Expr::param("arc_length") / Expr::Literal(0.0);
        assert!(e.eval(&table()).is_err());
    }

    #[test]
    fn lists_referenced_names() {
        let e = Expr::param("storage_depth") - Expr::param("arc_length");
        assert_eq!(e.params(), vec!["storage_depth", "arc_length"]);
    }
}
