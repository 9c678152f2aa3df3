use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
    sync::Arc,
};

use crate::{Constant, EvalError, Scalar, Valuation, Variable};

/// A unary operator or elementary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Sin,
    Cos,
    Exp,
    Sqrt,
}

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A real-valued expression over named quantities.
///
/// Expressions are plain data. They are built with the usual arithmetic
/// operators on [`Expr`], [`Variable`], [`Constant`], and `f64`, plus the
/// [`sin`], [`cos`], [`exp`], and [`sqrt`] functions:
///
/// ```
/// use braid_core::{Constant, Expr, Variable};
///
/// let kp = Constant::new("Kp", 10.2);
/// let reference = Variable::new("ref_m");
/// let velocity = Variable::new("velocity_m");
///
/// let torque = kp * (reference - velocity);
/// assert_eq!(torque.to_string(), "Kp*(ref_m-velocity_m)");
/// ```
///
/// The builders fold trivial constants (`0*e`, `1*e`, `e+0`, literal
/// arithmetic), which keeps symbolic derivatives small.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Constant(Constant),
    Variable(Variable),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, i32),
}

impl Expr {
    #[must_use]
    pub fn literal(value: f64) -> Self {
        Expr::Literal(value)
    }

    #[must_use]
    pub fn zero() -> Self {
        Expr::Literal(0.0)
    }

    /// Returns the numeric value if the expression is a literal or named constant.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Expr::Literal(v) => Some(*v),
            Expr::Constant(c) => Some(c.value()),
            _ => None,
        }
    }

    #[allow(clippy::float_cmp)]
    fn is_value(&self, target: f64) -> bool {
        self.value() == Some(target)
    }

    fn literal_value(&self) -> Option<f64> {
        match self {
            Expr::Literal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns `true` if the expression reads no variables.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.variables().is_empty()
    }

    pub(crate) fn unary(op: UnaryOp, operand: Expr) -> Expr {
        if let Some(v) = operand.literal_value() {
            return Expr::Literal(op.apply(v));
        }
        match (op, operand) {
            (UnaryOp::Neg, Expr::Unary(UnaryOp::Neg, inner)) => *inner,
            (op, operand) => Expr::Unary(op, Box::new(operand)),
        }
    }

    pub(crate) fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        if let (Some(a), Some(b)) = (lhs.literal_value(), rhs.literal_value()) {
            return Expr::Literal(op.apply(a, b));
        }
        match op {
            BinaryOp::Add if lhs.is_value(0.0) => rhs,
            BinaryOp::Add | BinaryOp::Sub if rhs.is_value(0.0) => lhs,
            BinaryOp::Sub if lhs.is_value(0.0) => Expr::unary(UnaryOp::Neg, rhs),
            BinaryOp::Mul if lhs.is_value(0.0) || rhs.is_value(0.0) => Expr::zero(),
            BinaryOp::Mul if lhs.is_value(1.0) => rhs,
            BinaryOp::Mul | BinaryOp::Div if rhs.is_value(1.0) => lhs,
            BinaryOp::Div if lhs.is_value(0.0) => Expr::zero(),
            _ => Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Raises the expression to an integer power.
    #[must_use]
    pub fn powi(self, n: i32) -> Expr {
        match n {
            0 => Expr::Literal(1.0),
            1 => self,
            _ => match self.literal_value() {
                Some(v) => Expr::Literal(v.powi(n)),
                None => Expr::Pow(Box::new(self), n),
            },
        }
    }

    /// Evaluates the expression over a valuation.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Unbound`] if a variable has no value, or
    /// [`EvalError::NonFinite`] if the result is not finite.
    pub fn eval<T, V>(&self, valuation: &V) -> Result<T, EvalError>
    where
        T: Scalar,
        V: Valuation<T> + ?Sized,
    {
        let value = self.eval_unchecked(valuation)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite {
                expr: self.to_string(),
            })
        }
    }

    fn eval_unchecked<T, V>(&self, valuation: &V) -> Result<T, EvalError>
    where
        T: Scalar,
        V: Valuation<T> + ?Sized,
    {
        Ok(match self {
            Expr::Literal(v) => T::constant(*v),
            Expr::Constant(c) => T::constant(c.value()),
            Expr::Variable(var) => valuation.value(var.name()).ok_or_else(|| EvalError::Unbound {
                name: var.key().clone(),
            })?,
            Expr::Unary(op, operand) => {
                let x = operand.eval_unchecked(valuation)?;
                match op {
                    UnaryOp::Neg => -x,
                    UnaryOp::Sin => x.sin(),
                    UnaryOp::Cos => x.cos(),
                    UnaryOp::Exp => x.exp(),
                    UnaryOp::Sqrt => x.sqrt(),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval_unchecked(valuation)?;
                let b = rhs.eval_unchecked(valuation)?;
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                }
            }
            Expr::Pow(base, n) => base.eval_unchecked(valuation)?.powi(*n),
        })
    }

    /// Returns the names of all variables the expression reads.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Arc<str>> {
        let mut names = BTreeSet::new();
        self.visit(&mut |expr| {
            if let Expr::Variable(var) = expr {
                names.insert(var.key().clone());
            }
        });
        names
    }

    /// Returns every named constant the expression references.
    #[must_use]
    pub fn constants(&self) -> Vec<&Constant> {
        let mut constants = Vec::new();
        self.visit_ref(&mut constants);
        constants
    }

    fn visit_ref<'a>(&'a self, out: &mut Vec<&'a Constant>) {
        match self {
            Expr::Constant(c) => out.push(c),
            Expr::Literal(_) | Expr::Variable(_) => {}
            Expr::Unary(_, operand) | Expr::Pow(operand, _) => operand.visit_ref(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.visit_ref(out);
                rhs.visit_ref(out);
            }
        }
    }

    fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Literal(_) | Expr::Constant(_) | Expr::Variable(_) => {}
            Expr::Unary(_, operand) | Expr::Pow(operand, _) => operand.visit(f),
            Expr::Binary(_, lhs, rhs) => {
                lhs.visit(f);
                rhs.visit(f);
            }
        }
    }

    /// Replaces variables by the expressions bound to their names.
    ///
    /// Variables without a binding are left in place.
    #[must_use]
    pub fn substitute(&self, bindings: &BTreeMap<Arc<str>, Expr>) -> Expr {
        match self {
            Expr::Variable(var) => bindings
                .get(var.name())
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Expr::Literal(_) | Expr::Constant(_) => self.clone(),
            Expr::Unary(op, operand) => Expr::unary(*op, operand.substitute(bindings)),
            Expr::Binary(op, lhs, rhs) => {
                Expr::binary(*op, lhs.substitute(bindings), rhs.substitute(bindings))
            }
            Expr::Pow(base, n) => base.substitute(bindings).powi(*n),
        }
    }

    /// Returns the symbolic partial derivative with respect to `variable`.
    #[must_use]
    pub fn derivative(&self, variable: &str) -> Expr {
        match self {
            Expr::Literal(_) | Expr::Constant(_) => Expr::zero(),
            Expr::Variable(var) => {
                if var.name() == variable {
                    Expr::Literal(1.0)
                } else {
                    Expr::zero()
                }
            }
            Expr::Unary(op, operand) => {
                let inner = operand.derivative(variable);
                let x = operand.as_ref().clone();
                match op {
                    UnaryOp::Neg => -inner,
                    UnaryOp::Sin => cos(x) * inner,
                    UnaryOp::Cos => -(sin(x) * inner),
                    UnaryOp::Exp => exp(x) * inner,
                    UnaryOp::Sqrt => inner / (2.0 * sqrt(x)),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let (f, g) = (lhs.as_ref().clone(), rhs.as_ref().clone());
                let (df, dg) = (lhs.derivative(variable), rhs.derivative(variable));
                match op {
                    BinaryOp::Add => df + dg,
                    BinaryOp::Sub => df - dg,
                    BinaryOp::Mul => df * g + f * dg,
                    BinaryOp::Div => (df * g.clone() - f * dg) / g.powi(2),
                }
            }
            Expr::Pow(base, n) => {
                let db = base.derivative(variable);
                f64::from(*n) * base.as_ref().clone().powi(n - 1) * db
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(BinaryOp::Add | BinaryOp::Sub, ..) => 1,
            Expr::Binary(BinaryOp::Mul | BinaryOp::Div, ..) => 2,
            Expr::Unary(UnaryOp::Neg, _) => 3,
            Expr::Literal(v) if *v < 0.0 => 3,
            Expr::Pow(..) => 4,
            _ => 5,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl UnaryOp {
    fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Sqrt => x.sqrt(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Exp => "exp",
            UnaryOp::Sqrt => "sqrt",
        }
    }
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Constant(c) => write!(f, "{c}"),
            Expr::Variable(var) => write!(f, "{var}"),
            Expr::Unary(UnaryOp::Neg, operand) => {
                f.write_str("-")?;
                operand.fmt_child(f, 4)
            }
            Expr::Unary(op, operand) => write!(f, "{}({operand})", op.name()),
            Expr::Binary(op, lhs, rhs) => {
                let precedence = self.precedence();
                lhs.fmt_child(f, precedence)?;
                write!(f, "{}", op.symbol())?;
                // Right operands of `-` and `/` need parentheses at equal precedence.
                let right = match op {
                    BinaryOp::Sub | BinaryOp::Div => precedence + 1,
                    BinaryOp::Add | BinaryOp::Mul => precedence,
                };
                rhs.fmt_child(f, right)
            }
            Expr::Pow(base, n) => {
                base.fmt_child(f, 5)?;
                write!(f, "^{n}")
            }
        }
    }
}

/// Sine of an expression.
pub fn sin(x: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Sin, x.into())
}

/// Cosine of an expression.
pub fn cos(x: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Cos, x.into())
}

/// Natural exponential of an expression.
pub fn exp(x: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Exp, x.into())
}

/// Square root of an expression.
pub fn sqrt(x: impl Into<Expr>) -> Expr {
    Expr::unary(UnaryOp::Sqrt, x.into())
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Literal(value)
    }
}

impl From<Variable> for Expr {
    fn from(var: Variable) -> Self {
        Expr::Variable(var)
    }
}

impl From<&Variable> for Expr {
    fn from(var: &Variable) -> Self {
        Expr::Variable(var.clone())
    }
}

impl From<Constant> for Expr {
    fn from(c: Constant) -> Self {
        Expr::Constant(c)
    }
}

impl From<&Constant> for Expr {
    fn from(c: &Constant) -> Self {
        Expr::Constant(c.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

macro_rules! impl_operators {
    ($($lhs:ty),*) => {$(
        impl<R: Into<Expr>> Add<R> for $lhs {
            type Output = Expr;
            fn add(self, rhs: R) -> Expr {
                Expr::binary(BinaryOp::Add, self.into(), rhs.into())
            }
        }

        impl<R: Into<Expr>> Sub<R> for $lhs {
            type Output = Expr;
            fn sub(self, rhs: R) -> Expr {
                Expr::binary(BinaryOp::Sub, self.into(), rhs.into())
            }
        }

        impl<R: Into<Expr>> Mul<R> for $lhs {
            type Output = Expr;
            fn mul(self, rhs: R) -> Expr {
                Expr::binary(BinaryOp::Mul, self.into(), rhs.into())
            }
        }

        impl<R: Into<Expr>> Div<R> for $lhs {
            type Output = Expr;
            fn div(self, rhs: R) -> Expr {
                Expr::binary(BinaryOp::Div, self.into(), rhs.into())
            }
        }

        impl Neg for $lhs {
            type Output = Expr;
            fn neg(self) -> Expr {
                Expr::unary(UnaryOp::Neg, self.into())
            }
        }
    )*};
}

impl_operators!(Expr, &Expr, Variable, &Variable, Constant, &Constant);

macro_rules! impl_scalar_lhs {
    ($($rhs:ty),*) => {$(
        impl Add<$rhs> for f64 {
            type Output = Expr;
            fn add(self, rhs: $rhs) -> Expr {
                Expr::binary(BinaryOp::Add, self.into(), rhs.into())
            }
        }

        impl Sub<$rhs> for f64 {
            type Output = Expr;
            fn sub(self, rhs: $rhs) -> Expr {
                Expr::binary(BinaryOp::Sub, self.into(), rhs.into())
            }
        }

        impl Mul<$rhs> for f64 {
            type Output = Expr;
            fn mul(self, rhs: $rhs) -> Expr {
                Expr::binary(BinaryOp::Mul, self.into(), rhs.into())
            }
        }

        impl Div<$rhs> for f64 {
            type Output = Expr;
            fn div(self, rhs: $rhs) -> Expr {
                Expr::binary(BinaryOp::Div, self.into(), rhs.into())
            }
        }
    )*};
}

impl_scalar_lhs!(Expr, &Expr, Variable, &Variable, Constant, &Constant);
