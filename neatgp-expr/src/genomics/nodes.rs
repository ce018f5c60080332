use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Arguments closer to zero than this are treated
/// as zero by division and reciprocals.
pub const DIVISION_EPSILON: f64 = 1e-10;
/// Arguments to `exp` are clamped to ±this value.
pub const EXP_ARGUMENT_BOUND: f64 = 700.0;

/// Operations taking a single operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// -x
    Negate,
    /// exp(x), argument clamped to ±700
    Exp,
    /// ln(x), 0 for x ≤ 0
    Log,
    /// √x, 0 for x ≤ 0
    Sqrt,
    /// x²
    Square,
    /// 1/x, 0 for x ≈ 0
    Reciprocal,
}

impl UnaryOp {
    /// Every unary operation.
    pub const ALL: [UnaryOp; 6] = [
        UnaryOp::Negate,
        UnaryOp::Exp,
        UnaryOp::Log,
        UnaryOp::Sqrt,
        UnaryOp::Square,
        UnaryOp::Reciprocal,
    ];

    /// Applies the operation. Domain violations
    /// evaluate to 0 instead of NaN or infinity.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::UnaryOp;
    ///
    /// assert_eq!(UnaryOp::Square.apply(-3.0), 9.0);
    /// assert_eq!(UnaryOp::Log.apply(-1.0), 0.0);
    /// assert_eq!(UnaryOp::Sqrt.apply(0.0), 0.0);
    /// assert_eq!(UnaryOp::Reciprocal.apply(1e-12), 0.0);
    /// assert!(UnaryOp::Exp.apply(1e6).is_finite());
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Negate => -x,
            UnaryOp::Exp => x.clamp(-EXP_ARGUMENT_BOUND, EXP_ARGUMENT_BOUND).exp(),
            UnaryOp::Log => {
                if x > 0.0 {
                    x.ln()
                } else {
                    0.0
                }
            }
            UnaryOp::Sqrt => {
                if x > 0.0 {
                    x.sqrt()
                } else {
                    0.0
                }
            }
            UnaryOp::Square => x * x,
            UnaryOp::Reciprocal => {
                if x.abs() < DIVISION_EPSILON {
                    0.0
                } else {
                    1.0 / x
                }
            }
        }
    }
}

/// Operations taking two operands, in slots 0 and 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    /// a/b, 0 for b ≈ 0
    Divide,
}

impl BinaryOp {
    /// Every binary operation.
    pub const ALL: [BinaryOp; 4] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
    ];

    /// Applies the operation. Division by
    /// (almost) zero evaluates to 0.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::BinaryOp;
    ///
    /// assert_eq!(BinaryOp::Subtract.apply(1.0, 3.0), -2.0);
    /// assert_eq!(BinaryOp::Divide.apply(1.0, 4.0), 0.25);
    /// assert_eq!(BinaryOp::Divide.apply(1.0, 0.0), 0.0);
    /// ```
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide => {
                if b.abs() < DIVISION_EPSILON {
                    0.0
                } else {
                    a / b
                }
            }
        }
    }

    /// Returns the infix symbol of the operation.
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
        }
    }
}

/// What a node computes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Reads the input with the given index.
    Variable(usize),
    /// A mutable constant value.
    Constant(f64),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl Operation {
    /// Returns the number of operand slots of the operation.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{BinaryOp, Operation, UnaryOp};
    ///
    /// assert_eq!(Operation::Variable(0).arity(), 0);
    /// assert_eq!(Operation::Constant(1.5).arity(), 0);
    /// assert_eq!(Operation::Unary(UnaryOp::Exp).arity(), 1);
    /// assert_eq!(Operation::Binary(BinaryOp::Add).arity(), 2);
    /// ```
    pub fn arity(&self) -> usize {
        match self {
            Operation::Variable(_) | Operation::Constant(_) => 0,
            Operation::Unary(_) => 1,
            Operation::Binary(_) => 2,
        }
    }

    /// Returns `true` for variables and constants,
    /// which take no operands.
    pub fn is_source(&self) -> bool {
        self.arity() == 0
    }
}

/// A single operation placed in a genome's
/// computation graph.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    id: Innovation,
    operation: Operation,
    layer: f64,
}

impl Node {
    /// Returns a new node. Layers are assigned
    /// by the containing genome.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::genomics::{Node, Operation, UnaryOp};
    ///
    /// let node = Node::new(4, Operation::Unary(UnaryOp::Negate));
    /// assert_eq!(node.id(), 4);
    /// assert_eq!(node.layer(), 0.0);
    /// ```
    pub fn new(id: Innovation, operation: Operation) -> Node {
        Node {
            id,
            operation,
            layer: 0.0,
        }
    }

    pub fn id(&self) -> Innovation {
        self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub(crate) fn set_operation(&mut self, operation: Operation) {
        self.operation = operation;
    }

    /// Returns the node's topological depth: 0 for
    /// variables and constants, one more than the
    /// deepest operand source otherwise. The output
    /// node always has the greatest layer.
    pub fn layer(&self) -> f64 {
        self.layer
    }

    pub(crate) fn set_layer(&mut self, layer: f64) {
        self.layer = layer;
    }

    pub fn arity(&self) -> usize {
        self.operation.arity()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{:?}, layer {}]", self.id, self.operation, self.layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_is_clamped() {
        assert_eq!(UnaryOp::Exp.apply(1000.0), 700f64.exp());
        assert_eq!(UnaryOp::Exp.apply(-1000.0), (-700f64).exp());
    }

    #[test]
    fn guards_absorb_nan() {
        assert_eq!(UnaryOp::Log.apply(f64::NAN), 0.0);
        assert_eq!(UnaryOp::Sqrt.apply(f64::NAN), 0.0);
    }

    #[test]
    fn division_guard_is_symmetric() {
        assert_eq!(BinaryOp::Divide.apply(3.0, -5e-11), 0.0);
        assert_eq!(BinaryOp::Divide.apply(3.0, -2.0), -1.5);
        assert_eq!(UnaryOp::Reciprocal.apply(-4.0), -0.25);
    }
}
