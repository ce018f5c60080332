use crate::genomics::{BinaryOp, ExprGenome, Node, Operation, UnaryOp};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;

/// The decoded expression of a genome, in plain-text
/// and LaTeX form.
///
/// Every operator node is rendered as a parenthesized
/// sub-expression, and weights other than 1 as explicit
/// products. Operand slots without an enabled connection
/// render as `0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    plain: String,
    latex: String,
}

/// A rendered sub-expression.
struct Rendering {
    plain: String,
    latex: String,
}

impl Equation {
    /// Decodes the genome's expression, naming
    /// variables after `input_names`.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::equations::Equation;
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig, InnovationTracker, UnaryOp};
    /// use rand::SeedableRng;
    ///
    /// let config = GeneticConfig {
    ///     input_names: vec!["Mn".into()],
    ///     initial_expression_chance: 0.0,
    ///     ..GeneticConfig::default()
    /// };
    /// let tracker = InnovationTracker::new(&config);
    /// let mut genome = ExprGenome::new(&config, &mut rand::rngs::StdRng::seed_from_u64(0));
    /// genome.add_connection(&tracker, 0, 2, 0, -0.02).unwrap();
    ///
    /// let equation = Equation::from_genome(&genome, &config.input_names);
    /// assert_eq!(equation.plain(), "(((-0.02)*Mn) + 0)");
    /// assert_eq!(equation.latex(), r"\left(-0.02 \cdot \mathrm{Mn} + 0\right)");
    /// ```
    pub fn from_genome(genome: &ExprGenome, input_names: &[String]) -> Equation {
        let mut order: Vec<&Node> = genome.nodes().collect();
        order.sort_by(|a, b| a.layer().total_cmp(&b.layer()).then(a.id().cmp(&b.id())));

        let mut rendered: HashMap<Innovation, Rendering, RandomState> = HashMap::default();
        for node in order {
            let operand = |slot| render_operand(genome, &rendered, node.id(), slot);
            let rendering = match node.operation() {
                Operation::Variable(index) => render_variable(index, input_names),
                Operation::Constant(value) => Rendering {
                    plain: plain_number(value),
                    latex: latex_number(value),
                },
                Operation::Unary(op) => render_unary(op, operand(0)),
                Operation::Binary(op) => render_binary(op, operand(0), operand(1)),
            };
            rendered.insert(node.id(), rendering);
        }

        match rendered.remove(&genome.output()) {
            Some(Rendering { plain, latex }) => Equation { plain, latex },
            None => Equation {
                plain: "0".to_string(),
                latex: "0".to_string(),
            },
        }
    }

    /// Returns the plain-text form, readable by [`parse`](super::parse).
    pub fn plain(&self) -> &str {
        &self.plain
    }

    pub fn latex(&self) -> &str {
        &self.latex
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain)
    }
}

fn render_operand(
    genome: &ExprGenome,
    rendered: &HashMap<Innovation, Rendering, RandomState>,
    node: Innovation,
    slot: usize,
) -> Rendering {
    let (connection, source) = match genome
        .operand(node, slot)
        .and_then(|c| rendered.get(&c.input()).map(|r| (c, r)))
    {
        Some(operand) => operand,
        None => {
            return Rendering {
                plain: "0".to_string(),
                latex: "0".to_string(),
            }
        }
    };

    let weight = connection.weight();
    if weight == 1.0 {
        Rendering {
            plain: source.plain.clone(),
            latex: source.latex.clone(),
        }
    } else {
        Rendering {
            plain: format!("({}*{})", plain_number(weight), source.plain),
            latex: format!("{} \\cdot {}", latex_number(weight), source.latex),
        }
    }
}

fn render_variable(index: usize, input_names: &[String]) -> Rendering {
    let name = input_names
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("x{}", index));
    let latex = if name.chars().count() == 1 {
        name.clone()
    } else {
        format!("\\mathrm{{{}}}", name.replace('_', "\\_"))
    };
    Rendering { plain: name, latex }
}

fn render_unary(op: UnaryOp, a: Rendering) -> Rendering {
    let (plain, latex) = match op {
        UnaryOp::Negate => (
            format!("(-{})", a.plain),
            format!("\\left(-{}\\right)", a.latex),
        ),
        UnaryOp::Exp => (format!("exp({})", a.plain), format!("e^{{{}}}", a.latex)),
        UnaryOp::Log => (
            format!("log({})", a.plain),
            format!("\\ln\\left({}\\right)", a.latex),
        ),
        UnaryOp::Sqrt => (
            format!("sqrt({})", a.plain),
            format!("\\sqrt{{{}}}", a.latex),
        ),
        UnaryOp::Square => (
            format!("({}^2)", a.plain),
            format!("\\left({}\\right)^{{2}}", a.latex),
        ),
        UnaryOp::Reciprocal => (
            format!("(1/{})", a.plain),
            format!("\\frac{{1}}{{{}}}", a.latex),
        ),
    };
    Rendering { plain, latex }
}

fn render_binary(op: BinaryOp, a: Rendering, b: Rendering) -> Rendering {
    let plain = format!("({} {} {})", a.plain, op.symbol(), b.plain);
    let latex = match op {
        BinaryOp::Add => format!("\\left({} + {}\\right)", a.latex, b.latex),
        BinaryOp::Subtract => format!("\\left({} - {}\\right)", a.latex, b.latex),
        BinaryOp::Multiply => format!("\\left({} \\cdot {}\\right)", a.latex, b.latex),
        BinaryOp::Divide => format!("\\frac{{{}}}{{{}}}", a.latex, b.latex),
    };
    Rendering { plain, latex }
}

/// Formats a number exactly, parenthesized if negative.
fn plain_number(value: f64) -> String {
    if value.is_sign_negative() {
        format!("({})", value)
    } else {
        value.to_string()
    }
}

fn latex_number(value: f64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Connection, GraphDescription};

    fn names() -> Vec<String> {
        vec!["Mn".into(), "t".into()]
    }

    fn decode(nodes: Vec<(usize, Operation)>, output: usize, connections: Vec<Connection>) -> Equation {
        let genome = ExprGenome::from_description(&GraphDescription {
            inputs: names(),
            output,
            nodes,
            connections,
        })
        .unwrap();
        Equation::from_genome(&genome, &names())
    }

    #[test]
    fn empty_slots_render_zero() {
        let equation = decode(
            vec![
                (0, Operation::Variable(0)),
                (1, Operation::Binary(BinaryOp::Multiply)),
            ],
            1,
            vec![],
        );
        assert_eq!(equation.plain(), "(0 * 0)");
        assert_eq!(equation.latex(), r"\left(0 \cdot 0\right)");
    }

    #[test]
    fn nested_operations() {
        let equation = decode(
            vec![
                (0, Operation::Variable(0)),
                (1, Operation::Variable(1)),
                (2, Operation::Constant(2.5)),
                (3, Operation::Binary(BinaryOp::Divide)),
                (4, Operation::Unary(UnaryOp::Sqrt)),
                (5, Operation::Unary(UnaryOp::Negate)),
            ],
            3,
            vec![
                Connection::new(0, 1, 4, 0, 1.0),
                Connection::new(1, 4, 3, 0, 3.0),
                Connection::new(2, 0, 5, 0, 1.0),
                Connection::new(3, 5, 3, 1, 1.0),
            ],
        );
        assert_eq!(equation.plain(), "((3*sqrt(t)) / (-Mn))");
        assert_eq!(
            equation.latex(),
            r"\frac{3 \cdot \sqrt{t}}{\left(-\mathrm{Mn}\right)}"
        );
    }

    #[test]
    fn disabled_connections_are_omitted() {
        let mut disabled = Connection::new(1, 0, 2, 1, 1.0);
        disabled.set_enabled(false);
        let equation = decode(
            vec![
                (0, Operation::Variable(0)),
                (1, Operation::Constant(-1.5)),
                (2, Operation::Binary(BinaryOp::Subtract)),
            ],
            2,
            vec![Connection::new(0, 1, 2, 0, 1.0), disabled],
        );
        assert_eq!(equation.plain(), "((-1.5) - 0)");
        assert_eq!(equation.to_string(), equation.plain());
    }

    #[test]
    fn underscores_are_escaped() {
        let rendering = render_variable(0, &["acid_conc".to_string()]);
        assert_eq!(rendering.plain, "acid_conc");
        assert_eq!(rendering.latex, r"\mathrm{acid\_conc}");
        assert_eq!(render_variable(3, &[]).plain, "x3");
    }
}
