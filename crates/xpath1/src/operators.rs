//! Comparison, arithmetic and set operators over `XPathValue`s.

use crate::ast::BinaryOperator;
use crate::datasource::DataSourceNode;
use crate::engine::{XPathValue, document_order, parse_number};
use crate::error::XPathError;

/// One side of a comparison after node-sets have been expanded into the
/// string values of their members.
#[derive(Debug, Clone, PartialEq)]
enum Atom {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Atom {
    fn to_number(&self) -> f64 {
        match self {
            Atom::String(s) => parse_number(s),
            Atom::Number(n) => *n,
            Atom::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Atom::String(s) => !s.is_empty(),
            Atom::Number(n) => *n != 0.0 && !n.is_nan(),
            Atom::Boolean(b) => *b,
        }
    }

    fn is_boolean(&self) -> bool {
        matches!(self, Atom::Boolean(_))
    }
}

/// Expands a value into the atoms it compares as. A node-set compared with a
/// boolean takes part as its own boolean value, not member by member.
fn atoms<'a, N: DataSourceNode<'a>>(value: XPathValue<N>, other_is_boolean: bool) -> Vec<Atom> {
    match value {
        XPathValue::NodeSet(nodes) if other_is_boolean => vec![Atom::Boolean(!nodes.is_empty())],
        XPathValue::NodeSet(nodes) => nodes
            .iter()
            .map(|n| Atom::String(n.string_value()))
            .collect(),
        XPathValue::String(s) => vec![Atom::String(s)],
        XPathValue::Number(n) => vec![Atom::Number(n)],
        XPathValue::Boolean(b) => vec![Atom::Boolean(b)],
    }
}

fn compare_atoms(op: BinaryOperator, left: &Atom, right: &Atom) -> bool {
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let want_equal = op == BinaryOperator::Equals;
            if left.is_boolean() || right.is_boolean() {
                (left.to_bool() == right.to_bool()) == want_equal
            } else if matches!(left, Atom::Number(_)) || matches!(right, Atom::Number(_)) {
                // NaN is unequal to everything, so `!=` is not the negation of `=`.
                let (l, r) = (left.to_number(), right.to_number());
                if want_equal { l == r } else { l != r }
            } else {
                (left == right) == want_equal
            }
        }
        BinaryOperator::LessThan => left.to_number() < right.to_number(),
        BinaryOperator::LessThanOrEqual => left.to_number() <= right.to_number(),
        BinaryOperator::GreaterThan => left.to_number() > right.to_number(),
        BinaryOperator::GreaterThanOrEqual => left.to_number() >= right.to_number(),
        _ => false,
    }
}

/// Applies a comparison with the existential semantics of node-sets: the result
/// is true if any pair of atoms drawn from the two sides satisfies it.
fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> bool {
    let left_is_boolean = matches!(left, XPathValue::Boolean(_));
    let right_is_boolean = matches!(right, XPathValue::Boolean(_));
    let left_atoms = atoms(left, right_is_boolean);
    let right_atoms = atoms(right, left_is_boolean);
    left_atoms
        .iter()
        .any(|l| right_atoms.iter().any(|r| compare_atoms(op, l, r)))
}

fn arithmetic<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> f64 {
    let (l, r) = (left.to_number(), right.to_number());
    match op {
        BinaryOperator::Plus => l + r,
        BinaryOperator::Minus => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => l / r,
        // Truncating remainder, the sign follows the dividend.
        BinaryOperator::Modulo => l % r,
        _ => f64::NAN,
    }
}

/// Evaluates a binary operator over two already evaluated operands.
pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let value = match op {
        BinaryOperator::Or => XPathValue::Boolean(left.to_bool() || right.to_bool()),
        BinaryOperator::And => XPathValue::Boolean(left.to_bool() && right.to_bool()),
        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => XPathValue::Boolean(compare(op, left, right)),
        BinaryOperator::Plus
        | BinaryOperator::Minus
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => XPathValue::Number(arithmetic(op, &left, &right)),
        BinaryOperator::Union => {
            let mut nodes = left.into_node_set("The union operator")?;
            nodes.extend(right.into_node_set("The union operator")?);
            XPathValue::NodeSet(document_order(nodes))
        }
    };
    Ok(value)
}
