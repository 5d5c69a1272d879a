pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;
pub mod resolver;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
pub use datasource::{DataSourceNode, MutationCounter, NodeType, QName};
pub use engine::{EvaluationContext, ValueKind, XPathValue, evaluate, format_number, parse_number};
pub use functions::{FunctionRegistry, Scalar};
pub use resolver::NamespaceResolver;

// Re-export test utilities for integration testing in downstream crates
pub use datasource::tests;
pub use error::XPathError;
pub use parser::parse_expression;
