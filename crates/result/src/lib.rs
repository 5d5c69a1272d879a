//! DOM Level 3 style `XPathResult` materialization on top of the XPath 1.0 engine.

pub mod error;
pub mod evaluator;
pub mod expression;
pub mod result;
pub mod result_type;

pub use error::Error;
pub use evaluator::{XPathEvaluator, XPathEvaluatorBuilder, compile, evaluate};
pub use expression::XPathExpression;
pub use result::{NodeIterator, XPathResult, materialize};
pub use result_type::ResultType;
