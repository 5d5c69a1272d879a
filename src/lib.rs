//! XPath 1.0 over an in-memory XML document, with results shaped like the DOM
//! `XPathResult` interface.
//!
//! ```ignore
//! use domxpath::{Document, DocumentEvaluate, ResultType};
//!
//! let doc = Document::parse("<body><div id='a'/><div id='b'/></body>")?;
//! let result = doc.evaluate("//div", doc.root(), None, ResultType::OrderedNodeSnapshot)?;
//! assert_eq!(result.snapshot_length()?, 2);
//! ```

pub mod document;
pub mod error;

pub use document::DocumentEvaluate;
pub use error::Error;

pub use domxpath_dom::{Document, DomError, DomNode, NodeId, NodeKind};
pub use domxpath_result::{
    NodeIterator, ResultType, XPathEvaluator, XPathEvaluatorBuilder, XPathExpression,
    XPathResult, compile, evaluate,
};
pub use domxpath_xpath1::{
    DataSourceNode, FunctionRegistry, MutationCounter, NamespaceResolver, Scalar, ValueKind,
    XPathError, XPathValue,
};

/// Error type of the result layer, re-exported under a distinct name.
pub use domxpath_result::Error as ResultError;
