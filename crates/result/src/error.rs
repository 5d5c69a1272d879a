use crate::result_type::ResultType;
use domxpath_xpath1::{ValueKind, XPathError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Syntax(XPathError),

    #[error("XPath evaluation failed: {0}")]
    Evaluation(XPathError),

    #[error("A {natural} value cannot be returned as {requested}")]
    Type {
        natural: ValueKind,
        requested: ResultType,
    },

    #[error("{accessor} is not available on a {result_type} result")]
    InvalidAccess {
        accessor: &'static str,
        result_type: ResultType,
    },

    #[error("Snapshot index {index} is out of range for length {length}")]
    Index { index: usize, length: usize },

    #[error("The document changed after the iterator was created")]
    StaleIterator,

    #[error("Unknown XPath result type code {0}")]
    UnknownResultType(u16),
}

impl Error {
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    pub fn is_evaluation_error(&self) -> bool {
        matches!(self, Error::Evaluation(_))
    }

    /// Errors the DOM reports as `TYPE_ERR`.
    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::Type { .. } | Error::InvalidAccess { .. })
    }
}

impl From<XPathError> for Error {
    fn from(err: XPathError) -> Self {
        if err.is_syntax_error() {
            Error::Syntax(err)
        } else {
            Error::Evaluation(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let syntax: Error = XPathError::Syntax {
            expression: "//div]".to_string(),
            offset: 5,
            message: "unexpected ']'".to_string(),
        }
        .into();
        assert!(syntax.is_syntax_error());

        let evaluation: Error = XPathError::UnknownFunction("nope".to_string()).into();
        assert!(evaluation.is_evaluation_error());
        assert!(!evaluation.is_type_error());

        let type_error = Error::Type {
            natural: ValueKind::Number,
            requested: ResultType::OrderedNodeSnapshot,
        };
        assert!(type_error.is_type_error());
        assert_eq!(
            type_error.to_string(),
            "A number value cannot be returned as ORDERED_NODE_SNAPSHOT_TYPE"
        );
    }
}
