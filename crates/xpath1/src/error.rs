use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("XPath syntax error in '{expression}' at offset {offset}: {message}")]
    Syntax {
        expression: String,
        offset: usize,
        message: String,
    },

    #[error("Function '{function}' error: {message}")]
    FunctionError { function: String, message: String },

    #[error("Unknown XPath function '{0}'")]
    UnknownFunction(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Variable '{0}' not found")]
    UnknownVariable(String),

    #[error("Namespace prefix '{0}' cannot be resolved")]
    UnknownNamespacePrefix(String),

    #[error("The '{0}' axis is not supported by this document")]
    UnsupportedAxis(&'static str),
}

impl XPathError {
    /// True for errors raised while parsing, false for errors raised while evaluating.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, XPathError::Syntax { .. })
    }

    pub(crate) fn function(function: &str, message: impl Into<String>) -> Self {
        XPathError::FunctionError {
            function: format!("{}()", function),
            message: message.into(),
        }
    }
}
