use crate::error::Error;
use domxpath_xpath1::{Expression, ValueKind, parse_expression};
use std::fmt;
use std::str::FromStr;

/// A parsed expression that can be evaluated any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct XPathExpression {
    source: String,
    ast: Expression,
    is_location_path: bool,
}

impl XPathExpression {
    pub fn compile(text: &str) -> Result<Self, Error> {
        let ast = parse_expression(text)?;
        log::debug!("Compiled XPath expression '{}'", text);
        let is_location_path = ast.is_location_path();
        Ok(Self {
            source: text.to_string(),
            ast,
            is_location_path,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expression {
        &self.ast
    }

    pub fn is_location_path(&self) -> bool {
        self.is_location_path
    }

    /// The kind of value the expression produces, when known before evaluation.
    pub fn static_kind(&self) -> Option<ValueKind> {
        self.ast.static_kind()
    }
}

impl FromStr for XPathExpression {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        XPathExpression::compile(text)
    }
}

impl fmt::Display for XPathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
