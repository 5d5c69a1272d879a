use domxpath_dom::DomError;
use domxpath_result::Error as ResultError;
use thiserror::Error;

/// Failures of the document-level convenience API.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error(transparent)]
    XPath(#[from] ResultError),
}

impl Error {
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Error::XPath(e) if e.is_syntax_error())
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::XPath(e) if e.is_type_error())
    }
}
