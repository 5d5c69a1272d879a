//! An arena-backed, mutable XML document that the XPath engine can navigate.

pub mod datasource;
pub mod document;
pub mod error;
pub mod node;
mod parse;

pub use datasource::DomNode;
pub use document::Document;
pub use error::DomError;
pub use node::{NodeId, NodeKind};
