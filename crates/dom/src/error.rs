use crate::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Invalid modification: {0}")]
    InvalidModification(String),

    #[error("XML parsing error: {0}")]
    Parse(#[from] roxmltree::Error),
}
