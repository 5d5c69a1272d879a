//! Arena node storage.

/// Index of a node in its document's arena. Stays valid for the lifetime of the
/// document, including after the node is removed from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The content of a node, one variant per node type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        prefix: Option<String>,
        local_name: String,
        namespace: Option<String>,
    },
    Attribute {
        prefix: Option<String>,
        local_name: String,
        namespace: Option<String>,
        value: String,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

impl NodeKind {
    /// Whether nodes of this kind may have children.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element { .. })
    }

    pub(crate) fn is_attribute(&self) -> bool {
        matches!(self, NodeKind::Attribute { .. })
    }

    /// `prefix:local` for elements and attributes, the target for a processing instruction.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            NodeKind::Element {
                prefix, local_name, ..
            }
            | NodeKind::Attribute {
                prefix, local_name, ..
            } => Some(match prefix {
                Some(prefix) => format!("{}:{}", prefix, local_name),
                None => local_name.clone(),
            }),
            NodeKind::ProcessingInstruction { target, .. } => Some(target.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: Vec<NodeId>,
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// Splits `prefix:local` into its parts.
pub(crate) fn split_qualified_name(name: &str) -> (Option<String>, String) {
    match name.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
            (Some(prefix.to_string()), local.to_string())
        }
        _ => (None, name.to_string()),
    }
}
