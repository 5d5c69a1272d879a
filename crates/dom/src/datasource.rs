//! Tree navigation over a `Document` for the XPath engine.

use crate::document::Document;
use crate::node::{NodeId, NodeKind};
use domxpath_xpath1::{DataSourceNode, MutationCounter, NodeType, QName};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A borrowed handle to one node of a `Document`.
#[derive(Clone, Copy)]
pub struct DomNode<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> DomNode<'d> {
    pub(crate) fn new(doc: &'d Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    pub fn kind(&self) -> &'d NodeKind {
        &self.doc.nodes_ref(self.id).kind
    }

    /// The value of one of this element's attributes.
    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        self.doc.attribute(self.id, name)
    }

    fn handles(&self, ids: &'d [NodeId]) -> Box<dyn Iterator<Item = Self> + 'd> {
        let doc = self.doc;
        Box::new(ids.iter().map(move |&id| DomNode { doc, id }))
    }

    fn collect_text(&self, out: &mut String) {
        for &child in &self.doc.nodes_ref(self.id).children {
            match &self.doc.nodes_ref(child).kind {
                NodeKind::Text(data) => out.push_str(data),
                NodeKind::Element { .. } => DomNode::new(self.doc, child).collect_text(out),
                _ => {}
            }
        }
    }
}

impl fmt::Debug for DomNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomNode")
            .field("id", &self.id)
            .field("kind", self.kind())
            .finish()
    }
}

impl PartialEq for DomNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.doc, other.doc)
    }
}

impl Eq for DomNode<'_> {}

impl Hash for DomNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for DomNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomNode<'_> {
    /// Document order. Handles into different documents order by document address.
    fn cmp(&self, other: &Self) -> Ordering {
        let self_doc = self.doc as *const Document as usize;
        let other_doc = other.doc as *const Document as usize;
        self_doc.cmp(&other_doc).then_with(|| {
            self.doc
                .order_index(self.id)
                .cmp(&other.doc.order_index(other.id))
        })
    }
}

impl<'d> DataSourceNode<'d> for DomNode<'d> {
    type Key = NodeId;

    fn node_type(&self) -> NodeType {
        match self.kind() {
            NodeKind::Document => NodeType::Root,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Attribute { .. } => NodeType::Attribute,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'d>> {
        match self.kind() {
            NodeKind::Element {
                prefix, local_name, ..
            }
            | NodeKind::Attribute {
                prefix, local_name, ..
            } => Some(QName {
                prefix: prefix.as_deref(),
                local_part: local_name,
            }),
            NodeKind::ProcessingInstruction { target, .. } => Some(QName {
                prefix: None,
                local_part: target,
            }),
            _ => None,
        }
    }

    fn namespace_uri(&self) -> Option<&'d str> {
        match self.kind() {
            NodeKind::Element { namespace, .. } | NodeKind::Attribute { namespace, .. } => {
                namespace.as_deref()
            }
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        match self.kind() {
            NodeKind::Document | NodeKind::Element { .. } => {
                let mut text = String::new();
                self.collect_text(&mut text);
                text
            }
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Text(data) | NodeKind::Comment(data) => data.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        self.handles(&self.doc.nodes_ref(self.id).attributes)
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        self.handles(&self.doc.nodes_ref(self.id).children)
    }

    fn parent(&self) -> Option<Self> {
        self.doc
            .nodes_ref(self.id)
            .parent
            .map(|id| DomNode::new(self.doc, id))
    }

    fn key(&self) -> NodeId {
        self.id
    }

    fn mutation_counter(&self) -> MutationCounter {
        self.doc.mutation_counter().clone()
    }
}
