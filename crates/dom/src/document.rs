//! The mutable document arena and its structural mutation API.

use crate::datasource::DomNode;
use crate::error::DomError;
use crate::node::{NodeData, NodeId, NodeKind, split_qualified_name};
use domxpath_xpath1::MutationCounter;
use once_cell::sync::OnceCell;

/// An ordered tree of nodes stored in an arena.
///
/// Node 0 is the document node. Nodes created with the `create_*` methods start
/// detached and join the tree through `append_child` or `insert_before`; removed
/// nodes stay in the arena so their ids remain valid.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// Document-order position of every node, rebuilt lazily after structural changes.
    order: OnceCell<Vec<usize>>,
    mutations: MutationCounter,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
            order: OnceCell::new(),
            mutations: MutationCounter::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_node(&self) -> DomNode<'_> {
        DomNode::new(self, self.root())
    }

    /// The first element child of the document node.
    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|&id| matches!(self.nodes[id.0].kind, NodeKind::Element { .. }))
    }

    pub fn node(&self, id: NodeId) -> Result<DomNode<'_>, DomError> {
        self.data(id)?;
        Ok(DomNode::new(self, id))
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind, DomError> {
        Ok(&self.data(id)?.kind)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.data(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], DomError> {
        Ok(&self.data(id)?.children)
    }

    pub fn attribute_nodes(&self, id: NodeId) -> Result<&[NodeId], DomError> {
        Ok(&self.data(id)?.attributes)
    }

    /// The value of the attribute with the given qualified name.
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        let data = self.nodes.get(element.0)?;
        data.attributes
            .iter()
            .map(|&id| &self.nodes[id.0].kind)
            .find(|kind| kind.qualified_name().as_deref() == Some(name))
            .and_then(|kind| match kind {
                NodeKind::Attribute { value, .. } => Some(value.as_str()),
                _ => None,
            })
    }

    /// The first element of the tree, in document order, whose `id` attribute is `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(current) = stack.pop() {
            let data = &self.nodes[current.0];
            if matches!(data.kind, NodeKind::Element { .. })
                && self.attribute(current, "id") == Some(id)
            {
                return Some(current);
            }
            stack.extend(data.children.iter().rev());
        }
        None
    }

    /// The counter this document increments on every structural change.
    pub fn mutation_counter(&self) -> &MutationCounter {
        &self.mutations
    }

    // --- Node creation ---

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_element_ns(None, name)
    }

    pub fn create_element_ns(&mut self, namespace: Option<&str>, qualified_name: &str) -> NodeId {
        let (prefix, local_name) = split_qualified_name(qualified_name);
        self.alloc(NodeKind::Element {
            prefix,
            local_name,
            namespace: namespace.map(str::to_string),
        })
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::Text(data.to_string()))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::Comment(data.to_string()))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.alloc(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        })
    }

    // --- Structural mutation ---

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. A child that is already in the tree is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        if let Some(reference) = reference {
            if self.data(reference)?.parent != Some(parent)
                || self.nodes[reference.0].kind.is_attribute()
            {
                return Err(DomError::NotFound(format!(
                    "{:?} is not a child of {:?}",
                    reference, parent
                )));
            }
            if reference == child {
                return Ok(());
            }
        }

        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|r| siblings.iter().position(|&id| id == r))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
        self.structure_changed();
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.data(parent)?;
        if self.data(child)?.parent != Some(parent) || self.nodes[child.0].kind.is_attribute() {
            return Err(DomError::NotFound(format!(
                "{:?} is not a child of {:?}",
                child, parent
            )));
        }
        self.detach(child);
        self.structure_changed();
        Ok(child)
    }

    /// Sets an attribute by qualified name. Adding a new attribute is a
    /// structural change; replacing the value of an existing one is not.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> Result<NodeId, DomError> {
        self.set_attribute_ns(element, None, name, value)
    }

    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<NodeId, DomError> {
        let (id, created) = self.put_attribute(element, namespace, qualified_name, value)?;
        if created {
            self.structure_changed();
        }
        Ok(id)
    }

    /// Removes an attribute by qualified name, returning its node if it existed.
    pub fn remove_attribute(
        &mut self,
        element: NodeId,
        name: &str,
    ) -> Result<Option<NodeId>, DomError> {
        let data = self.data(element)?;
        let found = data
            .attributes
            .iter()
            .copied()
            .find(|&id| self.nodes[id.0].kind.qualified_name().as_deref() == Some(name));
        let Some(attr) = found else {
            return Ok(None);
        };
        self.nodes[element.0].attributes.retain(|&id| id != attr);
        self.nodes[attr.0].parent = None;
        self.structure_changed();
        Ok(Some(attr))
    }

    /// Replaces the data of a text, comment or processing-instruction node.
    /// The shape of the tree is unchanged, so this is not a structural change.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.data_mut(node)?.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => *data = text.to_string(),
            NodeKind::ProcessingInstruction { data, .. } => *data = text.to_string(),
            other => {
                return Err(DomError::InvalidModification(format!(
                    "cannot set character data on {:?}",
                    other
                )));
            }
        }
        Ok(())
    }

    // --- Document order ---

    /// The position of a node in document order. Detached subtrees are ordered
    /// after the tree, by the id of their top node.
    pub(crate) fn order_index(&self, id: NodeId) -> usize {
        let order = self.order.get_or_init(|| self.compute_order());
        order.get(id.0).copied().unwrap_or(usize::MAX)
    }

    fn compute_order(&self) -> Vec<usize> {
        log::trace!("recomputing document order for {} nodes", self.nodes.len());
        let mut order = vec![0; self.nodes.len()];
        let mut next = 0;
        let tops = (0..self.nodes.len()).filter(|&i| self.nodes[i].parent.is_none());
        for top in tops {
            let mut stack = vec![NodeId(top)];
            while let Some(current) = stack.pop() {
                order[current.0] = next;
                next += 1;
                let data = &self.nodes[current.0];
                for &attr in &data.attributes {
                    order[attr.0] = next;
                    next += 1;
                }
                stack.extend(data.children.iter().rev());
            }
        }
        order
    }

    // --- Internals ---

    /// Direct access for handles, which only exist for allocated ids.
    pub(crate) fn nodes_ref(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        // A new node needs a slot in the order table, not a new generation.
        self.order = OnceCell::new();
        id
    }

    /// Links a new node as the last child of `parent` without counting a
    /// structural change. Used while building a document from markup.
    pub(crate) fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Creates or updates an attribute, reporting whether a node was created.
    pub(crate) fn put_attribute(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<(NodeId, bool), DomError> {
        if !matches!(self.data(element)?.kind, NodeKind::Element { .. }) {
            return Err(DomError::HierarchyRequest(format!(
                "attributes can only be set on elements, not {:?}",
                element
            )));
        }
        let (prefix, local_name) = split_qualified_name(qualified_name);
        let existing = self.nodes[element.0].attributes.iter().copied().find(|&id| {
            matches!(
                &self.nodes[id.0].kind,
                NodeKind::Attribute { prefix: p, local_name: l, namespace: ns, .. }
                    if *p == prefix && *l == local_name && ns.as_deref() == namespace
            )
        });
        if let Some(attr) = existing {
            if let NodeKind::Attribute { value: current, .. } = &mut self.nodes[attr.0].kind {
                *current = value.to_string();
            }
            return Ok((attr, false));
        }

        let attr = self.alloc(NodeKind::Attribute {
            prefix,
            local_name,
            namespace: namespace.map(str::to_string),
            value: value.to_string(),
        });
        self.nodes[attr.0].parent = Some(element);
        self.nodes[element.0].attributes.push(attr);
        Ok((attr, true))
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_data = self.data(parent)?;
        let child_data = self.data(child)?;
        if !parent_data.kind.is_container() {
            return Err(DomError::HierarchyRequest(format!(
                "{:?} cannot have children",
                parent
            )));
        }
        if matches!(
            child_data.kind,
            NodeKind::Document | NodeKind::Attribute { .. }
        ) {
            return Err(DomError::HierarchyRequest(format!(
                "{:?} cannot be inserted as a child",
                child
            )));
        }
        // The child may not be the parent itself or one of its ancestors.
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return Err(DomError::HierarchyRequest(format!(
                    "{:?} is an ancestor of {:?}",
                    child, parent
                )));
            }
            current = self.nodes[node.0].parent;
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|&id| id != child);
        }
    }

    fn structure_changed(&mut self) {
        self.order = OnceCell::new();
        let generation = self.mutations.increment();
        log::trace!("document structure changed, generation {}", generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        doc.append_child(doc.root(), html).unwrap();
        doc.append_child(html, first).unwrap();
        doc.append_child(html, second).unwrap();
        doc.set_attribute(first, "id", "id1").unwrap();
        doc.set_attribute(second, "id", "id2").unwrap();
        (doc, html, first, second)
    }

    #[test]
    fn test_build_and_lookup() {
        let (doc, html, first, second) = sample();
        assert_eq!(doc.document_element(), Some(html));
        assert_eq!(doc.children(html).unwrap(), &[first, second]);
        assert_eq!(doc.parent(first).unwrap(), Some(html));
        assert_eq!(doc.attribute(second, "id"), Some("id2"));
        assert_eq!(doc.element_by_id("id2"), Some(second));
        assert_eq!(doc.element_by_id("missing"), None);
    }

    #[test]
    fn test_structural_changes_advance_generation() {
        let (mut doc, html, first, second) = sample();
        let counter = doc.mutation_counter().clone();
        let start = counter.current();

        // Value-only changes keep the generation.
        doc.set_attribute(first, "id", "changed").unwrap();
        let text = doc.create_text("hello");
        assert_eq!(counter.current(), start);

        doc.append_child(second, text).unwrap();
        assert_eq!(counter.current(), start + 1);
        doc.set_text(text, "bye").unwrap();
        assert_eq!(counter.current(), start + 1);

        doc.remove_child(html, first).unwrap();
        assert_eq!(counter.current(), start + 2);
        doc.set_attribute(second, "class", "x").unwrap();
        assert_eq!(counter.current(), start + 3);
        assert!(doc.remove_attribute(second, "class").unwrap().is_some());
        assert_eq!(counter.current(), start + 4);
        assert!(doc.remove_attribute(second, "class").unwrap().is_none());
        assert_eq!(counter.current(), start + 4);
    }

    #[test]
    fn test_document_order_follows_structure() {
        let (mut doc, html, first, second) = sample();
        assert!(doc.order_index(html) < doc.order_index(first));
        assert!(doc.order_index(first) < doc.order_index(second));
        let first_id_attr = doc.attribute_nodes(first).unwrap()[0];
        assert!(doc.order_index(first) < doc.order_index(first_id_attr));
        assert!(doc.order_index(first_id_attr) < doc.order_index(second));

        // Moving the first div to the end reverses the pair.
        doc.append_child(html, first).unwrap();
        assert_eq!(doc.children(html).unwrap(), &[second, first]);
        assert!(doc.order_index(second) < doc.order_index(first));

        // Detached nodes come after everything in the tree.
        let loose = doc.create_element("p");
        assert!(doc.order_index(first) < doc.order_index(loose));
    }

    #[test]
    fn test_insert_before() {
        let (mut doc, html, first, second) = sample();
        let middle = doc.create_element("span");
        doc.insert_before(html, middle, Some(second)).unwrap();
        assert_eq!(doc.children(html).unwrap(), &[first, middle, second]);

        let stranger = doc.create_element("p");
        let err = doc.insert_before(html, stranger, Some(stranger)).unwrap_err();
        assert!(matches!(err, DomError::NotFound(_)));
    }

    #[test]
    fn test_hierarchy_errors() {
        let (mut doc, html, first, _) = sample();
        assert!(matches!(
            doc.append_child(first, html),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(html, html),
            Err(DomError::HierarchyRequest(_))
        ));
        let text = doc.create_text("t");
        let p = doc.create_element("p");
        assert!(matches!(
            doc.append_child(text, p),
            Err(DomError::HierarchyRequest(_))
        ));
        let attr = doc.attribute_nodes(first).unwrap()[0];
        assert!(matches!(
            doc.append_child(html, attr),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.set_attribute(text, "a", "b"),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.remove_child(first, html),
            Err(DomError::NotFound(_))
        ));
        assert!(matches!(
            doc.set_text(html, "x"),
            Err(DomError::InvalidModification(_))
        ));
        assert!(matches!(
            doc.node(NodeId(999)),
            Err(DomError::UnknownNode(_))
        ));
    }
}
