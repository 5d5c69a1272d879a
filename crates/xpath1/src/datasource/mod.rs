//! Defines the core abstraction for a navigable data source tree.
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

/// The type of a node in the data source tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A shared count of the structural changes made to one tree.
///
/// The tree owns the counter and increments it whenever nodes are inserted,
/// removed or reordered. Clones observe the same count, so a result created
/// from the tree can later tell whether the tree has changed underneath it.
#[derive(Debug, Clone, Default)]
pub struct MutationCounter(Arc<AtomicU64>);

impl MutationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of structural changes recorded so far.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Records one structural change and returns the new count.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// The universal contract for a node in a hierarchical data source.
///
/// The XPath engine is written exclusively against this trait, so it can run
/// over any tree that implements it. Handles are cheap `Copy` values that
/// borrow the tree for `'a`; `Ord` must follow document order.
///
/// `'a` is the lifetime of the underlying tree.
pub trait DataSourceNode<'a>:
    'a + std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    /// An owned identifier for this node that stays valid after the borrow of
    /// the tree ends, e.g. an arena index.
    type Key: std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + Send + Sync + 'static;

    /// The type of the node (Element, Text, Attribute, etc.).
    fn node_type(&self) -> NodeType;

    /// The qualified name of the node (e.g., `fo:block`). Returns `None` for node
    /// types that do not have names, such as text or root nodes. For a processing-
    /// instruction, this is its target.
    fn name(&self) -> Option<QName<'a>>;

    /// The namespace URI of an element or attribute, if it has one.
    fn namespace_uri(&self) -> Option<&'a str> {
        None
    }

    /// The string value of the node, as defined by the XPath 1.0 `string()` function.
    /// - For a text node, this is its content.
    /// - For an element, this is the concatenation of the string values of all
    ///   its descendant text nodes.
    /// - For an attribute, this is its value.
    /// - For a comment or processing instruction, this is its content.
    fn string_value(&self) -> String;

    /// An iterator over the attribute nodes of this node.
    /// The iterator will be empty for non-element nodes.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// An iterator over the child nodes of this node.
    /// The iterator will be empty for leaf nodes (like text or attributes).
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// A reference to the parent node. Returns `None` for the root node or detached
    /// nodes. For an attribute this is the element that owns it.
    fn parent(&self) -> Option<Self>;

    /// The owned identifier of this node.
    fn key(&self) -> Self::Key;

    /// The structural mutation counter of the tree this node belongs to.
    /// Trees that never change can rely on the default, which never advances.
    fn mutation_counter(&self) -> MutationCounter {
        MutationCounter::default()
    }

    /// Whether this tree exposes namespace nodes on the `namespace` axis.
    fn supports_namespace_axis(&self) -> bool {
        false
    }

    /// The namespace nodes in scope for an element.
    fn namespaces(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        Box::new(std::iter::empty())
    }
}

// Test utilities - publicly available for integration testing in downstream crates
pub mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::hash::Hasher;

    // --- Mock Implementation for TDD ---

    #[derive(Debug, Clone)]
    struct MockNodeData<'a> {
        node_type: NodeType,
        name: Option<QName<'a>>,
        value: String,
        parent: Option<usize>,
        children: Vec<usize>,
        attributes: Vec<usize>,
    }

    /// A read-only tree whose node ids are assigned in document order.
    #[derive(Debug)]
    pub struct MockTree<'a> {
        nodes: Vec<MockNodeData<'a>>,
        counter: MutationCounter,
    }

    impl<'a> MockTree<'a> {
        /// Simulates a structural change so staleness checks can be exercised.
        pub fn touch(&self) {
            self.counter.increment();
        }

        pub fn node(&'a self, id: usize) -> MockNode<'a> {
            MockNode { id, tree: self }
        }

        fn push(
            &mut self,
            parent: Option<usize>,
            node_type: NodeType,
            name: Option<QName<'a>>,
            value: &str,
        ) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNodeData {
                node_type,
                name,
                value: value.to_string(),
                parent,
                children: vec![],
                attributes: vec![],
            });
            if let Some(pid) = parent {
                if node_type == NodeType::Attribute {
                    self.nodes[pid].attributes.push(id);
                } else {
                    self.nodes[pid].children.push(id);
                }
            }
            id
        }
    }

    /// A simple, in-memory node representation that holds a reference to its tree.
    /// This is necessary so that the node can navigate itself (e.g., find its parent or children).
    #[derive(Debug, Clone, Copy)]
    pub struct MockNode<'a> {
        pub id: usize,
        pub tree: &'a MockTree<'a>,
    }

    impl<'a> PartialEq for MockNode<'a> {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }
    impl<'a> Eq for MockNode<'a> {}

    impl<'a> PartialOrd for MockNode<'a> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<'a> Ord for MockNode<'a> {
        fn cmp(&self, other: &Self) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    impl<'a> Hash for MockNode<'a> {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl<'a> DataSourceNode<'a> for MockNode<'a> {
        type Key = usize;

        fn node_type(&self) -> NodeType {
            self.tree.nodes[self.id].node_type
        }

        fn name(&self) -> Option<QName<'a>> {
            self.tree.nodes[self.id].name
        }

        fn string_value(&self) -> String {
            match self.node_type() {
                NodeType::Root | NodeType::Element => self
                    .children()
                    .map(|child| match child.node_type() {
                        NodeType::Text | NodeType::Element => child.string_value(),
                        _ => String::new(),
                    })
                    .collect(),
                _ => self.tree.nodes[self.id].value.clone(),
            }
        }

        fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree; // Re-borrow to help the lifetime checker
            Box::new(
                tree.nodes[self.id]
                    .attributes
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
            let tree = self.tree; // Re-borrow to help the lifetime checker
            Box::new(
                tree.nodes[self.id]
                    .children
                    .iter()
                    .map(move |&id| MockNode { id, tree }),
            )
        }

        fn parent(&self) -> Option<Self> {
            self.tree.nodes[self.id].parent.map(|pid| MockNode {
                id: pid,
                tree: self.tree,
            })
        }

        fn key(&self) -> usize {
            self.id
        }

        fn mutation_counter(&self) -> MutationCounter {
            self.tree.counter.clone()
        }
    }

    fn name(local_part: &str) -> Option<QName<'_>> {
        Some(QName {
            prefix: None,
            local_part,
        })
    }

    /// Creates a simple mock tree for testing:
    /// <root> <!-- id 0 -->
    ///   <para id="p1" xml:lang="en">Hello</para> <!-- id 1, attrs 2&3, text 4 -->
    ///   <!-- comment node --> <!-- id 5 -->
    ///   <div></div> <!-- id 6 -->
    ///   <?pi-target pi-value?> <!-- id 7 -->
    ///   <para>World</para> <!-- id 8, text 9 -->
    /// </root>
    pub fn create_test_tree<'a>() -> MockTree<'a> {
        let mut tree = MockTree {
            nodes: Vec::new(),
            counter: MutationCounter::new(),
        };

        let root = tree.push(None, NodeType::Root, None, "");
        let para = tree.push(Some(root), NodeType::Element, name("para"), "");
        tree.push(Some(para), NodeType::Attribute, name("id"), "p1");
        tree.push(
            Some(para),
            NodeType::Attribute,
            Some(QName {
                prefix: Some("xml"),
                local_part: "lang",
            }),
            "en",
        );
        tree.push(Some(para), NodeType::Text, None, "Hello");
        tree.push(Some(root), NodeType::Comment, None, " comment node ");
        tree.push(Some(root), NodeType::Element, name("div"), "");
        tree.push(
            Some(root),
            NodeType::ProcessingInstruction,
            name("pi-target"),
            "pi-value",
        );
        let para2 = tree.push(Some(root), NodeType::Element, name("para"), "");
        tree.push(Some(para2), NodeType::Text, None, "World");
        tree
    }
}
