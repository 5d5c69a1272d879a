//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends in axis order: document order for forward axes and
//! reverse document order for `ancestor`, `ancestor-or-self`, `preceding` and
//! `preceding-sibling`.

use crate::datasource::{DataSourceNode, NodeType};

/// Attribute and namespace nodes have a parent but are not its children.
fn is_attached_to_owner<'a, N: DataSourceNode<'a>>(node: N) -> bool {
    matches!(node.node_type(), NodeType::Attribute | NodeType::Namespace)
}

pub fn collect_self_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.push(node);
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.attributes());
}

pub fn collect_namespace_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Element {
        results.extend(node.namespaces());
    }
}

/// Pre-order walk of the subtree below `node`.
pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let start = stack.len();
        stack.extend(current.children());
        stack[start..].reverse();
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    results.push(node);
    collect_descendant_nodes(node, results);
}

pub fn collect_parent_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if let Some(parent) = node.parent() {
        results.push(parent);
    }
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

pub fn collect_ancestor_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    results.push(node);
    collect_ancestor_nodes(node, results);
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if is_attached_to_owner(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        results.extend(parent.children().skip_while(|sibling| *sibling != node).skip(1));
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if is_attached_to_owner(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        let mut siblings: Vec<N> = parent.children().take_while(|sibling| *sibling != node).collect();
        siblings.reverse();
        results.extend(siblings);
    }
}

/// Everything after `node` in document order except its descendants and any
/// attribute or namespace nodes.
pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if is_attached_to_owner(node) {
        // The owner's content follows its attributes.
        match node.parent() {
            Some(owner) => {
                collect_descendant_nodes(owner, results);
                current = owner;
            }
            None => return,
        }
    }
    loop {
        let mut siblings = Vec::new();
        collect_following_sibling_nodes(current, &mut siblings);
        for sibling in siblings {
            collect_descendant_or_self_nodes(sibling, results);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
}

/// Everything before `node` in document order except its ancestors and any
/// attribute or namespace nodes, nearest first.
pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if is_attached_to_owner(node) {
        // Nothing precedes an attribute that does not precede its owner element.
        match node.parent() {
            Some(owner) => current = owner,
            None => return,
        }
    }
    loop {
        let mut siblings = Vec::new();
        collect_preceding_sibling_nodes(current, &mut siblings);
        for sibling in siblings {
            let mut subtree = Vec::new();
            collect_descendant_or_self_nodes(sibling, &mut subtree);
            subtree.reverse();
            results.extend(subtree);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
}
