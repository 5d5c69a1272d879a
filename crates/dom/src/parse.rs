//! Building a `Document` from XML text.

use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKind};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

impl Document {
    /// Parses XML text into a new document. Building the tree does not count as
    /// mutation, so the new document starts at generation zero.
    pub fn parse(text: &str) -> Result<Document, DomError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(text, options)?;
        let mut doc = Document::new();
        let root = doc.root();
        import_children(&mut doc, root, xml.root())?;
        log::debug!(
            "parsed document with {} top-level node(s)",
            doc.children(root)?.len()
        );
        Ok(doc)
    }
}

/// The prefix bound to `uri` in scope at `node`. The default namespace has no prefix.
fn prefix_for(node: roxmltree::Node<'_, '_>, uri: Option<&str>) -> Option<String> {
    let uri = uri?;
    node.lookup_prefix(uri)
        .filter(|prefix| !prefix.is_empty())
        .or((uri == XML_NAMESPACE).then_some("xml"))
        .map(str::to_string)
}

fn import_children(
    doc: &mut Document,
    parent: NodeId,
    source: roxmltree::Node<'_, '_>,
) -> Result<(), DomError> {
    for child in source.children() {
        let kind = match child.node_type() {
            roxmltree::NodeType::Element => {
                let tag = child.tag_name();
                NodeKind::Element {
                    prefix: prefix_for(child, tag.namespace()),
                    local_name: tag.name().to_string(),
                    namespace: tag.namespace().map(str::to_string),
                }
            }
            roxmltree::NodeType::Text => NodeKind::Text(child.text().unwrap_or_default().to_string()),
            roxmltree::NodeType::Comment => {
                NodeKind::Comment(child.text().unwrap_or_default().to_string())
            }
            roxmltree::NodeType::PI => match child.pi() {
                Some(pi) => NodeKind::ProcessingInstruction {
                    target: pi.target.to_string(),
                    data: pi.value.unwrap_or_default().to_string(),
                },
                None => continue,
            },
            roxmltree::NodeType::Root => continue,
        };

        let id = doc.push_child(parent, kind);
        if child.is_element() {
            for attr in child.attributes() {
                let prefix = prefix_for(child, attr.namespace());
                let qualified_name = match prefix {
                    Some(prefix) => format!("{}:{}", prefix, attr.name()),
                    None => attr.name().to_string(),
                };
                doc.put_attribute(id, attr.namespace(), &qualified_name, attr.value())?;
            }
            import_children(doc, id, child)?;
        }
    }
    Ok(())
}
