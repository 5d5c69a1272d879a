//! `evaluate` directly on a `Document`, the way the DOM exposes it.

use crate::error::Error;
use domxpath_dom::{Document, NodeId};
use domxpath_result::{ResultType, XPathExpression, XPathResult};
use domxpath_xpath1::NamespaceResolver;

pub trait DocumentEvaluate {
    /// Compiles and evaluates `expression` with `context` as the context node.
    fn evaluate(
        &self,
        expression: &str,
        context: NodeId,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
    ) -> Result<XPathResult<NodeId>, Error>;

    /// Evaluates an already compiled expression.
    fn evaluate_expression(
        &self,
        expression: &XPathExpression,
        context: NodeId,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
    ) -> Result<XPathResult<NodeId>, Error>;

    /// The nodes an expression selects, in document order.
    fn select_nodes(&self, expression: &str, context: NodeId) -> Result<Vec<NodeId>, Error> {
        let result = self.evaluate(expression, context, None, ResultType::OrderedNodeSnapshot)?;
        Ok(result.snapshot()?.to_vec())
    }

    /// The first node an expression selects in document order.
    fn select_first(&self, expression: &str, context: NodeId) -> Result<Option<NodeId>, Error> {
        let result = self.evaluate(expression, context, None, ResultType::FirstOrderedNode)?;
        Ok(result.single_node_value()?)
    }
}

impl DocumentEvaluate for Document {
    fn evaluate(
        &self,
        expression: &str,
        context: NodeId,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
    ) -> Result<XPathResult<NodeId>, Error> {
        let expression = domxpath_result::compile(expression)?;
        self.evaluate_expression(&expression, context, resolver, requested)
    }

    fn evaluate_expression(
        &self,
        expression: &XPathExpression,
        context: NodeId,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
    ) -> Result<XPathResult<NodeId>, Error> {
        let node = self.node(context)?;
        Ok(domxpath_result::evaluate(
            expression,
            node,
            resolver,
            requested.code(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_helpers() {
        let doc = Document::parse("<list><item>a</item><item>b</item></list>").unwrap();
        let items = doc.select_nodes("//item", doc.root()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(doc.select_first("//item", doc.root()).unwrap(), Some(items[0]));
        assert_eq!(doc.select_first("//missing", doc.root()).unwrap(), None);
    }

    #[test]
    fn test_errors_are_classified() {
        let doc = Document::parse("<list/>").unwrap();
        assert!(doc.select_nodes("//item[", doc.root()).unwrap_err().is_syntax_error());
        assert!(doc.select_nodes("count(//item)", doc.root()).unwrap_err().is_type_error());
    }
}
