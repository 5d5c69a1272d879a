//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator,
};
use super::functions::{self, FunctionRegistry};
use super::resolver::NamespaceResolver;
use super::{axes, operators};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// The four value domains of XPath 1.0, without their payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    NodeSet,
    Number,
    String,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::NodeSet => "node-set",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    pub fn kind(&self) -> ValueKind {
        match self {
            XPathValue::NodeSet(_) => ValueKind::NodeSet,
            XPathValue::String(_) => ValueKind::String,
            XPathValue::Number(_) => ValueKind::Number,
            XPathValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => parse_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => parse_number(&first_string_value(nodes)),
        }
    }

    /// Unwraps a node-set, failing for any other kind of value.
    pub fn into_node_set(self, purpose: &str) -> Result<Vec<N>, XPathError> {
        match self {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError(format!(
                "{} requires a node-set, got a {}",
                purpose,
                other.kind()
            ))),
        }
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(f, "{}", first_string_value(nodes)),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", format_number(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// The string value of the first node in document order, or "" for an empty set.
fn first_string_value<'a, N: DataSourceNode<'a>>(nodes: &[N]) -> String {
    nodes.iter().min().map(|n| n.string_value()).unwrap_or_default()
}

/// Converts a string to a number using the XPath `Number` grammar: optional
/// surrounding whitespace, an optional minus sign, digits and an optional
/// fractional part. Anything else is NaN.
pub fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return f64::NAN,
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Formats a number the way the XPath `string()` function does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        // Covers negative zero as well.
        "0".to_string()
    } else {
        // `Display` for f64 never uses exponent notation and drops a zero fraction.
        format!("{}", n)
    }
}

/// Sorts nodes into document order and removes duplicates.
pub fn document_order<'a, N: DataSourceNode<'a>>(mut nodes: Vec<N>) -> Vec<N> {
    nodes.sort();
    nodes.dedup();
    nodes
}

/// A container for all state needed during expression evaluation.
/// `'a` is the lifetime of the underlying data source.
/// `'d` is the lifetime of the evaluation context itself.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub functions: &'d FunctionRegistry,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub variables: &'d HashMap<String, XPathValue<N>>,
    /// Resolves the prefixes of qualified name tests; `None` compares prefixes literally.
    pub namespaces: Option<&'d dyn NamespaceResolver>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    /// Creates a top-level context at position 1 of 1. The root node is found by
    /// following parent links from the context node.
    pub fn new(
        context_node: N,
        functions: &'d FunctionRegistry,
        variables: &'d HashMap<String, XPathValue<N>>,
    ) -> Self {
        let mut root_node = context_node;
        while let Some(parent) = root_node.parent() {
            root_node = parent;
        }
        Self {
            context_node,
            root_node,
            functions,
            context_position: 1,
            context_size: 1,
            variables,
            namespaces: None,
            _marker: PhantomData,
        }
    }

    pub fn with_namespaces(mut self, namespaces: Option<&'d dyn NamespaceResolver>) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Derives the context used to evaluate a predicate against one candidate node.
    pub fn for_node(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            functions: self.functions,
            context_position: position,
            context_size: size,
            variables: self.variables,
            namespaces: self.namespaces,
            _marker: PhantomData,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::Variable(name) => e_ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| XPathError::UnknownVariable(name.clone())),
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::Filter {
            primary,
            predicates,
        } => {
            let nodes = evaluate(primary, e_ctx)?.into_node_set("A predicate")?;
            let nodes = apply_predicates(document_order(nodes), predicates, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            // `or` and `and` do not evaluate their right operand when the left decides.
            match op {
                BinaryOperator::Or if left_val.to_bool() => return Ok(XPathValue::Boolean(true)),
                BinaryOperator::And if !left_val.to_bool() => {
                    return Ok(XPathValue::Boolean(false));
                }
                _ => {}
            }
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let initial_context = if let Some(start_expr) = &path.start_point {
        // The path starts from the result of another expression.
        let nodes = evaluate(start_expr, e_ctx)?.into_node_set("A path step")?;
        document_order(nodes)
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    let mut current_nodes = initial_context;
    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
        log::trace!(
            "step {}::{:?} selected {} node(s)",
            step.axis.name(),
            step.node_test,
            current_nodes.len()
        );
    }
    Ok(current_nodes)
}

/// Evaluates a single step in a location path. Axis collection, node testing and
/// predicate application run once per context node, so positional predicates
/// count along the axis from that node. The combined selection is returned in
/// document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    // A property of the tree, whatever nodes reached this step.
    if step.axis == Axis::Namespace && !e_ctx.root_node.supports_namespace_axis() {
        return Err(XPathError::UnsupportedAxis(Axis::Namespace.name()));
    }

    let name_matcher = NameMatcher::resolve(&step.node_test, e_ctx)?;
    let mut selected = Vec::new();
    for &node in context_nodes {
        let axis_nodes = collect_axis_nodes(step.axis, node);
        let tested_nodes = filter_by_node_test(axis_nodes, &step.node_test, &name_matcher, step.axis);
        selected.extend(apply_predicates(tested_nodes, &step.predicates, e_ctx)?);
    }

    if context_nodes.len() == 1 && !step.axis.is_reverse() {
        // A forward axis from a single node is already in document order.
        return Ok(selected);
    }
    Ok(document_order(selected))
}

/// Stage 1: Collects the nodes on an axis from one context node, in axis order.
fn collect_axis_nodes<'a, N>(axis: Axis, node: N) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut result_nodes = Vec::new();
    match axis {
        Axis::Child => axes::collect_child_nodes(node, &mut result_nodes),
        Axis::Attribute => axes::collect_attribute_nodes(node, &mut result_nodes),
        Axis::Namespace => axes::collect_namespace_nodes(node, &mut result_nodes),
        Axis::Descendant => axes::collect_descendant_nodes(node, &mut result_nodes),
        Axis::DescendantOrSelf => axes::collect_descendant_or_self_nodes(node, &mut result_nodes),
        Axis::Parent => axes::collect_parent_nodes(node, &mut result_nodes),
        Axis::Ancestor => axes::collect_ancestor_nodes(node, &mut result_nodes),
        Axis::AncestorOrSelf => axes::collect_ancestor_or_self_nodes(node, &mut result_nodes),
        Axis::SelfAxis => axes::collect_self_nodes(node, &mut result_nodes),
        Axis::FollowingSibling => axes::collect_following_sibling_nodes(node, &mut result_nodes),
        Axis::PrecedingSibling => axes::collect_preceding_sibling_nodes(node, &mut result_nodes),
        Axis::Following => axes::collect_following_nodes(node, &mut result_nodes),
        Axis::Preceding => axes::collect_preceding_nodes(node, &mut result_nodes),
    }
    result_nodes
}

/// How the prefix of a name test is matched, decided once per step.
enum NameMatcher {
    /// No prefix in the test.
    Any,
    /// The prefix resolved to this namespace URI.
    Namespace(String),
    /// No resolver was supplied; compare the node's own prefix.
    Prefix(String),
}

impl NameMatcher {
    fn resolve<'a, N: DataSourceNode<'a>>(
        test: &NodeTest,
        e_ctx: &EvaluationContext<'a, '_, N>,
    ) -> Result<Self, XPathError> {
        let prefix = match test {
            NodeTest::Name(name) => name.prefix.as_deref(),
            NodeTest::PrefixWildcard(prefix) => Some(prefix.as_str()),
            _ => None,
        };
        let Some(prefix) = prefix else {
            return Ok(NameMatcher::Any);
        };
        match e_ctx.namespaces {
            Some(resolver) => resolver
                .lookup_namespace_uri(prefix)
                .map(NameMatcher::Namespace)
                .ok_or_else(|| XPathError::UnknownNamespacePrefix(prefix.to_string())),
            None => Ok(NameMatcher::Prefix(prefix.to_string())),
        }
    }

    fn matches<'a, N: DataSourceNode<'a>>(&self, node: &N) -> bool {
        match self {
            NameMatcher::Any => true,
            NameMatcher::Namespace(uri) => node.namespace_uri() == Some(uri.as_str()),
            NameMatcher::Prefix(prefix) => node
                .name()
                .is_some_and(|q_name| q_name.prefix == Some(prefix.as_str())),
        }
    }
}

fn principal_node_type(axis: Axis) -> NodeType {
    match axis {
        Axis::Attribute => NodeType::Attribute,
        Axis::Namespace => NodeType::Namespace,
        _ => NodeType::Element,
    }
}

/// Stage 2: Filters a set of nodes based on a `NodeTest`.
fn filter_by_node_test<'a, N>(
    nodes: Vec<N>,
    test: &NodeTest,
    name_matcher: &NameMatcher,
    axis: Axis,
) -> Vec<N>
where
    N: DataSourceNode<'a> + 'a,
{
    let principal = principal_node_type(axis);
    nodes
        .into_iter()
        .filter(|node| match test {
            NodeTest::Wildcard => node.node_type() == principal,
            NodeTest::PrefixWildcard(_) => {
                node.node_type() == principal && name_matcher.matches(node)
            }
            NodeTest::Name(name_test) => {
                node.node_type() == principal
                    && node
                        .name()
                        .is_some_and(|q_name| q_name.local_part == name_test.local_name)
                    && name_matcher.matches(node)
            }
            NodeTest::NodeType(ntt) => match ntt {
                NodeTypeTest::Text => node.node_type() == NodeType::Text,
                NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
                NodeTypeTest::ProcessingInstruction(target) => {
                    node.node_type() == NodeType::ProcessingInstruction
                        && target.as_ref().is_none_or(|target| {
                            node.name().is_some_and(|q_name| q_name.local_part == target)
                        })
                }
                NodeTypeTest::Node => true,
            },
        })
        .collect()
}

/// Stage 3: Filters a set of nodes by applying a series of predicates. The
/// nodes must already be in the order that defines their proximity positions.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes;
    for predicate in predicates {
        let context_size = final_nodes.len();
        let mut predicate_results = Vec::with_capacity(context_size);
        for (i, node) in final_nodes.into_iter().enumerate() {
            let predicate_e_ctx = e_ctx.for_node(node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_e_ctx)? {
                // A number selects by position: `[2]` means `[position() = 2]`.
                XPathValue::Number(n) => n == (i + 1) as f64,
                result => result.to_bool(),
            };
            if keep {
                predicate_results.push(node);
            }
        }
        final_nodes = predicate_results;
    }
    Ok(final_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, MockTree, create_test_tree};
    use crate::parser::parse_expression;
    use std::collections::HashMap;

    fn eval<'a>(
        tree: &'a MockTree<'a>,
        context_id: usize,
        text: &str,
    ) -> Result<XPathValue<MockNode<'a>>, XPathError> {
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = EvaluationContext::new(tree.node(context_id), &funcs, &vars);
        evaluate(&parse_expression(text).unwrap(), &e_ctx)
    }

    fn ids(value: XPathValue<MockNode<'_>>) -> Vec<usize> {
        match value {
            XPathValue::NodeSet(nodes) => nodes.iter().map(|n| n.id).collect(),
            other => panic!("Expected a NodeSet, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_functions_individually() {
        let tree = create_test_tree();
        let root = tree.node(0);
        let para = tree.node(1);
        let attr = tree.node(2);
        let text = tree.node(4);

        // Test collect_axis_nodes
        assert_eq!(collect_axis_nodes(Axis::Child, root).len(), 5);
        assert_eq!(collect_axis_nodes(Axis::Attribute, para).len(), 2);
        assert_eq!(collect_axis_nodes(Axis::Ancestor, text), vec![para, root]);

        // Test filter_by_node_test
        let all_nodes = vec![root, para, attr, text];
        let any = NameMatcher::Any;
        let elements =
            filter_by_node_test(all_nodes.clone(), &NodeTest::Wildcard, &any, Axis::Child);
        assert_eq!(elements, vec![para]);
        let attributes =
            filter_by_node_test(all_nodes.clone(), &NodeTest::Wildcard, &any, Axis::Attribute);
        assert_eq!(attributes, vec![attr]);
        let text_nodes = filter_by_node_test(
            all_nodes,
            &NodeTest::NodeType(NodeTypeTest::Text),
            &any,
            Axis::Child,
        );
        assert_eq!(text_nodes, vec![text]);

        // Test apply_predicates (positional)
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = EvaluationContext::new(root, &funcs, &vars);
        let predicates = vec![parse_expression("position()=2").unwrap()];
        let filtered = apply_predicates(vec![root, para, text], &predicates, &e_ctx).unwrap();
        assert_eq!(filtered, vec![para]);
    }

    #[test]
    fn test_context_finds_root() {
        let tree = create_test_tree();
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let e_ctx = EvaluationContext::new(tree.node(4), &funcs, &vars);
        assert_eq!(e_ctx.root_node, tree.node(0));
        assert_eq!(ids(eval(&tree, 4, "/").unwrap()), vec![0]);
    }

    #[test]
    fn test_predicate_by_attribute() {
        let tree = create_test_tree();
        assert_eq!(ids(eval(&tree, 0, "child::para[@id='p1']").unwrap()), vec![1]);
    }

    #[test]
    fn test_predicate_by_position() {
        let tree = create_test_tree();
        assert_eq!(ids(eval(&tree, 0, "child::para[1]").unwrap()), vec![1]);
        assert_eq!(ids(eval(&tree, 0, "child::para[position()=1]").unwrap()), vec![1]);
        assert_eq!(ids(eval(&tree, 0, "child::para[last()]").unwrap()), vec![8]);
        assert!(ids(eval(&tree, 0, "child::para[1.5]").unwrap()).is_empty());
    }

    #[test]
    fn test_reverse_axis_positions() {
        let tree = create_test_tree();
        // Nearest preceding sibling element of the second <para> is the <div>.
        assert_eq!(ids(eval(&tree, 8, "preceding-sibling::*[1]").unwrap()), vec![6]);
        assert_eq!(ids(eval(&tree, 8, "preceding-sibling::*[2]").unwrap()), vec![1]);
        // The node-set itself is still reported in document order.
        assert_eq!(ids(eval(&tree, 8, "preceding-sibling::*").unwrap()), vec![1, 6]);
        assert_eq!(ids(eval(&tree, 4, "ancestor::node()[1]").unwrap()), vec![1]);
        assert_eq!(ids(eval(&tree, 1, "following-sibling::*[1]").unwrap()), vec![6]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = create_test_tree();
        assert_eq!(ids(eval(&tree, 0, "//node()").unwrap()), vec![1, 4, 5, 6, 7, 8, 9]);
        assert_eq!(
            ids(eval(&tree, 0, "descendant-or-self::node()").unwrap()),
            vec![0, 1, 4, 5, 6, 7, 8, 9]
        );
        assert_eq!(ids(eval(&tree, 0, "//text()").unwrap()), vec![4, 9]);
        assert_eq!(ids(eval(&tree, 0, "//para/text()").unwrap()), vec![4, 9]);
        assert_eq!(ids(eval(&tree, 0, "//@*").unwrap()), vec![2, 3]);
    }

    #[test]
    fn test_per_context_positional_predicates() {
        let tree = create_test_tree();
        // Each <para> contributes its own first text child.
        assert_eq!(ids(eval(&tree, 0, "//para/text()[1]").unwrap()), vec![4, 9]);
        // Filtering the combined set picks one node.
        assert_eq!(ids(eval(&tree, 0, "(//para/text())[1]").unwrap()), vec![4]);
        assert_eq!(ids(eval(&tree, 0, "(//para)[2]/text()").unwrap()), vec![9]);
    }

    #[test]
    fn test_union_and_prefixed_names() {
        let tree = create_test_tree();
        assert_eq!(ids(eval(&tree, 0, "//div | //para").unwrap()), vec![1, 6, 8]);
        assert_eq!(ids(eval(&tree, 0, "//para/@xml:lang").unwrap()), vec![3]);
        assert_eq!(ids(eval(&tree, 0, "//para/@xml:*").unwrap()), vec![3]);
        assert_eq!(
            ids(eval(&tree, 0, "processing-instruction('pi-target')").unwrap()),
            vec![7]
        );
        assert!(ids(eval(&tree, 0, "processing-instruction('other')").unwrap()).is_empty());
    }

    #[test]
    fn test_namespace_resolution() {
        let tree = create_test_tree();
        let funcs = FunctionRegistry::default();
        let vars = HashMap::new();
        let resolver: HashMap<String, String> = HashMap::new();
        let e_ctx = EvaluationContext::new(tree.node(0), &funcs, &vars)
            .with_namespaces(Some(&resolver as &dyn NamespaceResolver));
        let err = evaluate(&parse_expression("//para/@xml:lang").unwrap(), &e_ctx).unwrap_err();
        assert_eq!(err, XPathError::UnknownNamespacePrefix("xml".to_string()));
    }

    #[test]
    fn test_unsupported_namespace_axis() {
        let tree = create_test_tree();
        let err = eval(&tree, 1, "namespace::*").unwrap_err();
        assert_eq!(err, XPathError::UnsupportedAxis("namespace"));
    }

    #[test]
    fn test_unsupported_namespace_axis_without_matches() {
        let tree = create_test_tree();
        for expr in [
            "//missing/namespace::*",
            "count(//missing/namespace::*)",
            "//@*/namespace::*",
            "//para[false()]/namespace::node()",
        ] {
            let err = eval(&tree, 0, expr).unwrap_err();
            assert_eq!(err, XPathError::UnsupportedAxis("namespace"), "{}", expr);
        }
    }

    #[test]
    fn test_variable_evaluation() {
        let tree = create_test_tree();
        let funcs = FunctionRegistry::default();
        let mut vars = HashMap::new();
        vars.insert(
            "myVar".to_string(),
            XPathValue::String("test-value".to_string()),
        );
        let e_ctx = EvaluationContext::new(tree.node(0), &funcs, &vars);

        let result = evaluate(&parse_expression("$myVar").unwrap(), &e_ctx).unwrap();
        assert_eq!(result.to_string(), "test-value");

        let missing = evaluate(&parse_expression("$other").unwrap(), &e_ctx).unwrap_err();
        assert_eq!(missing, XPathError::UnknownVariable("other".to_string()));
    }

    #[test]
    fn test_path_from_variable_node_set() {
        let tree = create_test_tree();
        let funcs = FunctionRegistry::default();
        let mut vars = HashMap::new();
        vars.insert(
            "para_node".to_string(),
            XPathValue::NodeSet(vec![tree.node(1)]),
        );
        let e_ctx = EvaluationContext::new(tree.node(0), &funcs, &vars);

        let expr = parse_expression("$para_node/text()").unwrap();
        let result = evaluate(&expr, &e_ctx).unwrap();
        if let XPathValue::NodeSet(nodes) = result {
            assert_eq!(nodes.len(), 1);
            assert_eq!(nodes[0].id, 4);
            assert_eq!(nodes[0].string_value(), "Hello");
        } else {
            panic!("Expected a NodeSet");
        }
    }

    #[test]
    fn test_path_from_scalar_is_type_error() {
        let tree = create_test_tree();
        assert!(matches!(eval(&tree, 0, "(1)/foo"), Err(XPathError::TypeError(_))));
        assert!(matches!(eval(&tree, 0, "'a'[1]"), Err(XPathError::TypeError(_))));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        let tree = create_test_tree();
        assert!(eval(&tree, 0, "true() or $missing").unwrap().to_bool());
        assert!(!eval(&tree, 0, "false() and $missing").unwrap().to_bool());
        assert!(eval(&tree, 0, "false() or $missing").is_err());
    }

    #[test]
    fn test_coercions() {
        let tree = create_test_tree();
        assert!(eval(&tree, 0, "//para").unwrap().to_bool());
        assert!(!eval(&tree, 0, "//missing").unwrap().to_bool());
        assert_eq!(eval(&tree, 0, "//para").unwrap().to_string(), "Hello");
        assert_eq!(eval(&tree, 0, "//missing").unwrap().to_string(), "");
        assert!(eval(&tree, 0, "//para").unwrap().to_number().is_nan());
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number("-1.5"), -1.5);
        assert_eq!(parse_number(".5"), 0.5);
        assert!(parse_number("1e3").is_nan());
        assert!(parse_number("+1").is_nan());
        assert!(parse_number("Infinity").is_nan());
        assert!(parse_number("").is_nan());
        assert!(parse_number("-").is_nan());

        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e21), "1000000000000000000000");
    }
}
