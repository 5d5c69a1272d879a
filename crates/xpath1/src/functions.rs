//! Defines the registry and built-in implementations for XPath 1.0 functions.

use super::engine::{EvaluationContext, ValueKind, XPathValue, document_order, parse_number};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A non-node value passed to or returned from an extension function.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(f64),
    Boolean(bool),
}

/// A caller-supplied function. Node-set arguments arrive as their string value.
pub type ExtensionFunction = Arc<dyn Fn(&[Scalar]) -> Result<Scalar, XPathError> + Send + Sync>;

#[derive(Clone)]
enum FunctionEntry {
    Builtin,
    Extension(ExtensionFunction),
}

/// The set of functions an expression may call. The default registry holds the
/// XPath 1.0 core library; extensions can be added or can replace a core function.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionEntry>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    /// An empty registry: every call fails with `UnknownFunction`.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    fn register_builtin(&mut self, name: &str) {
        self.functions.insert(name.to_string(), FunctionEntry::Builtin);
    }

    pub fn register_extension<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Scalar]) -> Result<Scalar, XPathError> + Send + Sync + 'static,
    {
        self.functions
            .insert(name.into(), FunctionEntry::Extension(Arc::new(function)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

/// The result kind of a core library function, or `None` for any other name.
pub fn builtin_return_kind(name: &str) -> Option<ValueKind> {
    let kind = match name {
        "id" => ValueKind::NodeSet,
        "last" | "position" | "count" | "string-length" | "number" | "sum" | "floor"
        | "ceiling" | "round" => ValueKind::Number,
        "local-name" | "namespace-uri" | "name" | "string" | "concat" | "substring-before"
        | "substring-after" | "substring" | "normalize-space" | "translate" => ValueKind::String,
        "starts-with" | "contains" | "boolean" | "not" | "true" | "false" | "lang" => {
            ValueKind::Boolean
        }
        _ => return None,
    };
    Some(kind)
}

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    match e_ctx.functions.functions.get(name) {
        None => Err(XPathError::UnknownFunction(name.to_string())),
        Some(FunctionEntry::Extension(function)) => call_extension(function, args),
        Some(FunctionEntry::Builtin) => evaluate_builtin(name, args, e_ctx),
    }
}

fn call_extension<'a, N: DataSourceNode<'a>>(
    function: &ExtensionFunction,
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    let scalars: Vec<Scalar> = args
        .into_iter()
        .map(|arg| match arg {
            XPathValue::Number(n) => Scalar::Number(n),
            XPathValue::Boolean(b) => Scalar::Boolean(b),
            other => Scalar::String(other.to_string()),
        })
        .collect();
    Ok(match function(&scalars)? {
        Scalar::String(s) => XPathValue::String(s),
        Scalar::Number(n) => XPathValue::Number(n),
        Scalar::Boolean(b) => XPathValue::Boolean(b),
    })
}

fn evaluate_builtin<'a, 'd, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-Set
        "last" => func_last(args, e_ctx),
        "position" => func_position(args, e_ctx),
        "count" => func_count(args),
        "id" => func_id(args, e_ctx),
        "local-name" => func_local_name(args, e_ctx),
        "namespace-uri" => func_namespace_uri(args, e_ctx),
        "name" => func_name(args, e_ctx),

        // String
        "string" => func_string(args, e_ctx),
        "concat" => func_concat(args),
        "starts-with" => func_starts_with(args),
        "contains" => func_contains(args),
        "substring-before" => func_substring_before(args),
        "substring-after" => func_substring_after(args),
        "substring" => func_substring(args),
        "string-length" => func_string_length(args, e_ctx),
        "normalize-space" => func_normalize_space(args, e_ctx),
        "translate" => func_translate(args),

        // Boolean
        "boolean" => func_boolean(args),
        "not" => func_not(args),
        "true" => func_true(args),
        "false" => func_false(args),
        "lang" => func_lang(args, e_ctx),

        // Number
        "number" => func_number(args, e_ctx),
        "sum" => func_sum(args),
        "floor" => func_floor(args),
        "ceiling" => func_ceiling(args),
        "round" => func_round(args),

        _ => Err(XPathError::UnknownFunction(name.to_string())),
    }
}

fn check_arity<N>(
    function: &str,
    args: &[XPathValue<N>],
    min: usize,
    max: usize,
) -> Result<(), XPathError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        format!("Expected {} argument{}", min, if min == 1 { "" } else { "s" })
    } else if max == usize::MAX {
        format!("Expected at least {} arguments", min)
    } else {
        format!("Expected {} or {} arguments", min, max)
    };
    Err(XPathError::function(
        function,
        format!("{}, got {}", expected, args.len()),
    ))
}

fn node_set_arg<'a, N: DataSourceNode<'a>>(
    function: &str,
    value: XPathValue<N>,
) -> Result<Vec<N>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        other => Err(XPathError::function(
            function,
            format!("argument must be a node-set, got a {}", other.kind()),
        )),
    }
}

/// The node a name function reports on: the context node with no argument,
/// otherwise the first node of the argument in document order.
fn optional_node_arg<'a, 'd, N: DataSourceNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<Option<N>, XPathError> {
    check_arity(function, &args, 0, 1)?;
    if args.is_empty() {
        return Ok(Some(e_ctx.context_node));
    }
    let nodes = node_set_arg(function, args.remove(0))?;
    Ok(nodes.into_iter().min())
}

/// The argument as a string, defaulting to the context node's string value.
fn optional_string_arg<'a, 'd, N: DataSourceNode<'a>>(
    function: &str,
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<String, XPathError> {
    check_arity(function, &args, 0, 1)?;
    Ok(if args.is_empty() {
        e_ctx.context_node.string_value()
    } else {
        args.remove(0).to_string()
    })
}

fn two_strings<'a, N: DataSourceNode<'a>>(args: Vec<XPathValue<N>>) -> (String, String) {
    let mut iter = args.into_iter().map(|arg| arg.to_string());
    let s1 = iter.next().unwrap_or_default();
    let s2 = iter.next().unwrap_or_default();
    (s1, s2)
}

// --- Node-Set Functions ---

fn func_last<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("last", &args, 0, 0)?;
    Ok(XPathValue::Number(e_ctx.context_size as f64))
}

fn func_position<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("position", &args, 0, 0)?;
    Ok(XPathValue::Number(e_ctx.context_position as f64))
}

fn func_count<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("count", &args, 1, 1)?;
    let nodes = node_set_arg("count", args.remove(0))?;
    Ok(XPathValue::Number(nodes.len() as f64))
}

fn func_id<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("id", &args, 1, 1)?;

    // A node-set argument contributes the tokens of every node's string value.
    let id_strings: Vec<String> = match args.remove(0) {
        XPathValue::NodeSet(nodes) => nodes.iter().map(|n| n.string_value()).collect(),
        other => vec![other.to_string()],
    };
    let ids_to_find: HashSet<&str> = id_strings
        .iter()
        .flat_map(|s| s.split_whitespace())
        .collect();
    if ids_to_find.is_empty() {
        return Ok(XPathValue::NodeSet(vec![]));
    }

    let mut results = Vec::new();
    let mut stack = vec![e_ctx.root_node];
    while let Some(node) = stack.pop() {
        if node.node_type() == NodeType::Element {
            let matched = node.attributes().any(|attr| {
                attr.name().is_some_and(|q_name| {
                    let is_id_attr = (q_name.prefix == Some("xml") || q_name.prefix.is_none())
                        && q_name.local_part == "id";
                    is_id_attr && ids_to_find.contains(attr.string_value().trim())
                })
            });
            if matched {
                results.push(node);
            }
        }
        stack.extend(node.children());
    }

    Ok(XPathValue::NodeSet(document_order(results)))
}

fn func_local_name<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = optional_node_arg("local-name", args, e_ctx)?;
    let name = node
        .and_then(|n| n.name().map(|q| q.local_part.to_string()))
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

fn func_namespace_uri<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = optional_node_arg("namespace-uri", args, e_ctx)?;
    let uri = node
        .and_then(|n| n.namespace_uri())
        .unwrap_or_default()
        .to_string();
    Ok(XPathValue::String(uri))
}

fn func_name<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let node = optional_node_arg("name", args, e_ctx)?;
    let name = node
        .and_then(|n| {
            n.name().map(|q| {
                if let Some(prefix) = q.prefix {
                    format!("{}:{}", prefix, q.local_part)
                } else {
                    q.local_part.to_string()
                }
            })
        })
        .unwrap_or_default();
    Ok(XPathValue::String(name))
}

// --- String Functions ---

fn func_string<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    optional_string_arg("string", args, e_ctx).map(XPathValue::String)
}

fn func_concat<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("concat", &args, 2, usize::MAX)?;
    let result = args.iter().map(|v| v.to_string()).collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_starts_with<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("starts-with", &args, 2, 2)?;
    let (s1, s2) = two_strings(args);
    Ok(XPathValue::Boolean(s1.starts_with(&s2)))
}

fn func_contains<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("contains", &args, 2, 2)?;
    let (s1, s2) = two_strings(args);
    Ok(XPathValue::Boolean(s1.contains(&s2)))
}

fn func_substring_before<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("substring-before", &args, 2, 2)?;
    let (s1, s2) = two_strings(args);
    let before = s1.find(&s2).map(|index| &s1[..index]).unwrap_or_default();
    Ok(XPathValue::String(before.to_string()))
}

fn func_substring_after<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("substring-after", &args, 2, 2)?;
    let (s1, s2) = two_strings(args);
    let after = s1
        .find(&s2)
        .map(|index| &s1[index + s2.len()..])
        .unwrap_or_default();
    Ok(XPathValue::String(after.to_string()))
}

fn func_substring<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("substring", &args, 2, 3)?;
    let length_val = if args.len() == 3 {
        Some(args.remove(2).to_number())
    } else {
        None
    };
    let start_val = args.remove(1).to_number();
    let s = args.remove(0).to_string();

    // Characters at positions p with round(start) <= p < round(start) + round(length).
    // NaN bounds select nothing because every comparison with NaN is false.
    let first = xpath_round(start_val);
    let last = match length_val {
        Some(l) => first + xpath_round(l),
        None => f64::INFINITY,
    };

    let result = s
        .chars()
        .enumerate()
        .filter_map(|(i, c)| {
            let pos = (i + 1) as f64; // XPath positions are 1-based
            (pos >= first && pos < last).then_some(c)
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

fn func_string_length<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let s = optional_string_arg("string-length", args, e_ctx)?;
    Ok(XPathValue::Number(s.chars().count() as f64))
}

fn func_normalize_space<'a, 'd, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let s = optional_string_arg("normalize-space", args, e_ctx)?;
    let normalized = s
        .split(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(XPathValue::String(normalized))
}

fn func_translate<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("translate", &args, 3, 3)?;
    let to_str: Vec<char> = args.remove(2).to_string().chars().collect();
    let from_str: Vec<char> = args.remove(1).to_string().chars().collect();
    let source_str = args.remove(0).to_string();
    let result = source_str
        .chars()
        .filter_map(|c| {
            // Only the first occurrence of a character in `from` counts.
            if let Some(pos) = from_str.iter().position(|&fc| fc == c) {
                to_str.get(pos).copied()
            } else {
                Some(c)
            }
        })
        .collect::<String>();
    Ok(XPathValue::String(result))
}

// --- Boolean Functions ---

fn func_boolean<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("boolean", &args, 1, 1)?;
    Ok(XPathValue::Boolean(args.remove(0).to_bool()))
}

fn func_not<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("not", &args, 1, 1)?;
    Ok(XPathValue::Boolean(!args.remove(0).to_bool()))
}

fn func_true<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("true", &args, 0, 0)?;
    Ok(XPathValue::Boolean(true))
}

fn func_false<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("false", &args, 0, 0)?;
    Ok(XPathValue::Boolean(false))
}

fn func_lang<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("lang", &args, 1, 1)?;
    let test_lang = args.remove(0).to_string().to_lowercase();
    let mut current = Some(e_ctx.context_node);

    // If context node is not an element, start with its parent.
    if current.is_some_and(|n| n.node_type() != NodeType::Element) {
        current = current.and_then(|n| n.parent());
    }

    while let Some(node) = current {
        let declared = node.attributes().find(|attr| {
            attr.name()
                .is_some_and(|name| name.prefix == Some("xml") && name.local_part == "lang")
        });
        if let Some(attr) = declared {
            // The nearest xml:lang decides; "en" matches "en" and "en-GB".
            let node_lang = attr.string_value().to_lowercase();
            let matches = node_lang == test_lang
                || node_lang
                    .strip_prefix(test_lang.as_str())
                    .is_some_and(|rest| rest.starts_with('-'));
            return Ok(XPathValue::Boolean(matches));
        }
        current = node.parent();
    }
    Ok(XPathValue::Boolean(false))
}

// --- Number Functions ---

fn func_number<'a, 'd, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("number", &args, 0, 1)?;
    let n = if args.is_empty() {
        parse_number(&e_ctx.context_node.string_value())
    } else {
        args.remove(0).to_number()
    };
    Ok(XPathValue::Number(n))
}

fn func_sum<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("sum", &args, 1, 1)?;
    let nodes = node_set_arg("sum", args.remove(0))?;
    let sum = nodes
        .iter()
        .map(|node| parse_number(&node.string_value()))
        .sum();
    Ok(XPathValue::Number(sum))
}

fn func_floor<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("floor", &args, 1, 1)?;
    Ok(XPathValue::Number(args.remove(0).to_number().floor()))
}

fn func_ceiling<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("ceiling", &args, 1, 1)?;
    Ok(XPathValue::Number(args.remove(0).to_number().ceil()))
}

fn func_round<'a, N: DataSourceNode<'a>>(
    mut args: Vec<XPathValue<N>>,
) -> Result<XPathValue<N>, XPathError> {
    check_arity("round", &args, 1, 1)?;
    Ok(XPathValue::Number(xpath_round(args.remove(0).to_number())))
}

/// XPath 1.0 rounding: halves go towards positive infinity.
fn xpath_round(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() || n == 0.0 {
        return n;
    }
    if (-0.5..0.0).contains(&n) {
        return -0.0;
    }
    (n + 0.5).floor()
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        // Node-set
        registry.register_builtin("last");
        registry.register_builtin("position");
        registry.register_builtin("count");
        registry.register_builtin("id");
        registry.register_builtin("local-name");
        registry.register_builtin("namespace-uri");
        registry.register_builtin("name");
        // String
        registry.register_builtin("string");
        registry.register_builtin("concat");
        registry.register_builtin("starts-with");
        registry.register_builtin("contains");
        registry.register_builtin("substring-before");
        registry.register_builtin("substring-after");
        registry.register_builtin("substring");
        registry.register_builtin("string-length");
        registry.register_builtin("normalize-space");
        registry.register_builtin("translate");
        // Boolean
        registry.register_builtin("boolean");
        registry.register_builtin("not");
        registry.register_builtin("true");
        registry.register_builtin("false");
        registry.register_builtin("lang");
        // Number
        registry.register_builtin("number");
        registry.register_builtin("sum");
        registry.register_builtin("floor");
        registry.register_builtin("ceiling");
        registry.register_builtin("round");
        registry
    }
}
