//! The entry point callers use to compile and run expressions against a tree.

use crate::error::Error;
use crate::expression::XPathExpression;
use crate::result::{XPathResult, materialize};
use crate::result_type::ResultType;
use domxpath_xpath1::{
    DataSourceNode, EvaluationContext, FunctionRegistry, NamespaceResolver, Scalar, XPathError,
    XPathValue,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type SharedResolver = Arc<dyn NamespaceResolver + Send + Sync>;

static DEFAULT_EVALUATOR: Lazy<XPathEvaluator> = Lazy::new(XPathEvaluator::default);

/// Compiles and evaluates expressions with a fixed function library and an
/// optional default namespace resolver. Evaluators are immutable and can be
/// shared between threads.
#[derive(Clone, Default)]
pub struct XPathEvaluator {
    functions: FunctionRegistry,
    namespaces: Option<SharedResolver>,
}

impl fmt::Debug for XPathEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XPathEvaluator")
            .field("functions", &self.functions)
            .field("has_namespace_resolver", &self.namespaces.is_some())
            .finish()
    }
}

impl XPathEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> XPathEvaluatorBuilder {
        XPathEvaluatorBuilder::default()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn compile(&self, text: &str) -> Result<XPathExpression, Error> {
        XPathExpression::compile(text)
    }

    /// Evaluates `expression` with `context` as the context node.
    ///
    /// `resolver` takes precedence over the evaluator's own resolver. Without
    /// either, prefixed name tests compare prefixes literally.
    pub fn evaluate<'a, N>(
        &self,
        expression: &XPathExpression,
        context: N,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
    ) -> Result<XPathResult<N::Key>, Error>
    where
        N: DataSourceNode<'a> + 'a,
    {
        let variables = HashMap::new();
        self.evaluate_with_variables(expression, context, resolver, requested, &variables)
    }

    /// Like [`XPathEvaluator::evaluate`], with bindings for `$name` references.
    pub fn evaluate_with_variables<'a, N>(
        &self,
        expression: &XPathExpression,
        context: N,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
        variables: &HashMap<String, XPathValue<N>>,
    ) -> Result<XPathResult<N::Key>, Error>
    where
        N: DataSourceNode<'a> + 'a,
    {
        let namespaces: Option<&dyn NamespaceResolver> = match resolver {
            Some(resolver) => Some(resolver),
            None => self
                .namespaces
                .as_deref()
                .map(|resolver| resolver as &dyn NamespaceResolver),
        };
        log::debug!(
            "Evaluating '{}' as {} from {:?}",
            expression,
            requested,
            context
        );
        let e_ctx =
            EvaluationContext::new(context, &self.functions, variables).with_namespaces(namespaces);
        let value = domxpath_xpath1::evaluate(expression.ast(), &e_ctx)?;
        materialize(value, requested, context.mutation_counter())
    }

    /// Compiles and evaluates in one step.
    pub fn evaluate_str<'a, N>(
        &self,
        text: &str,
        context: N,
        resolver: Option<&dyn NamespaceResolver>,
        requested: ResultType,
    ) -> Result<XPathResult<N::Key>, Error>
    where
        N: DataSourceNode<'a> + 'a,
    {
        let expression = self.compile(text)?;
        self.evaluate(&expression, context, resolver, requested)
    }
}

/// Configures an [`XPathEvaluator`].
#[derive(Default)]
pub struct XPathEvaluatorBuilder {
    functions: FunctionRegistry,
    namespaces: HashMap<String, String>,
    resolver: Option<SharedResolver>,
}

impl XPathEvaluatorBuilder {
    /// Registers an extension function, replacing any function of the same name.
    pub fn function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Scalar]) -> Result<Scalar, XPathError> + Send + Sync + 'static,
    {
        self.functions.register_extension(name, function);
        self
    }

    /// Binds a prefix for every evaluation that is not given its own resolver.
    /// Ignored when [`XPathEvaluatorBuilder::namespace_resolver`] is set.
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn namespace_resolver<R>(mut self, resolver: R) -> Self
    where
        R: NamespaceResolver + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> XPathEvaluator {
        let namespaces = match self.resolver {
            Some(resolver) => Some(resolver),
            None if self.namespaces.is_empty() => None,
            None => Some(Arc::new(self.namespaces) as SharedResolver),
        };
        XPathEvaluator {
            functions: self.functions,
            namespaces,
        }
    }
}

/// Compiles an expression with the default evaluator.
pub fn compile(text: &str) -> Result<XPathExpression, Error> {
    DEFAULT_EVALUATOR.compile(text)
}

/// Evaluates with the default evaluator, taking the result type as its numeric
/// DOM code.
pub fn evaluate<'a, N>(
    expression: &XPathExpression,
    context: N,
    resolver: Option<&dyn NamespaceResolver>,
    requested_type: u16,
) -> Result<XPathResult<N::Key>, Error>
where
    N: DataSourceNode<'a> + 'a,
{
    let requested = ResultType::try_from(requested_type)?;
    DEFAULT_EVALUATOR.evaluate(expression, context, resolver, requested)
}
