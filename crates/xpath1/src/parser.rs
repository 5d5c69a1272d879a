//! A `nom`-based parser for the XPath 1.0 expression language.

use super::ast::*;
use crate::error::XPathError;
use std::cell::Cell;
use nom::{
    IResult, Parser,
    branch::alt,
    error::{ErrorKind, ParseError},
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{map, not, opt, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    DEEPEST_FAILURE.with(|deepest| deepest.set(None));
    let parsed = expression(input);
    let deepest = DEEPEST_FAILURE.with(Cell::take);
    match parsed {
        Ok((rem, expr)) => {
            let rem = rem.trim_start();
            if rem.is_empty() {
                Ok(expr)
            } else {
                let stop = furthest(input, rem, deepest);
                let message = if stop.len() < rem.len() {
                    "unexpected input"
                } else {
                    "unexpected trailing input"
                };
                Err(syntax_error(input, stop, message))
            }
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let stop = furthest(input, e.input, deepest);
            let message = if stop.trim().is_empty() {
                "unexpected end of expression"
            } else {
                "invalid expression"
            };
            Err(syntax_error(input, stop, message))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(syntax_error(input, "", "unexpected end of expression"))
        }
    }
}

type PResult<'a, O> = IResult<&'a str, O, SyntaxFailure<'a>>;

thread_local! {
    /// Remaining input length at the deepest failure of the parse in progress.
    /// Alternatives that fail deep inside a construct are otherwise lost once
    /// a shorter alternative succeeds.
    static DEEPEST_FAILURE: Cell<Option<usize>> = const { Cell::new(None) };
}

/// A parse failure positioned at the remaining input.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxFailure<'a> {
    input: &'a str,
}

impl<'a> SyntaxFailure<'a> {
    fn at(input: &'a str) -> Self {
        DEEPEST_FAILURE.with(|deepest| {
            if deepest.get().is_none_or(|len| input.len() < len) {
                deepest.set(Some(input.len()));
            }
        });
        Self { input }
    }
}

impl<'a> ParseError<&'a str> for SyntaxFailure<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        // `not(..)` fails after its inner parser matched, past the real stop.
        if kind == ErrorKind::Not {
            Self { input }
        } else {
            Self::at(input)
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a str, _c: char) -> Self {
        Self::at(input)
    }

    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

/// The remainder at whichever stop point lies further into `source`.
fn furthest<'s>(source: &'s str, remainder: &'s str, deepest: Option<usize>) -> &'s str {
    let len = deepest.map_or(remainder.len(), |len| len.min(remainder.len()));
    &source[source.len() - len..]
}

fn syntax_error(source: &str, remainder: &str, message: &str) -> XPathError {
    let offset = source.len().saturating_sub(remainder.len());
    let near: String = remainder.chars().take(16).collect();
    let message = if near.is_empty() {
        message.to_string()
    } else {
        format!("{} near '{}'", message, near)
    };
    XPathError::Syntax {
        expression: source.to_string(),
        offset,
        message,
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Matches an operator name such as `and` or `div` only when it is not the
/// prefix of a longer name.
fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = SyntaxFailure<'a>> {
    terminated(tag(word), not(satisfy(is_name_char)))
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> PResult<'a, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = SyntaxFailure<'a>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = SyntaxFailure<'a>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (input, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;

        for (op, right) in remainder {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str) -> PResult<'_, Expression> {
    or_expr(input)
}

fn or_op(input: &str) -> PResult<'_, BinaryOperator> {
    map(keyword("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> PResult<'_, BinaryOperator> {
    map(keyword("and"), |_| BinaryOperator::And).parse(input)
}

fn or_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(equality_expr, and_op)(input)
}

fn equality_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(tag("="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag("&lt;="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("&gt;="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag("&lt;"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
        map(tag("&gt;"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> PResult<'_, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(keyword("div"), |_| BinaryOperator::Divide),
        map(keyword("mod"), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn union_op(input: &str) -> PResult<'_, BinaryOperator> {
    map(char('|'), |_| BinaryOperator::Union).parse(input)
}

fn equality_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> PResult<'_, Expression> {
    alt((
        map(preceded(ws(char('-')), unary_expr), |expr| {
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            }
        }),
        union_expr,
    ))
    .parse(input)
}

// The union operator `|` binds tighter than every other operator and only
// combines path expressions.
fn union_expr(input: &str) -> PResult<'_, Expression> {
    build_binary_expr_parser(path_expr, union_op)(input)
}

/// This is the core parser that handles the ambiguity between location paths
/// and filter expressions that might be followed by a path.
fn path_expr(input: &str) -> PResult<'_, Expression> {
    // Try primary expressions FIRST, because a function call like `position()` is a primary expression,
    // but the more general `location_path` parser might incorrectly parse `position` as a step name
    // before the `function_call` parser gets a chance to see the `()`.
    ws(alt((
        filter_path,
        map(location_path, Expression::LocationPath),
    )))
    .parse(input)
}

fn filter_path(input: &str) -> PResult<'_, Expression> {
    let (i, primary) = primary_expr(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    let start = if predicates.is_empty() {
        primary
    } else {
        Expression::Filter {
            primary: Box::new(primary),
            predicates,
        }
    };

    let (i, steps) = relative_steps(i)?;
    if steps.is_empty() {
        return Ok((i, start));
    }

    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point: Some(Box::new(start)),
            is_absolute: false,
            steps,
        }),
    ))
}

fn primary_expr(input: &str) -> PResult<'_, Expression> {
    ws(alt((
        variable_reference,
        map(number_literal, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(char('('), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn number_literal(input: &str) -> PResult<'_, f64> {
    let (i, text) = alt((
        recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
        recognize(pair(char('.'), digit1)),
    ))
    .parse(input)?;
    // Only digits and a single '.', which `f64` always accepts.
    Ok((i, text.parse().unwrap_or(f64::NAN)))
}

fn string_literal(input: &str) -> PResult<'_, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

// --- Variable Reference Parser ---
fn variable_reference(input: &str) -> PResult<'_, Expression> {
    map(preceded(char('$'), q_name), Expression::Variable).parse(input)
}

// --- Name and NodeTest Parsers ---
fn nc_name(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        take_while1(is_name_start_char),
        take_while(is_name_char),
    ))
    .parse(input)
}

fn q_name(input: &str) -> PResult<'_, String> {
    map(
        recognize(pair(nc_name, opt(pair(char(':'), nc_name)))),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

const NODE_TYPE_NAMES: [&str; 4] = ["processing-instruction", "comment", "text", "node"];

fn node_type_test(input: &str) -> PResult<'_, NodeTest> {
    let (i, kind) = alt((
        tag(NODE_TYPE_NAMES[0]),
        tag(NODE_TYPE_NAMES[1]),
        tag(NODE_TYPE_NAMES[2]),
        tag(NODE_TYPE_NAMES[3]),
    ))
    .parse(input)?;
    let (i, _) = ws(char('(')).parse(i)?;
    let (i, target) = if kind == "processing-instruction" {
        opt(ws(string_literal)).parse(i)?
    } else {
        (i, None)
    };
    let (i, _) = char(')').parse(i)?;

    let test = match kind {
        "text" => NodeTypeTest::Text,
        "comment" => NodeTypeTest::Comment,
        "processing-instruction" => NodeTypeTest::ProcessingInstruction(target),
        _ => NodeTypeTest::Node, // "node"
    };
    Ok((i, NodeTest::NodeType(test)))
}

fn name_test(input: &str) -> PResult<'_, NodeTest> {
    let (i, first) = nc_name(input)?;
    let (i, second) = opt(preceded(
        char(':'),
        alt((map(char('*'), |_| None), map(nc_name, Some))),
    ))
    .parse(i)?;

    let test = match second {
        None => NodeTest::Name(NameTest::local(first)),
        Some(None) => NodeTest::PrefixWildcard(first.to_string()),
        Some(Some(local)) => NodeTest::Name(NameTest {
            prefix: Some(first.to_string()),
            local_name: local.to_string(),
        }),
    };
    Ok((i, test))
}

pub fn node_test(input: &str) -> PResult<'_, NodeTest> {
    alt((map(char('*'), |_| NodeTest::Wildcard), node_type_test, name_test)).parse(input)
}

// --- Path Parsers ---
fn axis(input: &str) -> PResult<'_, Axis> {
    map(
        terminated(
            alt((
                tag("child"),
                tag("descendant-or-self"),
                tag("descendant"),
                tag("attribute"),
                tag("namespace"),
                tag("parent"),
                tag("ancestor-or-self"),
                tag("ancestor"),
                tag("self"),
                tag("following-sibling"),
                tag("preceding-sibling"),
                tag("following"),
                tag("preceding"),
            )),
            ws(tag("::")),
        ),
        |axis_str: &str| match axis_str {
            "descendant-or-self" => Axis::DescendantOrSelf,
            "descendant" => Axis::Descendant,
            "attribute" => Axis::Attribute,
            "namespace" => Axis::Namespace,
            "parent" => Axis::Parent,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "ancestor" => Axis::Ancestor,
            "self" => Axis::SelfAxis,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            _ => Axis::Child, // child
        },
    )
    .parse(input)
}

fn predicate(input: &str) -> PResult<'_, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> PResult<'_, Step> {
    alt((
        map(tag(".."), |_| Step::any_node(Axis::Parent)),
        map(char('.'), |_| Step::any_node(Axis::SelfAxis)),
        axis_step,
    ))
    .parse(input)
}

fn axis_step(input: &str) -> PResult<'_, Step> {
    let (i, (axis, node_test)) = alt((
        map(preceded(ws(char('@')), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| {
            (ax.unwrap_or(Axis::Child), nt)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn path_separator(input: &str) -> PResult<'_, &str> {
    ws(alt((tag("//"), tag("/")))).parse(input)
}

/// Parses any number of `/step` or `//step` continuations.
fn relative_steps(input: &str) -> PResult<'_, Vec<Step>> {
    let (i, remainder) = many0(pair(path_separator, step)).parse(input)?;
    let mut steps = Vec::with_capacity(remainder.len());
    for (sep, next_step) in remainder {
        if sep == "//" {
            steps.push(Step::any_node(Axis::DescendantOrSelf));
        }
        steps.push(next_step);
    }
    Ok((i, steps))
}

fn location_path(input: &str) -> PResult<'_, LocationPath> {
    // This parser handles a path that does NOT start with a variable or function call.
    let (i, (is_absolute, mut steps)) =
        if let Ok((rem, _)) = tag::<&str, &str, SyntaxFailure<'_>>("//")(input) {
            let (rem, step) = preceded(multispace0, step).parse(rem)?;
            (
                rem,
                (true, vec![Step::any_node(Axis::DescendantOrSelf), step]),
            )
        } else if let Ok((rem, _)) = tag::<&str, &str, SyntaxFailure<'_>>("/")(input) {
            if let Ok((rem, first_step)) = preceded(multispace0, step).parse(rem) {
                (rem, (true, vec![first_step]))
            } else {
                // This handles the case of a path that is just "/"
                (rem, (true, vec![]))
            }
        } else {
            let (rem, first_step) = step(input)?;
            (rem, (false, vec![first_step]))
        };

    // After the first step, subsequent steps MUST be preceded by / or //.
    let (i, remainder) = relative_steps(i)?;
    steps.extend(remainder);

    Ok((
        i,
        LocationPath {
            start_point: None,
            is_absolute,
            steps,
        },
    ))
}

// --- Function Call Parser ---
fn function_call(input: &str) -> PResult<'_, Expression> {
    // A function call must be a QName followed by '('. This lookahead avoids
    // parsing a simple step name (like 'foo' in 'foo/bar') as a function.
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Node-type tests like text() are not functions. They are handled by the step parser.
    if NODE_TYPE_NAMES.contains(&name.as_str()) {
        return Err(nom::Err::Error(SyntaxFailure::from_error_kind(
            input,
            ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}
