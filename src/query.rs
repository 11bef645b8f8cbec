//! Node-set queries over a parsed source document.
//!
//! Only the subset of location paths needed to find headings is supported: a
//! union of absolute paths built from child (`/name`) and descendant
//! (`//name`) steps, where `name` may be the `*` wildcard.  The grammar is
//! parsed with `nom`.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, recognize, value},
    error::ParseError,
    multi::{many1, separated_list1},
    sequence::{delimited, pair},
    IResult, Parser,
};
use roxmltree::{Document, Node};

use crate::error::{OutlineError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: String,
}

impl Step {
    fn matches(&self, node: &Node<'_, '_>) -> bool {
        // Prefixes are not bound to namespaces, so only the local part is compared.
        let local = self.name.rsplit(':').next().unwrap_or(&self.name);
        node.is_element() && (local == "*" || node.tag_name().name() == local)
    }
}

/// A parsed node-set expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    paths: Vec<Vec<Step>>,
}

impl Query {
    /// Parses an expression such as `//heading|//section/title`.
    ///
    /// Whitespace is allowed around steps and the `|` operator.
    pub fn parse(expression: &str) -> Result<Self> {
        match all_consuming(union).parse(expression) {
            Ok((_, paths)) => Ok(Self { paths }),
            Err(err) => Err(OutlineError::Query {
                expression: expression.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Evaluates the query and returns matching elements in document order.
    pub fn select<'a, 'input>(&self, document: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
        let mut selected: Vec<Node<'a, 'input>> = Vec::new();
        for steps in &self.paths {
            let mut context = vec![document.root()];
            for step in steps {
                context = apply_step(&context, step);
            }
            selected.extend(context);
        }

        selected.sort_by_key(|node| node.range().start);
        selected.dedup_by_key(|node| node.id());
        selected
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn union(input: &str) -> IResult<&str, Vec<Vec<Step>>> {
    separated_list1(ws(char('|')), path).parse(input)
}

fn path(input: &str) -> IResult<&str, Vec<Step>> {
    many1(step).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    map(pair(ws(axis), ws(name_test)), |(axis, name)| Step { axis, name }).parse(input)
}

fn axis(input: &str) -> IResult<&str, Axis> {
    alt((
        value(Axis::Descendant, tag("//")),
        value(Axis::Child, tag("/")),
    ))
    .parse(input)
}

fn name_test(input: &str) -> IResult<&str, String> {
    map(
        alt((tag("*"), recognize(pair(nc_name, opt(pair(char(':'), nc_name)))))),
        |name: &str| name.to_string(),
    )
    .parse(input)
}

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
    ))
    .parse(input)
}

fn apply_step<'a, 'input>(context: &[Node<'a, 'input>], step: &Step) -> Vec<Node<'a, 'input>> {
    let mut result = Vec::new();
    for node in context {
        match step.axis {
            Axis::Child => result.extend(node.children().filter(|child| step.matches(child))),
            Axis::Descendant => result.extend(
                node.descendants()
                    .skip(1)
                    .filter(|descendant| step.matches(descendant)),
            ),
        }
    }
    result
}

/// Parses `expression` and evaluates it against `document`.
pub fn select<'a, 'input>(
    document: &'a Document<'input>,
    expression: &str,
) -> Result<Vec<Node<'a, 'input>>> {
    Ok(Query::parse(expression)?.select(document))
}
