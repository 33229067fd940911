//! In-memory resource graph read by the skolemizer and written by the
//! hypermedia builder.
//!
//! Graphs are supplied per request by the (external) store. The only mutation
//! the core performs on a caller's graph is [`Graph::rename`], which replaces
//! a resource identity in every statement where it appears.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use indexmap::IndexSet;
use oxrdf::{BlankNode, Literal, NamedOrBlankNode, Term, Triple};

use crate::ontology::value_objects::Iri;

/// Identity of a graph resource: either a named IRI or an anonymous blank node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Named(Iri),
    Blank(BlankNode),
}

impl Node {
    /// Creates a fresh anonymous node.
    #[must_use]
    pub fn blank() -> Self {
        Self::Blank(BlankNode::default())
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// Returns the IRI for named nodes.
    #[must_use]
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Self::Named(iri) => Some(iri),
            Self::Blank(_) => None,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(iri) => write!(f, "<{iri}>"),
            Self::Blank(node) => write!(f, "_:{}", node.as_str()),
        }
    }
}

impl From<Iri> for Node {
    fn from(iri: Iri) -> Self {
        Self::Named(iri)
    }
}

impl From<BlankNode> for Node {
    fn from(node: BlankNode) -> Self {
        Self::Blank(node)
    }
}

/// Object position of a statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Node(Node),
    Literal(Literal),
}

impl Value {
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            Self::Node(_) => None,
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Literal(_) => None,
        }
    }

    /// Returns the IRI when the value is a named resource.
    #[must_use]
    pub fn as_iri(&self) -> Option<&Iri> {
        self.as_node().and_then(Node::as_iri)
    }

    /// Creates a plain string literal value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(Literal::new_simple_literal(value))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => node.fmt(f),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Iri> for Value {
    fn from(iri: Iri) -> Self {
        Self::Node(Node::Named(iri))
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

/// A single subject/predicate/object edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Node,
    pub predicate: Iri,
    pub object: Value,
}

/// N-Triples line, without the trailing newline.
impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

/// Errors raised while reading an N-Triples document.
#[derive(Debug, thiserror::Error)]
pub enum GraphParseError {
    #[error("invalid N-Triples statement on line {line}: {source}")]
    Syntax {
        line: usize,
        source: oxrdf::TermParseError,
    },
}

/// Insertion-ordered set of statements, indexed by subject.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    statements: IndexSet<Statement>,
    by_subject: HashMap<Node, Vec<usize>>,
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.statements == other.statements
    }
}

impl Eq for Graph {}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads an N-Triples document. Blank lines and `#` comments are skipped.
    ///
    /// # Errors
    ///
    /// Fails on the first line that is not a valid statement.
    pub fn from_ntriples(text: &str) -> Result<Self, GraphParseError> {
        let mut graph = Self::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let triple = Triple::from_str(line).map_err(|source| GraphParseError::Syntax {
                line: index + 1,
                source,
            })?;
            let subject = match triple.subject {
                NamedOrBlankNode::NamedNode(node) => Node::Named(node.into()),
                NamedOrBlankNode::BlankNode(node) => Node::Blank(node),
            };
            let object = match triple.object {
                Term::NamedNode(node) => Value::from(Iri::from(node)),
                Term::BlankNode(node) => Value::from(Node::Blank(node)),
                Term::Literal(literal) => Value::from(literal),
            };
            graph.insert(subject, Iri::from(triple.predicate), object);
        }
        Ok(graph)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Adds a statement, returning `false` when it was already present.
    pub fn insert(
        &mut self,
        subject: impl Into<Node>,
        predicate: impl Into<Iri>,
        object: impl Into<Value>,
    ) -> bool {
        let statement = Statement {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        };
        let subject = statement.subject.clone();
        let (index, inserted) = self.statements.insert_full(statement);
        if inserted {
            self.by_subject.entry(subject).or_default().push(index);
        }
        inserted
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Distinct subjects in order of first appearance.
    #[must_use]
    pub fn subjects(&self) -> Vec<Node> {
        let mut seen = HashSet::new();
        self.statements
            .iter()
            .filter(|stmt| seen.insert(&stmt.subject))
            .map(|stmt| stmt.subject.clone())
            .collect()
    }

    /// Outgoing statements of `subject` in insertion order.
    pub fn properties<'a>(&'a self, subject: &Node) -> impl Iterator<Item = &'a Statement> + 'a {
        self.by_subject
            .get(subject)
            .into_iter()
            .flatten()
            .filter_map(move |index| self.statements.get_index(*index))
    }

    #[must_use]
    pub fn contains(&self, subject: &Node, predicate: &Iri, object: &Value) -> bool {
        self.properties(subject)
            .any(|stmt| stmt.predicate == *predicate && stmt.object == *object)
    }

    /// Returns a read view of the resource identified by `node`.
    #[must_use]
    pub fn resource(&self, node: Node) -> Resource<'_> {
        Resource { graph: self, node }
    }

    /// Replaces `from` with the named resource `to` in subject and object
    /// positions. Statements that become identical collapse into one.
    /// Returns the number of rewritten statements.
    pub fn rename(&mut self, from: &Node, to: &Iri) -> usize {
        let target = Node::Named(to.clone());
        let mut renamed = 0;
        self.statements = std::mem::take(&mut self.statements)
            .into_iter()
            .map(|mut stmt| {
                let mut touched = false;
                if stmt.subject == *from {
                    stmt.subject = target.clone();
                    touched = true;
                }
                if matches!(&stmt.object, Value::Node(node) if node == from) {
                    stmt.object = Value::Node(target.clone());
                    touched = true;
                }
                if touched {
                    renamed += 1;
                }
                stmt
            })
            .collect();
        self.reindex();
        renamed
    }

    fn reindex(&mut self) {
        self.by_subject.clear();
        for (index, stmt) in self.statements.iter().enumerate() {
            self.by_subject
                .entry(stmt.subject.clone())
                .or_default()
                .push(index);
        }
    }
}

/// Borrowed view of one resource inside a [`Graph`].
#[derive(Clone, Debug)]
pub struct Resource<'g> {
    graph: &'g Graph,
    node: Node,
}

impl<'g> Resource<'g> {
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[must_use]
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn properties(&self) -> impl Iterator<Item = &'g Statement> {
        self.graph.properties(&self.node)
    }

    /// Whether the resource carries `predicate` with exactly `value`.
    #[must_use]
    pub fn has_property(&self, predicate: &Iri, value: &Value) -> bool {
        self.graph.contains(&self.node, predicate, value)
    }

    /// Moves the view to another resource of the same graph.
    #[must_use]
    pub fn follow(&self, node: Node) -> Resource<'g> {
        Resource {
            graph: self.graph,
            node,
        }
    }
}
