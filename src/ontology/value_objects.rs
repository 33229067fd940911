use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::{NamedNode, NamedNodeRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value object ensuring that supplied text represents a valid absolute IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// The constructor rejects malformed and relative identifiers, so every
    /// schema element and every skolemized resource carries a canonical identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the local part of the identifier: the text after the last `#`,
    /// or after the last `/` when there is no fragment separator.
    ///
    /// Query parameter names and URI template placeholders are matched
    /// against property local names.
    #[must_use]
    pub fn local_name(&self) -> &str {
        let value = self.value.as_str();
        value
            .rfind('#')
            .or_else(|| value.rfind('/'))
            .or_else(|| value.rfind(':'))
            .map_or(value, |index| &value[index + 1..])
    }

    /// Borrows the identifier as an RDF named node.
    #[must_use]
    pub fn as_named_node(&self) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(&self.value)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.value
    }
}

impl From<NamedNodeRef<'_>> for Iri {
    fn from(node: NamedNodeRef<'_>) -> Self {
        Self {
            value: node.as_str().to_owned(),
        }
    }
}

impl From<NamedNode> for Iri {
    fn from(node: NamedNode) -> Self {
        Self {
            value: node.into_string(),
        }
    }
}

impl PartialEq<NamedNodeRef<'_>> for Iri {
    fn eq(&self, other: &NamedNodeRef<'_>) -> bool {
        self.value == other.as_str()
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an absolute IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}
