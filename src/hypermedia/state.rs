use std::collections::BTreeMap;

use url::Url;

use crate::{graph::Value, ontology::Iri};

/// Builds the URI of an application state: a base resource plus query
/// parameters named after property local names.
///
/// Each property holds one value; writing it again replaces the old one.
/// Parameters are emitted sorted by name, so equal states always produce the
/// same URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateBuilder {
    base: Url,
    parameters: BTreeMap<String, String>,
}

impl StateBuilder {
    /// Seeds the builder from `uri`, keeping its existing query parameters.
    #[must_use]
    pub fn from_uri(uri: &Url) -> Self {
        let mut base = uri.clone();
        base.set_fragment(None);
        let parameters = base
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        base.set_query(None);
        Self { base, parameters }
    }

    /// Sets `predicate` to `value`, replacing any previous value.
    pub fn property(&mut self, predicate: &Iri, value: &Value) -> &mut Self {
        let lexical = match value {
            Value::Literal(literal) => literal.value().to_string(),
            Value::Node(node) => node
                .as_iri()
                .map_or_else(|| node.to_string(), |iri| iri.as_str().to_string()),
        };
        self.parameters
            .insert(predicate.local_name().to_string(), lexical);
        self
    }

    pub fn remove(&mut self, predicate: &Iri) -> &mut Self {
        self.parameters.remove(predicate.local_name());
        self
    }

    #[must_use]
    pub fn build(&self) -> Url {
        let mut url = self.base.clone();
        if !self.parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.parameters);
        }
        url
    }
}
