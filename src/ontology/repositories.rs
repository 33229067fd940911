use super::entities::Ontology;
use super::value_objects::Iri;

/// Source of ontology documents, looked up by ontology IRI.
///
/// Lookups are synchronous: a sitemap is assembled once and then cached, and
/// the request path never waits on a repository.
pub trait OntologyRepository {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Retrieves an ontology by identifier.
    ///
    /// Implementors must return `Ok(None)` when the ontology is missing.
    fn get(&self, iri: &Iri) -> Result<Option<Ontology>, Self::Error>;

    /// Whether the repository knows `iri`.
    fn contains(&self, iri: &Iri) -> Result<bool, Self::Error> {
        Ok(self.get(iri)?.is_some())
    }
}
