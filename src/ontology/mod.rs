//! Sitemap ontology primitives and their sources.
//!
//! The module keeps the schema vocabulary as plain domain constructs
//! (classes, parameters, ontologies with import edges) independently from
//! where documents come from. Repositories supply ontologies by IRI, and the
//! [`SitemapService`] compiles and caches the sitemap of a root ontology.

pub mod document;
pub mod entities;
pub mod repositories;
pub mod service;
pub mod value_objects;

pub use document::{DocumentError, OntologyDocument};
pub use entities::{Class, ClassExpression, Ontology, OntologyError, Parameter};
pub use repositories::OntologyRepository;
pub use service::{
    InMemoryOntologyRepository, LocationMapper, OntologyServiceError, RepositoryHandle,
    SitemapService,
};
pub use value_objects::{Iri, IriError};
