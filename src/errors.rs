//! # Application Error Handling

use crate::{
    graph::GraphParseError,
    ontology::{document::DocumentError, IriError, OntologyError, OntologyServiceError},
    sitemap::SitemapError,
    skolemizer::SkolemizeError,
    template_call::ParameterError,
    uri_template::UriTemplateError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Sitemap(#[from] SitemapError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Skolemize(#[from] SkolemizeError),

    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    Service(#[from] OntologyServiceError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Graph(#[from] GraphParseError),

    #[error(transparent)]
    UriTemplate(#[from] UriTemplateError),

    #[error(transparent)]
    Iri(#[from] IriError),

    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),

    #[error(transparent)]
    Tera(#[from] tera::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error("cannot initialize logger: {0}")]
    Logger(String),
}
