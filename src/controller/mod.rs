//! `axum` glue: error responses, hypermedia transitions as responses, a
//! handler that resolves request URIs against the sitemap and one that
//! skolemizes posted graphs.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use url::Url;

use crate::{
    config::Config,
    graph::Graph,
    hypermedia::{HypermediaBuilder, Transition},
    ontology::{OntologyServiceError, SitemapService},
    sitemap::{SitemapError, TemplateRegistry},
    skolemizer::{SkolemizeError, Skolemizer},
    template_call::TemplateCall,
    Error, Result,
};

const N_TRIPLES: &str = "application/n-triples";

/// Shared state of the request handlers.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub sitemaps: SitemapService,
}

impl AppContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let sitemaps = SitemapService::from_config(&config.sitemap);
        Self {
            config: Arc::new(config),
            sitemaps,
        }
    }
}

/// Body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub error: String,
    pub description: String,
}

impl ErrorDetail {
    #[must_use]
    pub fn new<T: Into<String>>(error: T, description: T) -> Self {
        Self {
            error: error.into(),
            description: description.into(),
        }
    }
}

impl Error {
    /// Status code reported for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Parameter(_)
            | Self::Iri(_)
            | Self::Graph(_)
            | Self::Skolemize(
                SkolemizeError::Template { .. }
                | SkolemizeError::InvalidUri { .. }
                | SkolemizeError::UriTaken { .. },
            ) => StatusCode::BAD_REQUEST,
            Self::NotFound
            | Self::Sitemap(SitemapError::MissingOntology { .. })
            | Self::Service(OntologyServiceError::Missing { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error.msg = %self, error.details = ?self, "request failed");
        } else {
            tracing::debug!(error.msg = %self, "request rejected");
        }
        let reason = status.canonical_reason().unwrap_or("error");
        (status, Json(ErrorDetail::new(reason.to_string(), self.to_string()))).into_response()
    }
}

impl IntoResponse for Transition {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(uri) => Redirect::to(uri.as_str()).into_response(),
            Self::Render(graph) => {
                let body: String = graph
                    .statements()
                    .map(|statement| format!("{statement}\n"))
                    .collect();
                ([(header::CONTENT_TYPE, N_TRIPLES)], body).into_response()
            }
        }
    }
}

/// Resolves the request against the root sitemap and answers with the
/// hypermedia state of the matched template.
///
/// # Errors
///
/// `404` when no template matches the path, `400` for unsupported or
/// malformed arguments.
pub async fn state(State(ctx): State<AppContext>, uri: Uri) -> Result<Response> {
    let sitemap = ctx.sitemaps.sitemap()?;
    let registry = TemplateRegistry::new(&sitemap);
    let matched = registry.best_match(uri.path()).ok_or(Error::NotFound)?;

    let request_uri = request_uri(&ctx.config.server.base_uri, &uri);
    let mut absolute_path = request_uri.clone();
    absolute_path.set_query(None);

    let call = TemplateCall::from_query(matched.template, request_uri.query().unwrap_or(""))?
        .apply_defaults();
    let transition = HypermediaBuilder::default().transition(&request_uri, &absolute_path, &call)?;
    Ok(transition.into_response())
}

/// Assigns URIs to the anonymous resources of a posted N-Triples graph and
/// answers with the renamed graph. Segment templates resolve against the
/// request path.
///
/// # Errors
///
/// `400` when the body is not N-Triples or a resource cannot be named.
pub async fn skolemize(State(ctx): State<AppContext>, uri: Uri, body: String) -> Result<Response> {
    let sitemap = ctx.sitemaps.sitemap()?;
    let mut graph = Graph::from_ntriples(&body)?;

    let base_uri = &ctx.config.server.base_uri;
    let mut absolute_path = request_uri(base_uri, &uri);
    absolute_path.set_query(None);

    let skolemizer = Skolemizer::new(&sitemap, base_uri.clone(), absolute_path);
    let renamed = skolemizer.build_all(&mut graph)?;
    tracing::debug!(renamed = renamed.len(), "skolemized posted graph");
    Ok(Transition::Render(graph).into_response())
}

/// The request path and query placed under the path of `base_uri`. The
/// result always keeps the scheme and authority of `base_uri`.
fn request_uri(base_uri: &Url, uri: &Uri) -> Url {
    let mut request_uri = base_uri.clone();
    let path = format!(
        "{}/{}",
        base_uri.path().trim_end_matches('/'),
        uri.path().trim_start_matches('/')
    );
    request_uri.set_path(&path);
    request_uri.set_query(uri.query());
    request_uri.set_fragment(None);
    request_uri
}

/// Every path is resolved through the sitemap: `GET` renders hypermedia
/// states, `POST` skolemizes the request graph.
pub fn routes() -> Router<AppContext> {
    let handler = || get(state).post(skolemize);
    Router::new()
        .route("/", handler())
        .route("/{*path}", handler())
}

#[cfg(test)]
mod tests {
    use axum::body;

    use super::*;
    use crate::{
        graph::{Graph, Node, Value},
        ontology::Iri,
        template_call::ParameterError,
    };

    #[tokio::test]
    async fn parameter_errors_are_bad_requests() {
        let err = Error::Parameter(ParameterError::Unsupported {
            name: "sort".to_string(),
            template: Iri::new("https://example.org/ns#Container").unwrap(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(json["error"], "Bad Request");
        assert_eq!(
            json["description"],
            "Parameter 'sort' not supported by Template 'https://example.org/ns#Container'"
        );
    }

    #[tokio::test]
    async fn missing_ontology_is_not_found() {
        let err = Error::Sitemap(SitemapError::MissingOntology {
            ontology: Iri::new("https://example.org/missing#").unwrap(),
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn render_emits_ntriples() {
        let mut graph = Graph::new();
        graph.insert(
            Node::Named(Iri::new("https://example.org/a").unwrap()),
            Iri::new("https://example.org/p").unwrap(),
            Value::string("x"),
        );
        let response = Transition::Render(graph).into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], N_TRIPLES);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            "<https://example.org/a> <https://example.org/p> \"x\" .\n"
        );
    }

    #[tokio::test]
    async fn redirect_is_see_other() {
        let uri = url::Url::parse("https://example.org/files/?limit=10&offset=0").unwrap();
        let response = Transition::Redirect(uri).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.org/files/?limit=10&offset=0"
        );
    }

    #[test]
    fn request_uri_keeps_base_authority() {
        let base = url::Url::parse("https://example.org/").unwrap();
        for path in ["/http:evil.example/", "//evil.example/files/", "/https://evil.example/"] {
            let uri: Uri = path.parse().unwrap();
            let request = request_uri(&base, &uri);
            assert_eq!(request.host_str(), Some("example.org"), "{path}");
            assert_eq!(request.scheme(), "https", "{path}");
        }
    }

    #[test]
    fn request_uri_nests_under_base_path() {
        let base = url::Url::parse("https://example.org/app/").unwrap();
        let uri: Uri = "/files/?limit=10".parse().unwrap();
        assert_eq!(
            request_uri(&base, &uri).as_str(),
            "https://example.org/app/files/?limit=10"
        );
    }
}
