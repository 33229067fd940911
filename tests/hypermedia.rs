use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

use ldt_rs::{
    config::Config,
    controller::{self, AppContext},
    graph::Value,
    ontology::{Class, InMemoryOntologyRepository, Iri, Ontology, Parameter, SitemapService},
    vocabulary::{ldt, ldth, xsd},
};

fn iri(text: &str) -> Iri {
    Iri::new(text).expect("valid iri")
}

fn context() -> AppContext {
    let mut app = Ontology::new(iri("https://example.org/app#"));
    for (id, predicate, default) in [
        ("https://example.org/app#limit", ldth::LIMIT, Some("10")),
        ("https://example.org/app#offset", ldth::OFFSET, None),
    ] {
        let mut parameter = Parameter::new(iri(id), predicate.into())
            .optional(true)
            .with_value_type(xsd::LONG.into());
        if let Some(default) = default {
            parameter = parameter.with_default(oxrdf::Literal::new_typed_literal(default, xsd::LONG));
        }
        app.add_parameter(parameter).unwrap();
    }
    app.add_class(
        Class::new(iri("https://example.org/app#Container"))
            .with_annotation(ldt::PATH, Value::string("{path: .*}/"))
            .with_annotation(ldt::PARAM, iri("https://example.org/app#limit"))
            .with_annotation(ldt::PARAM, iri("https://example.org/app#offset")),
    )
    .unwrap();
    app.add_class(
        Class::new(iri("https://example.org/app#Item"))
            .with_annotation(ldt::PATH, Value::string("/{container}/{slug}")),
    )
    .unwrap();
    app.add_class(
        Class::new(iri("https://example.org/app#Note"))
            .defined_by(iri("https://example.org/app#"))
            .with_annotation(ldt::SEGMENT, Value::string("{slug}")),
    )
    .unwrap();

    let config = Config::from_yaml_str(
        r"
logger:
  enable: false
  level: error
  format: compact
server:
  base_uri: https://example.org/
sitemap:
  ontology: https://example.org/app#
",
    )
    .expect("config");
    let repository = Arc::new(InMemoryOntologyRepository::from_iter([app]));
    let sitemaps = SitemapService::new(iri("https://example.org/app#"), repository, true, 4);
    AppContext {
        config: Arc::new(config),
        sitemaps,
    }
}

async fn send(request: Request<Body>) -> Response {
    controller::routes()
        .with_state(context())
        .oneshot(request)
        .await
        .expect("infallible")
}

async fn request(uri: &str) -> Response {
    send(Request::get(uri).body(Body::empty()).expect("request")).await
}

async fn post(uri: &str, body: &str) -> Response {
    send(
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/n-triples")
            .body(Body::from(body.to_string()))
            .expect("request"),
    )
    .await
}

async fn text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}

#[tokio::test]
async fn defaults_redirect_to_canonical_page() {
    let response = request("/files/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://example.org/files/?limit=10"
    );
}

#[tokio::test]
async fn parameter_order_is_canonicalized() {
    let response = request("/files/?offset=10&limit=10").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://example.org/files/?limit=10&offset=10"
    );
}

#[tokio::test]
async fn canonical_page_links_siblings() {
    let response = request("/files/?limit=10&offset=10").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = text(response).await;

    let page = "<https://example.org/files/?limit=10&offset=10>";
    let prev = "<https://example.org/files/?limit=10&offset=0>";
    let next = "<https://example.org/files/?limit=10&offset=20>";
    for line in [
        format!("{page} <https://www.w3.org/ns/ldt/core/domain#viewOf> <https://example.org/files/> ."),
        format!("{page} <http://www.w3.org/1999/xhtml/vocab#prev> {prev} ."),
        format!("{page} <http://www.w3.org/1999/xhtml/vocab#next> {next} ."),
        format!("{next} <http://www.w3.org/1999/xhtml/vocab#prev> {page} ."),
        format!("{prev} <http://www.w3.org/1999/xhtml/vocab#next> {page} ."),
    ] {
        assert!(body.lines().any(|candidate| candidate == line), "missing {line}");
    }
}

#[tokio::test]
async fn first_page_has_no_previous_link() {
    let body = text(request("/files/?limit=10").await).await;
    let page = "<https://example.org/files/?limit=10>";
    let next = "<https://example.org/files/?limit=10&offset=10>";

    assert!(body
        .lines()
        .any(|line| line == format!("{page} <http://www.w3.org/1999/xhtml/vocab#next> {next} .")));
    assert!(body
        .lines()
        .any(|line| line == format!("{next} <http://www.w3.org/1999/xhtml/vocab#prev> {page} .")));
    assert!(!body
        .lines()
        .any(|line| line.starts_with(&format!("{page} <http://www.w3.org/1999/xhtml/vocab#prev>"))));
}

#[tokio::test]
async fn redirects_stay_on_the_base_host() {
    for path in ["/http:evil.example/", "/https://evil.example/"] {
        let response = request(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        let location = response.headers()[header::LOCATION]
            .to_str()
            .expect("ascii location");
        assert!(location.starts_with("https://example.org/"), "{path} -> {location}");
    }
}

#[tokio::test]
async fn resource_without_arguments_renders_empty_state() {
    let response = request("/files/readme").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.is_empty());
}

#[tokio::test]
async fn unsupported_parameter_is_bad_request() {
    let response = request("/files/?sort=title").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&text(response).await).expect("json");
    assert_eq!(
        json["description"],
        "Parameter 'sort' not supported by Template 'https://example.org/app#Container'"
    );
}

#[tokio::test]
async fn posted_graph_is_skolemized_under_request_path() {
    let response = post(
        "/notes/",
        "_:note <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://example.org/app#Note> .\n\
         _:note <https://example.org/app#slug> \"first\" .\n",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/n-triples");

    let body = text(response).await;
    assert_eq!(
        body,
        "<https://example.org/notes/first> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://example.org/app#Note> .\n\
         <https://example.org/notes/first> <https://example.org/app#slug> \"first\" .\n"
    );
}

#[tokio::test]
async fn colliding_resources_are_rejected() {
    let response = post(
        "/notes/",
        "_:a <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://example.org/app#Note> .\n\
         _:a <https://example.org/app#slug> \"same\" .\n\
         _:b <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://example.org/app#Note> .\n\
         _:b <https://example.org/app#slug> \"same\" .\n",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_graph_is_bad_request() {
    let response = post("/notes/", "this is not n-triples\n").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&text(response).await).expect("json");
    insta::assert_snapshot!(
        json["description"].as_str().unwrap_or_default().split(':').next().unwrap_or_default(),
        @"invalid N-Triples statement on line 1"
    );
}
