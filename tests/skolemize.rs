use ldt_rs::{
    graph::{Graph, Node, Value},
    ontology::{Class, ClassExpression, Iri, Ontology},
    sitemap::Sitemap,
    skolemizer::{SkolemizeError, Skolemizer},
    vocabulary::{ldt, rdf, sioc},
};
use url::Url;

const APP: &str = "https://example.org/app#";
const LEFT: &str = "https://example.org/left#";
const RIGHT: &str = "https://example.org/right#";
const BASE: &str = "https://example.org/base#";

fn iri(text: &str) -> Iri {
    Iri::new(text).expect("valid iri")
}

fn segment_class(id: &str, defined_by: &str, segment: &str) -> Class {
    Class::new(iri(id))
        .defined_by(iri(defined_by))
        .with_annotation(ldt::SEGMENT, Value::string(segment))
}

/// app imports left and right, both import base, base imports app again.
fn sitemap() -> Sitemap {
    let mut app = Ontology::new(iri(APP));
    app.add_import(iri(LEFT));
    app.add_import(iri(RIGHT));
    let mut post = segment_class("https://example.org/app#Post", APP, "{slug}");
    post.add_parent(ClassExpression::HasValue {
        on_property: sioc::HAS_CONTAINER.into(),
        value: iri("https://example.org/posts/").into(),
    });
    post.add_parent(ClassExpression::Named(iri("https://example.org/base#Document")));
    app.add_class(post).unwrap();

    let mut left = Ontology::new(iri(LEFT));
    left.add_import(iri(BASE));
    left.add_class(segment_class("https://example.org/left#Note", LEFT, "notes/{slug}"))
        .unwrap();

    let mut right = Ontology::new(iri(RIGHT));
    right.add_import(iri(BASE));

    let mut base = Ontology::new(iri(BASE));
    base.add_import(iri(APP));
    base.add_class(segment_class(
        "https://example.org/base#Document",
        BASE,
        "{identifier}",
    ))
    .unwrap();

    Sitemap::from_ontologies(&iri(APP), [app, left, right, base]).expect("sitemap")
}

fn skolemizer(sitemap: &Sitemap) -> Skolemizer<'_> {
    Skolemizer::new(
        sitemap,
        Url::parse("https://example.org/").unwrap(),
        Url::parse("https://example.org/documents/").unwrap(),
    )
}

fn typed(graph: &mut Graph, classes: &[&str], literals: &[(&str, &str)]) -> Node {
    let node = Node::blank();
    for class in classes {
        graph.insert(node.clone(), rdf::TYPE, iri(class));
    }
    for (property, value) in literals {
        graph.insert(node.clone(), iri(property), Value::string(*value));
    }
    node
}

#[test]
fn local_classes_outrank_imported_ones() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let post = typed(
        &mut graph,
        &["https://example.org/base#Document", "https://example.org/app#Post"],
        &[
            ("https://example.org/app#slug", "hello-world"),
            ("http://purl.org/dc/terms/identifier", "42"),
        ],
    );

    let resource = graph.resource(post);
    let ranked = skolemizer.match_classes(&resource, &rdf::TYPE.into());
    let ranked: Vec<_> = ranked
        .iter()
        .map(|matched| (matched.class.as_str(), matched.precedence))
        .collect();
    assert_eq!(
        ranked,
        [
            ("https://example.org/app#Post", 0),
            ("https://example.org/base#Document", -2),
        ]
    );

    let uri = skolemizer.build(&resource).unwrap().expect("matched");
    assert_eq!(uri.as_str(), "https://example.org/posts/hello-world");
}

#[test]
fn imported_class_falls_back_to_absolute_path() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let document = typed(
        &mut graph,
        &["https://example.org/base#Document"],
        &[("http://purl.org/dc/terms/identifier", "42")],
    );
    let uri = skolemizer.build(&graph.resource(document)).unwrap().unwrap();
    assert_eq!(uri.as_str(), "https://example.org/documents/42");
}

#[test]
fn diamond_and_cyclic_imports_visit_each_ontology_once() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let note = typed(
        &mut graph,
        &["https://example.org/left#Note", "https://example.org/base#Document"],
        &[],
    );
    let ranked = skolemizer.match_classes(&graph.resource(note), &rdf::TYPE.into());
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].class, iri("https://example.org/left#Note"));
    assert_eq!(ranked[0].precedence, -1);
    assert_eq!(ranked[1].precedence, -2);
}

#[test]
fn build_all_renames_only_matched_blank_nodes() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let first = typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "first")],
    );
    let second = typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "second")],
    );
    let unmatched = typed(&mut graph, &["https://example.org/app#Unknown"], &[]);
    let named = Node::Named(iri("https://example.org/posts/existing"));
    graph.insert(named.clone(), iri("https://example.org/app#related"), first.clone());

    let renamed = skolemizer.build_all(&mut graph).expect("skolemized");
    assert_eq!(
        renamed,
        vec![
            (first, iri("https://example.org/posts/first")),
            (second, iri("https://example.org/posts/second")),
        ]
    );
    assert!(graph.subjects().contains(&unmatched));
    assert!(graph.contains(
        &named,
        &iri("https://example.org/app#related"),
        &iri("https://example.org/posts/first").into()
    ));

    let snapshot = graph.clone();
    assert!(skolemizer.build_all(&mut graph).unwrap().is_empty());
    assert_eq!(graph, snapshot);
}

#[test]
fn build_all_aborts_without_partial_renames() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "fine")],
    );
    // no slug to expand the segment with
    typed(&mut graph, &["https://example.org/app#Post"], &[]);

    let snapshot = graph.clone();
    let err = skolemizer.build_all(&mut graph).expect_err("second post fails");
    assert!(matches!(err, SkolemizeError::Template { .. }));
    assert_eq!(graph, snapshot);
}

#[test]
fn built_uri_matches_back_to_bindings() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let post = typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "Ąžuolas")],
    );
    let uri = skolemizer.build(&graph.resource(post)).unwrap().unwrap();

    let template = sitemap
        .template(&iri("https://example.org/app#Post"))
        .expect("template");
    let relative = uri
        .as_str()
        .strip_prefix("https://example.org/posts/")
        .expect("container prefix");
    let bindings = template.segment().unwrap().matches(relative).expect("match");
    assert_eq!(bindings.get("slug").map(String::as_str), Some("Ąžuolas"));
}

#[test]
fn build_all_refuses_to_merge_resources() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let first = typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "same")],
    );
    let second = typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "same")],
    );

    let snapshot = graph.clone();
    let err = skolemizer.build_all(&mut graph).expect_err("both posts map to one URI");
    assert!(matches!(
        err,
        SkolemizeError::UriTaken { ref resource, ref holder, .. }
            if *resource == second && *holder == first
    ));
    assert_eq!(graph.len(), snapshot.len());
    assert_eq!(graph, snapshot);
}

#[test]
fn build_all_keeps_existing_subjects_apart() {
    let sitemap = sitemap();
    let skolemizer = skolemizer(&sitemap);
    let mut graph = Graph::new();
    let existing = Node::Named(iri("https://example.org/posts/taken"));
    graph.insert(existing.clone(), iri("https://example.org/app#slug"), Value::string("taken"));
    typed(
        &mut graph,
        &["https://example.org/app#Post"],
        &[("https://example.org/app#slug", "taken")],
    );

    let err = skolemizer.build_all(&mut graph).expect_err("URI already describes a resource");
    insta::assert_snapshot!(
        err.to_string().split(" already identifies ").nth(1).unwrap_or_default(),
        @"<https://example.org/posts/taken>"
    );
}
