//! Hypermedia state transitions for template calls: view and page states of
//! a base resource, with `next`/`prev` links between sibling pages.

pub mod state;

use url::Url;

use crate::{
    graph::{Graph, Node},
    ontology::Iri,
    template_call::TemplateCall,
    vocabulary::{ldtc, ldth, rdf, xhv},
    Result,
};

pub use state::StateBuilder;

/// Outcome of processing a request against its template call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The request URI is not the canonical URI of its state.
    Redirect(Url),
    /// State metadata to merge into the response.
    Render(Graph),
}

/// URIs of the pages around the current one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub prev: Option<Url>,
    pub next: Option<Url>,
}

/// Derives state URIs and page links from template calls.
#[derive(Clone, Debug)]
pub struct HypermediaBuilder {
    limit: Iri,
    offset: Iri,
}

impl Default for HypermediaBuilder {
    fn default() -> Self {
        Self {
            limit: ldth::LIMIT.into(),
            offset: ldth::OFFSET.into(),
        }
    }
}

impl HypermediaBuilder {
    /// Replays every binding of `call` onto `builder`.
    pub fn apply_template_call<'b>(
        &self,
        builder: &'b mut StateBuilder,
        call: &TemplateCall<'_>,
    ) -> &'b mut StateBuilder {
        for (predicate, value) in call.bindings() {
            builder.property(predicate, value);
        }
        builder
    }

    /// URI of the state `call` describes, relative to `base`.
    #[must_use]
    pub fn state(&self, base: &Url, call: &TemplateCall<'_>) -> Url {
        let mut builder = StateBuilder::from_uri(base);
        self.apply_template_call(&mut builder, call).build()
    }

    /// Computes the previous and next pages of `call`.
    ///
    /// There is no previous page while `offset < limit`; no link is produced
    /// for a non-positive limit. A missing offset counts as `0`.
    ///
    /// # Errors
    ///
    /// Fails when the paging arguments of `call` are malformed.
    pub fn page_links(&self, absolute_path: &Url, call: &TemplateCall<'_>) -> Result<PageLinks> {
        let Some(limit) = call.long(&self.limit)?.filter(|limit| *limit > 0) else {
            return Ok(PageLinks::default());
        };
        let offset = call.long(&self.offset)?.unwrap_or(0).max(0);

        let sibling = |offset: i64| {
            let mut sibling = call.clone();
            sibling.replace(self.offset.clone(), oxrdf::Literal::from(offset));
            self.state(absolute_path, &sibling)
        };

        Ok(PageLinks {
            prev: (offset >= limit).then(|| sibling(offset - limit)),
            next: offset.checked_add(limit).map(sibling),
        })
    }

    /// Decides how to answer a request for `request_uri`, whose resource
    /// without query is `absolute_path`.
    ///
    /// Redirects when the canonical state URI of `call` differs from the
    /// request URI. Otherwise returns the view and page metadata: the view
    /// is a `ldtc:View` of the absolute path when it carries parameters, and
    /// additionally a `ldth:Page` with `xhv:prev`/`xhv:next` siblings when a
    /// limit is bound.
    ///
    /// # Errors
    ///
    /// Fails when the paging arguments of `call` are malformed.
    pub fn transition(
        &self,
        request_uri: &Url,
        absolute_path: &Url,
        call: &TemplateCall<'_>,
    ) -> Result<Transition> {
        let page_state = self.state(request_uri, call);
        if page_state.as_str() != request_uri.as_str() {
            tracing::debug!(uri = %page_state, "redirecting to state transition URI");
            return Ok(Transition::Redirect(page_state));
        }

        let mut graph = Graph::new();
        let base = node(absolute_path)?;
        let view_state = self.state(absolute_path, call);
        if view_state.as_str() == absolute_path.as_str() {
            return Ok(Transition::Render(graph));
        }

        let view = node(&view_state)?;
        graph.insert(view.clone(), ldtc::VIEW_OF, base.clone());
        graph.insert(view.clone(), rdf::TYPE, Iri::from(ldtc::VIEW));

        if call.has(&self.limit) {
            tracing::debug!(page = %view_state, container = %absolute_path, "adding page metadata");
            graph.insert(view.clone(), ldth::PAGE_OF, base.clone());
            graph.insert(view.clone(), rdf::TYPE, Iri::from(ldth::PAGE));

            let links = self.page_links(absolute_path, call)?;
            for (sibling, forward, backward) in [
                (links.prev, xhv::PREV, xhv::NEXT),
                (links.next, xhv::NEXT, xhv::PREV),
            ] {
                let Some(sibling) = sibling else {
                    continue;
                };
                let sibling = node(&sibling)?;
                graph.insert(sibling.clone(), ldth::PAGE_OF, base.clone());
                graph.insert(sibling.clone(), rdf::TYPE, Iri::from(ldth::PAGE));
                graph.insert(sibling.clone(), backward, view.clone());
                graph.insert(view.clone(), forward, sibling);
            }
        }

        tracing::debug!(statements = graph.len(), "added hypermedia statements");
        Ok(Transition::Render(graph))
    }
}

fn node(url: &Url) -> Result<Node> {
    Ok(Node::Named(Iri::new(url.as_str())?))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use oxrdf::Literal;
    use rstest::rstest;

    use super::*;
    use crate::{
        graph::Value,
        ontology::{Class, Parameter},
        sitemap::Template,
        vocabulary::{ldt, xsd},
    };

    fn container() -> Template {
        let parameters: BTreeMap<_, _> = [
            Parameter::new(
                Iri::new("https://example.org/ns#limit").unwrap(),
                ldth::LIMIT.into(),
            )
            .optional(true)
            .with_value_type(xsd::LONG.into()),
            Parameter::new(
                Iri::new("https://example.org/ns#offset").unwrap(),
                ldth::OFFSET.into(),
            )
            .optional(true)
            .with_value_type(xsd::LONG.into()),
        ]
        .into_iter()
        .map(|parameter| (parameter.id().clone(), parameter))
        .collect();
        let class = Class::new(Iri::new("https://example.org/ns#Container").unwrap())
            .with_annotation(ldt::PATH, Value::string("{path: .*}/"))
            .with_annotation(ldt::PARAM, Iri::new("https://example.org/ns#limit").unwrap())
            .with_annotation(ldt::PARAM, Iri::new("https://example.org/ns#offset").unwrap());
        Template::compile(&class, &parameters).expect("template")
    }

    fn absolute_path() -> Url {
        Url::parse("https://example.org/files/").unwrap()
    }

    #[rstest]
    #[case("limit=10&offset=0", None, Some("limit=10&offset=10"))]
    #[case("limit=10", None, Some("limit=10&offset=10"))]
    #[case("limit=10&offset=10", Some("limit=10&offset=0"), Some("limit=10&offset=20"))]
    #[case("limit=10&offset=5", None, Some("limit=10&offset=15"))]
    #[case("limit=0&offset=10", None, None)]
    fn page_links(
        #[case] query: &str,
        #[case] prev: Option<&str>,
        #[case] next: Option<&str>,
    ) {
        let template = container();
        let call = TemplateCall::from_query(&template, query).unwrap();
        let links = HypermediaBuilder::default()
            .page_links(&absolute_path(), &call)
            .unwrap();
        let expected = |query: Option<&str>| {
            query.map(|query| Url::parse(&format!("https://example.org/files/?{query}")).unwrap())
        };
        assert_eq!(links.prev, expected(prev));
        assert_eq!(links.next, expected(next));
    }

    #[test]
    fn page_links_are_stable() {
        let template = container();
        let call = TemplateCall::from_query(&template, "offset=30&limit=10").unwrap();
        let builder = HypermediaBuilder::default();
        let first = builder.page_links(&absolute_path(), &call).unwrap();
        let second = builder.page_links(&absolute_path(), &call).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_canonical_request_redirects() {
        let template = container();
        let request = Url::parse("https://example.org/files/?offset=0&limit=10").unwrap();
        let call = TemplateCall::from_query(&template, request.query().unwrap()).unwrap();
        let transition = HypermediaBuilder::default()
            .transition(&request, &absolute_path(), &call)
            .unwrap();
        assert_eq!(
            transition,
            Transition::Redirect(Url::parse("https://example.org/files/?limit=10&offset=0").unwrap())
        );
    }

    #[test]
    fn canonical_page_renders_links() {
        let template = container();
        let request = Url::parse("https://example.org/files/?limit=10&offset=10").unwrap();
        let call = TemplateCall::from_query(&template, request.query().unwrap()).unwrap();
        let Transition::Render(graph) = HypermediaBuilder::default()
            .transition(&request, &absolute_path(), &call)
            .unwrap()
        else {
            panic!("expected render");
        };

        let page = Node::Named(Iri::new(request.as_str()).unwrap());
        let prev = Node::Named(Iri::new("https://example.org/files/?limit=10&offset=0").unwrap());
        let next = Node::Named(Iri::new("https://example.org/files/?limit=10&offset=20").unwrap());
        let container = Value::from(Iri::new(absolute_path().as_str()).unwrap());

        assert!(graph.contains(&page, &ldtc::VIEW_OF.into(), &container));
        assert!(graph.contains(&page, &rdf::TYPE.into(), &Iri::from(ldth::PAGE).into()));
        assert!(graph.contains(&page, &xhv::PREV.into(), &prev.clone().into()));
        assert!(graph.contains(&prev, &xhv::NEXT.into(), &page.clone().into()));
        assert!(graph.contains(&page, &xhv::NEXT.into(), &next.clone().into()));
        assert!(graph.contains(&next, &xhv::PREV.into(), &page.clone().into()));
        assert!(graph.contains(&next, &ldth::PAGE_OF.into(), &container));
    }

    #[test]
    fn plain_resource_renders_nothing() {
        let template = container();
        let call = TemplateCall::new(&template);
        let transition = HypermediaBuilder::default()
            .transition(&absolute_path(), &absolute_path(), &call)
            .unwrap();
        assert_eq!(transition, Transition::Render(Graph::new()));
    }

    #[test]
    fn negative_offsets_are_never_linked() {
        let template = container();
        let mut call = TemplateCall::from_query(&template, "limit=10").unwrap();
        call.replace(ldth::OFFSET, Literal::from(-25_i64));
        let links = HypermediaBuilder::default()
            .page_links(&absolute_path(), &call)
            .unwrap();
        assert_eq!(links.prev, None);
        assert_eq!(
            links.next.map(String::from),
            Some("https://example.org/files/?limit=10&offset=10".to_string())
        );
    }
}
