//! Skolemization: assigning URIs to anonymous resources from the segment
//! templates of the classes they are typed with.
//!
//! Candidate classes are ranked by how close their defining ontology is to
//! the sitemap root ([`ClassPrecedence`]); the URI is then built from literal
//! values reachable on the resource through dotted property paths.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    fmt::{self, Display, Formatter},
};

use oxrdf::Literal;
use thiserror::Error;
use url::Url;

use crate::{
    graph::{Graph, Node, Resource, Value},
    ontology::{ClassExpression, Iri},
    sitemap::{OntologyId, Sitemap, SitemapError, Template},
    uri_template::{UriTemplate, UriTemplateError},
    vocabulary::{rdf, sioc},
};

#[derive(Debug, Error)]
pub enum SkolemizeError {
    #[error(transparent)]
    Sitemap(#[from] SitemapError),
    #[error("cannot build URI for resource {resource} from template `{template}`: {source}")]
    Template {
        resource: Node,
        template: Iri,
        source: UriTemplateError,
    },
    #[error("URI `{uri}` built for resource {resource} is not a valid absolute URI")]
    InvalidUri { resource: Node, uri: String },
    #[error("URI `{uri}` built for resource {resource} already identifies {holder}")]
    UriTaken {
        resource: Node,
        uri: Iri,
        holder: Node,
    },
}

/// A matched class ranked by negated import depth: `0` for classes defined
/// by the root ontology, `-1` for its direct imports and so on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassPrecedence {
    pub class: Iri,
    pub precedence: i32,
}

impl Display for ClassPrecedence {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[<{}>, {}]", self.class, self.precedence)
    }
}

/// Builds URIs for resources of a sitemap.
#[derive(Clone, Debug)]
pub struct Skolemizer<'s> {
    sitemap: &'s Sitemap,
    base_uri: Url,
    absolute_path: Url,
}

impl<'s> Skolemizer<'s> {
    /// `base_uri` anchors path templates, `absolute_path` anchors segment
    /// templates of classes without a parent/container restriction.
    #[must_use]
    pub fn new(sitemap: &'s Sitemap, base_uri: Url, absolute_path: Url) -> Self {
        Self {
            sitemap,
            base_uri,
            absolute_path,
        }
    }

    #[must_use]
    pub fn sitemap(&self) -> &'s Sitemap {
        self.sitemap
    }

    /// Ranks every segment-bearing class the resource matches through
    /// `property`, best first.
    ///
    /// Ontologies are visited breadth-first from the root, each at most once,
    /// so an ontology reachable via several import paths is ranked by its
    /// shallowest one and import cycles terminate. Equal precedences keep
    /// visit order.
    #[must_use]
    pub fn match_classes(&self, resource: &Resource<'_>, property: &Iri) -> Vec<ClassPrecedence> {
        let mut matched = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(self.sitemap.root(), 0usize)]);

        while let Some((ontology, depth)) = queue.pop_front() {
            if !visited.insert(ontology) {
                continue;
            }
            let precedence = -i32::try_from(depth).unwrap_or(i32::MAX);
            for class in self.sitemap.defined_classes(ontology) {
                let has_segment = self
                    .sitemap
                    .template(class)
                    .is_some_and(|template| template.segment().is_some());
                if has_segment && resource.has_property(property, &Value::from(class.clone())) {
                    tracing::trace!(resource = %resource.node(), class = %class, precedence, "resource matched class");
                    matched.push(ClassPrecedence {
                        class: class.clone(),
                        precedence,
                    });
                }
            }
            queue.extend(
                self.sitemap
                    .imports(ontology)
                    .iter()
                    .filter(|import| !visited.contains(*import))
                    .map(|import: &OntologyId| (*import, depth + 1)),
            );
        }

        matched.sort_by(|a, b| b.precedence.cmp(&a.precedence));
        matched
    }

    /// The template of the best ranked `rdf:type` match.
    #[must_use]
    pub fn template_for(&self, resource: &Resource<'_>) -> Option<&'s Template> {
        self.match_classes(resource, &Iri::from(rdf::TYPE))
            .first()
            .and_then(|best| self.sitemap.template(&best.class))
    }

    /// Builds the URI of `resource`, or `None` when no class matches it.
    ///
    /// # Errors
    ///
    /// Fails on misconfigured parent/container restrictions and when the
    /// template cannot be expanded into an absolute URI.
    pub fn build(&self, resource: &Resource<'_>) -> Result<Option<Iri>, SkolemizeError> {
        let Some(template) = self.template_for(resource) else {
            return Ok(None);
        };
        tracing::debug!(resource = %resource.node(), template = %template.id(), "skolemizing resource");
        self.build_with(template, resource).map(Some)
    }

    /// Builds the URI of `resource` from `template`.
    ///
    /// The segment template is resolved against the class's absolute path,
    /// otherwise the path template against the base URI. Names without a
    /// literal on the resource are left unbound.
    ///
    /// # Errors
    ///
    /// See [`Skolemizer::build`].
    pub fn build_with(
        &self,
        template: &Template,
        resource: &Resource<'_>,
    ) -> Result<Iri, SkolemizeError> {
        let (base, uri_template) = match (template.segment(), template.path()) {
            (Some(segment), _) => (self.absolute_path_for(template)?, Some(segment)),
            (None, path) => (self.base_uri.clone(), path),
        };

        let mut values = BTreeMap::new();
        let names = uri_template
            .into_iter()
            .chain(template.fragment())
            .flat_map(UriTemplate::names);
        for name in names {
            if let Some(literal) = literal(resource, name) {
                values.insert(name.clone(), literal.value().to_string());
            }
        }

        let expand = |uri_template: &UriTemplate| {
            uri_template
                .expand(&values)
                .map_err(|source| SkolemizeError::Template {
                    resource: resource.node().clone(),
                    template: template.id().clone(),
                    source,
                })
        };

        let mut uri = base_path(&base);
        if let Some(uri_template) = uri_template {
            append_path(&mut uri, &expand(uri_template)?);
        }
        if let Some(fragment) = template.fragment() {
            uri.push('#');
            uri.push_str(&expand(fragment)?);
        }

        Iri::new(uri.as_str()).map_err(|_| SkolemizeError::InvalidUri {
            resource: resource.node().clone(),
            uri,
        })
    }

    /// Assigns URIs to every anonymous subject of `graph`.
    ///
    /// URIs are computed for all subjects before any rename is applied. If any
    /// of them fails, the error is returned and the graph is left untouched.
    /// Resources matching no class keep their blank identity.
    ///
    /// # Errors
    ///
    /// See [`Skolemizer::build`]. Also fails with [`SkolemizeError::UriTaken`]
    /// when a built URI is shared by two resources or already describes a
    /// named subject of the graph.
    pub fn build_all(&self, graph: &mut Graph) -> Result<Vec<(Node, Iri)>, SkolemizeError> {
        let mut renames = Vec::new();
        let mut holders: HashMap<Iri, Node> = HashMap::new();
        for node in graph.subjects().into_iter().filter(Node::is_blank) {
            let resource = graph.resource(node.clone());
            let Some(uri) = self.build(&resource)? else {
                continue;
            };
            let named = Node::Named(uri.clone());
            let holder = if graph.properties(&named).next().is_some() {
                Some(named)
            } else {
                holders.get(&uri).cloned()
            };
            if let Some(holder) = holder {
                return Err(SkolemizeError::UriTaken {
                    resource: node,
                    uri,
                    holder,
                });
            }
            holders.insert(uri.clone(), node.clone());
            renames.push((node, uri));
        }

        for (node, uri) in &renames {
            graph.rename(node, uri);
        }
        tracing::debug!(renamed = renames.len(), "skolemized graph");
        Ok(renames)
    }

    /// Base for segment templates: the first `sioc:has_parent` or
    /// `sioc:has_container` value restriction found on the class or its
    /// super classes, else the request's absolute path.
    ///
    /// # Errors
    ///
    /// Fails with [`SitemapError::NonAbsoluteRestriction`] when the restriction
    /// names something other than a resource IRI.
    pub fn absolute_path_for(&self, template: &Template) -> Result<Url, SkolemizeError> {
        let structural = [Iri::from(sioc::HAS_PARENT), Iri::from(sioc::HAS_CONTAINER)];
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([template.id().clone()]);

        while let Some(class_iri) = queue.pop_front() {
            if !visited.insert(class_iri.clone()) {
                continue;
            }
            let Some(class) = self.sitemap.class(&class_iri) else {
                continue;
            };
            for parent in class.parents() {
                match parent {
                    ClassExpression::HasValue { on_property, value }
                        if structural.contains(on_property) =>
                    {
                        let Some(container) = value.as_iri() else {
                            tracing::error!(class = %class_iri, property = %on_property, "value restriction is not a URI resource");
                            return Err(SitemapError::NonAbsoluteRestriction {
                                class: class_iri,
                                property: on_property.clone(),
                            }
                            .into());
                        };
                        return Url::parse(container.as_str()).map_err(|_| {
                            SkolemizeError::Sitemap(SitemapError::NonAbsoluteRestriction {
                                class: class_iri.clone(),
                                property: on_property.clone(),
                            })
                        });
                    }
                    ClassExpression::Named(named) => queue.push_back(named.clone()),
                    ClassExpression::HasValue { .. } => {}
                }
            }
        }

        Ok(self.absolute_path.clone())
    }
}

/// Looks up a literal by dotted property path: `a.b` follows a property with
/// local name `a` to a nested resource and resolves `b` there.
fn literal<'g>(resource: &Resource<'g>, path: &str) -> Option<&'g Literal> {
    if let Some((name, rest)) = path.split_once('.') {
        if let Some(nested) = nested_resource(resource, name) {
            return literal(&nested, rest);
        }
    }

    let found = resource.properties().find_map(|stmt| match &stmt.object {
        Value::Literal(literal) if stmt.predicate.local_name() == path => Some(literal),
        _ => None,
    });
    if let Some(found) = found {
        tracing::trace!(resource = %resource.node(), name = path, literal = %found, "found literal");
    }
    found
}

fn nested_resource<'g>(resource: &Resource<'g>, name: &str) -> Option<Resource<'g>> {
    resource.properties().find_map(|stmt| match &stmt.object {
        Value::Node(node) if stmt.predicate.local_name() == name => Some(resource.follow(node.clone())),
        _ => None,
    })
}

fn base_path(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}

/// Appends a path segment with exactly one `/` between base and segment.
fn append_path(uri: &mut String, segment: &str) {
    if segment.is_empty() {
        return;
    }
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri.push_str(segment.trim_start_matches('/'));
}
