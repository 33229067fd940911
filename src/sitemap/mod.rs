//! Compiled sitemap: the root ontology, its import closure and the templates
//! declared across it.
//!
//! Ontologies live in an arena addressed by [`OntologyId`]; import edges are
//! stored as ids, so traversals carry plain visited sets instead of relying on
//! recursion depth. A sitemap is read-only once assembled and is shared across
//! requests behind an `Arc`.

pub mod registry;
pub mod template;

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::{
    ontology::{repositories::OntologyRepository, Class, Iri, Ontology, Parameter},
    uri_template::UriTemplateError,
};

pub use registry::{TemplateMatch, TemplateRegistry};
pub use template::{CacheControl, Template};

/// Stable index of an ontology inside a [`Sitemap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OntologyId(usize);

/// Configuration errors found in sitemap ontologies. These are fatal for the
/// affected resolution and are never retried.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SitemapError {
    /// An import edge (or the root) names an ontology that cannot be found.
    #[error("ontology `{ontology}` not found")]
    MissingOntology { ontology: Iri },
    /// A language annotation is a resource instead of a literal.
    #[error("illegal non-literal language value for template `{template}`")]
    NonLiteralLanguage { template: Iri },
    /// A `param` annotation does not reference a declared parameter.
    #[error("unsupported argument `{argument}` for template `{template}`")]
    UnsupportedArgument { template: Iri, argument: String },
    #[error("invalid priority {value} for template `{template}`")]
    InvalidPriority { template: Iri, value: String },
    #[error("invalid cache control `{value}` for template `{template}`")]
    InvalidCacheControl { template: Iri, value: String },
    #[error("invalid `{property}` template on `{template}`: {source}")]
    InvalidTemplate {
        template: Iri,
        property: Iri,
        source: UriTemplateError,
    },
    /// A structural parent/container restriction does not name an absolute IRI.
    #[error("value restriction on class `{class}` for property `{property}` is not a URI resource")]
    NonAbsoluteRestriction { class: Iri, property: Iri },
}

/// Root ontology plus its import closure and compiled templates.
#[derive(Clone, Debug)]
pub struct Sitemap {
    root: OntologyId,
    ontologies: Vec<Ontology>,
    imports: Vec<Vec<OntologyId>>,
    index: HashMap<Iri, OntologyId>,
    classes: HashMap<Iri, OntologyId>,
    templates: BTreeMap<Iri, Template>,
    defined: Vec<Vec<Iri>>,
}

impl Sitemap {
    /// Loads `root` and every ontology reachable through imports from `repository`.
    ///
    /// # Errors
    ///
    /// Fails when an ontology is missing, when the repository fails or when a
    /// template is misconfigured.
    pub fn load<R>(root: &Iri, repository: &R) -> crate::Result<Self>
    where
        R: OntologyRepository + ?Sized,
        R::Error: Into<crate::Error>,
    {
        Self::assemble(root, |iri| repository.get(iri).map_err(Into::into))
    }

    /// Assembles a sitemap from already loaded ontologies. Ontologies that are
    /// not reachable from `root` are ignored.
    ///
    /// # Errors
    ///
    /// Fails when the root or an imported ontology is absent, or when a
    /// template is misconfigured.
    pub fn from_ontologies(
        root: &Iri,
        ontologies: impl IntoIterator<Item = Ontology>,
    ) -> crate::Result<Self> {
        let mut available: HashMap<Iri, Ontology> = ontologies
            .into_iter()
            .map(|ontology| (ontology.id().clone(), ontology))
            .collect();
        Self::assemble(root, |iri| Ok(available.remove(iri)))
    }

    fn assemble(
        root: &Iri,
        mut fetch: impl FnMut(&Iri) -> crate::Result<Option<Ontology>>,
    ) -> crate::Result<Self> {
        let mut ontologies = Vec::new();
        let mut index = HashMap::new();
        let mut queue = VecDeque::from([root.clone()]);

        // breadth-first, so arena order follows import depth
        while let Some(iri) = queue.pop_front() {
            if index.contains_key(&iri) {
                continue;
            }
            let Some(ontology) = fetch(&iri)? else {
                tracing::error!(ontology = %iri, "ontology not found");
                return Err(SitemapError::MissingOntology { ontology: iri }.into());
            };
            index.insert(iri, OntologyId(ontologies.len()));
            queue.extend(
                ontology
                    .imports()
                    .iter()
                    .filter(|import| !index.contains_key(*import))
                    .cloned(),
            );
            ontologies.push(ontology);
        }

        let imports = ontologies
            .iter()
            .map(|ontology| {
                ontology
                    .imports()
                    .iter()
                    .filter_map(|import| index.get(import).copied())
                    .collect()
            })
            .collect();

        let mut sitemap = Self {
            root: OntologyId(0),
            defined: vec![Vec::new(); ontologies.len()],
            ontologies,
            imports,
            index,
            classes: HashMap::new(),
            templates: BTreeMap::new(),
        };
        sitemap.index_classes();
        sitemap.compile_templates()?;
        tracing::debug!(
            root = %root,
            ontologies = sitemap.ontologies.len(),
            templates = sitemap.templates.len(),
            "sitemap assembled"
        );
        Ok(sitemap)
    }

    fn index_classes(&mut self) {
        for (position, ontology) in self.ontologies.iter().enumerate() {
            for (iri, class) in ontology.classes() {
                if self.classes.contains_key(iri) {
                    continue;
                }
                self.classes.insert(iri.clone(), OntologyId(position));
                if let Some(defining) = class
                    .is_defined_by()
                    .and_then(|defined_by| self.index.get(defined_by))
                {
                    self.defined[defining.0].push(iri.clone());
                }
            }
        }
    }

    fn compile_templates(&mut self) -> Result<(), SitemapError> {
        let parameters: BTreeMap<Iri, Parameter> = self
            .ontologies
            .iter()
            .flat_map(|ontology| ontology.parameters().iter())
            .map(|(iri, parameter)| (iri.clone(), parameter.clone()))
            .collect();

        let mut templates = BTreeMap::new();
        for (position, ontology) in self.ontologies.iter().enumerate() {
            for (iri, class) in ontology.classes() {
                let owner = self.classes.get(iri).copied();
                if owner == Some(OntologyId(position)) && Template::is_template(class) {
                    templates.insert(iri.clone(), Template::compile(class, &parameters)?);
                }
            }
        }

        let mut linked = BTreeMap::new();
        for (iri, template) in &templates {
            let Some(parent) = self.template_parent(iri, &templates) else {
                continue;
            };
            // nearest declaration wins, ancestors applied first
            let mut arguments = BTreeMap::new();
            for ancestor in self.template_chain(iri, &templates).iter().rev() {
                if let Some(ancestor) = templates.get(ancestor) {
                    arguments.extend(
                        ancestor
                            .local_arguments()
                            .iter()
                            .map(|(predicate, parameter)| (predicate.clone(), parameter.clone())),
                    );
                }
            }
            linked.insert(iri.clone(), (parent, arguments));
            tracing::trace!(template = %template.id(), "linked template to parent");
        }
        for (iri, (parent, arguments)) in linked {
            if let Some(template) = templates.get_mut(&iri) {
                template.set_parent(parent, arguments);
            }
        }

        self.templates = templates;
        Ok(())
    }

    fn template_parent(&self, iri: &Iri, templates: &BTreeMap<Iri, Template>) -> Option<Iri> {
        self.class(iri)?
            .named_parents()
            .find(|parent| *parent != iri && templates.contains_key(*parent))
            .cloned()
    }

    /// `iri` followed by its template ancestors, nearest first.
    fn template_chain(&self, iri: &Iri, templates: &BTreeMap<Iri, Template>) -> Vec<Iri> {
        let mut chain = vec![iri.clone()];
        let mut visited = HashSet::from([iri.clone()]);
        let mut current = iri.clone();
        while let Some(parent) = self.template_parent(&current, templates) {
            if !visited.insert(parent.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// Identifier of the root ontology.
    #[must_use]
    pub fn root(&self) -> OntologyId {
        self.root
    }

    #[must_use]
    pub fn ontology(&self, id: OntologyId) -> &Ontology {
        &self.ontologies[id.0]
    }

    #[must_use]
    pub fn ontology_id(&self, iri: &Iri) -> Option<OntologyId> {
        self.index.get(iri).copied()
    }

    /// All ontologies in breadth-first import order, root first.
    pub fn ontologies(&self) -> impl Iterator<Item = (OntologyId, &Ontology)> {
        self.ontologies
            .iter()
            .enumerate()
            .map(|(position, ontology)| (OntologyId(position), ontology))
    }

    /// Direct imports of `id` in declaration order.
    #[must_use]
    pub fn imports(&self, id: OntologyId) -> &[OntologyId] {
        &self.imports[id.0]
    }

    /// Looks up a class across the import closure; the shallowest declaration wins.
    #[must_use]
    pub fn class(&self, iri: &Iri) -> Option<&Class> {
        let position = self.classes.get(iri)?;
        self.ontologies[position.0].class(iri)
    }

    /// Classes whose `isDefinedBy` is `id`, in declaration order.
    #[must_use]
    pub fn defined_classes(&self, id: OntologyId) -> &[Iri] {
        &self.defined[id.0]
    }

    #[must_use]
    pub fn template(&self, iri: &Iri) -> Option<&Template> {
        self.templates.get(iri)
    }

    /// All compiled templates ordered by identifier.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::Value, ontology::ClassExpression, vocabulary::ldt};

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    fn ontology(id: &str, imports: &[&str]) -> Ontology {
        let mut ontology = Ontology::new(iri(id));
        for import in imports {
            ontology.add_import(iri(import));
        }
        ontology
    }

    #[test]
    fn import_cycles_terminate() {
        let a = ontology("https://example.org/a#", &["https://example.org/b#"]);
        let b = ontology("https://example.org/b#", &["https://example.org/a#"]);
        let sitemap = Sitemap::from_ontologies(&iri("https://example.org/a#"), [a, b])
            .expect("sitemap");
        assert_eq!(sitemap.ontologies().count(), 2);
        let root = sitemap.root();
        let b_id = sitemap.ontology_id(&iri("https://example.org/b#")).unwrap();
        assert_eq!(sitemap.imports(root), [b_id]);
        assert_eq!(sitemap.imports(b_id), [root]);
    }

    #[test]
    fn missing_import_is_reported() {
        let a = ontology("https://example.org/a#", &["https://example.org/missing#"]);
        let err = Sitemap::from_ontologies(&iri("https://example.org/a#"), [a])
            .expect_err("missing import");
        assert!(matches!(
            err,
            crate::Error::Sitemap(SitemapError::MissingOntology { ontology }) if ontology == iri("https://example.org/missing#")
        ));
    }

    #[test]
    fn arguments_are_inherited_along_parent_chain() {
        let mut app = ontology("https://example.org/app#", &[]);
        let limit = Parameter::new(
            iri("https://example.org/app#limitParam"),
            iri("https://example.org/app#limit"),
        );
        let narrowed = Parameter::new(
            iri("https://example.org/app#limitParamOptional"),
            iri("https://example.org/app#limit"),
        )
        .optional(true);
        let offset = Parameter::new(
            iri("https://example.org/app#offsetParam"),
            iri("https://example.org/app#offset"),
        );
        for parameter in [limit, narrowed, offset] {
            app.add_parameter(parameter).unwrap();
        }

        let container = Class::new(iri("https://example.org/app#Container"))
            .with_annotation(ldt::PATH, Value::string("/{path: .*}"))
            .with_annotation(ldt::PARAM, iri("https://example.org/app#limitParam"))
            .with_annotation(ldt::PARAM, iri("https://example.org/app#offsetParam"));
        let mut files = Class::new(iri("https://example.org/app#Files"))
            .with_annotation(ldt::PATH, Value::string("/files/"))
            .with_annotation(ldt::PARAM, iri("https://example.org/app#limitParamOptional"));
        files.add_parent(ClassExpression::Named(iri("https://example.org/app#Container")));
        app.add_class(container).unwrap();
        app.add_class(files).unwrap();

        let sitemap =
            Sitemap::from_ontologies(&iri("https://example.org/app#"), [app]).expect("sitemap");
        let files = sitemap
            .template(&iri("https://example.org/app#Files"))
            .expect("files template");
        assert_eq!(files.parent(), Some(&iri("https://example.org/app#Container")));
        assert_eq!(files.arguments().len(), 2);
        assert!(files.argument_by_name("limit").unwrap().is_optional());
        assert!(!files.argument_by_name("offset").unwrap().is_optional());
        assert_eq!(files.local_arguments().len(), 1);
    }

    #[test]
    fn defined_classes_follow_is_defined_by() {
        let mut base = ontology("https://example.org/base#", &[]);
        let mut app = ontology("https://example.org/app#", &["https://example.org/base#"]);
        // declared in the app document but defined by the base vocabulary
        app.add_class(
            Class::new(iri("https://example.org/base#Item"))
                .defined_by(iri("https://example.org/base#"))
                .with_annotation(ldt::SEGMENT, Value::string("{slug}")),
        )
        .unwrap();
        base.add_class(
            Class::new(iri("https://example.org/base#Other"))
                .defined_by(iri("https://example.org/base#")),
        )
        .unwrap();

        let sitemap = Sitemap::from_ontologies(&iri("https://example.org/app#"), [app, base])
            .expect("sitemap");
        let base_id = sitemap.ontology_id(&iri("https://example.org/base#")).unwrap();
        assert!(sitemap.defined_classes(sitemap.root()).is_empty());
        assert_eq!(sitemap.defined_classes(base_id).len(), 2);
        assert!(sitemap.template(&iri("https://example.org/base#Item")).is_some());
        assert!(sitemap.template(&iri("https://example.org/base#Other")).is_none());
    }
}
