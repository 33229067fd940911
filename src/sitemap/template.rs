use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

use crate::{
    graph::Value,
    ontology::{Class, Iri, Parameter},
    uri_template::UriTemplate,
    vocabulary::ldt,
};

use super::SitemapError;

/// Parsed `Cache-Control` directives declared on a template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub max_age: Option<u64>,
    pub s_max_age: Option<u64>,
    pub no_cache: bool,
    pub no_store: bool,
    pub no_transform: bool,
    pub must_revalidate: bool,
    pub proxy_revalidate: bool,
    pub private: bool,
    pub public: bool,
    pub extensions: Vec<(String, Option<String>)>,
}

impl CacheControl {
    /// Parses a comma separated directive list such as `max-age=3600, private`.
    ///
    /// Returns `None` for a malformed value (bad delta-seconds, empty directive names).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut cache_control = Self::default();
        for directive in value.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let (name, argument) = match directive.split_once('=') {
                Some((name, argument)) => (
                    name.trim().to_ascii_lowercase(),
                    Some(argument.trim().trim_matches('"').to_string()),
                ),
                None => (directive.to_ascii_lowercase(), None),
            };
            if name.is_empty() {
                return None;
            }
            match (name.as_str(), argument) {
                ("max-age", Some(seconds)) => cache_control.max_age = Some(seconds.parse().ok()?),
                ("s-maxage", Some(seconds)) => {
                    cache_control.s_max_age = Some(seconds.parse().ok()?);
                }
                ("max-age" | "s-maxage", None) => return None,
                ("no-cache", _) => cache_control.no_cache = true,
                ("no-store", _) => cache_control.no_store = true,
                ("no-transform", _) => cache_control.no_transform = true,
                ("must-revalidate", _) => cache_control.must_revalidate = true,
                ("proxy-revalidate", _) => cache_control.proxy_revalidate = true,
                ("private", _) => cache_control.private = true,
                ("public", _) => cache_control.public = true,
                (_, argument) => cache_control.extensions.push((name, argument)),
            }
        }
        Some(cache_control)
    }
}

impl Display for CacheControl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut directives = Vec::new();
        if self.public {
            directives.push("public".to_string());
        }
        if self.private {
            directives.push("private".to_string());
        }
        if self.no_cache {
            directives.push("no-cache".to_string());
        }
        if self.no_store {
            directives.push("no-store".to_string());
        }
        if self.no_transform {
            directives.push("no-transform".to_string());
        }
        if self.must_revalidate {
            directives.push("must-revalidate".to_string());
        }
        if self.proxy_revalidate {
            directives.push("proxy-revalidate".to_string());
        }
        if let Some(max_age) = self.max_age {
            directives.push(format!("max-age={max_age}"));
        }
        if let Some(s_max_age) = self.s_max_age {
            directives.push(format!("s-maxage={s_max_age}"));
        }
        for (name, argument) in &self.extensions {
            match argument {
                Some(argument) => directives.push(format!("{name}={argument}")),
                None => directives.push(name.clone()),
            }
        }
        f.write_str(&directives.join(", "))
    }
}

/// A routable type: URI generation and argument rules compiled from an
/// ontology class. Immutable once the sitemap is loaded.
#[derive(Clone, Debug)]
pub struct Template {
    id: Iri,
    defined_by: Option<Iri>,
    path: Option<UriTemplate>,
    segment: Option<UriTemplate>,
    fragment: Option<UriTemplate>,
    query: Option<Iri>,
    update: Option<Iri>,
    priority: f64,
    parent: Option<Iri>,
    local_arguments: BTreeMap<Iri, Parameter>,
    arguments: BTreeMap<Iri, Parameter>,
    languages: Vec<String>,
    load_class: Option<Iri>,
    cache_control: Option<CacheControl>,
}

impl Template {
    /// Whether the class carries any template annotation.
    pub(crate) fn is_template(class: &Class) -> bool {
        [
            ldt::PATH,
            ldt::SEGMENT,
            ldt::FRAGMENT,
            ldt::QUERY,
            ldt::UPDATE,
            ldt::PRIORITY,
            ldt::PARAM,
            ldt::LANG,
            ldt::LOAD_CLASS,
            ldt::CACHE_CONTROL,
        ]
        .into_iter()
        .any(|property| class.has_annotation(&Iri::from(property)))
    }

    /// Compiles the class's own annotations. Parent linkage and inherited
    /// arguments are resolved by the sitemap once every template exists.
    pub(crate) fn compile(
        class: &Class,
        parameters: &BTreeMap<Iri, Parameter>,
    ) -> Result<Self, SitemapError> {
        let id = class.id().clone();

        let mut local_arguments = BTreeMap::new();
        for value in class.annotations(&Iri::from(ldt::PARAM)) {
            let Some(parameter) = value.as_iri().and_then(|param| parameters.get(param)) else {
                tracing::error!(template = %id, argument = %value, "unsupported template argument");
                return Err(SitemapError::UnsupportedArgument {
                    template: id,
                    argument: value.to_string(),
                });
            };
            local_arguments.insert(parameter.predicate().clone(), parameter.clone());
        }

        let mut languages = Vec::new();
        for value in class.annotations(&Iri::from(ldt::LANG)) {
            let Some(literal) = value.as_literal() else {
                tracing::error!(template = %id, "illegal non-literal language value");
                return Err(SitemapError::NonLiteralLanguage { template: id });
            };
            languages.push(literal.value().to_string());
        }

        let priority = match class.annotations(&Iri::from(ldt::PRIORITY)).first() {
            None => 0.0,
            Some(value) => value
                .as_literal()
                .and_then(|literal| literal.value().trim().parse::<f64>().ok())
                .filter(|priority| priority.is_finite())
                .ok_or_else(|| SitemapError::InvalidPriority {
                    template: id.clone(),
                    value: value.to_string(),
                })?,
        };

        let cache_control = match class.string_value(&Iri::from(ldt::CACHE_CONTROL)) {
            None => None,
            Some(value) => Some(CacheControl::parse(value).ok_or_else(|| {
                SitemapError::InvalidCacheControl {
                    template: id.clone(),
                    value: value.to_string(),
                }
            })?),
        };

        let resource = |property| {
            class
                .annotations(&Iri::from(property))
                .first()
                .and_then(Value::as_iri)
                .cloned()
        };

        Ok(Self {
            path: uri_template(class, ldt::PATH, true)?,
            segment: uri_template(class, ldt::SEGMENT, false)?,
            fragment: uri_template(class, ldt::FRAGMENT, false)?,
            query: resource(ldt::QUERY),
            update: resource(ldt::UPDATE),
            load_class: resource(ldt::LOAD_CLASS),
            defined_by: class.is_defined_by().cloned(),
            parent: None,
            arguments: local_arguments.clone(),
            local_arguments,
            languages,
            cache_control,
            priority,
            id,
        })
    }

    pub(crate) fn set_parent(&mut self, parent: Iri, arguments: BTreeMap<Iri, Parameter>) {
        self.parent = Some(parent);
        self.arguments = arguments;
    }

    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Ontology that directly defines the underlying class.
    #[must_use]
    pub fn defined_by(&self) -> Option<&Iri> {
        self.defined_by.as_ref()
    }

    /// Request path template, relative to the site base URI.
    #[must_use]
    pub fn path(&self) -> Option<&UriTemplate> {
        self.path.as_ref()
    }

    /// Skolemization template, relative to the container's absolute path.
    #[must_use]
    pub fn segment(&self) -> Option<&UriTemplate> {
        self.segment.as_ref()
    }

    #[must_use]
    pub fn fragment(&self) -> Option<&UriTemplate> {
        self.fragment.as_ref()
    }

    #[must_use]
    pub fn query(&self) -> Option<&Iri> {
        self.query.as_ref()
    }

    #[must_use]
    pub fn update(&self) -> Option<&Iri> {
        self.update.as_ref()
    }

    #[must_use]
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// The nearest super class that is itself a template.
    #[must_use]
    pub fn parent(&self) -> Option<&Iri> {
        self.parent.as_ref()
    }

    /// Effective arguments keyed by bound property, including inherited ones.
    #[must_use]
    pub fn arguments(&self) -> &BTreeMap<Iri, Parameter> {
        &self.arguments
    }

    /// Arguments declared on this template only.
    #[must_use]
    pub fn local_arguments(&self) -> &BTreeMap<Iri, Parameter> {
        &self.local_arguments
    }

    /// Looks up an argument by the local name of its bound property, which is
    /// the query parameter name callers use.
    #[must_use]
    pub fn argument_by_name(&self, name: &str) -> Option<&Parameter> {
        self.arguments
            .iter()
            .find(|(predicate, _)| predicate.local_name() == name)
            .map(|(_, parameter)| parameter)
    }

    /// Default values keyed by bound property.
    #[must_use]
    pub fn default_values(&self) -> BTreeMap<&Iri, &Value> {
        self.arguments
            .iter()
            .filter_map(|(predicate, parameter)| {
                parameter.default_value().map(|value| (predicate, value))
            })
            .collect()
    }

    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    #[must_use]
    pub fn load_class(&self) -> Option<&Iri> {
        self.load_class.as_ref()
    }

    #[must_use]
    pub fn cache_control(&self) -> Option<&CacheControl> {
        self.cache_control.as_ref()
    }

    /// Best-first ordering: higher priority first, then the more specific
    /// path template. Templates without a path sort after those with one.
    #[must_use]
    pub fn precedence_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| match (&self.path, &other.path) {
                (Some(mine), Some(theirs)) => mine.specificity_cmp(theirs),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[<{}>: \"{path}\", {}]", self.id, self.priority),
            None => write!(f, "[<{}>, {}]", self.id, self.priority),
        }
    }
}

fn uri_template(
    class: &Class,
    property: oxrdf::NamedNodeRef<'static>,
    trim_leading_slash: bool,
) -> Result<Option<UriTemplate>, SitemapError> {
    let Some(text) = class.string_value(&Iri::from(property)) else {
        return Ok(None);
    };
    let text = if trim_leading_slash {
        text.trim_start_matches('/')
    } else {
        text
    };
    UriTemplate::parse(text)
        .map(Some)
        .map_err(|source| SitemapError::InvalidTemplate {
            template: class.id().clone(),
            property: Iri::from(property),
            source,
        })
}
