//! YAML ontology documents.
//!
//! ```yaml
//! id: https://example.org/app#
//! imports: [https://example.org/base#]
//! parameters:
//!   - id: https://example.org/app#limit
//!     predicate: https://www.w3.org/ns/ldt/document-hierarchy/domain#limit
//!     optional: true
//!     value_type: http://www.w3.org/2001/XMLSchema#long
//!     default: 20
//! classes:
//!   - id: https://example.org/app#Container
//!     super_classes:
//!       - https://example.org/base#Document
//!       - has_value:
//!           on_property: http://rdfs.org/sioc/ns#has_parent
//!           value: { iri: https://example.org/ }
//!     path: "{path: .*}/"
//!     params: [https://example.org/app#limit]
//! ```

use std::collections::BTreeMap;

use oxrdf::{BlankNode, Literal};
use serde::Deserialize;
use thiserror::Error;

use super::{
    entities::{Class, ClassExpression, Ontology, OntologyError, Parameter},
    value_objects::Iri,
};
use crate::{graph::Value, vocabulary::ldt};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid blank node identifier `{value}`")]
    InvalidBlankNode { value: String },
    #[error("invalid language tag `{language}` on literal `{value}`")]
    InvalidLanguage { value: String, language: String },
    #[error(transparent)]
    Domain(#[from] OntologyError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OntologyDocument {
    pub id: Iri,
    pub label: Option<String>,
    #[serde(default)]
    pub imports: Vec<Iri>,
    #[serde(default)]
    pub parameters: Vec<ParameterDocument>,
    #[serde(default)]
    pub classes: Vec<ClassDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDocument {
    pub id: Iri,
    pub predicate: Iri,
    #[serde(default)]
    pub optional: bool,
    pub value_type: Option<Iri>,
    pub default: Option<ValueDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDocument {
    pub id: Iri,
    pub label: Option<String>,
    pub comment: Option<String>,
    /// Defaults to the enclosing document.
    pub defined_by: Option<Iri>,
    #[serde(default)]
    pub super_classes: Vec<SuperClassDocument>,
    pub path: Option<String>,
    pub segment: Option<String>,
    pub fragment: Option<String>,
    pub priority: Option<f64>,
    #[serde(default)]
    pub params: Vec<Iri>,
    #[serde(default)]
    pub lang: Vec<ValueDocument>,
    pub cache_control: Option<String>,
    pub query: Option<Iri>,
    pub update: Option<Iri>,
    pub load_class: Option<Iri>,
    /// Any other annotation, keyed by property.
    #[serde(default)]
    pub annotations: BTreeMap<Iri, Vec<ValueDocument>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuperClassDocument {
    Named(Iri),
    HasValue { has_value: HasValueDocument },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HasValueDocument {
    pub on_property: Iri,
    pub value: ValueDocument,
}

/// A node or literal. Bare scalars become plain, boolean, integer or double
/// literals.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueDocument {
    Iri {
        iri: Iri,
    },
    Blank {
        blank: String,
    },
    Literal {
        literal: String,
        datatype: Option<Iri>,
        language: Option<String>,
    },
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
}

impl ValueDocument {
    /// # Errors
    ///
    /// Fails for malformed blank node identifiers and language tags.
    pub fn into_value(self) -> Result<Value, DocumentError> {
        Ok(match self {
            Self::Iri { iri } => Value::from(iri),
            Self::Blank { blank } => BlankNode::new(blank.as_str())
                .map(|node| Value::Node(node.into()))
                .map_err(|_| DocumentError::InvalidBlankNode { value: blank })?,
            Self::Literal {
                literal,
                language: Some(language),
                ..
            } => Literal::new_language_tagged_literal(literal.as_str(), language.as_str())
                .map_err(|_| DocumentError::InvalidLanguage {
                    value: literal.clone(),
                    language: language.clone(),
                })?
                .into(),
            Self::Literal {
                literal,
                datatype: Some(datatype),
                language: None,
            } => Literal::new_typed_literal(literal, datatype.as_named_node()).into(),
            Self::Literal { literal, .. } | Self::Text(literal) => Value::string(literal),
            Self::Boolean(value) => Literal::from(value).into(),
            Self::Integer(value) => Literal::from(value).into(),
            Self::Double(value) => Literal::from(value).into(),
        })
    }
}

impl OntologyDocument {
    /// Converts the document into the domain aggregate.
    ///
    /// # Errors
    ///
    /// Fails on duplicate class or parameter identifiers and on malformed values.
    pub fn into_ontology(self) -> Result<Ontology, DocumentError> {
        let mut ontology = Ontology::new(self.id.clone());
        if let Some(label) = self.label {
            ontology = ontology.with_label(label);
        }
        for import in self.imports {
            ontology.add_import(import);
        }
        for parameter in self.parameters {
            ontology.add_parameter(parameter.into_parameter()?)?;
        }
        for class in self.classes {
            ontology.add_class(class.into_class(&self.id)?)?;
        }
        Ok(ontology)
    }
}

impl ParameterDocument {
    fn into_parameter(self) -> Result<Parameter, DocumentError> {
        let mut parameter = Parameter::new(self.id, self.predicate).optional(self.optional);
        if let Some(value_type) = self.value_type {
            parameter = parameter.with_value_type(value_type);
        }
        if let Some(default) = self.default {
            parameter = parameter.with_default(default.into_value()?);
        }
        Ok(parameter)
    }
}

impl ClassDocument {
    fn into_class(self, ontology: &Iri) -> Result<Class, DocumentError> {
        let mut class = Class::new(self.id).defined_by(self.defined_by.unwrap_or_else(|| ontology.clone()));
        if let Some(label) = self.label {
            class = class.with_label(label);
        }
        if let Some(comment) = self.comment {
            class = class.with_comment(comment);
        }

        for super_class in self.super_classes {
            class.add_parent(match super_class {
                SuperClassDocument::Named(iri) => ClassExpression::Named(iri),
                SuperClassDocument::HasValue { has_value } => ClassExpression::HasValue {
                    on_property: has_value.on_property,
                    value: has_value.value.into_value()?,
                },
            });
        }

        for (property, text) in [
            (ldt::PATH, self.path),
            (ldt::SEGMENT, self.segment),
            (ldt::FRAGMENT, self.fragment),
            (ldt::CACHE_CONTROL, self.cache_control),
        ] {
            if let Some(text) = text {
                class.annotate(property, Value::string(text));
            }
        }
        for (property, resource) in [
            (ldt::QUERY, self.query),
            (ldt::UPDATE, self.update),
            (ldt::LOAD_CLASS, self.load_class),
        ] {
            if let Some(resource) = resource {
                class.annotate(property, resource);
            }
        }
        if let Some(priority) = self.priority {
            class.annotate(ldt::PRIORITY, Literal::from(priority));
        }
        for param in self.params {
            class.annotate(ldt::PARAM, param);
        }
        for lang in self.lang {
            class.annotate(ldt::LANG, lang.into_value()?);
        }
        for (property, values) in self.annotations {
            for value in values {
                class.annotate(property.clone(), value.into_value()?);
            }
        }
        Ok(class)
    }
}
