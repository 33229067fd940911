//! Binding of request arguments to a template.
//!
//! A [`TemplateCall`] is created per request, carries one typed value per
//! bound property and is discarded afterwards. Required arguments are checked
//! lazily, when a consumer asks for them.

use std::collections::BTreeMap;

use oxrdf::Literal;
use serde::Serialize;
use thiserror::Error;

use crate::{
    graph::Value,
    ontology::Iri,
    sitemap::Template,
    vocabulary::{ldth, rdfs, xsd},
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("Parameter '{name}' not supported by Template '{template}'")]
    Unsupported { name: String, template: Iri },
    #[error("Argument with predicate '{predicate}' is not optional in Template '{template}' but no value is supplied")]
    MissingRequired { predicate: Iri, template: Iri },
    #[error("Value '{value}' of parameter '{name}' in Template '{template}' is not a valid {value_type}")]
    InvalidValue {
        name: String,
        value: String,
        value_type: Iri,
        template: Iri,
    },
}

/// Container page window derived from the `limit`, `offset`, `orderBy` and
/// `desc` arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub offset: i64,
    pub limit: i64,
    pub order_by: Option<String>,
    pub desc: bool,
}

/// A template bound to the argument values of one invocation.
#[derive(Clone, Debug)]
pub struct TemplateCall<'t> {
    template: &'t Template,
    bindings: BTreeMap<Iri, Value>,
}

impl<'t> TemplateCall<'t> {
    #[must_use]
    pub fn new(template: &'t Template) -> Self {
        Self {
            template,
            bindings: BTreeMap::new(),
        }
    }

    /// Parses an `application/x-www-form-urlencoded` query string and applies
    /// it with [`TemplateCall::apply_arguments`].
    ///
    /// # Errors
    ///
    /// See [`TemplateCall::apply_arguments`].
    pub fn from_query(template: &'t Template, query: &str) -> Result<Self, ParameterError> {
        Self::new(template).apply_arguments(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Binds the default value of every argument that is not bound yet.
    #[must_use]
    pub fn apply_defaults(mut self) -> Self {
        for (predicate, value) in self.template.default_values() {
            self.bindings
                .entry(predicate.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Binds `(name, value)` pairs, where `name` is the local name of an
    /// argument's property. A later pair for the same property replaces an
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Fails on the first name the template does not declare, or on a value
    /// that does not convert to the argument's type. Nothing is bound then.
    pub fn apply_arguments<I, N, V>(mut self, arguments: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut bound = Vec::new();
        for (name, value) in arguments {
            let (name, value) = (name.as_ref(), value.as_ref());
            let Some(parameter) = self.template.argument_by_name(name) else {
                tracing::debug!(name, template = %self.template.id(), "unsupported parameter");
                return Err(ParameterError::Unsupported {
                    name: name.to_string(),
                    template: self.template.id().clone(),
                });
            };
            let typed = typed_value(value, parameter.value_type()).ok_or_else(|| {
                ParameterError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                    value_type: parameter
                        .value_type()
                        .cloned()
                        .unwrap_or_else(|| Iri::from(xsd::STRING)),
                    template: self.template.id().clone(),
                }
            })?;
            bound.push((parameter.predicate().clone(), typed));
        }
        self.bindings.extend(bound);
        Ok(self)
    }

    /// Sets the value of `predicate`, replacing any previous value.
    pub fn replace(&mut self, predicate: impl Into<Iri>, value: impl Into<Value>) -> &mut Self {
        self.bindings.insert(predicate.into(), value.into());
        self
    }

    pub fn remove(&mut self, predicate: &Iri) -> Option<Value> {
        self.bindings.remove(predicate)
    }

    #[must_use]
    pub fn template(&self) -> &'t Template {
        self.template
    }

    /// Explicitly bound values keyed by property.
    #[must_use]
    pub fn bindings(&self) -> &BTreeMap<Iri, Value> {
        &self.bindings
    }

    #[must_use]
    pub fn has(&self, predicate: &Iri) -> bool {
        self.bindings.contains_key(predicate)
    }

    /// The bound value only, without defaults.
    #[must_use]
    pub fn value(&self, predicate: &Iri) -> Option<&Value> {
        self.bindings.get(predicate)
    }

    /// The value a consumer should use for `predicate`: the bound value, else
    /// the argument's default.
    ///
    /// # Errors
    ///
    /// Fails when the template declares `predicate` as a required argument and
    /// there is neither a value nor a default.
    pub fn argument(&self, predicate: &Iri) -> Result<Option<&Value>, ParameterError> {
        if let Some(value) = self.bindings.get(predicate) {
            return Ok(Some(value));
        }
        let Some(parameter) = self.template.arguments().get(predicate) else {
            return Ok(None);
        };
        match parameter.default_value() {
            Some(value) => Ok(Some(value)),
            None if parameter.is_optional() => Ok(None),
            None => Err(ParameterError::MissingRequired {
                predicate: predicate.clone(),
                template: self.template.id().clone(),
            }),
        }
    }

    /// Checks that every required argument has a value or a default.
    ///
    /// # Errors
    ///
    /// Returns the first missing required argument.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for predicate in self.template.arguments().keys() {
            self.argument(predicate)?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Fails for a missing required argument or a value that is not an integer.
    pub fn long(&self, predicate: &Iri) -> Result<Option<i64>, ParameterError> {
        self.lexical(predicate)?
            .map(|(lexical, value)| {
                lexical
                    .trim()
                    .parse()
                    .map_err(|_| self.invalid(predicate, value, xsd::LONG.into()))
            })
            .transpose()
    }

    /// # Errors
    ///
    /// Fails for a missing required argument or a value that is not a boolean.
    pub fn boolean(&self, predicate: &Iri) -> Result<Option<bool>, ParameterError> {
        self.lexical(predicate)?
            .map(|(lexical, value)| {
                parse_boolean(lexical)
                    .ok_or_else(|| self.invalid(predicate, value, xsd::BOOLEAN.into()))
            })
            .transpose()
    }

    /// Lexical form of a literal value, or the IRI of a resource value.
    ///
    /// # Errors
    ///
    /// Fails for a missing required argument.
    pub fn string(&self, predicate: &Iri) -> Result<Option<String>, ParameterError> {
        Ok(self
            .lexical(predicate)?
            .map(|(lexical, _)| lexical.to_string()))
    }

    /// The page window, when a `limit` is in effect.
    ///
    /// # Errors
    ///
    /// Fails when one of the paging arguments is missing or malformed.
    pub fn page(&self) -> Result<Option<PageQuery>, ParameterError> {
        let Some(limit) = self.long(&ldth::LIMIT.into())? else {
            return Ok(None);
        };
        Ok(Some(PageQuery {
            offset: self.long(&ldth::OFFSET.into())?.unwrap_or(0),
            limit,
            order_by: self.string(&ldth::ORDER_BY.into())?,
            desc: self.boolean(&ldth::DESC.into())?.unwrap_or(false),
        }))
    }

    fn lexical(&self, predicate: &Iri) -> Result<Option<(&str, &Value)>, ParameterError> {
        Ok(self.argument(predicate)?.map(|value| {
            let lexical = match value {
                Value::Literal(literal) => literal.value(),
                Value::Node(node) => node.as_iri().map_or("", Iri::as_str),
            };
            (lexical, value)
        }))
    }

    fn invalid(&self, predicate: &Iri, value: &Value, value_type: Iri) -> ParameterError {
        ParameterError::InvalidValue {
            name: predicate.local_name().to_string(),
            value: value.to_string(),
            value_type,
            template: self.template.id().clone(),
        }
    }
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Converts a request value into the argument's declared type. Plain strings
/// become simple literals, `rdfs:Resource` values become resource IRIs.
fn typed_value(value: &str, value_type: Option<&Iri>) -> Option<Value> {
    let Some(datatype) = value_type else {
        return Some(Value::string(value));
    };
    let datatype = datatype.as_named_node();

    if datatype == rdfs::RESOURCE {
        return Iri::new(value).ok().map(Value::from);
    }

    let integer = [
        xsd::INTEGER,
        xsd::LONG,
        xsd::INT,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
    ];
    if integer.contains(&datatype) {
        let number: i64 = value.trim().parse().ok()?;
        let in_range = match datatype {
            d if d == xsd::NON_NEGATIVE_INTEGER => number >= 0,
            d if d == xsd::POSITIVE_INTEGER => number > 0,
            d if d == xsd::NEGATIVE_INTEGER => number < 0,
            d if d == xsd::NON_POSITIVE_INTEGER => number <= 0,
            _ => true,
        };
        return in_range.then(|| Literal::new_typed_literal(number.to_string(), datatype).into());
    }

    if datatype == xsd::BOOLEAN {
        return parse_boolean(value)
            .map(|flag| Literal::new_typed_literal(flag.to_string(), datatype).into());
    }

    if [xsd::DOUBLE, xsd::FLOAT, xsd::DECIMAL].contains(&datatype) {
        value.trim().parse::<f64>().ok()?;
        return Some(Literal::new_typed_literal(value.trim(), datatype).into());
    }

    Some(Literal::new_typed_literal(value, datatype).into())
}
