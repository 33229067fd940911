use std::collections::BTreeMap;

use thiserror::Error;

use super::value_objects::Iri;
use crate::graph::Value;

/// Super class expression: a named class or a value restriction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassExpression {
    /// A named super class.
    Named(Iri),
    /// Instances must carry `on_property` with exactly `value`.
    HasValue { on_property: Iri, value: Value },
}

/// Ontology class definition capturing parent relationships and template annotations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    id: Iri,
    label: Option<String>,
    comment: Option<String>,
    defined_by: Option<Iri>,
    super_classes: Vec<ClassExpression>,
    annotations: BTreeMap<Iri, Vec<Value>>,
}

impl Class {
    /// Creates a new [`Class`] with the supplied identifier.
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: None,
            comment: None,
            defined_by: None,
            super_classes: Vec::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Sets a human friendly label for the class.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets a textual description for the class.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Records the ontology that directly defines this class.
    #[must_use]
    pub fn defined_by(mut self, ontology: Iri) -> Self {
        self.defined_by = Some(ontology);
        self
    }

    /// Adds an annotation value, keeping earlier values for the same property.
    #[must_use]
    pub fn with_annotation(mut self, property: impl Into<Iri>, value: impl Into<Value>) -> Self {
        self.annotate(property, value);
        self
    }

    /// Adds a super class expression, ignoring duplicates.
    pub fn add_parent(&mut self, parent: ClassExpression) -> bool {
        if self.super_classes.contains(&parent) {
            return false;
        }
        self.super_classes.push(parent);
        true
    }

    /// Removes a super class expression.
    pub fn remove_parent(&mut self, parent: &ClassExpression) -> bool {
        let before = self.super_classes.len();
        self.super_classes.retain(|existing| existing != parent);
        before != self.super_classes.len()
    }

    /// Appends an annotation value for `property`.
    pub fn annotate(&mut self, property: impl Into<Iri>, value: impl Into<Value>) {
        self.annotations
            .entry(property.into())
            .or_default()
            .push(value.into());
    }

    /// Returns the unique identifier of the class.
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the optional label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the optional comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the ontology that directly defines the class, if recorded.
    #[must_use]
    pub fn is_defined_by(&self) -> Option<&Iri> {
        self.defined_by.as_ref()
    }

    /// Returns the super class expressions in declaration order.
    #[must_use]
    pub fn parents(&self) -> &[ClassExpression] {
        &self.super_classes
    }

    /// Returns the named super classes in declaration order.
    pub fn named_parents(&self) -> impl Iterator<Item = &Iri> {
        self.super_classes.iter().filter_map(|parent| match parent {
            ClassExpression::Named(iri) => Some(iri),
            ClassExpression::HasValue { .. } => None,
        })
    }

    /// Returns every annotation value recorded for `property`.
    #[must_use]
    pub fn annotations(&self, property: &Iri) -> &[Value] {
        self.annotations.get(property).map_or(&[], Vec::as_slice)
    }

    /// Whether any value is recorded for `property`.
    #[must_use]
    pub fn has_annotation(&self, property: &Iri) -> bool {
        !self.annotations(property).is_empty()
    }

    /// Returns the lexical form of the first value for `property` when that
    /// value is a literal.
    #[must_use]
    pub fn string_value(&self, property: &Iri) -> Option<&str> {
        self.annotations(property)
            .first()
            .and_then(Value::as_literal)
            .map(oxrdf::Literal::value)
    }
}

/// Template parameter declaration binding a query parameter to a property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    id: Iri,
    predicate: Iri,
    optional: bool,
    value_type: Option<Iri>,
    default_value: Option<Value>,
}

impl Parameter {
    /// Creates a required parameter bound to `predicate`.
    #[must_use]
    pub fn new(id: Iri, predicate: Iri) -> Self {
        Self {
            id,
            predicate,
            optional: false,
            value_type: None,
            default_value: None,
        }
    }

    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Sets the datatype that supplied values are converted to.
    #[must_use]
    pub fn with_value_type(mut self, value_type: Iri) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the property this parameter binds.
    #[must_use]
    pub fn predicate(&self) -> &Iri {
        &self.predicate
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn value_type(&self) -> Option<&Iri> {
        self.value_type.as_ref()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }
}

/// Aggregates classes and parameter declarations of one schema document,
/// together with its import edges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ontology {
    id: Iri,
    label: Option<String>,
    imports: Vec<Iri>,
    classes: BTreeMap<Iri, Class>,
    parameters: BTreeMap<Iri, Parameter>,
}

impl Ontology {
    /// Creates a new ontology aggregate with the supplied identifier.
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: None,
            imports: Vec::new(),
            classes: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Sets a human readable label for the ontology.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Declares an import edge. Self imports and repeated imports are ignored.
    pub fn add_import(&mut self, ontology: Iri) -> bool {
        if ontology == self.id || self.imports.contains(&ontology) {
            return false;
        }
        self.imports.push(ontology);
        true
    }

    /// Adds a class to the ontology, enforcing unique identifiers.
    pub fn add_class(&mut self, class: Class) -> Result<(), OntologyError> {
        let id = class.id().clone();
        if self.classes.contains_key(&id) {
            return Err(OntologyError::DuplicateClass(id));
        }
        self.classes.insert(id, class);
        Ok(())
    }

    /// Adds a parameter declaration, enforcing unique identifiers.
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), OntologyError> {
        let id = parameter.id().clone();
        if self.parameters.contains_key(&id) {
            return Err(OntologyError::DuplicateParameter(id));
        }
        self.parameters.insert(id, parameter);
        Ok(())
    }

    /// Returns the ontology identifier.
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the optional label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the imported ontology identifiers in declaration order.
    #[must_use]
    pub fn imports(&self) -> &[Iri] {
        &self.imports
    }

    /// Retrieves a class by identifier.
    #[must_use]
    pub fn class(&self, id: &Iri) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Retrieves a parameter by identifier.
    #[must_use]
    pub fn parameter(&self, id: &Iri) -> Option<&Parameter> {
        self.parameters.get(id)
    }

    /// Returns all classes ordered by identifier.
    #[must_use]
    pub fn classes(&self) -> &BTreeMap<Iri, Class> {
        &self.classes
    }

    /// Returns all parameters ordered by identifier.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<Iri, Parameter> {
        &self.parameters
    }
}

/// Errors raised when manipulating an ontology aggregate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    /// Attempted to add a class with an existing identifier.
    #[error("class `{0}` already exists")]
    DuplicateClass(Iri),
    /// Attempted to add a parameter with an existing identifier.
    #[error("parameter `{0}` already exists")]
    DuplicateParameter(Iri),
}
