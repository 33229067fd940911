//! URI templates with `{name}` and `{name: regex}` placeholders.
//!
//! Templates expand from a name/value map (values are percent-encoded) and
//! match concrete paths back into name/value bindings. [`UriTemplate::specificity_cmp`]
//! orders more literal templates before more generic ones.

use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use thiserror::Error;

/// Characters left as-is when expanding a value: RFC 3986 unreserved.
const VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const DEFAULT_VARIABLE_REGEX: &str = "[^/]+?";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Literal(String),
    Variable { name: String, regex: Option<String> },
}

/// A parsed URI template.
#[derive(Clone, Debug)]
pub struct UriTemplate {
    template: String,
    parts: Vec<Part>,
    names: Vec<String>,
    pattern: Regex,
}

impl UriTemplate {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns an error for unbalanced braces, empty or malformed variable
    /// names and invalid variable regexes.
    pub fn parse(template: &str) -> Result<Self, UriTemplateError> {
        let parts = parse_parts(template)?;

        let mut names: Vec<String> = Vec::new();
        let mut pattern = String::from("^");
        let mut group = 0usize;
        for part in &parts {
            match part {
                Part::Literal(text) => pattern.push_str(&regex::escape(text)),
                Part::Variable { name, regex } => {
                    if !names.contains(name) {
                        names.push(name.clone());
                    }
                    let body = regex.as_deref().unwrap_or(DEFAULT_VARIABLE_REGEX);
                    pattern.push_str(&format!("(?P<v{group}>{body})"));
                    group += 1;
                }
            }
        }
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|err| UriTemplateError::InvalidRegex {
            template: template.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            parts,
            names,
            pattern,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Variable names in order of first appearance.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Substitutes every placeholder with its percent-encoded value.
    ///
    /// Only unreserved characters pass through, so `/` is encoded as `%2F`
    /// even for placeholders with a multi-segment regex such as `{path: .*}`.
    /// A value never adds path segments to the expansion.
    ///
    /// # Errors
    ///
    /// Fails with [`UriTemplateError::MissingValue`] when a placeholder has no value.
    pub fn expand(&self, values: &BTreeMap<String, String>) -> Result<String, UriTemplateError> {
        let mut expanded = String::with_capacity(self.template.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => expanded.push_str(text),
                Part::Variable { name, .. } => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| UriTemplateError::MissingValue {
                            template: self.template.clone(),
                            name: name.clone(),
                        })?;
                    expanded.extend(utf8_percent_encode(value, VALUE_ENCODE_SET));
                }
            }
        }
        Ok(expanded)
    }

    /// Matches a concrete path against the whole template, returning the
    /// decoded value of every placeholder.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.pattern.captures(path)?;
        let mut bindings = BTreeMap::new();
        let mut group = 0usize;
        for part in &self.parts {
            if let Part::Variable { name, .. } = part {
                if let Some(value) = captures.name(&format!("v{group}")) {
                    bindings
                        .entry(name.clone())
                        .or_insert_with(|| percent_decode_str(value.as_str()).decode_utf8_lossy().into_owned());
                }
                group += 1;
            }
        }
        Some(bindings)
    }

    /// Number of literal characters outside placeholders.
    #[must_use]
    pub fn explicit_characters(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) => text.chars().count(),
                Part::Variable { .. } => 0,
            })
            .sum()
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    /// Number of placeholders that declare their own regex.
    #[must_use]
    pub fn explicit_regex_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, Part::Variable { regex: Some(_), .. }))
            .count()
    }

    /// Specificity ordering: `Less` means `self` is more specific and sorts first.
    ///
    /// More literal characters win, then more variables, then more explicit
    /// regexes; remaining ties fall back to reverse lexical order of the
    /// generated pattern so that distinct templates never compare equal.
    #[must_use]
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        other
            .explicit_characters()
            .cmp(&self.explicit_characters())
            .then_with(|| other.variable_count().cmp(&self.variable_count()))
            .then_with(|| other.explicit_regex_count().cmp(&self.explicit_regex_count()))
            .then_with(|| other.pattern.as_str().cmp(self.pattern.as_str()))
    }
}

impl PartialEq for UriTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for UriTemplate {}

impl Display for UriTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl FromStr for UriTemplate {
    type Err = UriTemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_parts(template: &str) -> Result<Vec<Part>, UriTemplateError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices();

    while let Some((start, ch)) = chars.next() {
        match ch {
            '{' => {
                let mut depth = 1usize;
                let mut expression = String::new();
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    expression.push(inner);
                }
                if depth != 0 {
                    return Err(UriTemplateError::Unbalanced {
                        template: template.to_string(),
                        position: start,
                    });
                }
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                parts.push(parse_variable(template, &expression)?);
            }
            '}' => {
                return Err(UriTemplateError::Unbalanced {
                    template: template.to_string(),
                    position: start,
                })
            }
            _ => literal.push(ch),
        }
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}

fn parse_variable(template: &str, expression: &str) -> Result<Part, UriTemplateError> {
    let (name, regex) = match expression.split_once(':') {
        Some((name, regex)) => (name.trim(), Some(regex.trim().to_string())),
        None => (expression.trim(), None),
    };
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err(UriTemplateError::InvalidName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    Ok(Part::Variable {
        name: name.to_string(),
        regex: regex.filter(|regex| !regex.is_empty()),
    })
}

/// Errors raised while parsing or expanding a [`UriTemplate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UriTemplateError {
    #[error("unbalanced brace at position {position} in URI template `{template}`")]
    Unbalanced { template: String, position: usize },
    #[error("invalid variable name `{name}` in URI template `{template}`")]
    InvalidName { template: String, name: String },
    #[error("invalid variable regex in URI template `{template}`: {message}")]
    InvalidRegex { template: String, message: String },
    #[error("URI template `{template}` has no value for variable `{name}`")]
    MissingValue { template: String, name: String },
}
