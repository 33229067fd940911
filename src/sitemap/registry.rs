use std::collections::BTreeMap;

use super::{Sitemap, Template};

/// A template chosen for a request path, with the values its placeholders matched.
#[derive(Clone, Debug)]
pub struct TemplateMatch<'s> {
    pub template: &'s Template,
    pub bindings: BTreeMap<String, String>,
}

/// Path-bearing templates of a sitemap in best-first order.
#[derive(Clone, Debug)]
pub struct TemplateRegistry<'s> {
    templates: Vec<&'s Template>,
}

impl<'s> TemplateRegistry<'s> {
    #[must_use]
    pub fn new(sitemap: &'s Sitemap) -> Self {
        Self::from_templates(sitemap.templates())
    }

    pub fn from_templates(templates: impl IntoIterator<Item = &'s Template>) -> Self {
        let mut templates: Vec<_> = templates
            .into_iter()
            .filter(|template| template.path().is_some())
            .collect();
        templates.sort_by(|a, b| a.precedence_cmp(b));
        Self { templates }
    }

    /// Templates in the order they are tried.
    #[must_use]
    pub fn templates(&self) -> &[&'s Template] {
        &self.templates
    }

    /// Returns the first template, in precedence order, whose path matches `path`.
    /// A leading `/` on the request path is ignored.
    #[must_use]
    pub fn best_match(&self, path: &str) -> Option<TemplateMatch<'s>> {
        let path = path.trim_start_matches('/');
        let found = self.templates.iter().find_map(|template| {
            template
                .path()
                .and_then(|uri_template| uri_template.matches(path))
                .map(|bindings| TemplateMatch {
                    template: *template,
                    bindings,
                })
        });
        match &found {
            Some(found) => tracing::debug!(path, template = %found.template, "matched template"),
            None => tracing::debug!(path, "no template matches path"),
        }
        found
    }
}
