//! URL → template routing.
//!
//! Routes are an ordered YAML mapping of shell-glob pattern to template name:
//!
//! ```yaml
//! "/*": page.html
//! "/blog/*": post.html
//! "/blog/index": blog_home.html
//! ```
//!
//! Every pattern is tried against the output path. `*` also crosses `/`, so
//! `/blog/*` matches `/blog/2024/hello`. Among all matches the longest
//! pattern (in characters) wins; equal lengths go to the route declared
//! first. No match is an error: there is no implicit default template.

use indexmap::IndexMap;
use std::fs;
use std::path::Path;

use super::TemplateError;

#[derive(Debug, Clone)]
pub struct Route {
    pattern: glob::Pattern,
    template: String,
}

impl Route {
    pub fn new(pattern: &str, template: impl Into<String>) -> Result<Self, TemplateError> {
        let compiled = glob::Pattern::new(pattern).map_err(|source| TemplateError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            template: template.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn specificity(&self) -> usize {
        self.pattern.as_str().chars().count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Parse a YAML mapping of pattern → template name, keeping declaration order.
    pub fn from_yaml(text: &str) -> Result<Self, TemplateError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mapping: IndexMap<String, String> = serde_yaml::from_str(text)?;
        mapping
            .into_iter()
            .map(|(pattern, template)| Route::new(&pattern, template))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::RoutesRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Template name for `url`.
    pub fn resolve(&self, url: &str) -> Result<&str, TemplateError> {
        let mut best: Option<&Route> = None;
        for route in self.routes.iter().filter(|r| r.pattern.matches(url)) {
            if best.is_none_or(|b| route.specificity() > b.specificity()) {
                best = Some(route);
            }
        }
        best.map(Route::template)
            .ok_or_else(|| TemplateError::NoRoute(url.to_string()))
    }
}
