use minijinja::{AutoEscape, Environment, context, path_loader};
use minijinja::value::Value;
use std::path::Path;

use super::view::{NodeView, SiteView};
use super::{Bindings, TemplateEngine, TemplateError};

/// Jinja2-compatible engine backed by `minijinja`, loading templates by
/// name from one directory.
#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

/// Jinja2 defaults: no autoescaping, rendered markdown is inserted as-is.
fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env
}

impl MiniJinjaEngine {
    pub fn new(templates_dir: &Path) -> Self {
        let mut env = environment();
        env.set_loader(path_loader(templates_dir));
        Self { env }
    }

    /// Engine over in-memory templates.
    #[cfg(test)]
    pub fn from_templates<I, N, S>(templates: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut env = environment();
        for (name, source) in templates {
            env.add_template_owned(name.into(), source.into())?;
        }
        Ok(Self { env })
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, name: &str, bindings: &Bindings) -> Result<String, TemplateError> {
        let template = self.env.get_template(name)?;
        let node = bindings.node();
        let rendered = template.render(context! {
            site => SiteView::value(bindings.site.clone()),
            page => Value::from_serialize(node.page()),
            node => NodeView::value(bindings.site.clone(), bindings.node),
        })?;
        Ok(rendered)
    }
}
