//! Built-in templates, rendered with Tera.

use crate::BuildError;
use tera::{Context, Tera};

pub const CLOUDBUILD: &str = "cloudbuild.yaml";
pub const SETTINGS: &str = "settings.py";

const TEMPLATES: &[(&str, &str)] = &[
    (CLOUDBUILD, include_str!("../templates/cloudbuild.yaml.tera")),
    (SETTINGS, include_str!("../templates/settings.py.tera")),
];

/// Render the built-in template `name`.
///
/// Template names carry no `.html` suffix, so Tera applies no escaping and
/// values (existing settings content included) are inserted verbatim.
pub fn render(name: &'static str, context: &Context) -> Result<String, BuildError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())
        .map_err(|e| BuildError::Template { name, source: e })?;
    tera.render(name, context)
        .map_err(|e| BuildError::Template { name, source: e })
}
