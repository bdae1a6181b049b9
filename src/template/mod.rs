//! Compiled templates
//!
//! A [`Template`] wraps a Tera registry with one entry template plus any
//! partials it includes. The generator binds the per-file helper functions
//! onto it before every render.

mod context;
mod filters;

use std::path::Path;

use tera::{Context, Tera};

use crate::GeneratorError;

pub(crate) use context::RenderContext;

/// A template registry with a designated entry template
#[derive(Debug)]
pub struct Template {
    tera: Tera,
    entry: String,
}

impl Template {
    /// Compile a single template from source
    pub fn from_raw(name: &str, source: &str) -> Result<Self, GeneratorError> {
        let mut tera = Tera::default();
        tera.add_raw_template(name, source)
            .map_err(|source| GeneratorError::TemplateLoad {
                name: name.to_string(),
                source,
            })?;
        Ok(Self::with_entry(tera, name))
    }

    /// Load templates from disk
    ///
    /// The first path is the entry template; the others are partials that the
    /// entry can `include`, `extends` or `import`. Every file is registered
    /// under its base name.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, GeneratorError> {
        let (entry_path, _) = paths.split_first().ok_or_else(|| {
            GeneratorError::InvalidConfig("at least one template file is required".to_string())
        })?;
        let entry = base_name(entry_path.as_ref());

        let files: Vec<(&Path, Option<String>)> = paths
            .iter()
            .map(|p| (p.as_ref(), Some(base_name(p.as_ref()))))
            .collect();

        let mut tera = Tera::default();
        tera.add_template_files(files)
            .map_err(|source| GeneratorError::TemplateLoad {
                name: entry_path.as_ref().display().to_string(),
                source,
            })?;
        Ok(Self::with_entry(tera, &entry))
    }

    fn with_entry(mut tera: Tera, entry: &str) -> Self {
        filters::register(&mut tera);
        Self {
            tera,
            entry: entry.to_string(),
        }
    }

    /// Name of the template rendered for each protobuf file
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Names of every template in the registry, entry first, others sorted
    pub fn source_names(&self) -> Vec<&str> {
        let mut rest: Vec<&str> = self
            .tera
            .get_template_names()
            .filter(|name| *name != self.entry)
            .collect();
        rest.sort_unstable();

        std::iter::once(self.entry.as_str()).chain(rest).collect()
    }

    /// Add another named template, e.g. a partial for `include`
    pub fn add_raw_template(&mut self, name: &str, source: &str) -> Result<(), GeneratorError> {
        self.tera
            .add_raw_template(name, source)
            .map_err(|source| GeneratorError::TemplateLoad {
                name: name.to_string(),
                source,
            })
    }

    /// Register an extra Tera function
    ///
    /// Functions named like a built-in helper are replaced on the next render.
    pub fn register_function<F: tera::Function + 'static>(&mut self, name: &str, function: F) {
        self.tera.register_function(name, function);
    }

    /// Bind the helper functions of one rendering context
    pub(crate) fn bind(&mut self, context: &std::sync::Arc<RenderContext>) {
        for (name, helper) in context::helper_set(context) {
            self.tera.register_function(name, helper);
        }
    }

    /// Render the entry template into `out`
    pub(crate) fn render_to(&self, context: &Context, out: &mut Vec<u8>) -> tera::Result<()> {
        self.tera.render_to(&self.entry, context, out)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
