//! Prompt templates.
//!
//! Templates are Jinja-style with square-bracket delimiters so they sit well
//! inside Markdown and JSON prompt text:
//!
//! ```text
//! Summarise the following [[ kind ]]:
//! [% for item in items %]- [[ item ]]
//! [% endfor %]
//! ```

use std::path::{Path, PathBuf};

use minijinja::Environment;
use minijinja::syntax::SyntaxConfig;
use serde::Serialize;
use tracing::error;

use crate::{LlmFunctionError, Result};

const TEMPLATE_NAME: &str = "prompt";

/// A parsed prompt template.
pub struct PromptTemplate {
    env: Environment<'static>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PromptTemplate {
    /// Load and parse a template file.
    ///
    /// A missing file or a syntax error is a [`LlmFunctionError::Template`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "template file not found");
            LlmFunctionError::Template(format!(
                "failed to read template {}: {e}",
                path.display()
            ))
        })?;
        let mut template = Self::from_source(source)?;
        template.path = Some(path.to_path_buf());
        Ok(template)
    }

    /// Parse a template from a string.
    pub fn from_source(source: impl Into<String>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_syntax(
            SyntaxConfig::builder()
                .block_delimiters("[%", "%]")
                .variable_delimiters("[[", "]]")
                .build()?,
        );
        env.add_template_owned(TEMPLATE_NAME, source.into())?;
        Ok(Self { env, path: None })
    }

    /// The file this template was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Render with `values` as the template context.
    pub fn render<S: Serialize>(&self, values: S) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(values)?)
    }
}
