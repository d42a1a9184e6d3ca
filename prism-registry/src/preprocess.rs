//! Template-based field derivation for source records.

use handlebars::Handlebars;
use prism_model::{PreprocessRule, Record};
use serde_json::Value;

use crate::error::{ConfigError, RegistryError, RegistryResult};

/// Compiled preprocessing rules of one source.
///
/// Rules run in declared order against the record as it stands, so a rule
/// can read fields derived by the rules before it.
pub struct Preprocessor {
    source_name: String,
    fields: Vec<String>,
    templates: Handlebars<'static>,
}

impl Preprocessor {
    /// Compiles every rule's template. A malformed template is a
    /// configuration error.
    pub fn new(source_name: &str, rules: &[PreprocessRule]) -> Result<Self, ConfigError> {
        let mut templates = Handlebars::new();
        // Output is data, not HTML.
        templates.register_escape_fn(handlebars::no_escape);

        for (index, rule) in rules.iter().enumerate() {
            templates
                .register_template_string(&index.to_string(), &rule.template)
                .map_err(|e| ConfigError::InvalidTemplate {
                    source_name: source_name.to_string(),
                    field: rule.field.clone(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self {
            source_name: source_name.to_string(),
            fields: rules.iter().map(|r| r.field.clone()).collect(),
            templates,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Applies every rule to `record` in place. Each rendered value is trimmed.
    pub fn apply(&self, record: &mut Record) -> RegistryResult<()> {
        for (index, field) in self.fields.iter().enumerate() {
            let rendered = self
                .templates
                .render(&index.to_string(), &*record)
                .map_err(|e| RegistryError::Template {
                    source_name: self.source_name.clone(),
                    field: field.clone(),
                    message: e.to_string(),
                })?;
            record.insert(field.clone(), Value::String(rendered.trim().to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("source_name", &self.source_name)
            .field("fields", &self.fields)
            .finish()
    }
}
