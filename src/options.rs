//! Plugin parameter parsing
//!
//! protoc passes everything after `--tmpl_opt=` (or before the `:` in
//! `--tmpl_out=`) as a single parameter string. It is a comma-separated list
//! of `key=value` pairs:
//!
//! ```text
//! template=doc.html,template=partials.html,ext=.md,root_dir=/api
//! ```

use std::path::PathBuf;

use crate::GeneratorError;

/// Environment variable naming the template when no `template` parameter is given
pub const TEMPLATE_ENV: &str = "PROTOC_GEN_TMPL_TEMPLATE";

/// Options controlling one plugin invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOptions {
    /// Template files; the first one is the entry template
    pub templates: Vec<PathBuf>,
    /// Output extension; empty means infer it from the template name
    pub extension: String,
    /// Root directory prefix used by the `type_url` helpers
    pub root_dir: String,
}

impl PluginOptions {
    /// Parse the plugin parameter string
    pub fn parse(parameter: Option<&str>) -> Result<Self, GeneratorError> {
        let mut options = Self::default();
        let Some(parameter) = parameter else {
            return Ok(options);
        };

        for part in split_parameter(parameter) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part.split_once('=').ok_or_else(|| {
                GeneratorError::InvalidConfig(format!("expected key=value, got '{part}'"))
            })?;
            let value = parse_quoted_string(value);

            match key.trim() {
                "template" => options.templates.push(PathBuf::from(value)),
                "ext" | "extension" => options.extension = value,
                "root_dir" | "rootdir" => options.root_dir = value,
                other => {
                    return Err(GeneratorError::InvalidConfig(format!(
                        "unknown parameter '{other}'"
                    )))
                }
            }
        }

        Ok(options)
    }

    /// Fill in the template from `PROTOC_GEN_TMPL_TEMPLATE` when none was given
    pub fn with_env_fallback(mut self) -> Self {
        if self.templates.is_empty() {
            if let Some(path) = std::env::var_os(TEMPLATE_ENV).filter(|p| !p.is_empty()) {
                self.templates.push(PathBuf::from(path));
            }
        }
        self
    }
}

/// Split on commas that are not inside quotes
fn split_parameter(parameter: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;

    for (i, c) in parameter.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (',', None) => {
                parts.push(&parameter[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < parameter.len() {
        parts.push(&parameter[start..]);
    }

    parts
}

/// Parse a possibly quoted value, removing quotes
fn parse_quoted_string(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_none() {
        assert_eq!(PluginOptions::parse(None).unwrap(), PluginOptions::default());
        assert_eq!(PluginOptions::parse(Some("")).unwrap(), PluginOptions::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let options =
            PluginOptions::parse(Some("template=doc.html,template=part.html,ext=.md,root_dir=/api"))
                .unwrap();
        assert_eq!(
            options.templates,
            vec![PathBuf::from("doc.html"), PathBuf::from("part.html")]
        );
        assert_eq!(options.extension, ".md");
        assert_eq!(options.root_dir, "/api");
    }

    #[test]
    fn test_parse_aliases_and_quotes() {
        let options =
            PluginOptions::parse(Some("extension='.txt', rootdir=\"/a,b\"")).unwrap();
        assert_eq!(options.extension, ".txt");
        assert_eq!(options.root_dir, "/a,b");
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        let err = PluginOptions::parse(Some("colour=blue")).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_rejects_missing_value() {
        let err = PluginOptions::parse(Some("template")).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_quoted_string() {
        assert_eq!(parse_quoted_string("\"hello\""), "hello");
        assert_eq!(parse_quoted_string("'world'"), "world");
        assert_eq!(parse_quoted_string("unquoted"), "unquoted");
        assert_eq!(parse_quoted_string("\""), "\"");
    }

    #[test]
    fn test_env_fallback() {
        std::env::set_var(TEMPLATE_ENV, "from_env.md");

        let options = PluginOptions::parse(Some("ext=.txt")).unwrap().with_env_fallback();
        assert_eq!(options.templates, vec![PathBuf::from("from_env.md")]);

        let options = PluginOptions::parse(Some("template=given.md"))
            .unwrap()
            .with_env_fallback();
        assert_eq!(options.templates, vec![PathBuf::from("given.md")]);

        std::env::set_var(TEMPLATE_ENV, "");
        let options = PluginOptions::parse(None).unwrap().with_env_fallback();
        assert!(options.templates.is_empty());

        std::env::remove_var(TEMPLATE_ENV);
        let options = PluginOptions::parse(None).unwrap().with_env_fallback();
        assert!(options.templates.is_empty());
    }

    #[test]
    fn test_split_parameter() {
        assert_eq!(split_parameter("a=1,b=2"), vec!["a=1", "b=2"]);
        assert_eq!(split_parameter("a='1,2',b=3"), vec!["a='1,2'", "b=3"]);
    }
}
