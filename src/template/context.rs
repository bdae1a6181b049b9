//! Per-file rendering context and the helper functions bound from it
//!
//! A [`RenderContext`] is built for one protobuf file and never mutated. The
//! helpers exposed to templates are closures over an `Arc` of it, rebuilt for
//! every file so no helper can observe another file's context.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FileDescriptorProto;
use serde::Serialize;
use tera::Value;

use crate::naming;
use crate::types::{self, TypeEntry, TypeIndex};

/// A helper function as registered with Tera
pub(crate) type Helper =
    Box<dyn Fn(&HashMap<String, Value>) -> tera::Result<Value> + Send + Sync>;

/// Helper name to bound function
pub(crate) type HelperSet = BTreeMap<&'static str, Helper>;

type Method = fn(&RenderContext, &HashMap<String, Value>) -> tera::Result<Value>;

const HELPERS: &[(&str, Method)] = &[
    ("root_dir", RenderContext::root_dir),
    ("extension", RenderContext::extension),
    ("files", RenderContext::files),
    ("output_name", RenderContext::output_name),
    ("clean_type", RenderContext::clean_type),
    ("field_label", RenderContext::field_label),
    ("field_type", RenderContext::field_type),
    ("resolve_type", RenderContext::resolve_type),
    ("type_url", RenderContext::type_url),
    ("comments", RenderContext::comments),
];

/// Build the helper set for one file
pub(crate) fn helper_set(context: &Arc<RenderContext>) -> HelperSet {
    HELPERS
        .iter()
        .map(|&(name, method)| {
            let context = Arc::clone(context);
            let helper: Helper =
                Box::new(move |args: &HashMap<String, Value>| method(&context, args));
            (name, helper)
        })
        .collect()
}

/// Everything the helpers may consult while one file is rendered
#[derive(Debug)]
pub(crate) struct RenderContext {
    files: Arc<[FileDescriptorProto]>,
    current: usize,
    index: Arc<TypeIndex>,
    extension: String,
    root_dir: String,
}

#[derive(Serialize)]
struct ResolvedType<'a> {
    #[serde(flatten)]
    entry: &'a TypeEntry,
    output: String,
    url: String,
}

impl RenderContext {
    pub(crate) fn new(
        files: Arc<[FileDescriptorProto]>,
        current: usize,
        index: Arc<TypeIndex>,
        extension: &str,
        root_dir: &str,
    ) -> Self {
        Self {
            files,
            current,
            index,
            extension: extension.to_string(),
            root_dir: root_dir.to_string(),
        }
    }

    /// The file being rendered
    pub(crate) fn file(&self) -> &FileDescriptorProto {
        &self.files[self.current]
    }

    fn root_dir(&self, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(Value::String(self.root_dir.clone()))
    }

    fn extension(&self, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(Value::String(self.extension.clone()))
    }

    fn files(&self, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(Value::Array(
            self.files
                .iter()
                .map(|f| Value::String(f.name().to_string()))
                .collect(),
        ))
    }

    fn output_name(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let file = match args.get("file") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| tera::Error::msg("`output_name`: `file` must be a string"))?,
            None => self.file().name(),
        };
        Ok(Value::String(naming::output_name(file, &self.extension)))
    }

    fn clean_type(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let name = required_str(args, "clean_type", "name")?;
        Ok(Value::String(self.clean(name)))
    }

    fn field_label(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let field = required_field(args, "field_label")?;
        let label = field
            .get("label")
            .and_then(parse_label)
            .ok_or_else(|| tera::Error::msg("`field_label`: field has no valid `label`"))?;
        let label = match label {
            Label::Optional => "optional",
            Label::Required => "required",
            Label::Repeated => "repeated",
        };
        Ok(Value::String(label.to_string()))
    }

    fn field_type(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let field = required_field(args, "field_type")?;

        if let Some(type_name) = field
            .get("type_name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
        {
            return Ok(Value::String(self.clean(type_name)));
        }

        field
            .get("type")
            .and_then(parse_type)
            .and_then(types::scalar_name)
            .map(|name| Value::String(name.to_string()))
            .ok_or_else(|| tera::Error::msg("`field_type`: field has no scalar `type` or `type_name`"))
    }

    fn resolve_type(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let entry = self.lookup(required_str(args, "resolve_type", "name")?)?;
        let resolved = ResolvedType {
            entry,
            output: naming::output_name(&entry.file, &self.extension),
            url: self.url_for(entry),
        };
        serde_json::to_value(resolved)
            .map_err(|e| tera::Error::chain("`resolve_type`: failed to serialize type", e))
    }

    fn type_url(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let entry = self.lookup(required_str(args, "type_url", "name")?)?;
        Ok(Value::String(self.url_for(entry)))
    }

    fn comments(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let path = args
            .get("path")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_i64().and_then(|n| i32::try_from(n).ok()))
                    .collect::<Option<Vec<i32>>>()
            })
            .ok_or_else(|| tera::Error::msg("`comments` expects `path` as a list of integers"))?;

        let location = self
            .file()
            .source_code_info
            .iter()
            .flat_map(|info| &info.location)
            .find(|location| location.path == path);

        let text = location
            .map(|location| {
                let leading = location.leading_comments().trim();
                if leading.is_empty() {
                    location.trailing_comments().trim()
                } else {
                    leading
                }
            })
            .unwrap_or_default();
        Ok(Value::String(text.to_string()))
    }

    /// Strip the leading dot and, when it matches, the current file's package
    fn clean(&self, name: &str) -> String {
        let name = name.trim_start_matches('.');
        let package = self.file().package();
        if !package.is_empty() {
            if let Some(local) = name
                .strip_prefix(package)
                .and_then(|rest| rest.strip_prefix('.'))
            {
                return local.to_string();
            }
        }
        name.to_string()
    }

    fn lookup(&self, name: &str) -> tera::Result<&TypeEntry> {
        self.index
            .get(name)
            .ok_or_else(|| tera::Error::msg(format!("unknown type `{name}`")))
    }

    fn url_for(&self, entry: &TypeEntry) -> String {
        let output = naming::output_name(&entry.file, &self.extension);
        let path = if self.root_dir.is_empty() {
            output
        } else {
            format!("{}/{}", self.root_dir.trim_end_matches('/'), output)
        };
        format!("{}#{}", path, entry.name)
    }
}

fn required_str<'a>(
    args: &'a HashMap<String, Value>,
    helper: &str,
    key: &str,
) -> tera::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg(format!("`{helper}` expects a string argument `{key}`")))
}

fn required_field<'a>(
    args: &'a HashMap<String, Value>,
    helper: &str,
) -> tera::Result<&'a serde_json::Map<String, Value>> {
    args.get("field")
        .and_then(Value::as_object)
        .ok_or_else(|| tera::Error::msg(format!("`{helper}` expects a field object `field`")))
}

fn parse_label(value: &Value) -> Option<Label> {
    match value {
        Value::String(name) => Label::from_str_name(name),
        Value::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .and_then(|n| Label::try_from(n).ok()),
        _ => None,
    }
}

fn parse_type(value: &Value) -> Option<Type> {
    match value {
        Value::String(name) => Type::from_str_name(name),
        Value::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .and_then(|n| Type::try_from(n).ok()),
        _ => None,
    }
}
