//! The generation loop
//!
//! [`Generator`] renders its template once per file of its request and turns
//! the results into a `CodeGeneratorResponse`. Either every file renders and
//! the response carries all outputs, or at least one fails and the response
//! carries only the combined error.

use std::error::Error as _;
use std::sync::Arc;

use prost_reflect::{ReflectMessage, SerializeOptions};
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorProto;
use tera::Context;
use tracing::{debug, info, warn};

use crate::naming;
use crate::template::{RenderContext, Template};
use crate::types::TypeIndex;
use crate::GeneratorError;

/// Renders a template for every file in a request
///
/// A generator may be reused: each [`Generator::generate`] call starts from an
/// empty response. It must not be shared between concurrent calls.
#[derive(Debug)]
pub struct Generator {
    /// Request from protoc, decoded by the caller
    pub request: CodeGeneratorRequest,

    /// Template executed for every file
    pub template: Option<Template>,

    /// Extension for generated files; empty means infer it from the template
    pub extension: String,

    /// Root directory prefix handed to the template helpers
    pub root_dir: String,

    response: CodeGeneratorResponse,
    buf: Vec<u8>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// A generator with an empty request and response and no template
    pub fn new() -> Self {
        Self {
            request: CodeGeneratorRequest::default(),
            template: None,
            extension: String::new(),
            root_dir: String::new(),
            response: CodeGeneratorResponse::default(),
            buf: Vec::new(),
        }
    }

    /// Response produced by the last [`Generator::generate`] call
    pub fn response(&self) -> &CodeGeneratorResponse {
        &self.response
    }

    /// Render every file of the request
    ///
    /// The response held by the generator is reset on entry, so results of a
    /// previous call never leak into this one. Files are rendered in request
    /// order and every file is attempted. If any file fails, no output files
    /// are returned and the response's `error` holds one line per failure.
    ///
    /// Template failures are not returned as `Err`; callers must check the
    /// response's `error`. `Err` is reserved for fatal conditions, currently
    /// only a missing template.
    pub fn generate(&mut self) -> Result<CodeGeneratorResponse, GeneratorError> {
        self.response = CodeGeneratorResponse::default();
        self.response.supported_features = Some(Feature::Proto3Optional as u64);

        let template = self
            .template
            .as_mut()
            .ok_or(GeneratorError::MissingTemplate)?;

        let ext = naming::resolve_extension(&self.extension, template);

        let files: Arc<[FileDescriptorProto]> = self.request.proto_file.clone().into();
        let index = Arc::new(TypeIndex::build(&files));

        let mut errors = String::new();
        let mut outputs = Vec::with_capacity(files.len());
        for (position, file) in files.iter().enumerate() {
            let context = Arc::new(RenderContext::new(
                Arc::clone(&files),
                position,
                Arc::clone(&index),
                &ext,
                &self.root_dir,
            ));
            template.bind(&context);

            self.buf.clear();
            if let Err(err) = render_file(template, file, &mut self.buf) {
                let line = error_line(file.name(), &err);
                warn!(file = file.name(), error = %line.trim_end(), "template execution failed");
                errors.push_str(&line);
                continue;
            }

            let name = naming::output_name(file.name(), &ext);
            debug!(file = file.name(), output = %name, bytes = self.buf.len(), "rendered file");
            outputs.push(File {
                name: Some(name),
                content: Some(String::from_utf8_lossy(&self.buf).into_owned()),
                ..Default::default()
            });
        }

        if errors.is_empty() {
            info!(files = outputs.len(), extension = %ext, "generation finished");
            self.response.file = outputs;
        } else {
            info!(
                files = files.len(),
                failed = errors.lines().count(),
                "generation failed; discarding outputs"
            );
            self.response.error = Some(errors);
        }

        Ok(self.response.clone())
    }
}

/// Execute the template with the file as the root data value
fn render_file(
    template: &Template,
    file: &FileDescriptorProto,
    out: &mut Vec<u8>,
) -> tera::Result<()> {
    let options = SerializeOptions::new()
        .use_proto_field_name(true)
        .skip_default_fields(false);
    let value = file
        .transcode_to_dynamic()
        .serialize_with_options(serde_json::value::Serializer, &options)
        .map_err(|e| tera::Error::chain(format!("failed to convert '{}'", file.name()), e))?;

    let context = Context::from_value(value)?;
    template.render_to(&context, out)
}

/// One line of the combined error: file name, then the error and its causes
fn error_line(file_name: &str, err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    let message = message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{file_name}: {message}\n")
}
