//! protoc-gen-tmpl library
//!
//! This crate renders a user-supplied Tera template once per protobuf file
//! found in a `CodeGeneratorRequest` and collects the results into a
//! `CodeGeneratorResponse`.

#![deny(warnings)]
#![deny(missing_docs)]

pub mod generator;
pub mod naming;
pub mod options;
pub mod template;
pub mod types;

use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use thiserror::Error;

pub use generator::Generator;
pub use options::PluginOptions;
pub use template::Template;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Invalid plugin configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A template could not be read or compiled
    #[error("Failed to load template '{name}': {source}")]
    TemplateLoad {
        /// Name or path of the template that failed
        name: String,
        /// Underlying Tera error
        #[source]
        source: tera::Error,
    },

    /// Generation was requested before a template was set
    #[error("No template set on generator")]
    MissingTemplate,

    /// Failed to decode protobuf message
    #[error("Decode error: {0}")]
    DecodeError(#[from] prost::DecodeError),
}

/// Render `template` for every file of a protobuf CodeGeneratorRequest
///
/// Per-file template failures are reported through the response's `error`
/// field; the `Err` variant is reserved for fatal conditions.
pub fn generate(
    request: CodeGeneratorRequest,
    template: Template,
    options: &PluginOptions,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let mut generator = Generator::new();
    generator.request = request;
    generator.template = Some(template);
    generator.extension = options.extension.clone();
    generator.root_dir = options.root_dir.clone();
    generator.generate()
}

/// Decode a CodeGeneratorRequest from raw bytes and render it
pub fn generate_from_bytes(
    bytes: &[u8],
    template: Template,
    options: &PluginOptions,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let request = CodeGeneratorRequest::decode(bytes)?;
    generate(request, template, options)
}
