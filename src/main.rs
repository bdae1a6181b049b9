//! protoc-gen-tmpl - A protoc plugin rendering a template per protobuf file
//!
//! This binary reads a CodeGeneratorRequest from stdin and writes a
//! CodeGeneratorResponse to stdout, following the protoc plugin protocol.
//! Logs go to stderr and are filtered by `PROTOC_GEN_TMPL_LOG`.

use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use protoc_gen_tmpl::{GeneratorError, PluginOptions, Template};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROTOC_GEN_TMPL_LOG";

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("protoc-gen-tmpl: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Read raw bytes from stdin
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;

    let request = CodeGeneratorRequest::decode(buf.as_slice())?;
    tracing::debug!(
        files = request.proto_file.len(),
        parameter = request.parameter(),
        "decoded request"
    );

    // Configuration and template problems are reported to protoc through the
    // response, like per-file failures
    let response = generate(request).unwrap_or_else(|e| {
        tracing::error!(error = %e, "generation aborted");
        CodeGeneratorResponse {
            error: Some(e.to_string()),
            ..Default::default()
        }
    });

    // Write CodeGeneratorResponse to stdout
    let mut out = Vec::new();
    response.encode(&mut out)?;
    io::stdout().write_all(&out)?;

    Ok(())
}

fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    let options = PluginOptions::parse(request.parameter.as_deref())?.with_env_fallback();
    if options.templates.is_empty() {
        return Err(GeneratorError::InvalidConfig(format!(
            "no template given; pass --tmpl_opt=template=<path> or set {}",
            protoc_gen_tmpl::options::TEMPLATE_ENV
        )));
    }

    let template = Template::from_files(&options.templates)?;
    protoc_gen_tmpl::generate(request, template, &options)
}
