//! HLSL front-end for hlslc.
//!
//! Consumes preprocessed HLSL source text (with embedded `#line`
//! directives) and produces a typed, scoped, lowered
//! [`hlslc_ir::Program`] with instruction indices and variable liveness
//! computed for the selected entry point.

mod ctx;
mod diag;
mod lexer;
mod parser;
mod token;

use hlslc_ir::{Program, ShaderType, SourceLoc, TargetProfile};

pub use diag::{DiagnosticSink, Level, Status};
pub use lexer::{IdentClass, LexerEnv};

/// Options for one compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Name of the shader's top-level function.
    pub entry_point: String,
    pub shader_type: ShaderType,
    pub major: u8,
    pub minor: u8,
}

impl CompileOptions {
    pub fn new(entry_point: impl Into<String>, shader_type: ShaderType, major: u8, minor: u8) -> Self {
        Self {
            entry_point: entry_point.into(),
            shader_type,
            major,
            minor,
        }
    }

    fn profile(&self) -> TargetProfile {
        TargetProfile {
            shader_type: self.shader_type,
            major: self.major,
            minor: self.minor,
        }
    }
}

/// The result of one compilation: the final status, the accumulated
/// diagnostic text, and, unless an error was recorded, the fully
/// built, indexed, liveness-annotated program.
#[derive(Debug)]
pub struct CompileOutput {
    pub status: Status,
    pub diagnostics: String,
    pub program: Option<Program>,
}

/// Compiles HLSL source text. `source_name` seeds the file-name pool
/// and is what diagnostics cite until a `#line` directive changes it.
pub fn compile(source: &str, source_name: &str, options: &CompileOptions) -> CompileOutput {
    let mut parser = parser::Parser::new(source, source_name, options.profile());
    parser.parse_program();
    let mut ctx = parser.finish();

    // Select the entry function: the overload carrying a body.
    let entry = ctx
        .program
        .function_table
        .get(&options.entry_point)
        .and_then(|overloads| {
            overloads
                .iter()
                .copied()
                .find(|&f| ctx.program.functions[f].has_body())
        });
    match entry {
        Some(function) => ctx.program.entry = Some(function),
        None => {
            let file = ctx.intern_file(source_name);
            let loc = SourceLoc::new(file, 1, 1);
            let message = format!("entry point '{}' not found", options.entry_point);
            ctx.error(loc, &message);
        }
    }

    if !ctx.sink.has_errors() {
        hlslc_analysis::index_program(&mut ctx.program);
        hlslc_analysis::compute_liveness(&mut ctx.program);
    }

    let (program, sink) = ctx.into_parts();
    let status = sink.status();
    CompileOutput {
        status,
        diagnostics: sink.into_buffer(),
        program: (status != Status::Error).then_some(program),
    }
}

/// Failure to recognize a shader profile string.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("unknown shader profile '{0}', expected e.g. ps_2_0 or vs_3_0")]
    Unrecognized(String),
}

/// Parses a target profile string such as `ps_2_0` or `vs_3_0`.
pub fn parse_profile(profile: &str) -> Result<TargetProfile, ProfileError> {
    let unrecognized = || ProfileError::Unrecognized(profile.to_string());
    let mut parts = profile.split('_');
    let shader_type = match parts.next() {
        Some("ps") => ShaderType::Pixel,
        Some("vs") => ShaderType::Vertex,
        _ => return Err(unrecognized()),
    };
    let major: u8 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(unrecognized)?;
    let minor: u8 = match parts.next() {
        Some("x") => 1,
        Some(s) => s.parse().map_err(|_| unrecognized())?,
        None => return Err(unrecognized()),
    };
    if parts.next().is_some() {
        return Err(unrecognized());
    }
    Ok(TargetProfile {
        shader_type,
        major,
        minor,
    })
}
