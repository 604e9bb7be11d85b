use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{Context, IntoDiagnostic};

use hlslc_parser::{compile, parse_profile, CompileOptions, Status};

/// hlslc — HLSL front-end: parse, type-check, and lower to IR
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input HLSL file (preprocessed source)
    input: PathBuf,

    /// Entry point function name
    #[arg(short, long, default_value = "main")]
    entry: String,

    /// Target profile: ps_2_0, ps_3_0, vs_2_0, ...
    #[arg(short, long, default_value = "ps_2_0")]
    profile: String,

    /// Dump the lowered IR to stdout
    #[arg(long)]
    dump_ir: bool,

    /// Run structural IR validation and report violations
    #[arg(long)]
    validate: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> miette::Result<ExitCode> {
    env_logger::try_init().ok();

    let cli = Cli::parse();

    let profile = parse_profile(&cli.profile).into_diagnostic()?;
    let source = std::fs::read_to_string(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;
    let source_name = cli.input.display().to_string();

    let options = CompileOptions::new(
        cli.entry.clone(),
        profile.shader_type,
        profile.major,
        profile.minor,
    );
    let output = compile(&source, &source_name, &options);
    eprint!("{}", output.diagnostics);

    if let Some(program) = &output.program {
        if cli.validate {
            let violations = hlslc_analysis::collect_violations(program);
            for violation in &violations {
                eprintln!("validation: {violation}");
            }
            if !violations.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        if cli.dump_ir {
            print!("{}", hlslc_ir::dump_program(program));
        }
    }

    Ok(match output.status {
        Status::Error => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
