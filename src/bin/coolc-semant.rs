use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use coolc::parser::parse_files;
use coolc::semantic::{write_annotated, AnalysisOptions, SemanticAnalyzer};
use coolc::Interner;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Static semantic checker for COOL programs
#[derive(Parser, Debug)]
#[command(name = "coolc-semant", version)]
struct Cli {
    /// Source files making up one program
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print the program with the inferred type of every expression
    #[arg(long)]
    dump_types: bool,

    /// Skip checking attribute initializers against their declared types
    #[arg(long)]
    no_attr_init_check: bool,

    /// Class that must be defined
    #[arg(long, default_value = "Main")]
    entry_class: String,
}

fn main() -> ExitCode {
    // COOLC_LOG uses EnvFilter syntax, e.g. COOLC_LOG=coolc=debug
    if let Ok(filter) = EnvFilter::try_from_env("COOLC_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut interner = Interner::new();
    let program = parse_files(&cli.files, &mut interner)
        .context("Compilation halted due to lex and parse errors")?;

    let options = AnalysisOptions {
        entry_class: cli.entry_class.clone(),
        check_attribute_initializers: !cli.no_attr_init_check,
    };
    let analysis = SemanticAnalyzer::new(&program, &mut interner, options).analyze();

    if analysis.has_errors() {
        for diagnostic in &analysis.diagnostics {
            eprintln!("{diagnostic}");
        }
        eprintln!("Compilation halted due to static semantic errors.");
        return Ok(ExitCode::FAILURE);
    }

    if cli.dump_types {
        let mut out = String::new();
        write_annotated(&mut out, &program, &analysis.annotations, &interner)
            .context("failed to render annotated program")?;
        print!("{out}");
    }

    Ok(ExitCode::SUCCESS)
}
