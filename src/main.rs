use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use avm2_ast_normalizer::config::PassConfig;
use avm2_ast_normalizer::ir::pipeline::Pipeline;
use avm2_ast_normalizer::ir::ast::Ast;
use avm2_ast_normalizer::ir::printer::{to_json_string, to_sexpr_pretty};
use avm2_ast_normalizer::ir::sexpr::{parse, parse_file};
use avm2_ast_normalizer::ir::transforms::canonical_check::CanonicalCheck;
use avm2_ast_normalizer::logging::init_logger;

#[derive(Parser)]
#[command(name = "avm2-normalize", about = "Normalize decompiled AVM2 expression trees")]
struct Cli {
    /// S-expression tree to normalize. Reads stdin when omitted.
    input: Option<PathBuf>,
    /// Print the result as JSON instead of an S-expression.
    #[arg(long)]
    json: bool,
    /// Passes to skip ("ast-normalize", "canonical-check").
    #[arg(long = "skip-pass")]
    skip_passes: Vec<String>,
    /// Log level for stderr (otherwise RUST_LOG, then "info").
    #[arg(long)]
    log_level: Option<String>,
    /// Disable ANSI colors in log output.
    #[arg(long)]
    no_color: bool,
    /// Also write a debug-level session log to the user cache directory.
    #[arg(long)]
    log_file: bool,
    /// Exit with status 1 if non-canonical nodes remain. Runs the
    /// canonical check even when it is listed in the skipped passes.
    #[arg(long)]
    check: bool,
}

fn read_input(input: Option<&PathBuf>) -> Result<Ast> {
    match input {
        Some(path) => parse_file(path).with_context(|| format!("failed to read tree from {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            parse(&buf).context("failed to parse input tree")
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let ast = read_input(cli.input.as_ref())?;
    debug!("parsed tree with {} nodes", ast.len());

    let mut config = PassConfig::from_env_or_default(&cli.skip_passes);
    if cli.check {
        config = config.require_canonical_check();
    }
    let check = Arc::new(Mutex::new(CanonicalCheck::new()));
    let pipeline = Pipeline::from_config(&config, check.clone()).context("failed to build pipeline")?;
    let (ast, ()) = pipeline.apply(ast, ()).context("pipeline failed")?;

    if cli.json {
        println!("{}", to_json_string(&ast, ast.root())?);
    } else {
        println!("{}", to_sexpr_pretty(&ast, ast.root()));
    }

    let check = check.lock().unwrap_or_else(PoisonError::into_inner);
    if config.canonical_check && !check.is_canonical() {
        info!("{} non-canonical nodes remain", check.remaining().len());
        return Ok(!cli.check);
    }
    Ok(true)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logger(cli.no_color, cli.log_level.as_deref(), cli.log_file)
        .context("failed to initialize logging")?;

    if run(&cli)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
