//! reyna-driver - orchestrates the pipeline a `reyna` invocation runs:
//! read source, lex, parse, type-check, compile to bytecode, run on the
//! VM (§6 "CLI shape").
//!
//! There is no separate HIR/MIR/LIR lowering here: `reyna-compile` lowers
//! the checked AST straight into bytecode, so the driver's only job is
//! wiring the phases together and turning the `Handler`'s diagnostics
//! into process exit codes.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use reyna_check::Checker;
use reyna_lex::Lexer;
use reyna_parse::Parser as ReynaParser;
use reyna_util::{Handler, Interner};
use reyna_vm::{NativeRegistry, Vm, VmError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Run on `reyna-vm`'s stack interpreter (the only backend this
    /// implementation ships).
    Vm,
    /// A backend outside this implementation's scope; selecting it is a
    /// reported error rather than a silent fall-through to `vm`.
    Jit,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Vm
    }
}

/// `reyna [FILE] [--mode=vm|jit] [--check] [--base-dir DIR]` (§6).
#[derive(Parser, Debug)]
#[command(name = "reyna", about = "Run a Reyna program", long_about = None)]
pub struct Cli {
    /// Source file to run.
    pub file: PathBuf,

    /// Execution backend.
    #[arg(long, value_enum, default_value_t = Mode::Vm)]
    pub mode: Mode,

    /// Only lex/parse/type-check; don't run the program.
    #[arg(long)]
    pub check: bool,

    /// Directory `import` statements resolve relative paths against
    /// (defaults to the source file's own directory).
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
}

/// Exit codes (§7): `0` success, `1` a reported diagnostic (lex/parse/
/// check/compile error), `2` an uncaught runtime error, `3` a command
/// line or I/O error before any phase ran.
pub enum ExitCode {
    Success = 0,
    Diagnostics = 1,
    RuntimeError = 2,
    UsageError = 3,
}

/// Runs the pipeline, reporting any I/O/usage failure (§1.1's anyhow/
/// thiserror split at the binary boundary: `anyhow::Context` annotates
/// where a file or directory came from, `thiserror` types from the phase
/// crates carry the actual error data).
pub fn run(cli: &Cli) -> ExitCode {
    match try_run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::UsageError
        }
    }
}

fn try_run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("couldn't read '{}'", cli.file.display()))?;

    let base_dir = cli.base_dir.clone().unwrap_or_else(|| {
        cli.file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    });

    let handler = Handler::new();
    let mut interner = Interner::new();

    tracing::debug!(file = %cli.file.display(), "lexing");
    let tokens = Lexer::new(&source, &handler, &mut interner).tokenize();

    tracing::debug!(count = tokens.len(), "parsing");
    let program = ReynaParser::new(tokens, &handler, &interner).parse_program();

    tracing::debug!("type checking");
    let mut checker = Checker::new(&handler, &interner);
    checker.check_program(&program);

    if handler.has_errors() {
        report_diagnostics(&handler, &cli.file);
        return Ok(ExitCode::Diagnostics);
    }

    if cli.mode == Mode::Jit {
        eprintln!("error: {}", VmError::UnsupportedMode);
        return Ok(ExitCode::UsageError);
    }

    let proto = match reyna_compile::compile(&program, &handler, &mut interner, base_dir) {
        Some(proto) => proto,
        None => {
            report_diagnostics(&handler, &cli.file);
            return Ok(ExitCode::Diagnostics);
        }
    };

    if handler.has_errors() {
        report_diagnostics(&handler, &cli.file);
        return Ok(ExitCode::Diagnostics);
    }

    if cli.check {
        return Ok(ExitCode::Success);
    }

    tracing::debug!("running");
    let mut vm = Vm::new(&mut interner);
    if let Err(e) = NativeRegistry::install_default(&mut vm) {
        eprintln!("error: {e}");
        return Ok(ExitCode::RuntimeError);
    }
    match vm.interpret(proto) {
        Ok(()) => Ok(ExitCode::Success),
        Err(e) => {
            eprintln!("runtime error: {e}");
            Ok(ExitCode::RuntimeError)
        }
    }
}

fn report_diagnostics(handler: &Handler, file: &Path) {
    for diag in handler.diagnostics() {
        eprintln!("{}: {} - {}", file.display(), diag.level, diag.message);
    }
}
