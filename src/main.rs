//! ghoul compiler CLI

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ghoul::{
    config::{Config, LIB_MARKER},
    errors::errors::Error,
    frontend::{FileSystemProvider, Frontend},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ghoul")]
#[command(author, version, about = "ghoul compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a module and everything it imports
    Build {
        /// Main module, e.g. `main.gh`
        path: PathBuf,

        /// Print tokens, the AST, the symbol table and the IR
        #[arg(short, long)]
        verbose: bool,

        #[arg(long)]
        verbose_ast: bool,

        #[arg(long)]
        verbose_symtable: bool,

        #[arg(long)]
        verbose_ir: bool,

        /// Executable to produce
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the directory holding `lib/`
        #[arg(long, default_value = LIB_MARKER)]
        lib_marker: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            path,
            verbose,
            verbose_ast,
            verbose_symtable,
            verbose_ir,
            output,
            lib_marker,
        } => {
            let config = Config {
                verbose,
                verbose_ast,
                verbose_symtable,
                verbose_ir,
                output,
                lib_marker,
                ..Default::default()
            };
            init_logging(&config);
            build(&path, config)
        }
    }
}

fn init_logging(config: &Config) {
    let default = if config.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn build(path: &Path, config: Config) -> Result<ExitCode> {
    if !path.is_file() {
        bail!("Failed to read file: {}", path.display());
    }

    let module = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("Invalid module name: {}", path.display()))?
        .to_string();
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let provider = FileSystemProvider::new(&root, &config);
    let mut frontend = Frontend::new(config.clone(), Box::new(provider));

    let compilation = match frontend.compile(&module) {
        Ok(compilation) => compilation,
        Err(errors) => {
            for error in &errors {
                display_error(error, &root);
            }
            return Ok(ExitCode::from(1));
        }
    };

    emit(&compilation, &config, &module)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "llvm"))]
fn emit(_compilation: &ghoul::frontend::Compilation, _config: &Config, module: &str) -> Result<()> {
    tracing::warn!(module, "built without the `llvm` feature, no code generated");
    Ok(())
}

#[cfg(feature = "llvm")]
fn emit(compilation: &ghoul::frontend::Compilation, config: &Config, module: &str) -> Result<()> {
    use std::{process::Command, time::Instant};

    use ghoul::compiler::compiler::compile;
    use inkwell::context::Context as LlvmContext;

    let start = Instant::now();
    let context = LlvmContext::create();
    let llvm_module = compile(
        &context,
        &compilation.toplevel,
        &compilation.symtable,
        module,
    )
    .with_context(|| format!("Code generation failed for {}", module))?;
    tracing::info!(module, elapsed = ?start.elapsed(), "IR generated");

    if config.show_ir() {
        println!("{}", llvm_module.print_to_string().to_string());
    }

    let build_dir = PathBuf::from("build");
    fs::create_dir_all(&build_dir).context("Failed to create build directory")?;

    let ir_file = build_dir.join(format!("{}.ll", module));
    let object_file = build_dir.join(format!("{}.o", module));
    let executable = config
        .output
        .clone()
        .unwrap_or_else(|| build_dir.join(module));

    llvm_module
        .print_to_file(&ir_file)
        .map_err(|error| anyhow::anyhow!(error.to_string()))
        .with_context(|| format!("Failed to write {}", ir_file.display()))?;

    let llc = Command::new("llc")
        .args(["-filetype=obj", "-relocation-model=pic"])
        .arg(&ir_file)
        .arg("-o")
        .arg(&object_file)
        .output()
        .context("Failed to run llc")?;
    if !llc.status.success() {
        bail!(
            "Failed to compile using llc:\n{}",
            String::from_utf8_lossy(&llc.stderr)
        );
    }

    let links: Vec<String> = compilation
        .toplevel
        .links()
        .map(|link| format!("-l{}", link.library))
        .collect();
    let clang = Command::new("clang")
        .args(["-fPIE", "-pie", "-o"])
        .arg(&executable)
        .arg(&object_file)
        .args(&links)
        .output()
        .context("Failed to run clang")?;
    if !clang.status.success() {
        bail!(
            "Failed to link using clang:\n{}",
            String::from_utf8_lossy(&clang.stderr)
        );
    }

    tracing::info!(executable = %executable.display(), elapsed = ?start.elapsed(), "linked");
    Ok(())
}

/// Prints a diagnostic followed by the offending source line.
///
/// ```text
/// main.gh:2:10
/// Unrecognized token '$'
///   |
/// 2 | int a = $
///   |         ^
/// ```
fn display_error(error: &Error, root: &Path) {
    eprintln!("{}", error);

    let position = error.get_position();
    let Some(line) = source_line(&root.join(position.file.as_str()), position.row) else {
        return;
    };

    let number = position.row.to_string();
    let padding = number.len() + 2;
    let trimmed = line.trim_start();
    let removed = line.len() - trimmed.len();
    let arrows = (position.col as usize).saturating_sub(removed).max(1);

    eprintln!("{:>padding$}", "|");
    eprintln!("{} | {}", number, trimmed.trim_end());
    eprintln!("{:>padding$} {:>arrows$}", "|", "^");
}

fn source_line(file: &Path, row: u32) -> Option<String> {
    let text = fs::read_to_string(file).ok()?;
    let index = (row as usize).checked_sub(1)?;
    text.lines().nth(index).map(String::from)
}
