//! `hscss`: compile a stylesheet to CSS, optionally recompiling on change.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use horizon_scss::hot_reload::SourceWatcher;
use horizon_scss::loader::FileLoader;
use horizon_scss::{Compiler, CompilerConfig};
use tracing_subscriber::prelude::*;

/// How often watch mode checks for changed sources.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What to do with calls to functions that are neither builtin nor CSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnknownFunctionMode {
    /// Keep the call silently.
    Keep,
    /// Keep the call and warn.
    Warn,
    /// Replace the call with its arguments.
    Drop,
    /// Fail the compile.
    Error,
}

#[derive(Parser, Debug)]
#[command(name = "hscss")]
#[command(about = "Compile SCSS-like stylesheets to CSS")]
#[command(version)]
struct Args {
    /// Entry stylesheet. Imports are resolved relative to its directory.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write CSS here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Marker selector of debug-only rules
    #[arg(long = "debug-selector", value_name = "SELECTOR")]
    debug_selector: Option<String>,

    /// Keep debug rules, removing only the marker
    #[arg(long = "keep-debug-style")]
    keep_debug_style: bool,

    /// Emit comments naming sources, imports and included mixins
    #[arg(long = "debug-comments")]
    debug_comments: bool,

    /// Policy for unknown function calls
    #[arg(long = "unknown-functions", value_enum, default_value_t = UnknownFunctionMode::Warn)]
    unknown_functions: UnknownFunctionMode,

    /// Warn about unused variables and rarely used mixins
    #[arg(long = "diagnostics")]
    diagnostics: bool,

    /// Recompile whenever the input or one of its imports changes
    #[arg(long = "watch")]
    watch: bool,

    /// Verbose output (-v for compiler messages, -vv for everything)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> CompilerConfig {
        let mut config = CompilerConfig::new()
            .keep_debug_style(self.keep_debug_style)
            .debug_comments(self.debug_comments);
        if let Some(selector) = &self.debug_selector {
            config = config.debug_selector(selector.clone());
        }

        let (error, warn, keep) = match self.unknown_functions {
            UnknownFunctionMode::Keep => (false, false, true),
            UnknownFunctionMode::Warn => (false, true, true),
            UnknownFunctionMode::Drop => (false, false, false),
            UnknownFunctionMode::Error => (true, false, true),
        };
        config
            .unknown_function_error(error)
            .unknown_function_warning(warn)
            .keep_unknown_function(keep)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = match args.verbose {
        0 => "warn",
        1 => "horizon_scss=debug,hscss=info,warn",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", args.input);
    }

    let root = args
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let mut compiler = Compiler::new(args.config()).with_loader(FileLoader::new(root));

    if args.watch {
        return watch(&args, &mut compiler);
    }

    compiler
        .process_file(&args.input)
        .with_context(|| format!("Failed to compile {:?}", args.input))?;
    if args.diagnostics {
        compiler.run_diagnostics();
    }
    write_output(args.output.as_deref(), &compiler.render())?;

    let errors = compiler.logger().errors();
    if !errors.is_empty() {
        anyhow::bail!("{} error(s) reported while compiling", errors.len());
    }
    Ok(())
}

fn watch(args: &Args, compiler: &mut Compiler) -> Result<()> {
    let mut watcher = SourceWatcher::new().context("Failed to start file watcher")?;
    rebuild(args, compiler, &mut watcher);
    tracing::info!("Watching {:?} for changes", args.input);

    loop {
        std::thread::sleep(POLL_INTERVAL);

        let changes = watcher.poll();
        if changes.is_empty() {
            continue;
        }
        for change in &changes {
            tracing::info!("Changed ({:?}): {}", change.kind, change.path.display());
        }
        rebuild(args, compiler, &mut watcher);
    }
}

/// Recompile in watch mode. Failures are reported and watching continues.
fn rebuild(args: &Args, compiler: &mut Compiler, watcher: &mut SourceWatcher) {
    let css = match watcher.rebuild(compiler, &args.input) {
        Ok(css) => css,
        Err(e) => {
            tracing::debug!("Rebuild failed: {}", e);
            return;
        }
    };

    if args.diagnostics {
        compiler.run_diagnostics();
    }
    if let Err(e) = write_output(args.output.as_deref(), &css) {
        tracing::error!("{:#}", e);
    }
}

fn write_output(output: Option<&Path>, css: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, css).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(css.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("hscss").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&["app.scss"]);
        let config = args.config();
        assert_eq!(args.input, PathBuf::from("app.scss"));
        assert!(args.output.is_none());
        assert_eq!(config.debug_selector, "#debug");
        assert!(config.keep_unknown_function);
        assert!(config.unknown_function_warning);
        assert!(!config.unknown_function_error);
    }

    #[test]
    fn flags_map_onto_config() {
        let args = parse(&[
            "app.scss",
            "-o",
            "out.css",
            "--debug-selector",
            ".dbg",
            "--keep-debug-style",
            "--debug-comments",
            "--unknown-functions",
            "drop",
            "-vv",
        ]);
        let config = args.config();
        assert_eq!(args.output, Some(PathBuf::from("out.css")));
        assert_eq!(args.verbose, 2);
        assert_eq!(config.debug_selector, ".dbg");
        assert!(config.keep_debug_style);
        assert!(config.debug_comments);
        assert!(!config.keep_unknown_function);
        assert!(!config.unknown_function_warning);
    }

    #[test]
    fn error_mode_is_fatal() {
        let config = parse(&["a.scss", "--unknown-functions", "error"]).config();
        assert!(config.unknown_function_error);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(
            Args::try_parse_from(["hscss", "a.scss", "--unknown-functions", "maybe"]).is_err()
        );
    }
}
