//! bridgegen CLI
//!
//! Usage:
//!   bridgegen generate [OPTIONS] <MODEL>
//!   bridgegen link [OPTIONS] <FILES>...
//!
//! `generate` reads a declaration model (TOML, `-` for stdin) and writes the
//! replacement source text; link records go to `--link-out`. `link` resolves
//! the link files of a whole program into registration statements.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use bridgegen::{link, Generator, GeneratorConfig, SourceFile};

#[derive(Parser)]
#[command(name = "bridgegen")]
#[command(about = "Generates scripting-host glue from annotated declarations")]
struct Cli {
    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate glue code for one source file model
    Generate {
        /// Declaration model (TOML), or `-` to read stdin
        model: PathBuf,

        /// Generator configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit documentation stubs instead of glue
        #[arg(long)]
        doc: bool,

        /// Output file for the replacement text (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for link records
        #[arg(long)]
        link_out: Option<PathBuf>,

        /// Original source file, used to show context in diagnostics
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Resolve link files into registration statements
    Link {
        /// Link files written by `generate --link-out`
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    // A second init only happens if a subscriber is already installed
    let _ = Registry::default().with(env_filter).with(fmt_layer).try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Generate {
            model,
            config,
            doc,
            output,
            link_out,
            source,
        } => run_generate(
            &model,
            config.as_deref(),
            doc,
            output.as_deref(),
            link_out.as_deref(),
            source.as_deref(),
        ),
        Command::Link { files, output } => run_link(&files, output.as_deref()),
    };

    if let Err(message) = result {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn run_generate(
    model: &Path,
    config: Option<&Path>,
    doc: bool,
    output: Option<&Path>,
    link_out: Option<&Path>,
    source: Option<&Path>,
) -> Result<(), String> {
    let config = match config {
        Some(path) => GeneratorConfig::from_file(path)
            .map_err(|e| format!("Error loading config '{}': {}", path.display(), e))?,
        None => GeneratorConfig::default(),
    };
    let config = if doc { config.with_doc_mode(true) } else { config };

    let model_text = read_input(model)?;
    let file = SourceFile::from_toml(&model_text)
        .map_err(|e| format!("Error reading model '{}': {}", model.display(), e))?;

    let generator = Generator::new(config).map_err(|e| format!("Error: {}", e))?;
    let sink = match generator.generate(&file) {
        Ok(sink) => sink,
        Err(e) => {
            let message = match source.map(fs::read_to_string) {
                Some(Ok(text)) => e.format(&text, &file.path),
                _ => format!("{}: {}", file.path, e),
            };
            return Err(message);
        }
    };

    write_output(output, &sink.inplace)?;
    match link_out {
        Some(path) => write_output(Some(path), &sink.link_text())?,
        None if !sink.link.is_empty() => {
            warn!(records = sink.link.len(), "link records discarded, pass --link-out to keep them");
        }
        None => {}
    }
    info!(path = %file.path, records = sink.link.len(), "generated");
    Ok(())
}

fn run_link(files: &[PathBuf], output: Option<&Path>) -> Result<(), String> {
    let texts = files
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let texts: Vec<&str> = texts.iter().map(String::as_str).collect();

    let out = link(&texts).map_err(|e| format!("Error: {}", e))?;
    info!(files = files.len(), statements = out.lines().count(), "linked");
    write_output(output, &out)
}

fn read_input(path: &Path) -> Result<String, String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Error reading from stdin: {}", e))?;
        return Ok(buffer);
    }
    fs::read_to_string(path).map_err(|e| format!("Error reading file '{}': {}", path.display(), e))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), String> {
    match path {
        Some(path) => fs::write(path, content)
            .map_err(|e| format!("Error writing file '{}': {}", path.display(), e)),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}
