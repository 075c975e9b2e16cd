//! CLI entry point for the tsgraph tool.
//!
//! Extracts the model graph of a TypeScript source file and prints it as
//! JSON, or keeps re-extracting while the file changes.
//!
//! # Usage
//!
//! ```bash
//! # Models of a file, or of stdin
//! tsgraph models schema.ts
//! cat schema.ts | tsgraph models -
//!
//! # Drawable nodes and edges
//! tsgraph graph schema.ts --compact
//!
//! # Re-extract on every save, of one file or of every source in a directory
//! tsgraph watch schema.ts
//! tsgraph watch ./schema
//!
//! # Bundled samples
//! tsgraph samples
//! tsgraph samples task-management | tsgraph models -
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::{Read, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use serde::Serialize;
use tg_core::{Config, ExtractConfig, FxHashMap, Model};
use tg_extract::{Graph, ModelDiff, ModelParser, samples};
use tg_watcher::{ChangeBatch, FileWatcher, SourceFilter};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Extracts model dependency graphs from TypeScript type declarations.
///
/// Interfaces, type aliases and classes become models; fields that name
/// other models become edges.
#[derive(Parser)]
#[command(name = "tsgraph", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "TSGRAPH_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// List members inherited from local supertypes in each schema.
    #[arg(long, global = true, env = "TSGRAPH_INHERITED_FIELDS")]
    inherited_fields: bool,

    /// Do not turn classes into models.
    #[arg(long, global = true, env = "TSGRAPH_NO_CLASSES")]
    no_classes: bool,

    /// Print JSON on a single line.
    #[arg(long, global = true)]
    compact: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the models of a file as JSON.
    Models {
        /// TypeScript file, or `-` for stdin.
        input: Utf8PathBuf,
    },

    /// Print the drawable nodes and edges of a file as JSON.
    Graph {
        /// TypeScript file, or `-` for stdin.
        input: Utf8PathBuf,
    },

    /// Re-extract whenever a file changes and log what changed.
    Watch {
        /// TypeScript file, or a directory whose sources are all watched.
        path: Utf8PathBuf,

        /// Also watch subdirectories when watching a directory.
        #[arg(short, long)]
        recursive: bool,

        /// Debounce window in milliseconds.
        #[arg(long, env = "TSGRAPH_DEBOUNCE_MS")]
        debounce_ms: Option<u64>,

        /// Also print the models as JSON after every change.
        #[arg(long)]
        print: bool,
    },

    /// List the bundled samples, or print one.
    Samples {
        /// Sample to print.
        name: Option<String>,
    },
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber, logging to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `--verbose` selects `debug`, the
/// default is `info`.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn,mio=warn"))
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Loads the configuration file, if any, and layers the flags on top.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .wrap_err_with(|| format!("Failed to load config {path}"))?,
        None => Config::default(),
    };

    if cli.inherited_fields {
        config.extract.inherited_fields = true;
    }
    if cli.no_classes {
        config.extract.include_classes = false;
    }
    if cli.compact {
        config.output.pretty = false;
    }
    if let Commands::Watch {
        debounce_ms,
        recursive,
        ..
    } = &cli.command
    {
        if let Some(ms) = debounce_ms {
            config.watch.debounce_ms = *ms;
        }
        if *recursive {
            config.watch.recursive = true;
        }
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Reads a file, or stdin for `-`.
fn read_input(input: &Utf8Path) -> color_eyre::Result<String> {
    if input.as_str() == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .wrap_err("Failed to read stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(input.as_std_path()).wrap_err_with(|| format!("Failed to read {input}"))
}

fn extract(source: &str, config: &Config) -> color_eyre::Result<Vec<Model>> {
    let parser = ModelParser::with_config(source, config.extract)?;
    if parser.parser().has_syntax_errors() {
        warn!("Source has syntax errors; affected declarations are skipped");
    }
    Ok(parser.get_models())
}

fn run_models(config: &Config, input: &Utf8Path) -> color_eyre::Result<()> {
    let models = extract(&read_input(input)?, config)?;
    info!(models = models.len(), "Extracted models");
    write_json(&models, config.output.pretty)
}

fn run_graph(config: &Config, input: &Utf8Path) -> color_eyre::Result<()> {
    let models = extract(&read_input(input)?, config)?;
    let graph = Graph::from_models(&models);
    info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "Built graph"
    );
    write_json(&graph, config.output.pretty)
}

/// Extraction state of one watched file.
struct Session {
    parser: ModelParser,
    models: Vec<Model>,
}

/// Extraction state of every watched file, keyed by canonical path.
#[derive(Default)]
struct Sessions {
    files: FxHashMap<Utf8PathBuf, Session>,
}

impl Sessions {
    /// Re-extracts `path` from `source`, or forgets it when `source` is
    /// `None`, and reports what changed.
    fn update(
        &mut self,
        path: &Utf8Path,
        source: Option<&str>,
        config: ExtractConfig,
    ) -> color_eyre::Result<ModelDiff> {
        let Some(source) = source else {
            let previous = self.files.remove(path).map(|s| s.models).unwrap_or_default();
            return Ok(ModelDiff::between(&previous, &[]));
        };

        if let Some(session) = self.files.get_mut(path) {
            session.parser.set_source(source);
            let current = session.parser.get_models();
            let diff = ModelDiff::between(&session.models, &current);
            session.models = current;
            return Ok(diff);
        }

        let parser = ModelParser::with_config(source, config)?;
        let models = parser.get_models();
        let diff = ModelDiff::between(&[], &models);
        self.files.insert(path.to_owned(), Session { parser, models });
        Ok(diff)
    }

    fn models(&self, path: &Utf8Path) -> &[Model] {
        self.files
            .get(path)
            .map(|s| s.models.as_slice())
            .unwrap_or_default()
    }
}

/// Re-extracts every file of a change batch.
fn apply_batch(
    sessions: &mut Sessions,
    batch: &ChangeBatch,
    config: &Config,
    print: bool,
) -> color_eyre::Result<()> {
    for path in batch {
        let source = match std::fs::read_to_string(path.as_std_path()) {
            Ok(source) => Some(source),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path, error = %err, "Skipping change");
                continue;
            }
        };
        let diff = sessions.update(path, source.as_deref(), config.extract)?;
        let models = sessions.models(path);
        info!(path = %path, models = models.len(), diff = %diff, "Re-extracted");
        if print && !diff.is_empty() {
            write_json(&models, config.output.pretty)?;
        }
    }
    Ok(())
}

/// Re-extracts on every debounced change batch until Ctrl-C.
///
/// A file is watched through its parent directory. A directory reports
/// every TypeScript source in it, and in its subdirectories when
/// `watch.recursive` is set; each file is extracted on its first change.
async fn run_watch(config: &Config, path: &Utf8Path, print: bool) -> color_eyre::Result<()> {
    let mut sessions = Sessions::default();

    let mut watcher = if path.is_dir() {
        let watcher = FileWatcher::new(path, &config.watch, SourceFilter)?;
        info!(path = %watcher.watch_path(), recursive = config.watch.recursive, "Watching directory");
        watcher
    } else {
        let file = path
            .canonicalize_utf8()
            .wrap_err_with(|| format!("Failed to resolve {path}"))?;
        let source = read_input(&file)?;
        let diff = sessions.update(&file, Some(source.as_str()), config.extract)?;
        let models = sessions.models(&file);
        info!(path = %file, models = models.len(), diff = %diff, "Initial extraction");
        if print {
            write_json(&models, config.output.pretty)?;
        }
        FileWatcher::watch_file(&file, &config.watch)?
    };

    loop {
        tokio::select! {
            batch = watcher.recv() => {
                let Some(batch) = batch else {
                    warn!("Watcher stopped");
                    break;
                };
                apply_batch(&mut sessions, &batch, config, print)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    watcher.shutdown().await?;
    Ok(())
}

fn run_samples(name: Option<&str>) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let Some(name) = name else {
        for sample in samples::ALL {
            writeln!(handle, "{:<18}{}", sample.name, sample.description)?;
        }
        return Ok(());
    };

    let sample = samples::find(name).ok_or_else(|| {
        let names: Vec<&str> = samples::ALL.iter().map(|s| s.name).collect();
        eyre!("Unknown sample {name:?}; available: {}", names.join(", "))
    })?;
    writeln!(handle, "{}", sample.source)?;
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn write_json<T: Serialize>(value: &T, pretty: bool) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut handle, value)?;
    } else {
        serde_json::to_writer(&mut handle, value)?;
    }
    writeln!(handle)?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Models { input } => run_models(&config, input),
        Commands::Graph { input } => run_graph(&config, input),
        Commands::Watch { path, print, .. } => run_watch(&config, path, *print).await,
        Commands::Samples { name } => run_samples(name.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tsgraph").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_layer_over_defaults() {
        let cli = parse(&["models", "-", "--compact", "--inherited-fields", "--no-classes"]);
        let config = build_config(&cli).expect("config");
        assert!(!config.output.pretty);
        assert!(config.extract.inherited_fields);
        assert!(!config.extract.include_classes);
    }

    #[test]
    fn test_watch_debounce_override() {
        let cli = parse(&["watch", "schema.ts", "--debounce-ms", "120"]);
        let config = build_config(&cli).expect("config");
        assert_eq!(config.watch.debounce_ms, 120);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_watch_recursive_flag() {
        let config = build_config(&parse(&["watch", "./schema"])).expect("config");
        assert!(!config.watch.recursive);

        let config = build_config(&parse(&["watch", "./schema", "--recursive"])).expect("config");
        assert!(config.watch.recursive);
    }

    #[test]
    fn test_sessions_track_each_file() {
        let mut sessions = Sessions::default();
        let config = ExtractConfig::default();
        let a = Utf8Path::new("/schema/a.ts");
        let b = Utf8Path::new("/schema/b.ts");

        let diff = sessions
            .update(a, Some("interface User { id: string }"), config)
            .expect("update");
        assert_eq!(diff.added, ["User"]);
        let diff = sessions.update(b, Some("type Tag = string;"), config).expect("update");
        assert_eq!(diff.added, ["Tag"]);

        let diff = sessions
            .update(a, Some("interface User { id: number } interface Team {}"), config)
            .expect("update");
        assert_eq!(diff.added, ["Team"]);
        assert_eq!(diff.changed, ["User"]);
        assert_eq!(sessions.models(b).len(), 1);

        let diff = sessions.update(a, None, config).expect("update");
        assert_eq!(diff.removed, ["User", "Team"]);
        assert!(sessions.models(a).is_empty());
    }

    #[test]
    fn test_apply_batch_reads_changed_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let present = dir.path().join("models.ts");
        std::fs::write(&present, "interface A { b: B } interface B {}").expect("write");
        let present = Utf8PathBuf::try_from(present).expect("utf-8 path");
        let gone = Utf8PathBuf::try_from(dir.path().join("gone.ts")).expect("utf-8 path");

        let mut sessions = Sessions::default();
        let batch: ChangeBatch = [present.clone(), gone.clone()].into_iter().collect();
        apply_batch(&mut sessions, &batch, &Config::default(), false).expect("apply");

        assert_eq!(sessions.models(&present).len(), 2);
        assert!(sessions.models(&gone).is_empty());
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tsgraph.json");
        std::fs::write(&path, r#"{ "extract": { "include_classes": false } }"#).expect("write");
        let path = path.to_str().expect("utf-8 path");

        let config = build_config(&parse(&["--config", path, "graph", "-"])).expect("config");
        assert!(!config.extract.include_classes);

        let missing = build_config(&parse(&["--config", "/nonexistent/tsgraph.json", "graph", "-"]));
        assert!(missing.is_err());
    }

    #[test]
    fn test_extract_and_graph() {
        let config = Config::default();
        let models = extract(samples::TASK_MANAGEMENT.source, &config).expect("extract");
        assert_eq!(models.len(), 4);
        assert!(!Graph::from_models(&models).edges.is_empty());
    }
}
