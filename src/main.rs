use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use similar::TextDiff;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use yamlrewrite::config::{Config, RecipeFile};
use yamlrewrite::document::node::Documents;
use yamlrewrite::document::printer::print_yaml;
use yamlrewrite::file::loader::{load_yaml_file, load_yaml_from_stdin};
use yamlrewrite::file::saver::{save_yaml_file, validate_output};
use yamlrewrite::recipe::{self, ChangeValue, Recipe};

/// yamlrewrite - Format-preserving, path-addressed rewrites of YAML files
#[derive(Parser)]
#[command(name = "yamlrewrite")]
#[command(version)]
#[command(about = "Format-preserving, path-addressed rewrites of YAML files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v debug, -vv trace); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Change the value of every mapping entry selected by a path expression
    ChangeValue {
        /// Path expression selecting the entries, e.g. subjects/kind
        #[arg(long, visible_alias = "old-key-path")]
        key_path: String,

        /// New plain scalar value
        #[arg(long)]
        value: String,

        #[command(flatten)]
        output: OutputArgs,

        /// YAML files to rewrite (omit to read stdin and write stdout)
        files: Vec<PathBuf>,
    },

    /// Run the recipes listed in a TOML recipe file, in order
    Run {
        /// Recipe file with [[recipe]] tables
        #[arg(short, long)]
        recipes: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        /// YAML files to rewrite (omit to read stdin and write stdout)
        files: Vec<PathBuf>,
    },

    /// List the available recipes and their options
    List,
}

#[derive(Args)]
struct OutputArgs {
    /// Overwrite changed files instead of printing them
    #[arg(short, long)]
    in_place: bool,

    /// Print a unified diff of the changes
    #[arg(short, long)]
    diff: bool,

    /// Keep a .bak copy of every overwritten file
    #[arg(long)]
    backup: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load();
    init_logging(cli.verbose, &config.log_level);

    match cli.command {
        Command::ChangeValue {
            key_path,
            value,
            output,
            files,
        } => {
            let recipes: Vec<Box<dyn Recipe>> = vec![Box::new(ChangeValue::new(key_path, value)?)];
            config.create_backup |= output.backup;
            apply(&recipes, &files, &output, &config)
        }
        Command::Run {
            recipes,
            output,
            files,
        } => {
            let recipe_file = RecipeFile::load(&recipes)?;
            let recipes = recipe_file
                .build()
                .with_context(|| format!("Invalid recipe in {}", recipes.display()))?;
            config.create_backup |= output.backup;
            apply(&recipes, &files, &output, &config)
        }
        Command::List => list_recipes(),
    }
}

/// Logs to stderr so stdout stays clean for YAML output.
fn init_logging(verbose: u8, default_level: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        1 => EnvFilter::new("yamlrewrite=debug"),
        _ => EnvFilter::new("yamlrewrite=trace"),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn apply(
    recipes: &[Box<dyn Recipe>],
    files: &[PathBuf],
    output: &OutputArgs,
    config: &Config,
) -> Result<()> {
    if files.is_empty() {
        if output.in_place {
            anyhow::bail!("--in-place needs at least one file");
        }
        let documents = load_yaml_from_stdin(config)?;
        let result = recipe::run_all(recipes, &documents);
        return emit(Path::new("<stdin>"), &documents, &result, output, config);
    }

    let mut changed = 0;
    for path in files {
        let documents = load_yaml_file(path, config)?;
        let result = recipe::run_all(recipes, &documents);

        if Arc::ptr_eq(&result, &documents) {
            debug!(path = %path.display(), "no changes");
        } else {
            changed += 1;
            if output.in_place {
                save_yaml_file(path, &result, config)
                    .with_context(|| format!("Failed to save {}", path.display()))?;
            }
        }
        if !output.in_place || output.diff {
            emit(path, &documents, &result, output, config)?;
        }
    }

    info!(files = files.len(), changed, "done");
    Ok(())
}

/// Writes the rewritten stream, or a diff against the input, to stdout.
fn emit(
    path: &Path,
    before: &Documents,
    after: &Documents,
    output: &OutputArgs,
    config: &Config,
) -> Result<()> {
    let after_text = print_yaml(after);
    let mut stdout = io::stdout().lock();

    if output.diff {
        let before_text = print_yaml(before);
        let diff = TextDiff::from_lines(&before_text, &after_text);
        let old_header = format!("a/{}", path.display());
        let new_header = format!("b/{}", path.display());
        write!(
            stdout,
            "{}",
            diff.unified_diff().header(&old_header, &new_header)
        )?;
    } else {
        if config.validate_output {
            validate_output(&after_text)?;
        }
        stdout.write_all(after_text.as_bytes())?;
    }

    stdout.flush()?;
    Ok(())
}

fn list_recipes() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for descriptor in recipe::descriptors().values() {
        writeln!(stdout, "{} ({})", descriptor.name, descriptor.display_name)?;
        writeln!(stdout, "    {}", descriptor.description)?;
        for option in &descriptor.options {
            writeln!(
                stdout,
                "    {:<12} {} (example: {})",
                option.name, option.description, option.example
            )?;
        }
    }
    Ok(())
}
