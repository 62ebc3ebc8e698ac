mod pass_commands;
mod validate_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    marketsmith_marketplace::Workspace,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "marketsmith",
    version,
    about = "Generate plugin marketplace descriptors from one source of truth"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root; base for every relative path.
    #[arg(long, global = true, env = "MARKETSMITH_ROOT", default_value = ".")]
    root: PathBuf,

    /// Pipeline settings file (overrides discovery of marketsmith.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the flat descriptor from the source of truth.
    Sync {
        /// Source-of-truth file (overrides the configured candidates).
        #[arg(long)]
        variables: Option<PathBuf>,
        /// Print the descriptor instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Regroup the flat descriptor into component-based bundles.
    Reorganize {
        /// Print the descriptor instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Split the flat descriptor into one descriptor per component type.
    Split {
        /// Print the descriptors instead of writing them.
        #[arg(long)]
        dry_run: bool,
        /// Fail on source paths that cannot be made project-relative.
        #[arg(long)]
        strict_paths: bool,
    },
    /// Check descriptor files for schema problems.
    Validate {
        /// Files to check (default: every *.json in the marketplace directory).
        files: Vec<PathBuf>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), root = %cli.root.display(), "marketsmith starting");

    let workspace = Workspace::load(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Commands::Sync { variables, dry_run } => {
            pass_commands::handle_sync(&workspace, variables.as_deref(), dry_run)
        },
        Commands::Reorganize { dry_run } => pass_commands::handle_reorganize(&workspace, dry_run),
        Commands::Split {
            dry_run,
            strict_paths,
        } => pass_commands::handle_split(&workspace, dry_run, strict_paths),
        Commands::Validate { files } => validate_commands::handle_validate(&workspace, files),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "marketsmith",
            "split",
            "--strict-paths",
            "--root",
            "/work/framework",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/work/framework"));
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Split {
            dry_run: false,
            strict_paths: true
        }));
    }

    #[test]
    fn sync_accepts_variables_override() {
        let cli = Cli::try_parse_from([
            "marketsmith",
            "sync",
            "--variables",
            ".ai/VARIABLES.yaml",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Sync { variables, dry_run } = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(variables, Some(PathBuf::from(".ai/VARIABLES.yaml")));
        assert!(dry_run);
    }

    #[test]
    fn validate_takes_files() {
        let cli = Cli::try_parse_from(["marketsmith", "validate", "a.json", "b.json"]).unwrap();
        let Commands::Validate { files } = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn subcommand_required() {
        assert!(Cli::try_parse_from(["marketsmith"]).is_err());
        assert!(Cli::try_parse_from(["marketsmith", "reorganize", "--strict-paths"]).is_err());
    }
}
