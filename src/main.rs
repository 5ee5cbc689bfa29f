use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter (e.g. `RELPM_LOG=debug`)
const LOG_ENV: &str = "RELPM_LOG";

/// relpm - A minimal package manager for prebuilt release executables
#[derive(Parser)]
#[command(name = "relpm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the latest release of a package
    Install {
        /// Package name (e.g., c-utils)
        package: String,
    },

    /// Uninstall a package and remove its executables from bin
    Uninstall {
        /// Package name
        package: String,
    },

    /// Upgrade an installed package to its latest release
    Upgrade {
        /// Package name
        package: String,
    },

    /// List installed packages
    List,

    /// Show the registry record of an installed package
    Info {
        /// Package name
        package: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install { package } => commands::install::run(package),
        Commands::Uninstall { package } => commands::uninstall::run(package),
        Commands::Upgrade { package } => commands::upgrade::run(package),
        Commands::List => commands::list::run(),
        Commands::Info { package } => commands::info::run(package),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "relpm", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
