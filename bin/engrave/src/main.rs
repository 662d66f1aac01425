//! engrave CLI
//!
//! Builds the engrave.ren memorial site. Running `engrave` with no command
//! is the same as `engrave build`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for engrave.
#[derive(Parser)]
#[command(
    name = "engrave",
    version,
    about = "Builds the memorial site from per-person records"
)]
struct Cli {
    /// Path to configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = engrave_core::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Rebuild the whole site
    Build {
        /// Output directory, overriding build.output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Project root holding people/ and public/, overriding build.root
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Load every record and report problems without writing
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
        /// Project root, overriding build.root
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Build {
            output: None,
            root: None,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    engrave::init_tracing(cli.verbose);

    match cli.command.unwrap_or_default() {
        Commands::Build { output, root } => {
            engrave::cmd::build::run(&cli.config, output.as_deref(), root.as_deref())?;
        }
        Commands::Check { strict, root } => {
            engrave::cmd::check::run(&cli.config, root.as_deref(), strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_no_command_builds() {
        let cli = Cli::parse_from(["engrave"]);

        assert_eq!(cli.config, PathBuf::from("engrave.toml"));
        assert_eq!(cli.verbose, 0);
        assert!(cli.command.is_none());
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Commands::Build {
                output: None,
                root: None
            }
        ));
    }

    #[test]
    fn test_cli_build_command_parsing() {
        let cli = Cli::parse_from(["engrave", "build", "--output", "site", "--root", "memorial"]);

        match cli.command {
            Some(Commands::Build { output, root }) => {
                assert_eq!(output, Some(PathBuf::from("site")));
                assert_eq!(root, Some(PathBuf::from("memorial")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let cli = Cli::parse_from(["engrave", "check", "--strict"]);

        match cli.command {
            Some(Commands::Check { strict, root }) => {
                assert!(strict);
                assert!(root.is_none());
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["engrave", "-vvv"]);
        assert_eq!(cli.verbose, 3);

        let cli = Cli::parse_from(["engrave", "build", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let cli = Cli::parse_from(["engrave", "--config", "site.toml", "build"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["engrave", "serve"]).is_err());
    }
}
