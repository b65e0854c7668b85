//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pressroom: build a markdown blog and publish it
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Content directory path (relative to the source tree)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Config file name (default: pressroom.toml)
    #[arg(short = 'C', long, default_value = "pressroom.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared arguments for Build and Deploy
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Include documents marked `draft: true`
    #[arg(long)]
    pub drafts: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Override base URL for the site.
    ///
    /// Useful in CI where the production URL differs from local development,
    /// e.g. a GitHub Pages project site:
    ///   pressroom deploy --base-url "https://alice.github.io/notes"
    #[arg(long = "base-url")]
    pub base_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a site: config, sample post and publish workflow
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Parse every document and report front-matter errors
    Check,

    /// Check out and generate the site into the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Check out, generate and publish the site
    Deploy {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Force push to the publish branch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        force: Option<bool>,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }

    pub fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } | Commands::Deploy { build_args, .. } => Some(build_args),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy_with_force() {
        let cli = Cli::parse_from(["pressroom", "-r", "site", "deploy", "--force", "--drafts"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        match cli.command {
            Commands::Deploy { build_args, force } => {
                assert_eq!(force, Some(true));
                assert!(build_args.drafts);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_build_minify_false() {
        let cli = Cli::parse_from(["pressroom", "build", "--minify", "false"]);
        assert_eq!(cli.build_args().and_then(|a| a.minify), Some(false));
        assert_eq!(cli.config, PathBuf::from("pressroom.toml"));
    }

    #[test]
    fn test_parse_init_and_check() {
        let cli = Cli::parse_from(["pressroom", "init", "blog"]);
        assert!(cli.is_init());
        assert!(cli.build_args().is_none());

        let cli = Cli::parse_from(["pressroom", "check"]);
        assert!(matches!(cli.command, Commands::Check));
    }
}
