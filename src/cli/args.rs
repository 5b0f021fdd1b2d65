//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Fryer - package build contexts from remote sources
///
/// Fetches and verifies a recipe's source archive, then streams it together
/// with a generated Dockerfile and build script into a container engine.
#[derive(Parser, Debug)]
#[command(name = "fryer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FRYER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and verify a source into the cache
    Fetch(FetchArgs),

    /// Write a build context tar stream
    Context(ContextArgs),

    /// Build an image from a recipe
    Cook(CookArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Where the source comes from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Recipe file
    #[arg(short, long, default_value = "recipe.toml")]
    pub recipe: PathBuf,

    /// Root of the source cache (overrides config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Fetch this URL instead of the recipe's source
    #[arg(long, conflicts_with = "recipe")]
    pub url: Option<String>,

    /// Expected checksum for --url ("sha256:<hex>", "sha1:<hex>" or bare hex)
    #[arg(long, requires = "url")]
    pub checksum: Option<String>,

    /// Archive extension for --url when the file name has none
    #[arg(long, requires = "url")]
    pub extension: Option<String>,
}

/// Image and package-manager settings for rendering
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Base image of the build
    #[arg(short, long)]
    pub image: String,

    /// Package-manager flavour: debian or redhat
    #[arg(long)]
    pub flavour: Option<String>,

    /// Distribution name; implies a flavour when --flavour is absent
    #[arg(long)]
    pub distribution: Option<String>,
}

/// Arguments for the context command
#[derive(Parser, Debug)]
pub struct ContextArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Output file ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,
}

/// Arguments for the cook command
#[derive(Parser, Debug)]
pub struct CookArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub render: RenderArgs,

    /// Tag for the built image
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Engine CLI to build with (overrides config)
    #[arg(long)]
    pub engine: Option<String>,

    /// Keep intermediate containers
    #[arg(long)]
    pub keep_intermediate: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_context() {
        let cli = Cli::parse_from([
            "fryer", "context", "--image", "debian:12", "--flavour", "debian", "-o", "ctx.tar",
        ]);
        match cli.command {
            Commands::Context(args) => {
                assert_eq!(args.render.image, "debian:12");
                assert_eq!(args.render.flavour.as_deref(), Some("debian"));
                assert_eq!(args.output, PathBuf::from("ctx.tar"));
                assert_eq!(args.source.recipe, PathBuf::from("recipe.toml"));
            }
            _ => panic!("expected Context command"),
        }
    }

    #[test]
    fn cli_context_defaults_to_stdout() {
        let cli = Cli::parse_from(["fryer", "context", "-i", "busybox"]);
        match cli.command {
            Commands::Context(args) => assert_eq!(args.output, PathBuf::from("-")),
            _ => panic!("expected Context command"),
        }
    }

    #[test]
    fn cli_parses_fetch_url() {
        let cli = Cli::parse_from([
            "fryer",
            "fetch",
            "--url",
            "http://example.com/a.tgz",
            "--checksum",
            "sha1:abc",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.url.as_deref(), Some("http://example.com/a.tgz"));
                assert_eq!(args.checksum.as_deref(), Some("sha1:abc"));
            }
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_checksum_requires_url() {
        assert!(Cli::try_parse_from(["fryer", "fetch", "--checksum", "abc"]).is_err());
    }

    #[test]
    fn cli_parses_cook() {
        let cli = Cli::parse_from([
            "fryer", "-vv", "cook", "-i", "centos:7", "--distribution", "centos", "-t", "foo:1",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Cook(args) => {
                assert_eq!(args.tag.as_deref(), Some("foo:1"));
                assert_eq!(args.render.distribution.as_deref(), Some("centos"));
                assert!(!args.keep_intermediate);
            }
            _ => panic!("expected Cook command"),
        }
    }

    #[test]
    fn cli_requires_image_for_cook() {
        assert!(Cli::try_parse_from(["fryer", "cook"]).is_err());
    }

    #[test]
    fn cli_parses_config_path() {
        let cli = Cli::parse_from(["fryer", "config", "path"]);
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.action, Some(ConfigAction::Path))),
            _ => panic!("expected Config command"),
        }
    }
}
