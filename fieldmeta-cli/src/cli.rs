//! CLI definition for the fieldmeta command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// fieldmeta - field definition metadata tooling
///
/// Inspects the field-type catalogue, decodes stored definitions into their
/// typed view, and checks definitions against reference data.
#[derive(Parser, Debug)]
#[command(name = "fieldmeta")]
#[command(version)]
#[command(about = "Inspect, decode and check field definitions")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every known field type
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a stored definition and print its typed view
    Decode {
        /// Definition file (JSON, or YAML by extension)
        file: PathBuf,
        /// Print YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
    /// Resolve a definition's references against fixture data and print the
    /// normalized definition
    Check {
        /// Definition file (JSON, or YAML by extension)
        file: PathBuf,
        /// Reference fixture (JSON)
        #[arg(short, long, value_name = "PATH")]
        references: PathBuf,
        /// Print YAML instead of JSON
        #[arg(long)]
        yaml: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_types() {
        let cli = Cli::parse_from(["fieldmeta", "types"]);
        assert!(!cli.debug);
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Commands::Types { json: false }));
    }

    #[test]
    fn test_cli_parsing_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["fieldmeta", "types", "--json", "--debug", "-c", "fm.toml"]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("fm.toml")));
        assert!(matches!(cli.command, Commands::Types { json: true }));
    }

    #[test]
    fn test_cli_parsing_decode() {
        let cli = Cli::parse_from(["fieldmeta", "decode", "def.json", "--yaml"]);
        match cli.command {
            Commands::Decode { file, yaml } => {
                assert_eq!(file, PathBuf::from("def.json"));
                assert!(yaml);
            }
            _ => panic!("Expected Decode command"),
        }
    }

    #[test]
    fn test_cli_parsing_check_requires_references() {
        assert!(Cli::try_parse_from(["fieldmeta", "check", "def.json"]).is_err());
        let cli = Cli::parse_from(["fieldmeta", "check", "def.json", "-r", "refs.json"]);
        match cli.command {
            Commands::Check {
                references, yaml, ..
            } => {
                assert_eq!(references, PathBuf::from("refs.json"));
                assert!(!yaml);
            }
            _ => panic!("Expected Check command"),
        }
    }
}
