use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "phishguard")]
#[command(author, version, about = "Lexical URL phishing detector")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the prediction server
    Serve(ServeArgs),

    /// Print the feature vector of a URL as JSON
    Extract {
        /// URL to encode
        url: String,
    },

    /// Select a decision threshold from labelled validation data
    Calibrate(CalibrateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Configuration file path [default: phishguard.yaml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model bundle path (overrides the config file)
    #[arg(short, long, env = "PHISHGUARD_MODEL")]
    pub model: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CalibrateArgs {
    /// Model bundle to calibrate
    #[arg(short, long)]
    pub bundle: PathBuf,

    /// JSON Lines file of {"url"|"probability", "phishing"} records
    #[arg(long)]
    pub validation: PathBuf,

    /// Where to write the calibrated bundle (defaults to --bundle)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report the selection without writing the bundle
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "phishguard",
            "serve",
            "--model",
            "model/custom.json",
            "-P",
            "9000",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.model, Some(PathBuf::from("model/custom.json")));
                assert_eq!(args.port, Some(9000));
                assert!(args.config.is_none());
                assert!(args.listen.is_none());
            }
            other => panic!("Expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_calibrate() {
        let cli = Cli::try_parse_from([
            "phishguard",
            "calibrate",
            "--bundle",
            "model.json",
            "--validation",
            "val.jsonl",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Calibrate(args) => {
                assert!(args.dry_run);
                assert!(args.output.is_none());
            }
            other => panic!("Expected calibrate, got {:?}", other),
        }
    }
}
