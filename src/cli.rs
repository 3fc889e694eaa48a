//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use stream_relay::{TransferParams, UploadMethod};

/// Relay a file from one HTTP endpoint to another without buffering it.
///
/// The source is fetched with GET and its body is streamed directly into a
/// POST or PUT to the destination. Results are printed as JSON on stdout;
/// logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "stream-relay")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (defaults to $XDG_CONFIG_HOME/stream-relay/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Connect timeout in seconds (1-3600)
    #[arg(
        long,
        value_name = "SECS",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub connect_timeout: Option<u64>,

    /// Maximum idle time between reads in seconds (1-3600)
    #[arg(
        long,
        value_name = "SECS",
        global = true,
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub read_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Relay a single file
    Transfer(TransferArgs),
    /// Relay every item of a JSON array (from FILE or stdin), in order
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Source URL (fetched with GET)
    #[arg(long)]
    pub download_url: String,

    /// Destination URL; a `bearer` query parameter is mirrored into Authorization
    #[arg(long)]
    pub upload_url: String,

    /// Upload Content-Length override (default: taken from the download)
    #[arg(long)]
    pub content_length: Option<u64>,

    /// Upload method: post or put
    #[arg(short = 'X', long)]
    pub method: Option<UploadMethod>,

    /// Extra download headers as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub download_headers: String,

    /// Extra upload headers as a JSON object
    #[arg(long, value_name = "JSON", default_value = "{}")]
    pub upload_headers: String,

    /// Report transfer failures in the result instead of exiting non-zero
    #[arg(long)]
    pub no_throw_on_error: bool,
}

impl TransferArgs {
    /// Converts flags into the same record shape a batch item uses.
    pub fn into_params(self) -> TransferParams {
        TransferParams {
            download_url: self.download_url,
            upload_url: self.upload_url,
            content_length: self.content_length.map(Value::from),
            method: self.method.map(|method| method.to_string()),
            download_headers: Value::String(self.download_headers),
            upload_headers: Value::String(self.upload_headers),
            throw_on_error: self.no_throw_on_error.then_some(false),
        }
    }
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file with an array of transfer items (reads stdin when omitted)
    pub input: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(args: &[&str]) -> TransferArgs {
        let mut argv = vec!["stream-relay", "transfer"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Transfer(args) => args,
            other => panic!("expected transfer, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_transfer_minimal_args() {
        let args = transfer(&["--download-url", "https://a/x", "--upload-url", "https://b/y"]);
        assert_eq!(args.method, None);
        assert_eq!(args.download_headers, "{}");
        assert!(!args.no_throw_on_error);

        let params = args.into_params();
        assert_eq!(params.download_url, "https://a/x");
        assert_eq!(params.throw_on_error, None);
        assert_eq!(params.content_length, None);
    }

    #[test]
    fn test_cli_transfer_all_args() {
        let args = transfer(&[
            "--download-url",
            "https://a/x",
            "--upload-url",
            "https://b/y",
            "--content-length",
            "77",
            "-X",
            "put",
            "--upload-headers",
            r#"{"X-K":"v"}"#,
            "--no-throw-on-error",
        ]);
        assert_eq!(args.method, Some(UploadMethod::Put));

        let params = args.into_params();
        assert_eq!(params.method.as_deref(), Some("PUT"));
        assert_eq!(params.content_length, Some(Value::from(77u64)));
        assert_eq!(params.upload_headers, Value::String(r#"{"X-K":"v"}"#.to_string()));
        assert_eq!(params.throw_on_error, Some(false));
    }

    #[test]
    fn test_cli_transfer_rejects_unknown_method() {
        let result = Cli::try_parse_from([
            "stream-relay",
            "transfer",
            "--download-url",
            "https://a/x",
            "--upload-url",
            "https://b/y",
            "--method",
            "delete",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_transfer_requires_urls() {
        let err = Cli::try_parse_from(["stream-relay", "transfer"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stream-relay",
            "batch",
            "items.json",
            "-vv",
            "--read-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.read_timeout, Some(60));
        match cli.command {
            Command::Batch(args) => assert_eq!(args.input, Some(PathBuf::from("items.json"))),
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_timeout_range_enforced() {
        assert!(Cli::try_parse_from(["stream-relay", "--connect-timeout", "0", "batch"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["stream-relay", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["stream-relay", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
