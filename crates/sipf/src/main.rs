mod cmd;
mod exit;
mod output;

use clap::Parser;
use sipf::logging::{init_logging, LogFormat, LogLevel};

use crate::cmd::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sipf", version, about = "SIPF LPWA module CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::TypeArg;

    #[test]
    fn parses_tx_subcommand() {
        let cli = Cli::try_parse_from([
            "sipf", "tx", "--port", "/dev/ttyUSB0", "--tag", "0x10", "--type", "u16", "513",
        ])
        .expect("tx args should parse");

        match cli.command {
            Command::Tx(args) => {
                assert_eq!(args.tag, 0x10);
                assert_eq!(args.obj_type, TypeArg::U16);
                assert_eq!(args.value, "513");
                assert_eq!(args.port.baud, 115_200);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_auth_mode() {
        let err = Cli::try_parse_from(["sipf", "auth-mode", "--port", "COM3", "token"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sipf",
            "rx",
            "--port",
            "/dev/ttyUSB0",
            "--max",
            "4",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("rx args should parse");
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(matches!(cli.command, Command::Rx(ref args) if args.max == 4));
    }

    #[test]
    fn log_flags_parse_through_value_enum() {
        let cli = Cli::try_parse_from([
            "sipf", "--log-format", "json", "--log-level", "trace", "version",
        ])
        .expect("log flags should parse");
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level, LogLevel::Trace);

        let err = Cli::try_parse_from(["sipf", "--log-level", "verbose", "version"])
            .expect_err("unknown level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
