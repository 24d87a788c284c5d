use std::fmt;
use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use sipf::client::{AuthMode, ClientConfig, SipfClient};
use sipf::transport::{SerialConfig, SerialTransport};

use crate::exit::{client_error, io_error, transport_error, CliResult};
use crate::output::OutputFormat;

pub mod gnss;
pub mod module;
pub mod object;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show version information.
    Version(VersionArgs),
    /// Read the module firmware version.
    Firmware(PortArgs),
    /// Set the module authentication mode.
    AuthMode(AuthModeArgs),
    /// Store credentials for password authentication.
    AuthInfo(AuthInfoArgs),
    /// Send one data object.
    Tx(TxArgs),
    /// Fetch queued inbound data objects.
    Rx(RxArgs),
    /// Switch the GNSS receiver on or off.
    Gnss(GnssArgs),
    /// Read the last GNSS fix.
    Location(PortArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Version(args) => version::run(args),
        Command::Firmware(port) => module::firmware(&mut open(&port)?, format),
        Command::AuthMode(args) => module::auth_mode(&mut open(&args.port)?, args.mode.into()),
        Command::AuthInfo(args) => {
            module::auth_info(&mut open(&args.port)?, &args.user, &args.password)
        }
        Command::Tx(args) => object::tx(&mut open(&args.port)?, &args, format),
        Command::Rx(args) => object::rx(&mut open(&args.port)?, args.max, format),
        Command::Gnss(args) => gnss::switch(&mut open(&args.port)?, args.state == Switch::On),
        Command::Location(port) => gnss::location(&mut open(&port)?, format),
    }
}

/// Open the serial port and build a client from the optional config file.
fn open(args: &PortArgs) -> CliResult<SipfClient<SerialTransport>> {
    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            })?;
            ClientConfig::from_json(&text).map_err(|err| client_error("invalid config", err))?
        }
        None => ClientConfig::default(),
    };

    let serial = SerialConfig {
        baud_rate: args.baud,
        ..SerialConfig::default()
    };
    let transport = SerialTransport::open_with_config(&args.port, &serial)
        .map_err(|err| transport_error("open failed", err))?;
    Ok(SipfClient::with_config(transport, config))
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial device the module is attached to.
    #[arg(long, short = 'p', env = "SIPF_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// JSON client configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthModeArg {
    /// User name and password.
    Password,
    /// SIM source address.
    SimIp,
}

impl From<AuthModeArg> for AuthMode {
    fn from(arg: AuthModeArg) -> Self {
        match arg {
            AuthModeArg::Password => AuthMode::Password,
            AuthModeArg::SimIp => AuthMode::SimIp,
        }
    }
}

#[derive(Args, Debug)]
pub struct AuthModeArgs {
    #[command(flatten)]
    pub port: PortArgs,
    pub mode: AuthModeArg,
}

#[derive(Args)]
pub struct AuthInfoArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// User name.
    #[arg(long)]
    pub user: String,
    /// Password.
    #[arg(long, env = "SIPF_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl fmt::Debug for AuthInfoArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthInfoArgs")
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Hex-encoded bytes.
    Bin,
    /// UTF-8 text.
    Str,
}

#[derive(Args, Debug)]
pub struct TxArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Tag id (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_tag)]
    pub tag: u8,
    /// Value type.
    #[arg(long = "type", value_enum, default_value = "str")]
    pub obj_type: TypeArg,
    /// Value text, interpreted per --type.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct RxArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Maximum objects to decode; the rest are dropped.
    #[arg(long, default_value_t = 64)]
    pub max: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct GnssArgs {
    #[command(flatten)]
    pub port: PortArgs,
    pub state: Switch,
}

fn parse_tag(input: &str) -> Result<u8, String> {
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid tag id: {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tag_forms() {
        assert_eq!(parse_tag("7"), Ok(7));
        assert_eq!(parse_tag("0x1F"), Ok(0x1F));
        assert!(parse_tag("256").is_err());
        assert!(parse_tag("0xZZ").is_err());
    }

    #[test]
    fn auth_mode_arg_maps_to_mode() {
        assert_eq!(AuthMode::from(AuthModeArg::SimIp), AuthMode::SimIp);
        assert_eq!(AuthMode::from(AuthModeArg::Password), AuthMode::Password);
    }
}
