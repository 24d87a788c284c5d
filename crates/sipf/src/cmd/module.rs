use sipf::client::{AuthMode, Credentials, SipfClient};
use sipf::transport::Transport;

use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_firmware, OutputFormat};

pub fn firmware<T: Transport>(client: &mut SipfClient<T>, format: OutputFormat) -> CliResult<i32> {
    let version = client
        .get_firmware_version()
        .map_err(|err| client_error("firmware read failed", err))?;
    print_firmware(version, format);
    Ok(SUCCESS)
}

pub fn auth_mode<T: Transport>(client: &mut SipfClient<T>, mode: AuthMode) -> CliResult<i32> {
    client
        .set_auth_mode(mode)
        .map_err(|err| client_error("set auth mode failed", err))?;
    eprintln!("auth mode set to {mode:?}");
    Ok(SUCCESS)
}

pub fn auth_info<T: Transport>(
    client: &mut SipfClient<T>,
    user: &str,
    password: &str,
) -> CliResult<i32> {
    client
        .set_auth_info(&Credentials::new(user, password))
        .map_err(|err| client_error("set auth info failed", err))?;
    eprintln!("credentials stored for {user}");
    Ok(SUCCESS)
}
