use sipf::client::SipfClient;
use sipf::transport::Transport;

use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_fix, OutputFormat};

pub fn switch<T: Transport>(client: &mut SipfClient<T>, enabled: bool) -> CliResult<i32> {
    client
        .set_gnss_enabled(enabled)
        .map_err(|err| client_error("gnss switch failed", err))?;
    eprintln!("gnss {}", if enabled { "enabled" } else { "disabled" });
    Ok(SUCCESS)
}

pub fn location<T: Transport>(client: &mut SipfClient<T>, format: OutputFormat) -> CliResult<i32> {
    let fix = client
        .get_gnss_location()
        .map_err(|err| client_error("gnss location failed", err))?;
    print_fix(&fix, format);
    Ok(SUCCESS)
}
