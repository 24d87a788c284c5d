use std::fmt;

use sipf_transport::Transport;
use tracing::{debug, info, warn};

use crate::client::SipfClient;
use crate::error::{ClientError, Result};
use crate::registers::{
    REG_AUTH_MODE, REG_PASSWORD, REG_PASSWORD_LEN, REG_USER_NAME, REG_USER_NAME_LEN,
};

/// Longest user name or password the module stores.
pub const MAX_CREDENTIAL_LEN: usize = 80;

/// How the module authenticates to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// User name and password.
    Password,
    /// Source IP address of the SIM.
    SimIp,
    /// A mode byte this crate does not name.
    Other(u8),
}

impl AuthMode {
    /// Register value for this mode.
    pub fn code(self) -> u8 {
        match self {
            AuthMode::Password => 0x00,
            AuthMode::SimIp => 0x01,
            AuthMode::Other(code) => code,
        }
    }

    /// Mode for a register value.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => AuthMode::Password,
            0x01 => AuthMode::SimIp,
            other => AuthMode::Other(other),
        }
    }
}

/// User name and password for password authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_name: String,
    /// Treated as secret and redacted in debug output.
    pub password: String,
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [("user name", &self.user_name), ("password", &self.password)] {
            if value.len() > MAX_CREDENTIAL_LEN {
                return Err(ClientError::InvalidArgument(format!(
                    "{field} too long ({} bytes, max {MAX_CREDENTIAL_LEN})",
                    value.len()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field(
                "password",
                &format_args!("<redacted:{} bytes>", self.password.len()),
            )
            .finish()
    }
}

impl<T: Transport> SipfClient<T> {
    /// Read the current auth mode.
    pub fn auth_mode(&mut self) -> Result<AuthMode> {
        Ok(AuthMode::from_code(self.read_register(REG_AUTH_MODE)?))
    }

    /// Set the auth mode and wait until the module reports it back.
    ///
    /// After the write, the mode register is read back every pacing delay
    /// until it matches. The poll is bounded by
    /// [`ClientConfig::auth_poll`](crate::ClientConfig::auth_poll); with an
    /// unbounded budget it blocks for as long as the module disagrees.
    pub fn set_auth_mode(&mut self, mode: AuthMode) -> Result<()> {
        let code = mode.code();
        self.write_register(REG_AUTH_MODE, code)?;

        let budget = self.config.auth_poll;
        let started = self.channel.now_millis();
        let mut attempts = 0u32;

        loop {
            self.pace();
            attempts += 1;
            let current = self.read_register(REG_AUTH_MODE)?;
            if current == code {
                info!(?mode, attempts, "auth mode applied");
                return Ok(());
            }

            let elapsed_ms = self.channel.now_millis().saturating_sub(started);
            debug!(current, expected = code, attempts, "auth mode not yet applied");
            if budget.exhausted(attempts, elapsed_ms) {
                warn!(attempts, elapsed_ms, "auth mode poll deadline exceeded");
                return Err(ClientError::DeadlineExceeded {
                    attempts,
                    elapsed_ms,
                });
            }
        }
    }

    /// Store credentials for password authentication.
    ///
    /// Both lengths are checked before anything is written. The sequence is
    /// not atomic: a failing write aborts it and leaves the module with a
    /// partially updated credential.
    pub fn set_auth_info(&mut self, credentials: &Credentials) -> Result<()> {
        credentials.validate()?;

        self.write_string(
            REG_USER_NAME_LEN,
            REG_USER_NAME,
            credentials.user_name.as_bytes(),
        )?;
        self.write_string(
            REG_PASSWORD_LEN,
            REG_PASSWORD,
            credentials.password.as_bytes(),
        )?;

        info!(user_name = %credentials.user_name, "auth info stored");
        Ok(())
    }

    fn write_string(&mut self, len_addr: u8, base_addr: u8, bytes: &[u8]) -> Result<()> {
        // validate() keeps len <= 80, so the length and every address fit in a byte.
        self.write_register(len_addr, bytes.len() as u8)?;
        self.pace();
        for (i, &byte) in bytes.iter().enumerate() {
            self.write_register(base_addr + i as u8, byte)?;
            self.pace();
        }
        Ok(())
    }
}
