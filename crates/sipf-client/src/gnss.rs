use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sipf_frame::{Reply, Tier};
use sipf_transport::Transport;
use tracing::{debug, trace, warn};

use crate::client::SipfClient;
use crate::command::Command;
use crate::error::{ClientError, ParseError, Result};

const FIELD_COUNT: usize = 7;
const DATETIME_LEN: usize = 20;
/// Literal characters of `YYYY-MM-DDTHH:MM:SSZ` by position.
const DATETIME_LITERALS: [(usize, u8); 6] = [
    (4, b'-'),
    (7, b'-'),
    (10, b'T'),
    (13, b':'),
    (16, b':'),
    (19, b'Z'),
];

/// GNSS fix reported by `$$GNSSLOC`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GnssFix {
    /// True for an `A` (valid) record, false for `V`.
    pub fixed: bool,
    pub longitude: f64,
    pub latitude: f64,
    /// Meters.
    pub altitude: f64,
    pub speed: f64,
    /// Degrees.
    pub heading: f64,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl GnssFix {
    /// Parse a location record.
    ///
    /// Format: `<A|V>,<lon>,<lat>,<alt>,<speed>,<heading>,YYYY-MM-DDTHH:MM:SSZ`
    pub fn parse(text: &str) -> std::result::Result<Self, ParseError> {
        let fields: Vec<&str> = text.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError(format!(
                "expected {FIELD_COUNT} fields, got {}",
                fields.len()
            )));
        }

        let fixed = match fields[0] {
            "A" => true,
            "V" => false,
            other => return Err(ParseError(format!("unknown fix status: {other:?}"))),
        };
        let (year, month, day, hour, minute, second) = parse_datetime(fields[6])?;

        Ok(GnssFix {
            fixed,
            longitude: parse_float("longitude", fields[1])?,
            latitude: parse_float("latitude", fields[2])?,
            altitude: parse_float("altitude", fields[3])?,
            speed: parse_float("speed", fields[4])?,
            heading: parse_float("heading", fields[5])?,
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Fix time, when the date fields form a valid UTC instant.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )?
        .and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
        .map(|naive| naive.and_utc())
    }
}

impl FromStr for GnssFix {
    type Err = ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Plain decimal only: no exponent, `inf` or `NaN`.
fn parse_float(field: &str, text: &str) -> std::result::Result<f64, ParseError> {
    let invalid = || ParseError(format!("invalid {field}: {text:?}"));
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'))
    {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}

fn parse_datetime(text: &str) -> std::result::Result<(u16, u8, u8, u8, u8, u8), ParseError> {
    let invalid = || ParseError(format!("invalid datetime: {text:?}"));

    let bytes = text.as_bytes();
    if bytes.len() != DATETIME_LEN {
        return Err(invalid());
    }
    if DATETIME_LITERALS
        .iter()
        .any(|&(pos, literal)| bytes[pos] != literal)
    {
        return Err(invalid());
    }

    let number = |range: std::ops::Range<usize>| -> std::result::Result<u16, ParseError> {
        let digits = &bytes[range];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        Ok(digits
            .iter()
            .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0')))
    };
    let small = |range| number(range).and_then(|n| u8::try_from(n).map_err(|_| invalid()));

    Ok((
        number(0..4)?,
        small(5..7)?,
        small(8..10)?,
        small(11..13)?,
        small(14..16)?,
        small(17..19)?,
    ))
}

impl<T: Transport> SipfClient<T> {
    /// Switch the GNSS receiver on or off (`$$GNSSEN`).
    pub fn set_gnss_enabled(&mut self, enabled: bool) -> Result<()> {
        let command = Command::GnssEnable(enabled);
        self.send(&command)?;

        loop {
            match self.channel.next_reply(Tier::Command)? {
                Reply::Ok => {
                    debug!(enabled, "gnss switched");
                    return Ok(());
                }
                Reply::Ng => {
                    warn!(enabled, "gnss switch rejected");
                    return Err(ClientError::rejected(command.label()));
                }
                other => trace!(?other, "ignoring line while awaiting gnss switch result"),
            }
        }
    }

    /// Read the last GNSS fix (`$$GNSSLOC`).
    pub fn get_gnss_location(&mut self) -> Result<GnssFix> {
        let command = Command::GnssLocation;
        self.send(&command)?;

        let fix = loop {
            match self.channel.next_reply(Tier::Command)? {
                Reply::Ng => {
                    warn!("gnss location rejected");
                    return Err(ClientError::rejected(command.label()));
                }
                Reply::Ok => {
                    return Err(ParseError("reply ended before location record".to_string()).into());
                }
                Reply::Data(line) if line.starts_with(b"A") || line.starts_with(b"V") => {
                    match GnssFix::parse(&line.text()) {
                        Ok(fix) => break fix,
                        Err(err) => {
                            warn!(error = %err, "gnss record rejected");
                            return Err(err.into());
                        }
                    }
                }
                other => trace!(?other, "ignoring line while awaiting location record"),
            }
        };

        loop {
            match self.channel.next_reply(Tier::InterChar)? {
                Reply::Ok => {
                    debug!(fixed = fix.fixed, "gnss location read");
                    return Ok(fix);
                }
                Reply::Ng => return Err(ClientError::rejected(command.label())),
                other => trace!(?other, "ignoring line while awaiting OK"),
            }
        }
    }
}
