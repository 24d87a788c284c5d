use sipf::client::{ObjectValue, SipfClient};
use sipf::frame::{hexcodec, HexOrder};
use sipf::transport::Transport;

use crate::cmd::{TxArgs, TypeArg};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_batch, print_sent, OutputFormat};

pub fn tx<T: Transport>(
    client: &mut SipfClient<T>,
    args: &TxArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let value = parse_value(args.obj_type, &args.value)?;
    let otid = client
        .send_value(args.tag, &value)
        .map_err(|err| client_error("send failed", err))?;
    print_sent(&otid, args.tag, format);
    Ok(SUCCESS)
}

pub fn rx<T: Transport>(
    client: &mut SipfClient<T>,
    max_objects: usize,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut arena = client.new_arena();
    let batch = client
        .receive_objects(&mut arena, max_objects)
        .map_err(|err| client_error("receive failed", err))?;
    print_batch(batch.as_ref(), format);
    Ok(SUCCESS)
}

/// Parse command-line value text for the given type.
pub fn parse_value(obj_type: TypeArg, text: &str) -> CliResult<ObjectValue> {
    fn num<N: std::str::FromStr>(text: &str) -> CliResult<N> {
        text.trim()
            .parse()
            .map_err(|_| CliError::new(USAGE, format!("invalid numeric value: {text}")))
    }

    let value = match obj_type {
        TypeArg::U8 => ObjectValue::U8(num(text)?),
        TypeArg::I8 => ObjectValue::I8(num(text)?),
        TypeArg::U16 => ObjectValue::U16(num(text)?),
        TypeArg::I16 => ObjectValue::I16(num(text)?),
        TypeArg::U32 => ObjectValue::U32(num(text)?),
        TypeArg::I32 => ObjectValue::I32(num(text)?),
        TypeArg::U64 => ObjectValue::U64(num(text)?),
        TypeArg::I64 => ObjectValue::I64(num(text)?),
        TypeArg::F32 => ObjectValue::F32(num(text)?),
        TypeArg::F64 => ObjectValue::F64(num(text)?),
        TypeArg::Bin => ObjectValue::Bin(
            hexcodec::decode(text.as_bytes(), HexOrder::Forward)
                .map_err(|err| CliError::new(USAGE, format!("invalid hex value: {err}")))?,
        ),
        TypeArg::Str => ObjectValue::Str(text.to_string()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use sipf::client::FirmwareVersion;
    use sipf::transport::ScriptedTransport;

    use super::*;
    use crate::exit::DATA_INVALID;

    const OTID: &str = "00112233445566778899AABBCCDDEEFF";

    #[test]
    fn parse_values() {
        assert_eq!(parse_value(TypeArg::I16, "-5").unwrap(), ObjectValue::I16(-5));
        assert_eq!(
            parse_value(TypeArg::Bin, "c0ffee").unwrap(),
            ObjectValue::Bin(vec![0xC0, 0xFF, 0xEE])
        );
        assert_eq!(
            parse_value(TypeArg::Str, "hello").unwrap(),
            ObjectValue::Str("hello".to_string())
        );
        assert_eq!(parse_value(TypeArg::U8, "300").unwrap_err().code, USAGE);
        assert_eq!(parse_value(TypeArg::Bin, "abc").unwrap_err().code, USAGE);
    }

    #[test]
    fn rx_prints_empty_queue() {
        let mut t = ScriptedTransport::new();
        for value in ["00", "03", "01", "00"] {
            t.reply_lines(&[value, "OK"]);
        }
        t.reply_lines(&["OK"]);
        let mut client = SipfClient::new(t);
        assert_eq!(rx(&mut client, 8, OutputFormat::Json).unwrap(), SUCCESS);
        assert_eq!(
            client.cached_version(),
            Some(FirmwareVersion::from_raw(0x0003_0001))
        );
    }

    #[test]
    fn rx_decode_failure_is_data_invalid() {
        let mut t = ScriptedTransport::new();
        for value in ["00", "03", "01", "00"] {
            t.reply_lines(&[value, "OK"]);
        }
        t.reply_lines(&[OTID, "not a timestamp"]);
        let mut client = SipfClient::new(t);

        let err = rx(&mut client, 8, OutputFormat::Json).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
