//! The `$$RX` receive path.
//!
//! A non-empty reply is a fixed header followed by object lines:
//!
//! ```text
//! <otid: 32 chars>
//! <user send time: 16 hex, big-endian ms>
//! <platform receive time: 16 hex, big-endian ms>
//! <remaining: 2 hex>
//! <qty: 2 hex>
//! <f1:2hex> <f2:2hex> <len:2hex> <value hex>   (repeated)
//! OK
//! ```
//!
//! Which of `f1`/`f2` is the tag id depends on the firmware
//! ([`FieldOrder`]). Decoded values are written into a caller-owned
//! [`ObjectArena`]; the returned objects borrow from it.

use sipf_frame::{hexcodec, HexOrder, Reply, Tier};
use sipf_transport::Transport;
use tracing::{debug, trace, warn};

use crate::client::SipfClient;
use crate::command::Command;
use crate::error::{ClientError, DecodeError, Result};
use crate::object::{ObjectType, Otid, SipfObject, OTID_LEN};
use crate::version::FieldOrder;

/// Default decode arena size in bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 1024;

const TIMESTAMP_HEX_LEN: usize = 16;
const BYTE_HEX_LEN: usize = 2;
const MIN_OBJECT_LINE_LEN: usize = 11;
const SEPARATORS: [usize; 3] = [2, 5, 8];
const VALUE_START: usize = 9;

/// Append-only buffer holding the values of one received batch.
///
/// Capacity is fixed at construction; a batch that does not fit fails with
/// [`DecodeError::ArenaOverflow`].
#[derive(Debug, Clone)]
pub struct ObjectArena {
    buf: Vec<u8>,
    capacity: usize,
}

impl ObjectArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently in use.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Bytes of a decoded value.
    pub fn get(&self, span: &ObjectSpan) -> &[u8] {
        &self.buf[span.offset..span.offset + span.len]
    }

    /// Decode hex text and append it. Returns the offset of the new bytes.
    fn push_hex(&mut self, text: &[u8], order: HexOrder) -> std::result::Result<usize, DecodeError> {
        let offset = self.buf.len();
        let needed = offset + text.len() / 2;
        if needed > self.capacity {
            return Err(DecodeError::ArenaOverflow {
                needed,
                capacity: self.capacity,
            });
        }

        self.buf.resize(needed, 0);
        if let Err(err) = hexcodec::decode_into(text, order, &mut self.buf[offset..]) {
            self.buf.truncate(offset);
            return Err(err.into());
        }
        Ok(offset)
    }
}

impl Default for ObjectArena {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ARENA_CAPACITY)
    }
}

/// Location of one decoded object inside an [`ObjectArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSpan {
    pub tag_id: u8,
    pub obj_type: ObjectType,
    pub offset: usize,
    pub len: usize,
}

/// One received batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RxBatch<'a> {
    pub otid: Otid,
    /// When the sender submitted the batch, ms since the Unix epoch.
    pub user_send_time_ms: u64,
    /// When the platform received the batch, ms since the Unix epoch.
    pub sipf_recv_time_ms: u64,
    /// Objects still queued on the module.
    pub remaining: u8,
    /// Object count announced in the header.
    pub qty: u8,
    pub objects: Vec<SipfObject<'a>>,
}

/// Decode one object line into `arena`.
pub fn decode_object_line(
    line: &[u8],
    order: FieldOrder,
    arena: &mut ObjectArena,
) -> std::result::Result<ObjectSpan, DecodeError> {
    if line.len() < MIN_OBJECT_LINE_LEN {
        return Err(DecodeError::ShortLine { len: line.len() });
    }
    if let Some(&position) = SEPARATORS.iter().find(|&&pos| line[pos] != b' ') {
        return Err(DecodeError::Separator { position });
    }

    let first = hexcodec::decode_byte(&line[0..2])?;
    let second = hexcodec::decode_byte(&line[3..5])?;
    let len = usize::from(hexcodec::decode_byte(&line[6..8])?);
    let (tag_id, type_code) = order.assign(first, second);
    let obj_type = ObjectType::from_code(type_code);

    let value = &line[VALUE_START..];
    if value.len() != len * 2 {
        return Err(DecodeError::FieldWidth {
            field: "object value",
            expected: len * 2,
            actual: value.len(),
        });
    }

    let offset = arena.push_hex(value, obj_type.hex_order())?;
    Ok(ObjectSpan {
        tag_id,
        obj_type,
        offset,
        len,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Otid,
    SendDtm,
    RecvDtm,
    Remain,
    Qty,
    Objs,
}

impl RxState {
    fn name(self) -> &'static str {
        match self {
            RxState::Otid => "otid",
            RxState::SendDtm => "send time",
            RxState::RecvDtm => "receive time",
            RxState::Remain => "remaining count",
            RxState::Qty => "object count",
            RxState::Objs => "objects",
        }
    }
}

#[derive(Debug, Default)]
struct Header {
    otid: String,
    send_time_ms: u64,
    recv_time_ms: u64,
    remaining: u8,
    qty: u8,
}

fn expect_width(field: &'static str, text: &[u8], width: usize) -> std::result::Result<(), DecodeError> {
    if text.len() != width {
        return Err(DecodeError::FieldWidth {
            field,
            expected: width,
            actual: text.len(),
        });
    }
    Ok(())
}

fn decode_timestamp(field: &'static str, text: &[u8]) -> std::result::Result<u64, DecodeError> {
    expect_width(field, text, TIMESTAMP_HEX_LEN)?;
    let mut bytes = [0u8; 8];
    hexcodec::decode_into(text, HexOrder::Forward, &mut bytes)?;
    Ok(u64::from_be_bytes(bytes))
}

fn decode_count(field: &'static str, text: &[u8]) -> std::result::Result<u8, DecodeError> {
    expect_width(field, text, BYTE_HEX_LEN)?;
    Ok(hexcodec::decode_byte(text)?)
}

impl<T: Transport> SipfClient<T> {
    /// Fetch queued inbound objects (`$$RX`).
    ///
    /// Returns `Ok(None)` when nothing is queued. At most `max_objects` are
    /// decoded; further object lines are read and dropped. The arena is
    /// cleared first, and again if the reply fails to decode, so a failed
    /// call never leaves partial values behind.
    ///
    /// The firmware version is read first when it is not cached yet.
    pub fn receive_objects<'a>(
        &mut self,
        arena: &'a mut ObjectArena,
        max_objects: usize,
    ) -> Result<Option<RxBatch<'a>>> {
        let order = self.field_order()?;
        arena.clear();

        let (header, spans) = match self.read_batch(arena, order, max_objects) {
            Ok(Some(batch)) => batch,
            Ok(None) => return Ok(None),
            Err(err) => {
                arena.clear();
                return Err(err);
            }
        };

        let arena: &'a ObjectArena = arena;
        let objects = spans
            .iter()
            .map(|span| SipfObject {
                tag_id: span.tag_id,
                obj_type: span.obj_type,
                value: arena.get(span),
            })
            .collect();

        Ok(Some(RxBatch {
            otid: Otid::new(header.otid),
            user_send_time_ms: header.send_time_ms,
            sipf_recv_time_ms: header.recv_time_ms,
            remaining: header.remaining,
            qty: header.qty,
            objects,
        }))
    }

    fn read_batch(
        &mut self,
        arena: &mut ObjectArena,
        order: FieldOrder,
        max_objects: usize,
    ) -> Result<Option<(Header, Vec<ObjectSpan>)>> {
        let command = Command::Receive;
        self.send(&command)?;

        let mut state = RxState::Otid;
        let mut tier = Tier::Command;
        let mut header = Header::default();
        let mut spans = Vec::new();
        let mut dropped = 0usize;

        loop {
            let line = match self.channel.next_reply(tier)? {
                Reply::Ng => {
                    warn!(state = state.name(), "receive rejected");
                    return Err(ClientError::rejected(command.label()));
                }
                Reply::Ok if state == RxState::Otid => {
                    debug!("no objects queued");
                    return Ok(None);
                }
                Reply::Ok if state == RxState::Objs => break,
                Reply::Ok => return Err(unexpected(state, "OK")),
                Reply::Echo => continue,
                Reply::Data(line) => line,
            };
            let text = line.as_bytes();

            let step = match state {
                RxState::Otid => expect_width("otid", text, OTID_LEN).map(|()| {
                    header.otid = line.text().into_owned();
                    tier = Tier::InterChar;
                    RxState::SendDtm
                }),
                RxState::SendDtm => decode_timestamp("send time", text).map(|ms| {
                    header.send_time_ms = ms;
                    RxState::RecvDtm
                }),
                RxState::RecvDtm => decode_timestamp("receive time", text).map(|ms| {
                    header.recv_time_ms = ms;
                    RxState::Remain
                }),
                RxState::Remain => decode_count("remaining count", text).map(|n| {
                    header.remaining = n;
                    RxState::Qty
                }),
                RxState::Qty => decode_count("object count", text).map(|n| {
                    header.qty = n;
                    RxState::Objs
                }),
                RxState::Objs if spans.len() >= max_objects => {
                    dropped += 1;
                    trace!(%line, "dropping object beyond max_objects");
                    Ok(RxState::Objs)
                }
                RxState::Objs => decode_object_line(text, order, arena).map(|span| {
                    spans.push(span);
                    RxState::Objs
                }),
            };

            state = match step {
                Ok(next) => next,
                Err(err) => {
                    warn!(state = state.name(), error = %err, "receive decode failed");
                    return Err(err.into());
                }
            };
        }

        debug!(
            otid = %header.otid,
            remaining = header.remaining,
            qty = header.qty,
            decoded = spans.len(),
            dropped,
            "objects received"
        );
        Ok(Some((header, spans)))
    }
}

fn unexpected(state: RxState, line: &str) -> ClientError {
    warn!(state = state.name(), line, "unexpected line in receive reply");
    DecodeError::Unexpected {
        state: state.name(),
        line: line.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use sipf_frame::FrameError;
    use sipf_transport::{ScriptedTransport, Step};

    use super::*;
    use crate::object::ObjectValue;
    use crate::version::FirmwareVersion;

    const OTID: &str = "0123456789ABCDEF0123456789ABCDEF";
    const SEND_DTM: &str = "0000018E0A1B2C3D";
    const RECV_DTM: &str = "0000018E0A1B2C40";

    fn client_at(version: u32, lines: &[&str]) -> SipfClient<ScriptedTransport> {
        let mut t = ScriptedTransport::new();
        t.reply_lines(lines);
        let mut client = SipfClient::new(t);
        client.version = Some(FirmwareVersion::from_raw(version));
        client
    }

    fn header_then(qty: &'static str, objects: &[&'static str]) -> Vec<&'static str> {
        let mut lines = vec!["$$RX", OTID, SEND_DTM, RECV_DTM, "00", qty];
        lines.extend_from_slice(objects);
        lines.push("OK");
        lines
    }

    #[test]
    fn decode_line_current_order() {
        let mut arena = ObjectArena::default();
        let span = decode_object_line(b"01 20 02 4142", FieldOrder::Current, &mut arena).unwrap();
        assert_eq!(span.tag_id, 0x01);
        assert_eq!(span.obj_type, ObjectType::StrUtf8);
        assert_eq!(arena.get(&span), b"AB");
    }

    #[test]
    fn field_order_swaps_tag_and_type() {
        let line = b"01 02 02 4142";

        let mut arena = ObjectArena::default();
        let current = decode_object_line(line, FieldOrder::Current, &mut arena).unwrap();
        assert_eq!((current.tag_id, current.obj_type), (0x01, ObjectType::Uint16));

        let mut arena = ObjectArena::default();
        let legacy = decode_object_line(line, FieldOrder::Legacy, &mut arena).unwrap();
        assert_eq!((legacy.tag_id, legacy.obj_type), (0x02, ObjectType::Int8));
    }

    #[test]
    fn decode_line_numeric_value_is_reversed() {
        let mut arena = ObjectArena::default();
        let span =
            decode_object_line(b"05 04 04 12345678", FieldOrder::Current, &mut arena).unwrap();
        assert_eq!(arena.get(&span), &[0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn decode_line_layout_errors() {
        let mut arena = ObjectArena::default();
        assert_eq!(
            decode_object_line(b"0A 1", FieldOrder::Current, &mut arena),
            Err(DecodeError::ShortLine { len: 4 })
        );
        assert_eq!(
            decode_object_line(b"01 20-01 41", FieldOrder::Current, &mut arena),
            Err(DecodeError::Separator { position: 5 })
        );
        assert!(matches!(
            decode_object_line(b"01 20 02 41", FieldOrder::Current, &mut arena),
            Err(DecodeError::FieldWidth { expected: 4, actual: 2, .. })
        ));
        assert!(matches!(
            decode_object_line(b"01 20 02 414243", FieldOrder::Current, &mut arena),
            Err(DecodeError::FieldWidth { expected: 4, actual: 6, .. })
        ));
        assert!(matches!(
            decode_object_line(b"01 20 02 41ZZ", FieldOrder::Current, &mut arena),
            Err(DecodeError::Hex(_))
        ));
        assert!(arena.is_empty());
    }

    #[test]
    fn arena_overflow_is_an_error() {
        let mut arena = ObjectArena::with_capacity(3);
        decode_object_line(b"01 10 02 AABB", FieldOrder::Current, &mut arena).unwrap();
        assert_eq!(
            decode_object_line(b"02 10 02 CCDD", FieldOrder::Current, &mut arena),
            Err(DecodeError::ArenaOverflow {
                needed: 4,
                capacity: 3
            })
        );
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn receive_full_batch() {
        let lines = header_then("02", &["01 20 02 4142", "02 04 04 12345678"]);
        let mut client = client_at(0x0003_0005, &lines);
        let mut arena = client.new_arena();

        let batch = client.receive_objects(&mut arena, 8).unwrap().unwrap();
        assert_eq!(batch.otid.as_str(), OTID);
        assert_eq!(batch.user_send_time_ms, 0x0000_018E_0A1B_2C3D);
        assert_eq!(batch.sipf_recv_time_ms, 0x0000_018E_0A1B_2C40);
        assert_eq!(batch.remaining, 0);
        assert_eq!(batch.qty, 2);
        assert_eq!(batch.objects.len(), 2);
        assert_eq!(batch.objects[0].as_str(), Some("AB"));
        assert_eq!(batch.objects[1].tag_id, 0x02);
        assert_eq!(
            batch.objects[1].to_value(),
            Some(ObjectValue::U32(0x1234_5678))
        );
        assert_eq!(client.transport().written(), b"$$RX\r\n");
    }

    #[test]
    fn receive_legacy_firmware_swaps_fields() {
        let lines = header_then("01", &["20 01 02 4142"]);
        let mut client = client_at(0x0002_0009, &lines);
        let mut arena = client.new_arena();

        let batch = client.receive_objects(&mut arena, 8).unwrap().unwrap();
        assert_eq!(batch.objects[0].tag_id, 0x01);
        assert_eq!(batch.objects[0].obj_type, ObjectType::StrUtf8);
    }

    #[test]
    fn receive_nothing_queued() {
        let mut client = client_at(0x0003_0005, &["$$RX", "OK"]);
        let mut arena = client.new_arena();
        assert!(client.receive_objects(&mut arena, 8).unwrap().is_none());
    }

    #[test]
    fn receive_zero_quantity() {
        let mut client = client_at(
            0x0003_0005,
            &["$$RX", OTID, SEND_DTM, RECV_DTM, "03", "00", "OK"],
        );
        let mut arena = client.new_arena();

        let batch = client.receive_objects(&mut arena, 8).unwrap().unwrap();
        assert!(batch.objects.is_empty());
        assert_eq!(batch.remaining, 3);
        assert_eq!(batch.qty, 0);
    }

    #[test]
    fn receive_ignores_blank_lines() {
        let mut client = client_at(
            0x0003_0005,
            &["", OTID, "", SEND_DTM, RECV_DTM, "", "00", "01", "", "01 20 01 41", "OK"],
        );
        let mut arena = client.new_arena();

        let batch = client.receive_objects(&mut arena, 8).unwrap().unwrap();
        assert_eq!(batch.objects.len(), 1);
    }

    #[test]
    fn receive_malformed_object_line_discards_batch() {
        let lines = header_then("02", &["01 20 01 41", "0A 1"]);
        let mut client = client_at(0x0003_0005, &lines);
        let mut arena = client.new_arena();

        let err = client.receive_objects(&mut arena, 8).unwrap_err();
        assert!(matches!(err, ClientError::Decode(DecodeError::ShortLine { len: 4 })));
        assert!(arena.is_empty());
    }

    #[test]
    fn receive_drops_objects_beyond_limit() {
        let lines = header_then("02", &["01 20 01 41", "02 20 01 ZZ"]);
        let mut client = client_at(0x0003_0005, &lines);
        let mut arena = client.new_arena();

        let batch = client.receive_objects(&mut arena, 1).unwrap().unwrap();
        assert_eq!(batch.objects.len(), 1);
        assert_eq!(batch.objects[0].tag_id, 0x01);
        assert_eq!(batch.qty, 2);
    }

    #[test]
    fn receive_arena_overflow() {
        let lines = header_then("02", &["01 10 02 AABB", "02 10 02 CCDD"]);
        let cfg = crate::ClientConfig {
            arena_capacity: 3,
            ..crate::ClientConfig::default()
        };
        let mut t = ScriptedTransport::new();
        t.reply_lines(&lines);
        let mut client = SipfClient::with_config(t, cfg);
        client.version = Some(FirmwareVersion::from_raw(0x0003_0005));
        let mut arena = client.new_arena();

        let err = client.receive_objects(&mut arena, 8).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Decode(DecodeError::ArenaOverflow { .. })
        ));
    }

    #[test]
    fn receive_bad_otid_width() {
        let mut client = client_at(0x0003_0005, &["$$RX", "0123", "OK"]);
        let mut arena = client.new_arena();

        let err = client.receive_objects(&mut arena, 8).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Decode(DecodeError::FieldWidth {
                field: "otid",
                expected: 32,
                actual: 4
            })
        ));
    }

    #[test]
    fn receive_ok_inside_header_is_unexpected() {
        let mut client = client_at(0x0003_0005, &[OTID, SEND_DTM, "OK"]);
        let mut arena = client.new_arena();

        let err = client.receive_objects(&mut arena, 8).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Decode(DecodeError::Unexpected {
                state: "receive time",
                ..
            })
        ));
    }

    #[test]
    fn receive_ng_in_objects() {
        let mut client = client_at(
            0x0003_0005,
            &[OTID, SEND_DTM, RECV_DTM, "00", "01", "01 20 01 41", "NG"],
        );
        let mut arena = client.new_arena();
        assert!(client.receive_objects(&mut arena, 8).unwrap_err().is_rejected());
        assert!(arena.is_empty());
    }

    #[test]
    fn receive_header_uses_inter_char_timeout() {
        let mut t = ScriptedTransport::new();
        t.reply(vec![
            Step::line(OTID),
            Step::Silence(600),
            Step::line(SEND_DTM),
        ]);
        let mut client = SipfClient::new(t);
        client.version = Some(FirmwareVersion::from_raw(0x0003_0005));
        let mut arena = client.new_arena();

        let err = client.receive_objects(&mut arena, 8).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Frame(FrameError::Timeout { timeout_ms: 500 })
        ));
    }

    #[test]
    fn receive_fetches_version_when_not_cached() {
        let mut t = ScriptedTransport::new();
        for value in ["00", "02", "09", "00"] {
            t.reply_lines(&[value, "OK"]);
        }
        t.reply_lines(&["OK"]);
        let mut client = SipfClient::new(t);
        let mut arena = client.new_arena();

        assert!(client.receive_objects(&mut arena, 8).unwrap().is_none());
        assert_eq!(
            client.transport().written_lines(),
            vec!["$R F1", "$R F2", "$R F3", "$R F4", "$$RX"]
        );
        assert_eq!(
            client.cached_version().map(FirmwareVersion::raw),
            Some(0x0002_0009)
        );
    }

    #[test]
    fn receive_largest_bin_object_with_default_config() {
        let value: Vec<u8> = (0..=254u8).collect();
        let object_line = format!("01 10 FF {}", hexcodec::encode(&value, HexOrder::Forward));
        assert_eq!(object_line.len(), 519);

        let mut lines: Vec<&str> = header_then("01", &[]);
        lines.insert(6, &object_line);
        let mut client = client_at(0x0003_0001, &lines);
        let mut arena = client.new_arena();

        let batch = client.receive_objects(&mut arena, 8).unwrap().unwrap();
        assert_eq!(batch.objects.len(), 1);
        assert_eq!(batch.objects[0].obj_type, ObjectType::Bin);
        assert_eq!(batch.objects[0].value(), value.as_slice());
    }
}
