use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sipf::client::{FirmwareVersion, GnssFix, ObjectType, ObjectValue, Otid, RxBatch, SipfObject};
use sipf::frame::{hexcodec, HexOrder};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FirmwareOutput {
    version: String,
    raw: String,
    major: u8,
    minor: u8,
    release: u16,
}

#[derive(Serialize)]
struct SentOutput<'a> {
    otid: &'a str,
    tag_id: u8,
}

#[derive(Serialize)]
struct ObjectOutput {
    tag_id: u8,
    #[serde(rename = "type")]
    obj_type: String,
    len: usize,
    value: String,
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    otid: Option<&'a str>,
    user_send_time_ms: Option<u64>,
    sipf_recv_time_ms: Option<u64>,
    remaining: u8,
    objects: Vec<ObjectOutput>,
}

pub fn print_firmware(version: FirmwareVersion, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FirmwareOutput {
                version: version.to_string(),
                raw: format!("{:#010x}", version.raw()),
                major: version.major(),
                minor: version.minor(),
                release: version.release(),
            };
            print_json(&out);
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("firmware {version} ({:#010x})", version.raw());
        }
    }
}

pub fn print_sent(otid: &Otid, tag_id: u8, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SentOutput {
            otid: otid.as_str(),
            tag_id,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent tag={tag_id:#04x} otid={otid}");
        }
    }
}

pub fn print_batch(batch: Option<&RxBatch<'_>>, format: OutputFormat) {
    let objects: Vec<ObjectOutput> = batch
        .map(|b| b.objects.iter().map(object_output).collect())
        .unwrap_or_default();

    match format {
        OutputFormat::Json => print_json(&BatchOutput {
            otid: batch.map(|b| b.otid.as_str()),
            user_send_time_ms: batch.map(|b| b.user_send_time_ms),
            sipf_recv_time_ms: batch.map(|b| b.sipf_recv_time_ms),
            remaining: batch.map_or(0, |b| b.remaining),
            objects,
        }),
        OutputFormat::Table => {
            let Some(batch) = batch else {
                println!("no objects queued");
                return;
            };
            println!("otid {} ({} remaining)", batch.otid, batch.remaining);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TAG", "TYPE", "LEN", "VALUE"]);
            for obj in &objects {
                table.add_row(vec![
                    format!("{:#04x}", obj.tag_id),
                    obj.obj_type.clone(),
                    obj.len.to_string(),
                    obj.value.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let Some(batch) = batch else {
                println!("no objects queued");
                return;
            };
            println!(
                "otid={} sent_ms={} received_ms={} remaining={}",
                batch.otid, batch.user_send_time_ms, batch.sipf_recv_time_ms, batch.remaining
            );
            for obj in &objects {
                println!(
                    "  tag={:#04x} type={} len={} value={}",
                    obj.tag_id, obj.obj_type, obj.len, obj.value
                );
            }
        }
    }
}

pub fn print_fix(fix: &GnssFix, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(fix),
        OutputFormat::Table | OutputFormat::Pretty => {
            let status = if fix.fixed { "fixed" } else { "no fix" };
            println!(
                "{status}: lon={} lat={} alt={} speed={} heading={}",
                fix.longitude, fix.latitude, fix.altitude, fix.speed, fix.heading
            );
            match fix.timestamp() {
                Some(ts) => println!("  time: {}", ts.to_rfc3339()),
                None => println!("  time: invalid"),
            }
        }
    }
}

pub fn type_name(obj_type: ObjectType) -> String {
    match obj_type {
        ObjectType::Uint8 => "u8".to_string(),
        ObjectType::Int8 => "i8".to_string(),
        ObjectType::Uint16 => "u16".to_string(),
        ObjectType::Int16 => "i16".to_string(),
        ObjectType::Uint32 => "u32".to_string(),
        ObjectType::Int32 => "i32".to_string(),
        ObjectType::Uint64 => "u64".to_string(),
        ObjectType::Int64 => "i64".to_string(),
        ObjectType::Float32 => "f32".to_string(),
        ObjectType::Float64 => "f64".to_string(),
        ObjectType::Bin => "bin".to_string(),
        ObjectType::StrUtf8 => "str".to_string(),
        ObjectType::Unknown(code) => format!("{code:#04x}"),
    }
}

pub fn value_preview(obj: &SipfObject<'_>) -> String {
    match obj.to_value() {
        Some(ObjectValue::U8(v)) => v.to_string(),
        Some(ObjectValue::I8(v)) => v.to_string(),
        Some(ObjectValue::U16(v)) => v.to_string(),
        Some(ObjectValue::I16(v)) => v.to_string(),
        Some(ObjectValue::U32(v)) => v.to_string(),
        Some(ObjectValue::I32(v)) => v.to_string(),
        Some(ObjectValue::U64(v)) => v.to_string(),
        Some(ObjectValue::I64(v)) => v.to_string(),
        Some(ObjectValue::F32(v)) => v.to_string(),
        Some(ObjectValue::F64(v)) => v.to_string(),
        Some(ObjectValue::Str(v)) => v,
        Some(ObjectValue::Bin(_)) | None => hexcodec::encode(obj.value(), HexOrder::Forward),
    }
}

fn object_output(obj: &SipfObject<'_>) -> ObjectOutput {
    ObjectOutput {
        tag_id: obj.tag_id,
        obj_type: type_name(obj.obj_type),
        len: obj.value().len(),
        value: value_preview(obj),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_by_type() {
        let bytes = 300u16.to_le_bytes();
        let obj = SipfObject {
            tag_id: 1,
            obj_type: ObjectType::Uint16,
            value: &bytes,
        };
        assert_eq!(value_preview(&obj), "300");

        let obj = SipfObject {
            tag_id: 2,
            obj_type: ObjectType::Bin,
            value: &[0xDE, 0xAD],
        };
        assert_eq!(value_preview(&obj), "DEAD");

        let obj = SipfObject {
            tag_id: 3,
            obj_type: ObjectType::Uint32,
            value: &[0x01],
        };
        assert_eq!(value_preview(&obj), "01");
    }

    #[test]
    fn type_names() {
        assert_eq!(type_name(ObjectType::StrUtf8), "str");
        assert_eq!(type_name(ObjectType::Unknown(0x42)), "0x42");
    }
}
