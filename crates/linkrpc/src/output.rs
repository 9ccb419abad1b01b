use std::io::IsTerminal;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linkrpc_codec::{Value, Values};
use linkrpc_frame::frame_types::type_name;
use linkrpc_frame::Frame;
use linkrpc_transport::serial::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
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
struct ValueOutput {
    index: usize,
    #[serde(rename = "type")]
    value_type: &'static str,
    value: serde_json::Value,
}

#[derive(Serialize)]
struct CallOutput {
    function_id: u16,
    args: Vec<ValueOutput>,
    timestamp: String,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    frame_type: u16,
    type_name: &'a str,
    size: usize,
    payload_hex: String,
}

#[derive(Serialize)]
struct PongOutput {
    seq: usize,
    rtt_ms: f64,
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    product: Option<&'a str>,
    device: bool,
}

pub fn print_call(function_id: u16, args: &Values, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = CallOutput {
                function_id,
                args: args
                    .iter()
                    .enumerate()
                    .map(|(index, value)| ValueOutput {
                        index,
                        value_type: value.value_type().name(),
                        value: value_json(value),
                    })
                    .collect(),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FUNCTION", "INDEX", "TYPE", "VALUE"]);
            if args.is_empty() {
                table.add_row(vec![function_id.to_string(), "-".into(), "-".into(), "-".into()]);
            }
            for (index, value) in args.iter().enumerate() {
                table.add_row(vec![
                    function_id.to_string(),
                    index.to_string(),
                    value.value_type().name().to_string(),
                    value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("call function={function_id} args={}", args.len());
            if !args.is_empty() {
                println!("{args}");
            }
        }
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    let payload_hex = hex::encode(&frame.payload);
    match format {
        OutputFormat::Json => print_json(&FrameOutput {
            frame_type: frame.frame_type,
            type_name: type_name(frame.frame_type),
            size: frame.size(),
            payload_hex,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "NAME", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    frame.frame_type.to_string(),
                    type_name(frame.frame_type).to_string(),
                    frame.size().to_string(),
                    payload_hex,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame type={} ({}) size={} payload={}",
                frame.frame_type,
                type_name(frame.frame_type),
                frame.size(),
                payload_hex
            );
        }
    }
}

pub fn print_pong(seq: usize, rtt: Duration, format: OutputFormat) {
    let rtt_ms = rtt.as_secs_f64() * 1000.0;
    match format {
        OutputFormat::Json => print_json(&PongOutput { seq, rtt_ms }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("pong seq={seq} time={rtt_ms:.3} ms");
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for port in ports {
                print_json(&PortOutput {
                    name: &port.name,
                    kind: port.kind,
                    product: port.product.as_deref(),
                    device: port.is_device_port(),
                });
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "PRODUCT", "DEVICE"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.product.clone().unwrap_or_else(|| "-".into()),
                    if port.is_device_port() { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports");
            }
            for port in ports {
                match &port.product {
                    Some(product) => println!("{} ({}, {product})", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(text) => serde_json::Value::from(text.as_str()),
        Value::Float32(number) => serde_json::Number::from_f64(f64::from(*number))
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        other => other
            .as_i64()
            .map_or(serde_json::Value::Null, serde_json::Value::from),
    }
}

fn print_json<T: Serialize>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
