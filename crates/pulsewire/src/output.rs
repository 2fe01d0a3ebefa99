use std::io::IsTerminal;
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pulsewire_codec::{ConsistencyTracker, Data, Message, Scalar, Timestamp, Value};
use serde::Serialize;
use serde_json::json;

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
struct ChannelOutput<'a> {
    name: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<&'a [usize]>,
    value: serde_json::Value,
    timestamp: Option<Timestamp>,
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    pulse_id: u64,
    global_timestamp: Timestamp,
    hash: &'a str,
    format_changed: bool,
    channels: Vec<ChannelOutput<'a>>,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    #[serde(flatten)]
    stats: &'a ConsistencyTracker,
    elapsed_ms: u128,
}

#[derive(Serialize)]
struct GenerateOutput<'a> {
    address: &'a str,
    sent: u64,
    last_pulse_id: Option<u64>,
}

/// Print one pulse. `channels` limits the printed channels when given.
pub fn print_message(message: &Message, channels: Option<&[String]>, format: OutputFormat) {
    let selected: Vec<(&str, &Value)> = message
        .data
        .iter()
        .filter(|(name, _)| channels.is_none_or(|wanted| wanted.iter().any(|w| w.as_str() == *name)))
        .collect();

    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                pulse_id: message.pulse_id(),
                global_timestamp: message.global_timestamp(),
                hash: message.hash(),
                format_changed: message.format_changed,
                channels: selected
                    .iter()
                    .map(|(name, value)| ChannelOutput {
                        name: *name,
                        type_name: value.value.as_ref().map(|data| data.kind().to_string()),
                        shape: value.value.as_ref().and_then(Data::as_array).map(|a| a.shape()),
                        value: value.value.as_ref().map_or(serde_json::Value::Null, data_json),
                        timestamp: value.timestamp,
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "VALUE", "TIMESTAMP"]);
            for (name, value) in &selected {
                table.add_row(vec![
                    name.to_string(),
                    value_text(value),
                    value.timestamp.map_or_else(|| "-".to_string(), timestamp_text),
                ]);
            }
            println!("{table}");
            println!(
                "pulse_id: {}  global_timestamp: {}",
                message.pulse_id(),
                timestamp_text(message.global_timestamp())
            );
        }
        OutputFormat::Pretty => {
            println!(
                "pulse_id={} hash={} channels={}{}",
                message.pulse_id(),
                message.hash(),
                message.data.len(),
                if message.format_changed { " (new format)" } else { "" }
            );
            for (name, value) in &selected {
                println!("  {name} = {}", value_text(value));
            }
        }
    }
}

pub fn print_stats(stats: &ConsistencyTracker, elapsed: Duration, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = StatsOutput {
                stats,
                elapsed_ms: elapsed.as_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STAT", "VALUE"])
                .add_row(vec!["received".to_string(), stats.received_count().to_string()])
                .add_row(vec!["missed".to_string(), stats.missed_count().to_string()])
                .add_row(vec!["duplicated".to_string(), stats.duplicate_count().to_string()])
                .add_row(vec!["reverted".to_string(), stats.reverted_count().to_string()])
                .add_row(vec![
                    "last pulse_id".to_string(),
                    stats
                        .last_pulse_id()
                        .map_or_else(|| "-".to_string(), |id| id.to_string()),
                ])
                .add_row(vec!["elapsed".to_string(), format!("{:.3}s", elapsed.as_secs_f64())]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "received={} missed={} duplicated={} reverted={} elapsed={:.3}s",
                stats.received_count(),
                stats.missed_count(),
                stats.duplicate_count(),
                stats.reverted_count(),
                elapsed.as_secs_f64()
            );
        }
    }
}

pub fn print_generated(address: &str, sent: u64, last_pulse_id: Option<u64>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = GenerateOutput {
                address,
                sent,
                last_pulse_id,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent {sent} pulses on {address}");
        }
    }
}

fn value_text(value: &Value) -> String {
    value
        .value
        .as_ref()
        .map_or_else(|| "<absent>".to_string(), Data::to_string)
}

fn timestamp_text(ts: Timestamp) -> String {
    format!("{}.{:09}", ts.sec, ts.ns)
}

fn scalar_json(scalar: Scalar) -> serde_json::Value {
    match scalar {
        Scalar::Int8(v) => json!(v),
        Scalar::UInt8(v) => json!(v),
        Scalar::Int16(v) => json!(v),
        Scalar::UInt16(v) => json!(v),
        Scalar::Int32(v) => json!(v),
        Scalar::UInt32(v) => json!(v),
        Scalar::Int64(v) => json!(v),
        Scalar::UInt64(v) => json!(v),
        Scalar::Float32(v) => json!(v),
        Scalar::Float64(v) => json!(v),
    }
}

/// Arrays are printed flat, row-major; `shape` says how to fold them.
fn data_json(data: &Data) -> serde_json::Value {
    match data {
        Data::Scalar(scalar) => scalar_json(*scalar),
        Data::Text(text) => json!(text),
        Data::Array(array) => serde_json::Value::Array(
            (0..array.len())
                .filter_map(|index| array.data().get(index))
                .map(scalar_json)
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use pulsewire_codec::Array;

    use super::*;

    #[test]
    fn data_renders_as_json() {
        assert_eq!(data_json(&Data::Scalar(Scalar::Int32(7))), json!(7));
        assert_eq!(data_json(&Data::from("hello")), json!("hello"));
        let image = Array::from_rows(vec![vec![1.0f64, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(data_json(&Data::from(image)), json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn timestamps_pad_nanoseconds() {
        assert_eq!(timestamp_text(Timestamp::new(12, 5)), "12.000000005");
    }
}
