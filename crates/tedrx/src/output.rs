use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tedrx_frame::{FieldSpec, FieldWidth, Packet};
use tedrx_receiver::render_dashboard_xml;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Xml,
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

pub fn print_packet(packet: &Packet, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(packet).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in packet.fields() {
                table.add_row(vec![name.to_string(), format_value(*value)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = packet
                .fields()
                .iter()
                .map(|(name, value)| format!("{name}={}", format_value(*value)))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
        OutputFormat::Xml => {
            print!("{}", render_dashboard_xml(packet));
        }
    }
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    offset: usize,
    name: &'a str,
    width: usize,
    scale: f64,
}

/// Print a packet layout table. XML has no layout form and falls back to pretty.
pub fn print_fields(table: &[FieldSpec], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<_> = table
                .iter()
                .map(|spec| FieldOutput {
                    offset: spec.offset,
                    name: spec.name,
                    width: spec.width.bytes(),
                    scale: spec.scale,
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut out = Table::new();
            out.load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "NAME", "WIDTH", "SCALE"]);
            for spec in table {
                out.add_row(vec![
                    spec.offset.to_string(),
                    spec.name.to_string(),
                    width_label(spec.width).to_string(),
                    spec.scale.to_string(),
                ]);
            }
            println!("{out}");
        }
        OutputFormat::Pretty | OutputFormat::Xml => {
            for spec in table {
                println!(
                    "{:>4}  {:<12} {:<4} x{}",
                    spec.offset,
                    spec.name,
                    width_label(spec.width),
                    spec.scale
                );
            }
        }
    }
}

fn width_label(width: FieldWidth) -> &'static str {
    match width {
        FieldWidth::U16 => "u16",
        FieldWidth::U32 => "u32",
    }
}

fn format_value(value: f64) -> String {
    // Trim float noise from the decimal scale factors.
    let rounded = format!("{value:.6}");
    rounded
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_value_trims_scale_noise() {
        assert_eq!(format_value(0.1 * 3.0), "0.3");
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(0.00000167 * 3.0), "0.000005");
    }
}
