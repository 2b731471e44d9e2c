//! Output formatting module

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ErrorOutput, OutputFormat};

/// Print output in the configured format
pub fn print_output<T: Serialize>(data: &T, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json_pretty(data),
        OutputFormat::Compact => print_compact(data),
        OutputFormat::Text => print_text(&serde_json::to_value(data)?, &[]),
    }
}

/// Print a collection; `columns` picks the properties shown in text mode
pub fn print_list(items: &[Value], format: &OutputFormat, columns: &[&str]) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if items.is_empty() {
                info("No items found");
                return Ok(());
            }
            table_header(columns);
            for item in items {
                print_row(item, columns);
            }
            Ok(())
        }
        _ => print_output(&items, format),
    }
}

/// Print as pretty JSON
pub fn print_json_pretty<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print compact output
pub fn print_compact<T: Serialize>(data: &T) -> Result<()> {
    let value = serde_json::to_value(data)?;
    print_value_compact(&value, 0);
    Ok(())
}

fn print_text(value: &Value, columns: &[&str]) -> Result<()> {
    match value {
        Value::Array(items) => {
            let derived: Vec<String>;
            let columns: Vec<&str> = if columns.is_empty() {
                derived = items
                    .first()
                    .and_then(|v| v.as_object())
                    .map(|obj| obj.keys().cloned().collect())
                    .unwrap_or_default();
                derived.iter().map(String::as_str).collect()
            } else {
                columns.to_vec()
            };
            print_list(items, &OutputFormat::Text, &columns)
        }
        Value::Object(map) => {
            for (key, val) in map {
                println!("{}: {}", key.cyan(), plain_value(val));
            }
            Ok(())
        }
        other => {
            println!("{}", plain_value(other));
            Ok(())
        }
    }
}

fn print_value_compact(value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}{}: ", prefix, key.cyan());
                        print_value_compact(val, indent + 1);
                    }
                    _ => {
                        println!("{}{}: {}", prefix, key.cyan(), format_value(val));
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                println!("{}[{}]", prefix, i.to_string().dimmed());
                print_value_compact(val, indent + 1);
            }
        }
        _ => {
            println!("{}{}", prefix, format_value(value));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".dimmed().to_string(),
        Value::Bool(b) => {
            if *b {
                "true".green().to_string()
            } else {
                "false".red().to_string()
            }
        }
        Value::Number(n) => n.to_string().yellow().to_string(),
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

/// Cell text without colors
pub fn plain_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

/// Print success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green().bold(), msg);
}

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print error message to the configured stream
pub fn report_error(msg: &str, stream: ErrorOutput) {
    match stream {
        ErrorOutput::Stderr => error(msg),
        ErrorOutput::Stdout => println!("{} {}", "✗".red().bold(), msg),
    }
}

/// Print warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print info message
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a table header
pub fn table_header(columns: &[&str]) {
    let header: Vec<String> = columns
        .iter()
        .map(|c| c.bold().underline().to_string())
        .collect();
    println!("{}", header.join("\t"));
}

/// Print one object as a table row
pub fn print_row(item: &Value, columns: &[&str]) {
    println!("{}", row_cells(item, columns).join("\t"));
}

fn row_cells(item: &Value, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .map(|column| item.get(*column).map(plain_value).unwrap_or_default())
        .collect()
}
