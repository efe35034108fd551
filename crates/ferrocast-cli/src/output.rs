use ferrocast_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(envelope)),
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> String {
    let meta = &envelope.meta;
    let mut out = String::new();
    out.push_str(&format!("run_id      : {}\n", meta.run_id));
    out.push_str(&format!("generated_at: {}\n", meta.generated_at));
    if let Some(symbol) = &meta.symbol {
        out.push_str(&format!("symbol      : {symbol}\n"));
    }
    out.push_str(&format!("source      : {}\n", meta.source));
    out.push_str(&format!("latency_ms  : {}\n", meta.latency_ms));
    out.push_str(&format!("cache_hit   : {}\n", meta.cache_hit));

    if !meta.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &meta.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    if let Value::Object(fields) = &envelope.data {
        for (name, value) in fields {
            render_field(&mut out, name, value);
        }
    }
    out
}

/// Arrays of flat objects become aligned rows; everything else prints inline.
fn render_field(out: &mut String, name: &str, value: &Value) {
    let Value::Array(items) = value else {
        out.push_str(&format!("{name}: {}\n", scalar(value)));
        return;
    };

    out.push_str(&format!("{name}:\n"));
    let headers: Vec<&String> = match items.first() {
        Some(Value::Object(first)) => first.keys().collect(),
        _ => {
            for item in items {
                out.push_str(&format!("  {}\n", scalar(item)));
            }
            return;
        }
    };

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            headers
                .iter()
                .map(|key| item.get(key.as_str()).map(scalar).unwrap_or_default())
                .collect()
        })
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain([header.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect();
        format!("  {}\n", padded.join("  "))
    };
    out.push_str(&line(headers.iter().map(|h| h.as_str()).collect()));
    for row in &rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => format!("{float:.4}"),
            _ => number.to_string(),
        },
        Value::Null => String::from("-"),
        other => other.to_string(),
    }
}
