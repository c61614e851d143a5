//! Field splitting and coercion helpers for single log lines

use csv::{ReaderBuilder, StringRecord};

/// Split one line into trimmed fields.
///
/// Quoted fields are honoured through the `csv` reader so that a comma
/// inside quotes stays data. Lines with an unbalanced quote, or delimiters
/// the reader cannot take, fall back to a plain split.
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Vec::new();
    }

    let balanced = line.matches('"').count() % 2 == 0;
    if delimiter.is_ascii() && balanced {
        if let Some(record) = read_record(line, delimiter as u8) {
            return record.iter().map(|field| field.trim().to_string()).collect();
        }
    }

    line.split(delimiter)
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .collect()
}

fn read_record(line: &str, delimiter: u8) -> Option<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Some(record),
        _ => None,
    }
}

/// Coerce a distance field, substituting 0.0 for anything non-numeric
pub fn coerce_distance(raw: &str) -> f64 {
    let value = raw.trim().trim_end_matches('m').trim();
    value
        .parse::<f64>()
        .or_else(|_| value.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|distance| distance.is_finite())
        .unwrap_or(0.0)
}

/// Field at `index`, or an empty string
pub fn field_at(fields: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| fields.get(i))
        .map(String::as_str)
        .unwrap_or("")
}
