use crate::error::EngineError;
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::{BarField, RawBarRecord};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reads quote exports shaped like
/// `Time,Open,High,Low,Last,Volume` / `"2024-01-02 08:30:00",10.1,10.2,10.0,10.15,1200`.
/// Values are kept as text; parsing happens in the bar validator.
pub struct QuoteCsvParser;

impl QuoteCsvParser {
    pub fn load_records_from_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawBarRecord>, EngineError> {
        let file = File::open(file_path.as_ref())?;
        let records = Self::read_records(BufReader::new(file))?;
        tracing::debug!(
            path = %file_path.as_ref().display(),
            rows = records.len(),
            "Read quote CSV"
        );
        Ok(records)
    }

    pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawBarRecord>, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // footer lines carry fewer columns
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let positions: Vec<(BarField, Option<usize>)> = BarField::ALL
            .iter()
            .map(|&field| (field, Self::header_position(&headers, field.header())))
            .collect();

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|value| value.is_empty()) {
                continue;
            }
            let mut raw = RawBarRecord::default();
            for &(field, pos) in &positions {
                raw.set_field(field, pos.and_then(|p| record.get(p)).map(str::to_string));
            }
            records.push(raw);
        }
        Ok(records)
    }

    fn header_position(headers: &StringRecord, name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|header| header.trim_matches('"').eq_ignore_ascii_case(name))
    }
}
