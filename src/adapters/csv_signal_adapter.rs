//! CSV signal writer.

use crate::domain::error::SignalError;
use crate::domain::pipeline::SignalMap;
use crate::ports::signal_port::SignalPort;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

const HEADER: [&str; 6] = [
    "asset",
    "weight",
    "stop_price",
    "target_price",
    "execute_stop_price",
    "execute_target_price",
];

/// Writes one row per asset to a file, or to stdout when no path is set.
pub struct CsvSignalAdapter {
    output: Option<PathBuf>,
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvSignalAdapter {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub fn write_to<W: Write>(&self, writer: W, signals: &SignalMap) -> Result<(), SignalError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let csv_err = |e: csv::Error| SignalError::Io(io::Error::other(e));

        wtr.write_record(HEADER).map_err(csv_err)?;
        for (asset, signal) in signals.iter() {
            wtr.write_record([
                asset.to_string(),
                signal.weight.to_string(),
                cell(signal.stop_price),
                cell(signal.target_price),
                cell(signal.execute_stop_price),
                cell(signal.execute_target_price),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl SignalPort for CsvSignalAdapter {
    fn publish(&self, signals: &SignalMap) -> Result<(), SignalError> {
        match &self.output {
            Some(path) => self.write_to(File::create(path)?, signals),
            None => self.write_to(io::stdout().lock(), signals),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::PositionSignal;
    use tempfile::TempDir;

    fn sample() -> SignalMap {
        vec![
            (
                "BTCUSDT".to_string(),
                PositionSignal {
                    weight: 0.7,
                    stop_price: Some(98.0),
                    target_price: Some(104.0),
                    execute_stop_price: None,
                    execute_target_price: None,
                },
            ),
            ("ETHUSDT".to_string(), PositionSignal::flat()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        CsvSignalAdapter::new(None).write_to(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "asset,weight,stop_price,target_price,execute_stop_price,execute_target_price\n\
             BTCUSDT,0.7,98,104,,\n\
             ETHUSDT,0,,,,\n"
        );
    }

    #[test]
    fn empty_map_writes_header_only() {
        let mut buf = Vec::new();
        CsvSignalAdapter::new(None)
            .write_to(&mut buf, &SignalMap::default())
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn publish_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signals.csv");
        CsvSignalAdapter::new(Some(path.clone()))
            .publish(&sample())
            .unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("BTCUSDT,0.7,98,104"));
    }
}
