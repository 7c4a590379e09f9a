//! JSON signal writer: an object keyed by asset.

use crate::domain::error::SignalError;
use crate::domain::pipeline::SignalMap;
use crate::ports::signal_port::SignalPort;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

pub struct JsonSignalAdapter {
    output: Option<PathBuf>,
    pretty: bool,
}

impl JsonSignalAdapter {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            output,
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn write_to<W: Write>(&self, mut writer: W, signals: &SignalMap) -> Result<(), SignalError> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, signals)
        } else {
            serde_json::to_writer(&mut writer, signals)
        };
        result.map_err(|e| SignalError::Io(io::Error::other(e)))?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl SignalPort for JsonSignalAdapter {
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
        vec![(
            "ETHUSDT".to_string(),
            PositionSignal {
                weight: -0.3,
                stop_price: Some(96.9),
                target_price: Some(91.2),
                execute_stop_price: Some(96.52),
                execute_target_price: Some(91.58),
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn compact_output() {
        let mut buf = Vec::new();
        JsonSignalAdapter::new(None)
            .compact()
            .write_to(&mut buf, &sample())
            .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "{\"ETHUSDT\":{\"weight\":-0.3,\"stop_price\":96.9,\"target_price\":91.2,\"execute_stop_price\":96.52,\"execute_target_price\":91.58}}\n"
        );
    }

    #[test]
    fn publish_to_file_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signals.json");
        JsonSignalAdapter::new(Some(path.clone()))
            .publish(&sample())
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["ETHUSDT"]["weight"], -0.3);
        assert_eq!(value["ETHUSDT"]["target_price"], 91.2);
    }

    #[test]
    fn empty_map_is_empty_object() {
        let mut buf = Vec::new();
        JsonSignalAdapter::new(None)
            .compact()
            .write_to(&mut buf, &SignalMap::default())
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{}\n");
    }
}
