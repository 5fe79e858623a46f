//! Metric samples and the sink they are handed to
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-4: System Monitoring - Samples are the collector's monitoring output
//! - AU-6: Audit Record Review - Samples carry full label context for analysis

use std::sync::mpsc;

use crate::catalog::MetricDesc;
use crate::error::{CollectorError, Result};

/// Prometheus value type of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Counter,
    Gauge,
}

/// One (name, type, value, labels) tuple for the monitoring pipeline
///
/// Label values are stored in the order of [`MetricDesc::labels`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Full metric name including the namespace prefix
    pub name: String,
    pub desc: &'static MetricDesc,
    pub value: f64,
    pub label_values: Vec<String>,
}

impl MetricSample {
    pub fn kind(&self) -> SampleKind {
        self.desc.kind
    }

    /// Label (name, value) pairs in schema order
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.desc
            .labels
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Value of one label, if the metric has it
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Receiver of emitted samples
///
/// Called once per sample, in emission order. A sink that applies
/// backpressure blocks the caller.
pub trait MetricSink: Send {
    fn emit(&mut self, sample: MetricSample) -> Result<()>;
}

impl MetricSink for Vec<MetricSample> {
    fn emit(&mut self, sample: MetricSample) -> Result<()> {
        self.push(sample);
        Ok(())
    }
}

impl MetricSink for mpsc::Sender<MetricSample> {
    fn emit(&mut self, sample: MetricSample) -> Result<()> {
        self.send(sample).map_err(disconnected)
    }
}

impl MetricSink for mpsc::SyncSender<MetricSample> {
    fn emit(&mut self, sample: MetricSample) -> Result<()> {
        self.send(sample).map_err(disconnected)
    }
}

fn disconnected(err: mpsc::SendError<MetricSample>) -> CollectorError {
    CollectorError::Sink {
        metric: err.0.name,
        message: "receiver disconnected".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn sample() -> MetricSample {
        MetricSample {
            name: "junos_fpc_up".to_string(),
            desc: &catalog::UP,
            value: 1.0,
            label_values: vec!["router1".into(), "N/A".into(), "0".into()],
        }
    }

    #[test]
    fn test_labels_follow_schema_order() {
        let s = sample();
        let labels: Vec<(&str, &str)> = s.labels().collect();
        assert_eq!(
            labels,
            vec![("target", "router1"), ("re_name", "N/A"), ("slot", "0")]
        );
        assert_eq!(s.label("slot"), Some("0"));
        assert_eq!(s.label("interval"), None);
        assert_eq!(s.kind(), SampleKind::Gauge);
    }

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = mpsc::channel();
        tx.emit(sample()).unwrap();
        assert_eq!(rx.recv().unwrap().value, 1.0);
    }

    #[test]
    fn test_disconnected_sink_fails() {
        let (mut tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        let err = tx.emit(sample()).unwrap_err();
        assert!(matches!(err, CollectorError::Sink { ref metric, .. } if metric == "junos_fpc_up"));
    }
}
