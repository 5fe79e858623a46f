//! Prometheus text exposition of one poll
//!
//! A fresh registry is built per call, so nothing from an earlier poll
//! leaks into the output.

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Result;
use crate::sample::{MetricSample, SampleKind};

enum Family {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

/// Encode samples in the Prometheus text format
pub fn encode_text(samples: &[MetricSample]) -> Result<String> {
    let registry = gather_registry(samples)?;
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Registry holding one metric family per sample name
pub fn gather_registry(samples: &[MetricSample]) -> Result<Registry> {
    let registry = Registry::new();
    let mut families: HashMap<&str, Family> = HashMap::new();

    for sample in samples {
        let family = match families.entry(sample.name.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(register_family(&registry, sample)?),
        };

        let values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
        match family {
            Family::Counter(vec) => {
                let counter = vec.with_label_values(&values);
                counter.reset();
                counter.inc_by(sample.value);
            }
            Family::Gauge(vec) => vec.with_label_values(&values).set(sample.value),
        }
    }

    Ok(registry)
}

fn register_family(registry: &Registry, sample: &MetricSample) -> Result<Family> {
    let opts = Opts::new(sample.name.clone(), sample.desc.help);
    let family = match sample.kind() {
        SampleKind::Counter => {
            let vec = CounterVec::new(opts, sample.desc.labels)?;
            registry.register(Box::new(vec.clone()))?;
            Family::Counter(vec)
        }
        SampleKind::Gauge => {
            let vec = GaugeVec::new(opts, sample.desc.labels)?;
            registry.register(Box::new(vec.clone()))?;
            Family::Gauge(vec)
        }
    };
    Ok(family)
}
