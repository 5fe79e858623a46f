//! Metric catalog
//!
//! Names, help texts, value types and label schemas of every metric the
//! collector emits. Label order is part of the schema.

use crate::sample::SampleKind;

/// Namespace prefix used unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "junos_fpc_";

const SLOT_LABELS: &[&str] = &["target", "re_name", "slot"];
const MEMORY_LABELS: &[&str] = &["target", "re_name", "slot", "memory_type"];
const LOAD_LABELS: &[&str] = &["target", "re_name", "slot", "interval"];
const PIC_LABELS: &[&str] = &["target", "re_name", "fpc_slot", "pic_slot", "pic_type"];

/// Static description of one metric family
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    /// Name without the namespace prefix
    pub suffix: &'static str,
    pub help: &'static str,
    pub kind: SampleKind,
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Full metric name under `namespace`
    pub fn name(&self, namespace: &str) -> String {
        format!("{}{}", namespace, self.suffix)
    }
}

pub static UP: MetricDesc = MetricDesc {
    suffix: "up",
    help: "Status of the linecard (1 = Online)",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static TEMPERATURE: MetricDesc = MetricDesc {
    suffix: "temperature_celsius",
    help: "Temperature in degree celsius",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static UPTIME: MetricDesc = MetricDesc {
    suffix: "uptime_seconds",
    help: "Seconds since boot",
    kind: SampleKind::Counter,
    labels: SLOT_LABELS,
};

pub static MAX_POWER: MetricDesc = MetricDesc {
    suffix: "max_power_consumption_watt",
    help: "Maximum power consumption in Watt",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static MEMORY: MetricDesc = MetricDesc {
    suffix: "memory_bytes",
    help: "Memory size in bytes",
    kind: SampleKind::Gauge,
    labels: MEMORY_LABELS,
};

pub static CPU_TOTAL: MetricDesc = MetricDesc {
    suffix: "cpu_total",
    help: "Overall CPU utilization in percent",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static CPU_INTERRUPTS: MetricDesc = MetricDesc {
    suffix: "cpu_interrupts",
    help: "Number of CPU interrupts",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static CPU_LOAD_AVG: MetricDesc = MetricDesc {
    suffix: "cpu_load_avg",
    help: "CPU load",
    kind: SampleKind::Gauge,
    labels: LOAD_LABELS,
};

pub static HEAP_UTILIZATION: MetricDesc = MetricDesc {
    suffix: "mem_heap_utilization_percent",
    help: "Heap usage percent",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static BUFFER_UTILIZATION: MetricDesc = MetricDesc {
    suffix: "mem_buffers_utilization_percent",
    help: "Buffers usage percent",
    kind: SampleKind::Gauge,
    labels: SLOT_LABELS,
};

pub static PIC_STATUS: MetricDesc = MetricDesc {
    suffix: "pic_status",
    help: "Status of the PIC (1 = Online, 0 = Offline)",
    kind: SampleKind::Gauge,
    labels: PIC_LABELS,
};

/// Every metric the collector can emit
pub fn describe() -> [&'static MetricDesc; 11] {
    [
        &UP,
        &TEMPERATURE,
        &MEMORY,
        &UPTIME,
        &MAX_POWER,
        &PIC_STATUS,
        &CPU_TOTAL,
        &CPU_INTERRUPTS,
        &HEAP_UTILIZATION,
        &BUFFER_UTILIZATION,
        &CPU_LOAD_AVG,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<&str> = describe().iter().map(|d| d.suffix).collect();
        assert_eq!(names.len(), describe().len());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(MEMORY.name(DEFAULT_NAMESPACE), "junos_fpc_memory_bytes");
        assert_eq!(UP.name("lab_"), "lab_up");
    }

    #[test]
    fn test_only_uptime_is_a_counter() {
        for desc in describe() {
            let expected = if desc.suffix == "uptime_seconds" {
                SampleKind::Counter
            } else {
                SampleKind::Gauge
            };
            assert_eq!(desc.kind, expected, "{}", desc.suffix);
        }
    }

    #[test]
    fn test_label_schemas() {
        assert_eq!(MEMORY.labels, ["target", "re_name", "slot", "memory_type"]);
        assert_eq!(CPU_LOAD_AVG.labels, ["target", "re_name", "slot", "interval"]);
        assert_eq!(
            PIC_STATUS.labels,
            ["target", "re_name", "fpc_slot", "pic_slot", "pic_type"]
        );
    }
}
