//! Metric derivation from the canonical structure
//!
//! One function per device query. Each walks a single FPC and emits its
//! samples to the sink in catalog order:
//!
//! | Query | Always | Conditional |
//! |-------|--------|-------------|
//! | detail | `uptime_seconds` | temperature, power, `memory_bytes` per type (value > 0) |
//! | summary | `up` | CPU, heap, buffers, 3x `cpu_load_avg` (FPC online) |
//! | pic-status | `pic_status` per PIC | - |
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-4: System Monitoring - Line-card health and utilization
//! - CM-8: System Component Inventory - Memory and PIC inventory

use crate::catalog::{self, MetricDesc};
use crate::error::Result;
use crate::sample::{MetricSample, MetricSink};
use crate::types::{ModuleSlot, SubModule};

const MIB: f64 = 1024.0 * 1024.0;

/// Label context of one control unit within one poll
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    pub namespace: &'a str,
    pub target: &'a str,
    pub re_name: &'a str,
}

impl UnitContext<'_> {
    /// Build a sample labelled `target, re_name, extra...`
    fn sample(&self, desc: &'static MetricDesc, value: f64, extra: &[&str]) -> MetricSample {
        let mut label_values = Vec::with_capacity(2 + extra.len());
        label_values.push(self.target.to_string());
        label_values.push(self.re_name.to_string());
        label_values.extend(extra.iter().map(|v| v.to_string()));
        debug_assert_eq!(label_values.len(), desc.labels.len(), "{}", desc.suffix);

        MetricSample {
            name: desc.name(self.namespace),
            desc,
            value,
            label_values,
        }
    }
}

/// Suppression policy for values the device reports as zero when unknown
///
/// A field is emitted only when present and strictly positive.
pub fn reported<T: Into<i128>>(value: Option<T>) -> Option<f64> {
    value
        .map(Into::into)
        .filter(|v| *v > 0)
        .map(|v| v as f64)
}

/// Convert a MiB figure from the device to bytes
#[inline]
pub fn mib_to_bytes(mib: u64) -> f64 {
    mib as f64 * MIB
}

fn up_value(online: bool) -> f64 {
    if online {
        1.0
    } else {
        0.0
    }
}

/// Samples for one FPC of `show chassis fpc detail`
pub fn derive_detail(
    ctx: &UnitContext<'_>,
    fpc: &ModuleSlot,
    sink: &mut dyn MetricSink,
) -> Result<()> {
    let slot = fpc.slot_index.to_string();

    sink.emit(ctx.sample(&catalog::UPTIME, fpc.uptime_seconds as f64, &[&slot]))?;

    if let Some(celsius) = reported(fpc.temperature_celsius) {
        sink.emit(ctx.sample(&catalog::TEMPERATURE, celsius, &[&slot]))?;
    }

    if let Some(watts) = reported(fpc.max_power_watts) {
        sink.emit(ctx.sample(&catalog::MAX_POWER, watts, &[&slot]))?;
    }

    for (memory_type, &mib) in &fpc.memory_by_type {
        if reported(Some(mib)).is_some() {
            sink.emit(ctx.sample(
                &catalog::MEMORY,
                mib_to_bytes(mib),
                &[&slot, memory_type.tag()],
            ))?;
        }
    }

    Ok(())
}

/// Samples for one FPC of `show chassis fpc`
///
/// Utilization metrics exist only for an online FPC.
pub fn derive_summary(
    ctx: &UnitContext<'_>,
    fpc: &ModuleSlot,
    sink: &mut dyn MetricSink,
) -> Result<()> {
    let slot = fpc.slot_index.to_string();
    let online = fpc.is_online();

    sink.emit(ctx.sample(&catalog::UP, up_value(online), &[&slot]))?;
    if !online {
        return Ok(());
    }

    let value = |v: Option<u64>| v.unwrap_or(0) as f64;

    sink.emit(ctx.sample(&catalog::CPU_TOTAL, value(fpc.cpu_total_percent), &[&slot]))?;
    sink.emit(ctx.sample(
        &catalog::CPU_INTERRUPTS,
        value(fpc.cpu_interrupt_percent),
        &[&slot],
    ))?;
    sink.emit(ctx.sample(
        &catalog::HEAP_UTILIZATION,
        value(fpc.memory_heap_utilization_percent),
        &[&slot],
    ))?;
    sink.emit(ctx.sample(
        &catalog::BUFFER_UTILIZATION,
        value(fpc.memory_buffer_utilization_percent),
        &[&slot],
    ))?;

    for (interval, avg) in [
        ("1min", fpc.cpu_load_avg_1m),
        ("5min", fpc.cpu_load_avg_5m),
        ("15min", fpc.cpu_load_avg_15m),
    ] {
        sink.emit(ctx.sample(&catalog::CPU_LOAD_AVG, value(avg), &[&slot, interval]))?;
    }

    Ok(())
}

/// Samples for every PIC of one FPC of `show chassis fpc pic-status`
///
/// Emitted whatever the parent FPC state is.
pub fn derive_sub_modules(
    ctx: &UnitContext<'_>,
    fpc: &ModuleSlot,
    sink: &mut dyn MetricSink,
) -> Result<()> {
    let slot = fpc.slot_index.to_string();
    for pic in &fpc.sub_modules {
        sink.emit(pic_sample(ctx, &slot, pic))?;
    }
    Ok(())
}

fn pic_sample(ctx: &UnitContext<'_>, fpc_slot: &str, pic: &SubModule) -> MetricSample {
    let pic_slot = pic.sub_slot_index.to_string();
    ctx.sample(
        &catalog::PIC_STATUS,
        up_value(pic.is_online()),
        &[fpc_slot, &pic_slot, &pic.module_type],
    )
}
