//! Canonical line-card inventory model
//!
//! Every reply from the device is normalized into a [`CanonicalReply`]
//! before any metric is derived, regardless of how many routing engines
//! the device reported.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Line cards and PICs as tracked components
//! - SI-4: System Monitoring - Health attributes of each component

use std::collections::BTreeMap;
use std::fmt;

/// State string the device reports for a healthy FPC or PIC.
///
/// Compared case-sensitively and as a whole string.
pub const ONLINE: &str = "Online";

/// Name given to the synthetic control unit of a single-RE device.
pub const SINGLE_UNIT_NAME: &str = "N/A";

/// Memory technology of an FPC memory bank
///
/// Declaration order is the metric emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemoryType {
    Sram,
    Dram,
    DdrDram,
    Sdram,
    RlDram,
}

impl MemoryType {
    /// All memory types in emission order
    pub const ALL: [MemoryType; 5] = [
        MemoryType::Sram,
        MemoryType::Dram,
        MemoryType::DdrDram,
        MemoryType::Sdram,
        MemoryType::RlDram,
    ];

    /// Value of the `memory_type` label
    pub fn tag(&self) -> &'static str {
        match self {
            MemoryType::Sram => "sram",
            MemoryType::Dram => "dram",
            MemoryType::DdrDram => "ddr-dram",
            MemoryType::Sdram => "sdram",
            MemoryType::RlDram => "rl-dram",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A pluggable interface card (PIC) installed in an FPC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubModule {
    /// PIC slot within the parent FPC
    pub sub_slot_index: u32,
    /// Reported state, e.g. "Online" or "Offline"
    pub state: String,
    /// Free-text PIC type, e.g. "10x 10GE SFP+"
    pub module_type: String,
}

impl SubModule {
    /// True iff the PIC reported exactly [`ONLINE`]
    #[inline]
    pub fn is_online(&self) -> bool {
        self.state == ONLINE
    }
}

/// One flexible PIC concentrator (FPC) line card
///
/// Fields the device may omit are `Option`s: `None` means the element was
/// absent from the reply. Whether a present value is worth emitting is a
/// separate decision made in [`crate::derive`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSlot {
    pub slot_index: u32,
    pub state: String,
    pub uptime_seconds: u64,
    pub temperature_celsius: Option<i64>,
    pub max_power_watts: Option<i64>,
    /// Memory bank sizes in MiB, keyed by technology
    pub memory_by_type: BTreeMap<MemoryType, u64>,
    pub cpu_total_percent: Option<u64>,
    pub cpu_interrupt_percent: Option<u64>,
    pub cpu_load_avg_1m: Option<u64>,
    pub cpu_load_avg_5m: Option<u64>,
    pub cpu_load_avg_15m: Option<u64>,
    pub memory_heap_utilization_percent: Option<u64>,
    pub memory_buffer_utilization_percent: Option<u64>,
    /// Installed PICs in reply order
    pub sub_modules: Vec<SubModule>,
}

impl ModuleSlot {
    /// True iff the FPC reported exactly [`ONLINE`]
    #[inline]
    pub fn is_online(&self) -> bool {
        self.state == ONLINE
    }
}

/// One routing-engine context and the FPCs it reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlUnit {
    /// RE name (`re_name` label), [`SINGLE_UNIT_NAME`] on single-RE devices
    pub name: String,
    pub slots: Vec<ModuleSlot>,
}

impl ControlUnit {
    /// Wrap the FPC list of a single-RE reply
    pub fn single(slots: Vec<ModuleSlot>) -> Self {
        Self {
            name: SINGLE_UNIT_NAME.to_string(),
            slots,
        }
    }
}

/// Normalized reply to one device query
///
/// Always holds at least one [`ControlUnit`] when produced by
/// [`crate::normalizer::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalReply {
    pub units: Vec<ControlUnit>,
}

impl CanonicalReply {
    /// Total FPC count across all units
    pub fn slot_count(&self) -> usize {
        self.units.iter().map(|u| u.slots.len()).sum()
    }
}
