//! Reply normalization
//!
//! A Junos device answers the FPC queries in one of two layouts:
//!
//! ```text
//! multi-RE                                  single-RE
//! <rpc-reply>                               <rpc-reply>
//!   <multi-routing-engine-results>            <fpc-information>
//!     <multi-routing-engine-item>               <fpc>...</fpc>
//!       <re-name>fpc0</re-name>               </fpc-information>
//!       <fpc-information>                   </rpc-reply>
//!         <fpc>...</fpc>
//!       </fpc-information>
//!     </multi-routing-engine-item>
//!   </multi-routing-engine-results>
//! </rpc-reply>
//! ```
//!
//! The layout is decided from the element structure (root element, or the
//! first known child of `rpc-reply`), never from a substring search on the
//! raw bytes. Other children of `rpc-reply`, such as `<xnm:warning>` or
//! `<cli>`, are skipped. A single-RE reply is wrapped into one control unit
//! named [`SINGLE_UNIT_NAME`](crate::types::SINGLE_UNIT_NAME).
//!
//! Numeric fields are read leniently: surrounding whitespace is trimmed and
//! an empty value decodes as absent.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Replies are fully checked for well-formedness
//! - CM-8: System Component Inventory - Device inventory decoded into typed records

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::types::{CanonicalReply, ControlUnit, MemoryType, ModuleSlot, SubModule};

const RPC_REPLY: &str = "rpc-reply";
const MULTI_ENGINE_RESULTS: &str = "multi-routing-engine-results";
const FPC_INFORMATION: &str = "fpc-information";

/// Layout of a raw reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// One entry per routing engine
    MultiUnit {
        /// Envelope sits inside `rpc-reply`
        wrapped: bool,
    },
    /// Bare FPC list
    SingleUnit {
        /// FPC list sits inside `rpc-reply`
        wrapped: bool,
    },
}

/// Normalize one raw reply into the canonical multi-unit structure
///
/// Pure: the same bytes always give the same result. A multi-RE envelope
/// with no routing engine entry is an error, not a reply with zero control
/// units.
pub fn normalize(raw: &[u8]) -> Result<CanonicalReply, ParseError> {
    let text = std::str::from_utf8(raw)?;

    let units = match detect_shape(text)? {
        ReplyShape::MultiUnit { wrapped } => {
            let results = if wrapped {
                quick_xml::de::from_str::<MultiEngineReply>(text)?.results
            } else {
                quick_xml::de::from_str::<MultiEngineResults>(text)?
            };
            if results.items.is_empty() {
                return Err(ParseError::EmptyEnvelope);
            }
            results
                .items
                .into_iter()
                .map(|item| ControlUnit {
                    name: item.name,
                    slots: item.information.into_slots(),
                })
                .collect()
        }
        ReplyShape::SingleUnit { wrapped } => {
            let information = if wrapped {
                quick_xml::de::from_str::<SingleEngineReply>(text)?.information
            } else {
                quick_xml::de::from_str::<FpcInformation>(text)?
            };
            vec![ControlUnit::single(information.into_slots())]
        }
    };

    Ok(CanonicalReply { units })
}

/// Determine the reply layout from its outer elements
///
/// Walks the whole document so that a reply which is not well-formed is
/// rejected here, before any field is decoded.
pub fn detect_shape(text: &str) -> Result<ReplyShape, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    let mut first_child: Option<String> = None;
    let mut shape_child: Option<String> = None;
    let mut open: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                note_element(&mut root, &mut first_child, &mut shape_child, open.len(), &name);
                open.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                note_element(&mut root, &mut first_child, &mut shape_child, open.len(), &name);
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(ParseError::Truncated(unclosed));
    }

    let root = root.ok_or(ParseError::Empty)?;
    let (outer, wrapped) = if root == RPC_REPLY {
        match (shape_child, first_child) {
            (Some(child), _) | (None, Some(child)) => (child, true),
            (None, None) => return Err(ParseError::UnknownShape(root)),
        }
    } else {
        (root, false)
    };

    match outer.as_str() {
        MULTI_ENGINE_RESULTS => Ok(ReplyShape::MultiUnit { wrapped }),
        FPC_INFORMATION => Ok(ReplyShape::SingleUnit { wrapped }),
        _ => Err(ParseError::UnknownShape(outer)),
    }
}

fn is_shape_element(name: &str) -> bool {
    name == MULTI_ENGINE_RESULTS || name == FPC_INFORMATION
}

fn note_element(
    root: &mut Option<String>,
    first_child: &mut Option<String>,
    shape_child: &mut Option<String>,
    depth: usize,
    name: &str,
) {
    match depth {
        0 if root.is_none() => *root = Some(name.to_string()),
        1 => {
            if first_child.is_none() {
                *first_child = Some(name.to_string());
            }
            if shape_child.is_none() && is_shape_element(name) {
                *shape_child = Some(name.to_string());
            }
        }
        _ => {}
    }
}

/// Decode a number from element or attribute text
///
/// Whitespace around the value is ignored; an empty value is `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

// Wire format. Element and attribute names are matched by local name, so
// `junos:seconds` decodes as `@seconds`.

#[derive(Debug, Deserialize)]
struct MultiEngineReply {
    #[serde(rename = "multi-routing-engine-results")]
    results: MultiEngineResults,
}

#[derive(Debug, Default, Deserialize)]
struct MultiEngineResults {
    #[serde(rename = "multi-routing-engine-item", default)]
    items: Vec<EngineItem>,
}

#[derive(Debug, Deserialize)]
struct EngineItem {
    #[serde(rename = "re-name", default)]
    name: String,
    #[serde(rename = "fpc-information", default)]
    information: FpcInformation,
}

#[derive(Debug, Deserialize)]
struct SingleEngineReply {
    #[serde(rename = "fpc-information")]
    information: FpcInformation,
}

#[derive(Debug, Default, Deserialize)]
struct FpcInformation {
    #[serde(rename = "fpc", default)]
    fpcs: Vec<FpcEntry>,
}

impl FpcInformation {
    fn into_slots(self) -> Vec<ModuleSlot> {
        self.fpcs.into_iter().map(ModuleSlot::from).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FpcEntry {
    #[serde(deserialize_with = "lenient")]
    slot: Option<u32>,
    state: String,
    temperature: Option<Temperature>,
    #[serde(rename = "up-time")]
    up_time: Option<UpTime>,
    #[serde(rename = "max-power-consumption", deserialize_with = "lenient")]
    max_power_consumption: Option<i64>,

    #[serde(rename = "memory-sram-size", deserialize_with = "lenient")]
    memory_sram_size: Option<u64>,
    #[serde(rename = "memory-dram-size", deserialize_with = "lenient")]
    memory_dram_size: Option<u64>,
    #[serde(rename = "memory-ddr-dram-size", deserialize_with = "lenient")]
    memory_ddr_dram_size: Option<u64>,
    #[serde(rename = "memory-sdram-size", deserialize_with = "lenient")]
    memory_sdram_size: Option<u64>,
    #[serde(rename = "memory-rldram-size", deserialize_with = "lenient")]
    memory_rldram_size: Option<u64>,

    #[serde(rename = "cpu-total", deserialize_with = "lenient")]
    cpu_total: Option<u64>,
    #[serde(rename = "cpu-interrupt", deserialize_with = "lenient")]
    cpu_interrupt: Option<u64>,
    #[serde(rename = "cpu-1min-avg", deserialize_with = "lenient")]
    cpu_1min_avg: Option<u64>,
    #[serde(rename = "cpu-5min-avg", deserialize_with = "lenient")]
    cpu_5min_avg: Option<u64>,
    #[serde(rename = "cpu-15min-avg", deserialize_with = "lenient")]
    cpu_15min_avg: Option<u64>,
    #[serde(rename = "memory-heap-utilization", deserialize_with = "lenient")]
    memory_heap_utilization: Option<u64>,
    #[serde(rename = "memory-buffer-utilization", deserialize_with = "lenient")]
    memory_buffer_utilization: Option<u64>,

    #[serde(rename = "pic")]
    pics: Vec<PicEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Temperature {
    #[serde(rename = "@celsius", default, deserialize_with = "lenient")]
    celsius: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct UpTime {
    #[serde(rename = "@seconds", default, deserialize_with = "lenient")]
    seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PicEntry {
    #[serde(rename = "pic-slot", deserialize_with = "lenient")]
    pic_slot: Option<u32>,
    #[serde(rename = "pic-state")]
    pic_state: String,
    #[serde(rename = "pic-type")]
    pic_type: String,
}

impl From<FpcEntry> for ModuleSlot {
    fn from(fpc: FpcEntry) -> Self {
        let memory_by_type: BTreeMap<MemoryType, u64> = [
            (MemoryType::Sram, fpc.memory_sram_size),
            (MemoryType::Dram, fpc.memory_dram_size),
            (MemoryType::DdrDram, fpc.memory_ddr_dram_size),
            (MemoryType::Sdram, fpc.memory_sdram_size),
            (MemoryType::RlDram, fpc.memory_rldram_size),
        ]
        .into_iter()
        .filter_map(|(kind, size)| size.map(|size| (kind, size)))
        .collect();

        Self {
            slot_index: fpc.slot.unwrap_or(0),
            state: fpc.state,
            uptime_seconds: fpc.up_time.and_then(|t| t.seconds).unwrap_or(0),
            temperature_celsius: fpc.temperature.and_then(|t| t.celsius),
            max_power_watts: fpc.max_power_consumption,
            memory_by_type,
            cpu_total_percent: fpc.cpu_total,
            cpu_interrupt_percent: fpc.cpu_interrupt,
            cpu_load_avg_1m: fpc.cpu_1min_avg,
            cpu_load_avg_5m: fpc.cpu_5min_avg,
            cpu_load_avg_15m: fpc.cpu_15min_avg,
            memory_heap_utilization_percent: fpc.memory_heap_utilization,
            memory_buffer_utilization_percent: fpc.memory_buffer_utilization,
            sub_modules: fpc.pics.into_iter().map(SubModule::from).collect(),
        }
    }
}

impl From<PicEntry> for SubModule {
    fn from(pic: PicEntry) -> Self {
        Self {
            sub_slot_index: pic.pic_slot.unwrap_or(0),
            state: pic.pic_state,
            module_type: pic.pic_type,
        }
    }
}
