//! Line-card status collector for Junos devices
//!
//! This crate polls a Junos device for the health and inventory of its
//! flexible PIC concentrators (FPCs) and their PICs, and turns the replies
//! into Prometheus metric samples.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-12 | Audit Record Generation | Every device query and poll outcome logged |
//! | CM-6 | Configuration Settings | Validated YAML configuration |
//! | CM-8 | System Component Inventory | FPC, memory and PIC inventory metrics |
//! | SI-4 | System Monitoring | Line-card state, temperature and utilization |
//! | SI-10 | Input Validation | Device replies checked before decoding |
//! | SI-11 | Error Handling | Structured error types, abort on first failure |
//!
//! # Architecture
//!
//! ```text
//! +-----------------+     +--------------------------------------+     +-------------+
//! |  Junos device   |     |            FpcCollector              |     |    sink     |
//! |                 |     |                                      |     |             |
//! | fpc detail      |---->| CommandClient -> normalize -> derive |---->| Vec / mpsc  |
//! | fpc             |     |   (3 steps, fixed order, abort on    |     |      |      |
//! | fpc pic-status  |     |    first failure)                    |     |      v      |
//! |                 |     |                                      |     | encode_text |
//! +-----------------+     +--------------------------------------+     +-------------+
//! ```
//!
//! # Example
//!
//! ```ignore
//! use junos_fpc_collector::{export, FileClient, FpcCollector, MetricSample};
//!
//! let client = FileClient::new("/var/lib/fpc-collector/router1");
//! let mut samples: Vec<MetricSample> = Vec::new();
//! FpcCollector::new().collect(&client, &mut samples, "router1").await?;
//! print!("{}", export::encode_text(&samples)?);
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod derive;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod pipeline;
pub mod sample;
pub mod types;

pub use catalog::{MetricDesc, DEFAULT_NAMESPACE};
pub use client::{CommandClient, FileClient, ShellClient};
pub use config::{CollectorConfig, TargetConfig};
pub use error::{ClientError, CollectorError, ParseError, Result};
pub use normalizer::{normalize, ReplyShape};
pub use pipeline::{FpcCollector, Step, STEPS};
pub use sample::{MetricSample, MetricSink, SampleKind};
pub use types::{
    CanonicalReply, ControlUnit, MemoryType, ModuleSlot, SubModule, ONLINE, SINGLE_UNIT_NAME,
};
