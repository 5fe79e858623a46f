//! Poll orchestration
//!
//! A poll is a fixed, ordered list of steps. Each step fetches one query
//! through the [`CommandClient`], normalizes the reply, then derives
//! samples for every FPC of every routing engine before the next step
//! starts. The first failure ends the poll; samples already handed to the
//! sink stay there.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-4: System Monitoring - Periodic line-card status collection
//! - SI-11: Error Handling - Abort on first failure, error returned to caller
//! - AU-12: Audit Record Generation - Poll lifecycle logged

use tracing::{debug, info, instrument, warn};

use crate::catalog::{self, MetricDesc, DEFAULT_NAMESPACE};
use crate::client::CommandClient;
use crate::derive::{self, UnitContext};
use crate::error::{CollectorError, Result};
use crate::normalizer;
use crate::sample::{MetricSample, MetricSink};
use crate::types::ModuleSlot;

/// Per-FPC derivation function of a step
pub type DeriveFn = fn(&UnitContext<'_>, &ModuleSlot, &mut dyn MetricSink) -> Result<()>;

/// One device query and the derivation applied to its reply
#[derive(Clone, Copy)]
pub struct Step {
    pub command: &'static str,
    pub derive: DeriveFn,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("command", &self.command).finish()
    }
}

pub const FPC_DETAIL: Step = Step {
    command: "show chassis fpc detail",
    derive: derive::derive_detail,
};

pub const FPC_SUMMARY: Step = Step {
    command: "show chassis fpc",
    derive: derive::derive_summary,
};

pub const PIC_STATUS: Step = Step {
    command: "show chassis fpc pic-status",
    derive: derive::derive_sub_modules,
};

/// Steps of a poll, in execution order
pub const STEPS: [Step; 3] = [FPC_DETAIL, FPC_SUMMARY, PIC_STATUS];

/// Collects FPC and PIC metrics from one device per call
///
/// Holds no per-device state; one collector can poll many devices
/// concurrently.
#[derive(Debug, Clone)]
pub struct FpcCollector {
    namespace: String,
    steps: Vec<Step>,
}

impl Default for FpcCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FpcCollector {
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Collector emitting metric names under `namespace`
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            steps: STEPS.to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        "FPC"
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Queries issued per poll, in order
    pub fn commands(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.command).collect()
    }

    /// Descriptors of every metric this collector may emit
    pub fn describe(&self) -> [&'static MetricDesc; 11] {
        catalog::describe()
    }

    /// Run one poll against `target`, emitting samples into `sink`
    ///
    /// Returns the number of samples emitted.
    #[instrument(skip_all, fields(collector = self.name(), device = target))]
    pub async fn collect<C>(
        &self,
        client: &C,
        sink: &mut dyn MetricSink,
        target: &str,
    ) -> Result<usize>
    where
        C: CommandClient + ?Sized,
    {
        let mut emitted = 0;
        for step in &self.steps {
            match self.run_step(step, client, sink, target).await {
                Ok(count) => emitted += count,
                Err(e) => {
                    warn!(command = step.command, error = %e, "Poll aborted");
                    return Err(e);
                }
            }
        }

        info!(emitted, "Poll complete");
        Ok(emitted)
    }

    async fn run_step<C>(
        &self,
        step: &Step,
        client: &C,
        sink: &mut dyn MetricSink,
        target: &str,
    ) -> Result<usize>
    where
        C: CommandClient + ?Sized,
    {
        let raw = client.run_command(step.command).await?;
        let reply =
            normalizer::normalize(&raw).map_err(|e| CollectorError::parse(step.command, e))?;

        debug!(
            command = step.command,
            units = reply.units.len(),
            slots = reply.slot_count(),
            "Normalized reply"
        );

        let mut counter = CountingSink { inner: sink, count: 0 };
        for unit in &reply.units {
            let ctx = UnitContext {
                namespace: &self.namespace,
                target,
                re_name: &unit.name,
            };
            for slot in &unit.slots {
                (step.derive)(&ctx, slot, &mut counter)?;
            }
        }

        Ok(counter.count)
    }
}

struct CountingSink<'a> {
    inner: &'a mut dyn MetricSink,
    count: usize,
}

impl MetricSink for CountingSink<'_> {
    fn emit(&mut self, sample: MetricSample) -> Result<()> {
        self.inner.emit(sample)?;
        self.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCommandClient;
    use crate::error::ClientError;
    use mockall::predicate::eq;
    use mockall::Sequence;

    const DETAIL: &str = r#"<rpc-reply><fpc-information>
        <fpc><slot>0</slot><state>Online</state><up-time seconds="60"/></fpc>
    </fpc-information></rpc-reply>"#;
    const SUMMARY: &str = r#"<rpc-reply><fpc-information>
        <fpc><slot>0</slot><state>Offline</state></fpc>
    </fpc-information></rpc-reply>"#;
    const PICS: &str = r#"<rpc-reply><fpc-information>
        <fpc><slot>0</slot><pic><pic-slot>0</pic-slot><pic-state>Online</pic-state><pic-type>X</pic-type></pic></fpc>
    </fpc-information></rpc-reply>"#;

    #[test]
    fn test_step_order() {
        let collector = FpcCollector::new();
        assert_eq!(
            collector.commands(),
            vec![
                "show chassis fpc detail",
                "show chassis fpc",
                "show chassis fpc pic-status"
            ]
        );
        assert_eq!(collector.name(), "FPC");
        assert_eq!(collector.namespace(), "junos_fpc_");
    }

    #[test]
    fn test_describe_matches_catalog() {
        let described = FpcCollector::new().describe();
        assert_eq!(described.len(), 11);
        assert!(described
            .iter()
            .zip(catalog::describe())
            .all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[tokio::test]
    async fn test_collect_runs_steps_in_order() {
        let mut seq = Sequence::new();
        let mut client = MockCommandClient::new();
        for (command, reply) in [
            ("show chassis fpc detail", DETAIL),
            ("show chassis fpc", SUMMARY),
            ("show chassis fpc pic-status", PICS),
        ] {
            client
                .expect_run_command()
                .with(eq(command))
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(reply.as_bytes().to_vec()));
        }

        let mut samples: Vec<MetricSample> = Vec::new();
        let emitted = FpcCollector::new()
            .collect(&client, &mut samples, "router1")
            .await
            .unwrap();

        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["junos_fpc_uptime_seconds", "junos_fpc_up", "junos_fpc_pic_status"]
        );
        assert_eq!(emitted, 3);
    }

    #[tokio::test]
    async fn test_parse_failure_stops_later_steps() {
        let mut client = MockCommandClient::new();
        client
            .expect_run_command()
            .with(eq("show chassis fpc detail"))
            .times(1)
            .returning(|_| Ok(b"<rpc-reply><fpc-information>".to_vec()));
        client
            .expect_run_command()
            .with(eq("show chassis fpc"))
            .never();
        client
            .expect_run_command()
            .with(eq("show chassis fpc pic-status"))
            .never();

        let mut samples: Vec<MetricSample> = Vec::new();
        let err = FpcCollector::new()
            .collect(&client, &mut samples, "router1")
            .await
            .unwrap_err();

        assert!(matches!(err, CollectorError::Parse { ref command, .. } if command == "show chassis fpc detail"));
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_earlier_samples() {
        let mut client = MockCommandClient::new();
        client
            .expect_run_command()
            .with(eq("show chassis fpc detail"))
            .returning(|_| Ok(DETAIL.as_bytes().to_vec()));
        client
            .expect_run_command()
            .with(eq("show chassis fpc"))
            .returning(|_| Err(ClientError::Other("session closed".to_string())));
        client
            .expect_run_command()
            .with(eq("show chassis fpc pic-status"))
            .never();

        let mut samples: Vec<MetricSample> = Vec::new();
        let err = FpcCollector::new()
            .collect(&client, &mut samples, "router1")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "session closed");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].desc.suffix, "uptime_seconds");
    }

    #[tokio::test]
    async fn test_custom_namespace() {
        let mut client = MockCommandClient::new();
        client
            .expect_run_command()
            .returning(|command| match command {
                "show chassis fpc detail" => Ok(DETAIL.as_bytes().to_vec()),
                "show chassis fpc" => Ok(SUMMARY.as_bytes().to_vec()),
                _ => Ok(PICS.as_bytes().to_vec()),
            });

        let mut samples: Vec<MetricSample> = Vec::new();
        FpcCollector::with_namespace("lab_fpc_")
            .collect(&client, &mut samples, "router1")
            .await
            .unwrap();

        assert!(samples.iter().all(|s| s.name.starts_with("lab_fpc_")));
    }
}
