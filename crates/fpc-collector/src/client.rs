//! Device command execution
//!
//! The collector only needs one capability from the transport: run a
//! query on the device and return the raw XML reply. Timeouts and retries
//! are the transport's business.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AC-3: Access Enforcement - Device access is delegated to the configured transport
//! - AU-12: Audit Record Generation - Every device query is logged

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Runs one query on the device and returns its raw reply
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandClient: Send + Sync {
    async fn run_command(&self, command: &str) -> Result<Vec<u8>, ClientError>;
}

/// Replays replies captured earlier from a device
///
/// The reply to `show chassis fpc detail` is read from
/// `<dir>/show_chassis_fpc_detail.xml`.
#[derive(Debug, Clone)]
pub struct FileClient {
    dir: PathBuf,
}

impl FileClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the captured reply for `command`
    pub fn reply_path(&self, command: &str) -> PathBuf {
        let file_name: String = command
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        self.dir.join(format!("{file_name}.xml"))
    }
}

#[async_trait]
impl CommandClient for FileClient {
    async fn run_command(&self, command: &str) -> Result<Vec<u8>, ClientError> {
        let path = self.reply_path(command);
        debug!(command, path = %path.display(), "Replaying captured reply");

        tokio::fs::read(&path)
            .await
            .map_err(|source| ClientError::MissingReply {
                command: command.to_string(),
                path: path.display().to_string(),
                source,
            })
    }
}

/// Runs queries through an external program such as `ssh <host>`
///
/// The query is passed as the last argument, piped through
/// `| display xml` so the device answers in XML.
#[derive(Debug, Clone)]
pub struct ShellClient {
    program: String,
    args: Vec<String>,
}

impl ShellClient {
    /// Build from a full argument vector, program first
    pub fn new(argv: &[String]) -> Result<Self, ClientError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ClientError::Other("empty transport command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Argument passed to the program for `command`
    pub fn device_query(command: &str) -> String {
        format!("{command} | display xml")
    }
}

#[async_trait]
impl CommandClient for ShellClient {
    async fn run_command(&self, command: &str) -> Result<Vec<u8>, ClientError> {
        debug!(program = %self.program, command, "Executing device query");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(Self::device_query(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ClientError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(command, exit_code, stderr = %stderr, "Device query failed");
            return Err(ClientError::CommandFailed {
                command: command.to_string(),
                exit_code,
                stderr,
            });
        }

        Ok(output.stdout)
    }
}
