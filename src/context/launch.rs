use crate::context::{LaunchContext, Platform};
use crate::error::Error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::PathBuf;

/// Pid as written by the pre-launch step, either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum RawPid {
    Number(i64),
    Text(String),
}

/// Launch info record as persisted on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LaunchInfo {
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    udid: Option<String>,
    #[serde(default)]
    pid: Option<RawPid>,
}

impl LaunchInfo {
    /// Create launch info from values supplied directly by the host.
    pub fn new(platform: impl Into<String>, udid: impl Into<String>, pid: i64) -> Self {
        Self {
            platform: Some(platform.into()),
            udid: Some(udid.into()),
            pid: Some(RawPid::Number(pid)),
        }
    }

    pub fn parse(data: &str) -> Result<Self, Error> {
        serde_json::from_str(data)
            .map_err(|e| Error::MalformedMetadata(format!("launch info is not valid JSON: {e}")))
    }

    /// Check required fields and convert into a [`LaunchContext`].
    pub fn into_context(self) -> Result<LaunchContext, Error> {
        let platform = self
            .platform
            .ok_or_else(|| missing_field("platform"))
            .and_then(|tag| Platform::from_tag(&tag))?;

        let target_identifier = self
            .udid
            .map(|udid| udid.trim().to_string())
            .filter(|udid| !udid.is_empty())
            .ok_or_else(|| missing_field("udid"))?;

        let raw_pid = match self.pid.ok_or_else(|| missing_field("pid"))? {
            RawPid::Number(n) => n,
            RawPid::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Error::MalformedMetadata(format!("pid is not a number: {s:?}")))?,
        };
        // pid 0 and negative pids address process groups when signalled
        let process_id = u32::try_from(raw_pid)
            .ok()
            .filter(|&pid| pid > 0 && pid <= i32::MAX as u32)
            .ok_or_else(|| Error::MalformedMetadata(format!("invalid pid {raw_pid}")))?;

        Ok(LaunchContext {
            platform,
            target_identifier,
            process_id,
        })
    }
}

fn missing_field(name: &str) -> Error {
    Error::MalformedMetadata(format!("launch info has no `{name}`"))
}

/// Where launch info comes from.
#[derive(Debug, Clone)]
pub enum LaunchInfoSource {
    /// JSON file written by the pre-launch step.
    File(PathBuf),
    /// Values passed by the invoking host.
    Provided(LaunchInfo),
}

impl LaunchInfoSource {
    pub fn load(&self) -> Result<LaunchContext, Error> {
        match self {
            LaunchInfoSource::File(path) => {
                let data = read_to_string(path).map_err(|e| {
                    log::debug!(target: "bridge", "read {}: {e}", path.display());
                    Error::MissingLaunchInfo(path.clone())
                })?;
                let context = LaunchInfo::parse(&data)?.into_context()?;
                log::info!(target: "bridge", "launch info loaded from {}", path.display());
                Ok(context)
            }
            LaunchInfoSource::Provided(info) => info.clone().into_context(),
        }
    }
}
