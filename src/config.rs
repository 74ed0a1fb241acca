use crate::error::Error;
use crate::muted_error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

pub const DEFAULT_LAUNCH_INFO: &str = "/tmp/lldb-bridge/launch_info";
pub const DEFAULT_OUTPUT_BASE_FILE: &str = "/tmp/lldb-bridge/output_base";

/// Bridge configuration, every field may be overridden from the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// JSON file written by the pre-launch step (platform, udid, pid).
    pub launch_info: PathBuf,
    /// Plain-text file holding the Bazel output base.
    pub output_base_file: PathBuf,
    /// Build tool queried with `info` when no output base file exists.
    pub build_tool: String,
    /// Name of the main repository directory under `<output_base>/execroot`.
    pub workspace_name: String,
    /// Value for `plugin.process.gdb-remote.packet-timeout`, in seconds.
    pub packet_timeout: u32,
    /// LLDB executable driven by the `lldb` engine.
    pub lldb: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            launch_info: PathBuf::from(DEFAULT_LAUNCH_INFO),
            output_base_file: PathBuf::from(DEFAULT_OUTPUT_BASE_FILE),
            build_tool: "bazel".to_string(),
            workspace_name: "_main".to_string(),
            packet_timeout: 300,
            lldb: "lldb".to_string(),
        }
    }
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/lldb-bridge/config.toml";

    /// Load configuration.
    ///
    /// Without an explicit path the file from the home directory is used if present, otherwise
    /// defaults are returned. An explicit path must be readable.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            None => {
                let Some(home) = home::home_dir() else {
                    return Ok(Self::default());
                };
                let path = home.join(Self::DEFAULT_PATH);
                let Some(data) = muted_error!(read_to_string(&path), "default config:") else {
                    return Ok(Self::default());
                };
                Self::parse(&path, &data)
            }
            Some(path) => {
                let data = read_to_string(path)?;
                Self::parse(path, &data)
            }
        }
    }

    fn parse(path: &Path, data: &str) -> Result<Self, Error> {
        toml::de::from_str(data).map_err(|e| Error::Config(path.to_path_buf(), e))
    }
}
