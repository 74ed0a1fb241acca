use crate::context::{absolute, BuildLocations, LaunchContext, LaunchInfoSource, MetadataSource};
use crate::error::Error;
use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::PathBuf;
use std::process::Command;

/// Metadata written by a pre-launch step next to the launch info.
#[derive(Debug, Clone)]
pub struct SideChannelFiles {
    pub launch: LaunchInfoSource,
    /// Plain-text file with a single line: the output base.
    pub output_base_file: PathBuf,
    /// Directory name of the main repository under `execroot`.
    pub workspace_name: String,
    pub workspace_root: Option<PathBuf>,
}

impl MetadataSource for SideChannelFiles {
    fn launch_context(&self) -> Result<LaunchContext, Error> {
        self.launch.load()
    }

    fn build_locations(&self) -> Result<BuildLocations, Error> {
        let data = read_to_string(&self.output_base_file).map_err(|e| {
            Error::MissingBuildInfo(format!("read {}: {e}", self.output_base_file.display()))
        })?;
        let output_base = absolute("output base", &data)?;
        let execution_root = output_base.join("execroot").join(&self.workspace_name);

        BuildLocations::new(execution_root, output_base, self.workspace_root.clone())?.validate()
    }
}

/// Metadata obtained by asking the build tool (`bazel info`).
#[derive(Debug, Clone)]
pub struct BuildToolQuery {
    pub launch: LaunchInfoSource,
    /// Build tool executable, looked up in `PATH` when not a path.
    pub tool: String,
    /// Directory the query runs in, current directory if not set.
    pub workspace_root: Option<PathBuf>,
}

impl BuildToolQuery {
    const OUTPUT_BASE: &'static str = "output_base";
    const EXECUTION_ROOT: &'static str = "execution_root";

    fn query(&self) -> Result<String, Error> {
        let tool = which::which(&self.tool)
            .map_err(|e| Error::MissingBuildInfo(format!("{}: {e}", self.tool)))?;

        let mut cmd = Command::new(&tool);
        cmd.args(["info", Self::OUTPUT_BASE, Self::EXECUTION_ROOT]);
        if let Some(root) = &self.workspace_root {
            cmd.current_dir(root);
        }
        log::debug!(target: "bridge", "running {cmd:?}");

        let output = cmd
            .output()
            .map_err(|e| Error::MissingBuildInfo(format!("run {}: {e}", tool.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::MissingBuildInfo(format!(
                "{} info exited with {}: {}",
                self.tool,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::MissingBuildInfo(format!("{} info output: {e}", self.tool)))
    }
}

impl MetadataSource for BuildToolQuery {
    fn launch_context(&self) -> Result<LaunchContext, Error> {
        self.launch.load()
    }

    fn build_locations(&self) -> Result<BuildLocations, Error> {
        let output = self.query()?;
        let info = parse_info_output(&output);

        let field = |key: &str| {
            info.get(key)
                .ok_or_else(|| Error::MissingBuildInfo(format!("`{key}` missing in info output")))
                .and_then(|value| absolute(key, value))
        };
        let output_base = field(Self::OUTPUT_BASE)?;
        let execution_root = field(Self::EXECUTION_ROOT)?;

        BuildLocations::new(execution_root, output_base, self.workspace_root.clone())?.validate()
    }
}

/// Parse `key: value` lines as printed by `bazel info <key>...`.
fn parse_info_output(output: &str) -> HashMap<&str, &str> {
    output
        .lines()
        .filter_map(|line| line.split_once(": "))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}
