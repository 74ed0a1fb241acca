use lldb_bridge::context::{BuildLocations, LaunchContext, MetadataSource};
use lldb_bridge::engine::{CommandInterpreter, CommandOutput};
use lldb_bridge::Error;
use std::cell::Cell;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Interpreter that records issued commands and optionally fails one of them.
#[derive(Default)]
pub struct RecordingInterpreter {
    pub commands: Vec<String>,
    pub fail_on: Option<String>,
    pub finished: bool,
}

impl RecordingInterpreter {
    pub fn failing_on(prefix: &str) -> Self {
        Self {
            fail_on: Some(prefix.to_string()),
            ..Self::default()
        }
    }
}

impl CommandInterpreter for RecordingInterpreter {
    fn run_command(&mut self, command: &str) -> Result<CommandOutput, Error> {
        self.commands.push(command.to_string());
        if let Some(prefix) = &self.fail_on {
            if command.starts_with(prefix.as_str()) {
                return Err(Error::EngineCommand {
                    command: command.to_string(),
                    message: "error: simulated failure".to_string(),
                });
            }
        }
        Ok(CommandOutput::default())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.finished = true;
        Ok(())
    }
}

/// In-memory metadata, counts how often build locations are requested.
pub struct StaticSource {
    pub launch: Option<LaunchContext>,
    pub locations: BuildLocations,
    pub build_queries: Cell<u32>,
}

impl StaticSource {
    pub fn new(launch: Option<LaunchContext>, locations: BuildLocations) -> Self {
        Self {
            launch,
            locations,
            build_queries: Cell::new(0),
        }
    }
}

impl MetadataSource for StaticSource {
    fn launch_context(&self) -> Result<LaunchContext, Error> {
        self.launch
            .clone()
            .ok_or_else(|| Error::MissingLaunchInfo(PathBuf::from("/tmp/lldb-bridge/launch_info")))
    }

    fn build_locations(&self) -> Result<BuildLocations, Error> {
        self.build_queries.set(self.build_queries.get() + 1);
        Ok(self.locations.clone())
    }
}

/// Scratch directory removed on drop.
pub struct TempDir(pub PathBuf);

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("lldb-bridge-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Write an executable shell script standing in for an external tool.
pub fn stub_executable(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
