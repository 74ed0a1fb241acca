//! Session metadata loading.
//!
//! Everything the attach sequence needs comes from two records written or computed before the
//! debugger starts: launch info (which process, on which target) and build locations (where
//! Bazel put the execution root and output base). Both are read once and never mutated.

pub mod build;
pub mod launch;

use crate::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString, IntoStaticStr};

pub use build::{BuildToolQuery, SideChannelFiles};
pub use launch::{LaunchInfo, LaunchInfoSource};

/// Kind of debug target, the platform tag is the only discriminator between connection methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Physical device reachable through the platform transport.
    Device,
    /// Simulator or another emulated platform, holds the LLDB platform name.
    Emulated(String),
}

impl Platform {
    pub const DEVICE_TAG: &'static str = "device";

    pub fn from_tag(tag: &str) -> Result<Self, Error> {
        let tag = tag.trim();
        match tag {
            "" => Err(Error::MalformedMetadata("empty platform".to_string())),
            Self::DEVICE_TAG => Ok(Platform::Device),
            other => Ok(Platform::Emulated(other.to_string())),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Platform::Device => Self::DEVICE_TAG,
            Platform::Emulated(tag) => tag,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which process to attach to and where it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    pub platform: Platform,
    pub target_identifier: String,
    pub process_id: u32,
}

/// Bazel output locations of the current build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLocations {
    pub execution_root: PathBuf,
    pub output_base: PathBuf,
    pub workspace_root: PathBuf,
}

impl BuildLocations {
    /// Create build locations without checking that they exist.
    ///
    /// # Arguments
    ///
    /// * `execution_root`: sandbox root used as the compiler working directory
    /// * `output_base`: Bazel output base, parent of the `external` tree
    /// * `workspace_root`: source checkout, current directory if not set, relative paths are
    ///   resolved against the current directory
    pub fn new(
        execution_root: impl Into<PathBuf>,
        output_base: impl Into<PathBuf>,
        workspace_root: Option<PathBuf>,
    ) -> Result<Self, Error> {
        let workspace_root = match workspace_root {
            Some(root) if root.is_absolute() => root,
            Some(root) => std::env::current_dir()?.join(root),
            None => std::env::current_dir()?,
        };
        Ok(Self {
            execution_root: execution_root.into(),
            output_base: output_base.into(),
            workspace_root,
        })
    }

    /// Check that the paths are absolute and the build has already produced them.
    pub fn validate(self) -> Result<Self, Error> {
        for (name, path, hint) in [
            ("execution root", &self.execution_root, ", has the build run?"),
            ("output base", &self.output_base, ", has the build run?"),
            ("workspace root", &self.workspace_root, ""),
        ] {
            if !path.is_absolute() {
                return Err(Error::MalformedMetadata(format!(
                    "{name} is not absolute: {}",
                    path.display()
                )));
            }
            if !path.exists() {
                return Err(Error::MissingBuildInfo(format!(
                    "{name} {} does not exist{hint}",
                    path.display()
                )));
            }
        }
        Ok(self)
    }

    /// Directory with third-party repositories.
    pub fn external_dir(&self) -> PathBuf {
        self.output_base.join("external")
    }
}

/// A capability that produces session metadata.
pub trait MetadataSource {
    /// Load launch information. Absence is reported as [`Error::MissingLaunchInfo`].
    fn launch_context(&self) -> Result<LaunchContext, Error>;

    /// Load and validate build locations.
    fn build_locations(&self) -> Result<BuildLocations, Error>;
}

/// Strategy for locating build output.
#[derive(Copy, Clone, PartialEq, Debug, Default, EnumString, Display, IntoStaticStr)]
pub enum SourceKind {
    /// Side-channel file when it exists, build tool query otherwise.
    #[default]
    #[strum(serialize = "auto")]
    Auto,
    #[strum(serialize = "file")]
    File,
    #[strum(serialize = "query")]
    Query,
}

/// Parameters shared by both metadata strategies.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub launch: LaunchInfoSource,
    pub output_base_file: PathBuf,
    pub workspace_name: String,
    pub build_tool: String,
    pub workspace_root: Option<PathBuf>,
}

/// Instantiate the metadata strategy for given inputs.
pub fn select_source(kind: SourceKind, options: SourceOptions) -> Box<dyn MetadataSource> {
    let use_file = match kind {
        SourceKind::File => true,
        SourceKind::Query => false,
        SourceKind::Auto => options.output_base_file.exists(),
    };
    if use_file {
        log::debug!(
            target: "bridge",
            "build locations from {}",
            options.output_base_file.display()
        );
        Box::new(SideChannelFiles {
            launch: options.launch,
            output_base_file: options.output_base_file,
            workspace_name: options.workspace_name,
            workspace_root: options.workspace_root,
        })
    } else {
        log::debug!(target: "bridge", "build locations from `{} info`", options.build_tool);
        Box::new(BuildToolQuery {
            launch: options.launch,
            tool: options.build_tool,
            workspace_root: options.workspace_root,
        })
    }
}

pub(crate) fn absolute(name: &str, raw: &str) -> Result<PathBuf, Error> {
    let path = Path::new(raw.trim());
    if path.as_os_str().is_empty() {
        return Err(Error::MalformedMetadata(format!("empty {name}")));
    }
    if !path.is_absolute() {
        return Err(Error::MalformedMetadata(format!(
            "{name} is not absolute: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}
