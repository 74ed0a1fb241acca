//! LLDB command channel.
//!
//! Directives are typed commands rendered into exactly one line of LLDB command text. A
//! [`CommandInterpreter`] executes one line at a time and reports success or the engine's error.

pub mod lldb;
pub mod script;

use crate::error::Error;
use crate::sourcemap::SourceMapRule;
use std::fmt;
use std::path::PathBuf;
use strum_macros::{Display, EnumString, IntoStaticStr};

pub use lldb::LldbDriver;
pub use script::{ScriptFormat, ScriptWriter};

/// Phase of the attach handshake a directive belongs to. Phases never go backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    WorkingDirectory,
    SourceMap,
    Tuning,
    Target,
    Attach,
}

/// A single LLDB configuration or attach command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Set the platform working directory.
    WorkingDirectory(PathBuf),
    /// Insert a `target.source-map` rule before position `index`.
    SourceMapInsertBefore { index: usize, rule: SourceMapRule },
    /// Append a `target.source-map` rule.
    SourceMapAppend(SourceMapRule),
    /// Set the gdb-remote packet timeout, in seconds.
    PacketTimeout(u32),
    DeviceSelect(String),
    DeviceAttach(u32),
    PlatformSelect(String),
    PlatformConnect(String),
    ProcessAttach(u32),
}

impl Directive {
    pub fn stage(&self) -> Stage {
        match self {
            Directive::WorkingDirectory(_) => Stage::WorkingDirectory,
            Directive::SourceMapInsertBefore { .. } | Directive::SourceMapAppend(_) => {
                Stage::SourceMap
            }
            Directive::PacketTimeout(_) => Stage::Tuning,
            Directive::DeviceSelect(_)
            | Directive::PlatformSelect(_)
            | Directive::PlatformConnect(_) => Stage::Target,
            Directive::DeviceAttach(_) | Directive::ProcessAttach(_) => Stage::Attach,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::WorkingDirectory(path) => {
                write!(f, "platform settings -w {}", Quoted(&path.to_string_lossy()))
            }
            Directive::SourceMapInsertBefore { index, rule } => write!(
                f,
                "settings insert-before target.source-map {index} {} {}",
                Quoted(&rule.from),
                Quoted(&rule.to)
            ),
            Directive::SourceMapAppend(rule) => write!(
                f,
                "settings append target.source-map {} {}",
                Quoted(&rule.from),
                Quoted(&rule.to)
            ),
            Directive::PacketTimeout(secs) => {
                write!(f, "settings set plugin.process.gdb-remote.packet-timeout {secs}")
            }
            Directive::DeviceSelect(id) => write!(f, "device select {id}"),
            Directive::DeviceAttach(pid) => write!(f, "device process attach --pid {pid}"),
            Directive::PlatformSelect(tag) => write!(f, "platform select {tag}"),
            Directive::PlatformConnect(id) => write!(f, "platform connect {id}"),
            Directive::ProcessAttach(pid) => write!(f, "process attach --pid {pid}"),
        }
    }
}

/// Double-quoted LLDB argument.
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("\"")
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub output: Option<String>,
}

/// Debugging engine command channel.
pub trait CommandInterpreter {
    /// Run one command and wait for its completion.
    ///
    /// # Arguments
    ///
    /// * `command`: single line of command text
    ///
    /// Returns [`Error::EngineCommand`] with the engine's error text if the command fails.
    fn run_command(&mut self, command: &str) -> Result<CommandOutput, Error>;

    /// Called once after the last command of a successful sequence.
    fn finish(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: CommandInterpreter + ?Sized> CommandInterpreter for &mut T {
    fn run_command(&mut self, command: &str) -> Result<CommandOutput, Error> {
        (**self).run_command(command)
    }

    fn finish(&mut self) -> Result<(), Error> {
        (**self).finish()
    }
}

impl<T: CommandInterpreter + ?Sized> CommandInterpreter for Box<T> {
    fn run_command(&mut self, command: &str) -> Result<CommandOutput, Error> {
        (**self).run_command(command)
    }

    fn finish(&mut self) -> Result<(), Error> {
        (**self).finish()
    }
}

/// Available engines.
#[derive(Copy, Clone, PartialEq, Debug, Default, EnumString, Display, IntoStaticStr)]
pub enum EngineKind {
    /// Emit commands for `lldb -s`, `command source` or lldb-dap.
    #[default]
    #[strum(serialize = "script")]
    Script,
    /// Drive an `lldb` process directly.
    #[strum(serialize = "lldb")]
    Lldb,
}
