use crate::engine::{CommandInterpreter, CommandOutput};
use crate::error::Error;
use std::io::Write;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Output format of a command script.
#[derive(Copy, Clone, PartialEq, Debug, Default, EnumString, Display, IntoStaticStr)]
pub enum ScriptFormat {
    /// One command per line, for `lldb -s <file>` or `command source <file>`.
    #[default]
    #[strum(serialize = "lines")]
    Lines,
    /// A JSON array of commands, for lldb-dap `attachCommands` or `initCommands`.
    #[strum(serialize = "json")]
    Json,
}

/// Engine that records commands instead of executing them.
///
/// LLDB stops sourcing a command file at the first failing command, so the abort-on-error
/// behaviour is kept when the script runs.
pub struct ScriptWriter<W: Write> {
    out: W,
    format: ScriptFormat,
    pending: Vec<String>,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(out: W, format: ScriptFormat) -> Self {
        Self {
            out,
            format,
            pending: vec![],
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_error(command: &str, err: impl std::fmt::Display) -> Error {
        Error::EngineCommand {
            command: command.to_string(),
            message: format!("write script: {err}"),
        }
    }
}

impl<W: Write> CommandInterpreter for ScriptWriter<W> {
    fn run_command(&mut self, command: &str) -> Result<CommandOutput, Error> {
        match self.format {
            ScriptFormat::Lines => {
                writeln!(self.out, "{command}").map_err(|e| Self::write_error(command, e))?;
            }
            ScriptFormat::Json => self.pending.push(command.to_string()),
        }
        Ok(CommandOutput::default())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.format == ScriptFormat::Json {
            let commands = std::mem::take(&mut self.pending);
            serde_json::to_writer_pretty(&mut self.out, &commands)?;
            writeln!(self.out)?;
        }
        self.out.flush()?;
        Ok(())
    }
}
