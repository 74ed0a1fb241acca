use crate::engine::{CommandInterpreter, CommandOutput};
use crate::error::Error;
use crate::weak_error;
use serde::Deserialize;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;

const MARKER_PREFIX: &str = "__lldb_bridge_";

/// Command result reported by the Python shim.
#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Engine backed by a live `lldb` process.
///
/// Every command goes through `SBCommandInterpreter::HandleCommand` inside LLDB's embedded
/// Python, which prints the outcome as a single JSON line tagged with a per-session marker.
pub struct LldbDriver {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    session: String,
}

impl LldbDriver {
    /// Start LLDB without user init files.
    ///
    /// # Arguments
    ///
    /// * `lldb`: executable name or path, looked up in `PATH` when not a path
    pub fn spawn(lldb: &str) -> Result<Self, Error> {
        let program = which::which(lldb).unwrap_or_else(|_| PathBuf::from(lldb));
        let mut child = Command::new(&program)
            .args(["--no-lldbinit", "--no-use-colors"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        log::info!(target: "engine", "started {} (pid {})", program.display(), child.id());

        let stdin = child.stdin.take().ok_or_else(|| closed_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| closed_pipe("stdout"))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            session: format!("{}__", uuid::Uuid::new_v4().simple()),
        })
    }

    /// Line prefix of a command result.
    fn marker(&self) -> String {
        format!("{MARKER_PREFIX}{}", self.session)
    }

    fn shim(&self, command: &str) -> Result<String, Error> {
        // a JSON string is a valid Python string literal
        let literal = serde_json::to_string(command)?;
        // the marker is concatenated by Python, so LLDB's command echo never carries it whole
        Ok(format!(
            "script -l python -- import json; __r = lldb.SBCommandReturnObject(); \
             lldb.debugger.GetCommandInterpreter().HandleCommand({literal}, __r); \
             print({MARKER_PREFIX:?} + {session:?} + json.dumps({{\"ok\": __r.Succeeded(), \
             \"output\": __r.GetOutput(), \"error\": __r.GetError()}}))",
            session = self.session,
        ))
    }

    fn read_reply(&mut self, command: &str) -> Result<Reply, Error> {
        let marker = self.marker();
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(Error::EngineCommand {
                    command: command.to_string(),
                    message: "lldb exited before reporting a result".to_string(),
                });
            }
            if let Some(payload) = line.strip_prefix(&marker) {
                return serde_json::from_str(payload.trim_end()).map_err(|e| {
                    Error::EngineCommand {
                        command: command.to_string(),
                        message: format!("unreadable result from lldb: {e}"),
                    }
                });
            }
            // anything else is LLDB chatter (prompts, script echo)
            log::trace!(target: "engine", "{}", line.trim_end());
        }
    }

    /// Hand the configured session over to the user and wait until LLDB exits.
    pub fn interact(mut self) -> Result<ExitStatus, Error> {
        let mut stdin = self.stdin;
        let input = thread::spawn(move || {
            let _ = io::copy(&mut io::stdin().lock(), &mut stdin);
        });
        let mut stdout = self.stdout;
        let output = thread::spawn(move || {
            let _ = io::copy(&mut stdout, &mut io::stdout().lock());
        });

        let status = self.child.wait()?;
        weak_error!(output.join().map_err(|_| "output thread panicked"));
        // the input thread blocks on our stdin until the user closes it
        drop(input);
        Ok(status)
    }
}

impl CommandInterpreter for LldbDriver {
    fn run_command(&mut self, command: &str) -> Result<CommandOutput, Error> {
        let shim = self.shim(command)?;
        writeln!(self.stdin, "{shim}")?;
        self.stdin.flush()?;

        let reply = self.read_reply(command)?;
        if !reply.ok {
            let message = reply
                .error
                .map(|e| e.trim_end().to_string())
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "command failed".to_string());
            return Err(Error::EngineCommand {
                command: command.to_string(),
                message,
            });
        }

        Ok(CommandOutput {
            output: reply.output.filter(|o| !o.trim().is_empty()),
        })
    }
}

fn closed_pipe(name: &str) -> Error {
    Error::IO(io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("lldb {name} is not piped"),
    ))
}
