//! Attach handshake.
//!
//! The order of directives is part of the contract:
//! 1. the working directory is set to the execution root, so paths relative to it resolve;
//! 2. the `./external/` rule is inserted at position 0, ahead of any existing rule;
//! 3. the general rule is appended, so it never shadows rule 2;
//! 4. target selection and attach come last.

use crate::context::{BuildLocations, LaunchContext, MetadataSource, Platform};
use crate::engine::{CommandInterpreter, Directive};
use crate::error::Error;
use crate::sourcemap::SourceMapRule;
use std::path::Path;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Flavour of the attach handshake.
#[derive(Copy, Clone, PartialEq, Debug, Default, EnumString, Display, IntoStaticStr)]
pub enum Variant {
    /// Bare LLDB: embedded paths are mapped forward onto the execution root.
    #[default]
    #[strum(serialize = "cli")]
    Cli,
    /// IDE integration: paths are mapped back onto the workspace so the editor opens real files,
    /// and the remote packet timeout is raised.
    #[strum(serialize = "ide")]
    Ide,
}

/// What the handshake covers.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Scope {
    /// Settings, target selection and attach.
    Attach,
    /// Settings only, the debug adapter attaches on its own.
    SettingsOnly,
}

/// Plan parameters not derived from session metadata.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub variant: Variant,
    pub scope: Scope,
    pub packet_timeout: u32,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            variant: Variant::Cli,
            scope: Scope::Attach,
            packet_timeout: 300,
        }
    }
}

/// Session state after a bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No launch info, nothing was issued.
    Skipped,
    /// Settings applied, no attach requested.
    Configured,
    /// Attached to the target process.
    Attached,
}

fn dir_prefix(path: &Path) -> String {
    let mut prefix = path.to_string_lossy().into_owned();
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

/// Build the ordered directive list for a session.
pub fn plan(
    ctx: &LaunchContext,
    locations: &BuildLocations,
    options: &PlanOptions,
) -> Vec<Directive> {
    let mut directives = vec![
        Directive::WorkingDirectory(locations.execution_root.clone()),
        Directive::SourceMapInsertBefore {
            index: 0,
            rule: SourceMapRule::new("./external/", dir_prefix(&locations.external_dir())),
        },
    ];

    let general = match options.variant {
        Variant::Cli => SourceMapRule::new("./", dir_prefix(&locations.execution_root)),
        Variant::Ide => SourceMapRule::new(".", locations.workspace_root.to_string_lossy()),
    };
    directives.push(Directive::SourceMapAppend(general));

    if options.scope == Scope::SettingsOnly {
        return directives;
    }

    if options.variant == Variant::Ide {
        directives.push(Directive::PacketTimeout(options.packet_timeout));
    }

    match &ctx.platform {
        Platform::Device => {
            directives.push(Directive::DeviceSelect(ctx.target_identifier.clone()));
            directives.push(Directive::DeviceAttach(ctx.process_id));
        }
        Platform::Emulated(tag) => {
            directives.push(Directive::PlatformSelect(tag.clone()));
            directives.push(Directive::PlatformConnect(ctx.target_identifier.clone()));
            directives.push(Directive::ProcessAttach(ctx.process_id));
        }
    }
    directives
}

/// Drives a [`CommandInterpreter`] through the attach handshake.
pub struct Orchestrator<I: CommandInterpreter> {
    interpreter: I,
    options: PlanOptions,
}

impl<I: CommandInterpreter> Orchestrator<I> {
    pub fn new(interpreter: I, options: PlanOptions) -> Self {
        Self {
            interpreter,
            options,
        }
    }

    pub fn into_interpreter(self) -> I {
        self.interpreter
    }

    /// Load session metadata and run the handshake.
    ///
    /// Missing launch info is not an error: the pre-launch step that should have written it has
    /// already reported its own failure, and the host may call us regardless. In that case no
    /// command is issued and [`Outcome::Skipped`] is returned.
    pub fn bootstrap(&mut self, source: &dyn MetadataSource) -> Result<Outcome, Error> {
        let ctx = match source.launch_context() {
            Ok(ctx) => ctx,
            Err(e) if e.is_silent() => {
                log::warn!(target: "bridge", "{e}, nothing to attach to");
                return Ok(Outcome::Skipped);
            }
            Err(e) => return Err(e),
        };
        let locations = source.build_locations()?;
        log::info!(
            target: "bridge",
            "attaching to pid {} on {} {} (execution root {})",
            ctx.process_id,
            ctx.platform,
            ctx.target_identifier,
            locations.execution_root.display()
        );

        let directives = plan(&ctx, &locations, &self.options);
        self.execute(&directives)?;

        Ok(match self.options.scope {
            Scope::Attach => Outcome::Attached,
            Scope::SettingsOnly => Outcome::Configured,
        })
    }

    /// Issue directives one by one, the first failure aborts the rest.
    pub fn execute(&mut self, directives: &[Directive]) -> Result<(), Error> {
        for directive in directives {
            let command = directive.to_string();
            log::info!(target: "engine", "(lldb) {command}");
            match self.interpreter.run_command(&command) {
                Ok(result) => {
                    if let Some(output) = result.output {
                        log::info!(target: "engine", "{}", output.trim_end());
                    }
                }
                Err(e) => {
                    log::error!(target: "engine", "{e}");
                    return Err(e);
                }
            }
        }
        self.interpreter.finish()
    }
}
