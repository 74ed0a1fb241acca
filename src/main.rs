use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lldb_bridge::config::Config;
use lldb_bridge::context::{
    self, LaunchInfo, LaunchInfoSource, MetadataSource, SourceKind, SourceOptions,
};
use lldb_bridge::engine::{EngineKind, LldbDriver, ScriptFormat, ScriptWriter};
use lldb_bridge::orchestrator::{self, Orchestrator, Outcome, PlanOptions, Scope, Variant};
use lldb_bridge::sourcemap::SourceMap;
use lldb_bridge::terminate::terminate;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/lldb-bridge/config.toml)
    #[arg(long, global = true, env = "LLDB_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    metadata: MetadataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct MetadataArgs {
    /// Launch info JSON written by the pre-launch step
    #[arg(long, global = true, env = "LLDB_BRIDGE_LAUNCH_INFO")]
    launch_info: Option<PathBuf>,

    /// File containing the Bazel output base
    #[arg(long, global = true, env = "LLDB_BRIDGE_OUTPUT_BASE_FILE")]
    output_base_file: Option<PathBuf>,

    /// Build tool queried for output locations
    #[arg(long, global = true, env = "LLDB_BRIDGE_BUILD_TOOL")]
    build_tool: Option<String>,

    /// Source checkout root (default: current directory)
    #[arg(long, global = true, env = "LLDB_BRIDGE_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// Where build locations come from: auto, file or query
    #[arg(long, global = true, default_value_t = SourceKind::Auto)]
    source: SourceKind,

    /// Target platform, overrides the launch info file (requires --udid and --pid)
    #[arg(long, global = true, requires_all = ["udid", "pid"])]
    platform: Option<String>,

    /// Target device or simulator identifier
    #[arg(long, global = true, requires_all = ["platform", "pid"])]
    udid: Option<String>,

    /// Process to attach to
    #[arg(long, global = true, requires_all = ["platform", "udid"])]
    pid: Option<i64>,
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Engine receiving the commands: script or lldb
    #[arg(long, default_value_t = EngineKind::Script)]
    engine: EngineKind,

    /// Script format for the script engine: lines or json
    #[arg(long, default_value_t = ScriptFormat::Lines)]
    format: ScriptFormat,

    /// Write the script to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configure LLDB and attach to the launched process
    Attach {
        /// Handshake flavour: cli or ide
        #[arg(long, default_value_t = Variant::Cli)]
        variant: Variant,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Apply working directory and source-map settings only
    InjectSettings {
        /// Source-map direction: cli or ide
        #[arg(long, default_value_t = Variant::Cli)]
        variant: Variant,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Print the commands and the resulting source map without running anything
    Plan {
        #[arg(long, default_value_t = Variant::Cli)]
        variant: Variant,

        /// Embedded paths to resolve through the source map
        resolve: Vec<String>,
    },
    /// Kill the launched process
    Kill,
}

fn source(cfg: &Config, args: MetadataArgs) -> Box<dyn MetadataSource> {
    let launch = match (args.platform, args.udid, args.pid) {
        (Some(platform), Some(udid), Some(pid)) => {
            LaunchInfoSource::Provided(LaunchInfo::new(platform, udid, pid))
        }
        _ => LaunchInfoSource::File(args.launch_info.unwrap_or_else(|| cfg.launch_info.clone())),
    };

    context::select_source(
        args.source,
        SourceOptions {
            launch,
            output_base_file: args
                .output_base_file
                .unwrap_or_else(|| cfg.output_base_file.clone()),
            workspace_name: cfg.workspace_name.clone(),
            build_tool: args.build_tool.unwrap_or_else(|| cfg.build_tool.clone()),
            workspace_root: args.workspace_root,
        },
    )
}

fn script_writer(args: &EngineArgs) -> anyhow::Result<ScriptWriter<Box<dyn io::Write>>> {
    let out: Box<dyn io::Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    Ok(ScriptWriter::new(out, args.format))
}

fn bootstrap(
    cfg: &Config,
    source: &dyn MetadataSource,
    engine: EngineArgs,
    options: PlanOptions,
) -> anyhow::Result<()> {
    match engine.engine {
        EngineKind::Script => {
            let mut orchestrator = Orchestrator::new(script_writer(&engine)?, options);
            orchestrator.bootstrap(source)?;
        }
        EngineKind::Lldb => {
            let driver = LldbDriver::spawn(&cfg.lldb).context("start lldb")?;
            let mut orchestrator = Orchestrator::new(driver, options);
            let outcome = orchestrator.bootstrap(source)?;
            if outcome != Outcome::Skipped {
                let status = orchestrator.into_interpreter().interact()?;
                log::info!(target: "bridge", "lldb exited with {status}");
            }
        }
    }
    Ok(())
}

fn print_plan(
    source: &dyn MetadataSource,
    options: PlanOptions,
    resolve: &[String],
) -> anyhow::Result<()> {
    let ctx = match source.launch_context() {
        Ok(ctx) => ctx,
        Err(e) if e.is_silent() => {
            log::warn!(target: "bridge", "{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let locations = source.build_locations()?;
    let directives = orchestrator::plan(&ctx, &locations, &options);

    let mut map = SourceMap::default();
    for directive in &directives {
        println!("{directive}");
        map.apply(directive);
    }

    println!();
    println!("source map:");
    for (i, rule) in map.rules().iter().enumerate() {
        println!("  [{i}] {rule}");
    }
    for path in resolve {
        match map.remap(path) {
            Some(resolved) => println!("{path} -> {resolved}"),
            None => println!("{path} -> (unmapped)"),
        }
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = Config::load(cli.config.as_deref()).context("load configuration")?;
    let source = source(&cfg, cli.metadata);
    let options = |variant, scope| PlanOptions {
        variant,
        scope,
        packet_timeout: cfg.packet_timeout,
    };

    match cli.command {
        Commands::Attach { variant, engine } => {
            bootstrap(&cfg, source.as_ref(), engine, options(variant, Scope::Attach))
        }
        Commands::InjectSettings { variant, engine } => bootstrap(
            &cfg,
            source.as_ref(),
            engine,
            options(variant, Scope::SettingsOnly),
        ),
        Commands::Plan { variant, resolve } => {
            print_plan(source.as_ref(), options(variant, Scope::Attach), &resolve)
        }
        Commands::Kill => {
            match source.launch_context() {
                Ok(ctx) => terminate(ctx.process_id),
                Err(e) => log::debug!(target: "bridge", "nothing to kill: {e}"),
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    lldb_bridge::log::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
