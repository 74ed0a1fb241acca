use crate::common::{RecordingInterpreter, StaticSource};
use lldb_bridge::context::{BuildLocations, LaunchContext, Platform};
use lldb_bridge::engine::{ScriptFormat, ScriptWriter};
use lldb_bridge::orchestrator::{Orchestrator, Outcome, PlanOptions, Scope, Variant};
use lldb_bridge::Error;

fn locations() -> BuildLocations {
    BuildLocations::new(
        "/tmp/ob/execroot/_main",
        "/tmp/ob",
        Some("/Users/dev/app".into()),
    )
    .unwrap()
}

fn simulator() -> LaunchContext {
    LaunchContext {
        platform: Platform::Emulated("iphonesimulator".to_string()),
        target_identifier: "SIM-1".to_string(),
        process_id: 4242,
    }
}

fn device() -> LaunchContext {
    LaunchContext {
        platform: Platform::Device,
        target_identifier: "00008110-ABCDEF".to_string(),
        process_id: 777,
    }
}

fn run(
    launch: Option<LaunchContext>,
    options: PlanOptions,
    interpreter: RecordingInterpreter,
) -> (Result<Outcome, Error>, RecordingInterpreter, StaticSource) {
    let source = StaticSource::new(launch, locations());
    let mut orchestrator = Orchestrator::new(interpreter, options);
    let result = orchestrator.bootstrap(&source);
    (result, orchestrator.into_interpreter(), source)
}

#[test]
fn test_simulator_attach_sequence() {
    let (result, interpreter, _) = run(
        Some(simulator()),
        PlanOptions::default(),
        RecordingInterpreter::default(),
    );

    assert_eq!(result.unwrap(), Outcome::Attached);
    assert_eq!(
        interpreter.commands,
        vec![
            r#"platform settings -w "/tmp/ob/execroot/_main""#,
            r#"settings insert-before target.source-map 0 "./external/" "/tmp/ob/external/""#,
            r#"settings append target.source-map "./" "/tmp/ob/execroot/_main/""#,
            "platform select iphonesimulator",
            "platform connect SIM-1",
            "process attach --pid 4242",
        ]
    );
    assert!(interpreter.finished);
}

#[test]
fn test_device_attach_sequence() {
    let (result, interpreter, _) = run(
        Some(device()),
        PlanOptions::default(),
        RecordingInterpreter::default(),
    );

    assert_eq!(result.unwrap(), Outcome::Attached);
    let tail = &interpreter.commands[interpreter.commands.len() - 2..];
    assert_eq!(
        tail,
        [
            "device select 00008110-ABCDEF",
            "device process attach --pid 777"
        ]
    );
    assert!(interpreter
        .commands
        .iter()
        .all(|c| !c.starts_with("platform select") && !c.starts_with("platform connect")));
}

#[test]
fn test_emulated_platform_tag_passed_through() {
    for tag in ["iphonesimulator", "watchsimulator", "appletvsimulator"] {
        let ctx = LaunchContext {
            platform: Platform::Emulated(tag.to_string()),
            target_identifier: "SIM-2".to_string(),
            process_id: 9,
        };
        let (_, interpreter, _) = run(
            Some(ctx),
            PlanOptions::default(),
            RecordingInterpreter::default(),
        );

        let select = interpreter
            .commands
            .iter()
            .position(|c| *c == format!("platform select {tag}"))
            .unwrap();
        assert_eq!(interpreter.commands[select + 1], "platform connect SIM-2");
        assert_eq!(interpreter.commands[select + 2], "process attach --pid 9");
        assert!(interpreter.commands.iter().all(|c| !c.starts_with("device ")));
    }
}

#[test]
fn test_ide_variant_sequence() {
    let options = PlanOptions {
        variant: Variant::Ide,
        ..PlanOptions::default()
    };
    let (_, interpreter, _) = run(Some(device()), options, RecordingInterpreter::default());

    assert_eq!(
        interpreter.commands,
        vec![
            r#"platform settings -w "/tmp/ob/execroot/_main""#,
            r#"settings insert-before target.source-map 0 "./external/" "/tmp/ob/external/""#,
            r#"settings append target.source-map "." "/Users/dev/app""#,
            "settings set plugin.process.gdb-remote.packet-timeout 300",
            "device select 00008110-ABCDEF",
            "device process attach --pid 777",
        ]
    );
}

#[test]
fn test_settings_only_never_attaches() {
    let options = PlanOptions {
        scope: Scope::SettingsOnly,
        ..PlanOptions::default()
    };
    let (result, interpreter, _) = run(Some(simulator()), options, RecordingInterpreter::default());

    assert_eq!(result.unwrap(), Outcome::Configured);
    assert_eq!(interpreter.commands.len(), 3);
    assert!(interpreter.commands.iter().all(|c| !c.contains("attach")));
}

#[test]
fn test_missing_launch_info_issues_nothing() {
    let (result, interpreter, source) =
        run(None, PlanOptions::default(), RecordingInterpreter::default());

    assert_eq!(result.unwrap(), Outcome::Skipped);
    assert!(interpreter.commands.is_empty());
    assert!(!interpreter.finished);
    assert_eq!(source.build_queries.get(), 0);
}

#[test]
fn test_failure_aborts_remaining_directives() {
    struct TestCase {
        fail_on: &'static str,
        issued: usize,
    }
    let cases = [
        TestCase {
            fail_on: "platform settings",
            issued: 1,
        },
        TestCase {
            fail_on: "settings append",
            issued: 3,
        },
        TestCase {
            fail_on: "platform connect",
            issued: 5,
        },
        TestCase {
            fail_on: "process attach",
            issued: 6,
        },
    ];

    for tc in cases {
        let (result, interpreter, _) = run(
            Some(simulator()),
            PlanOptions::default(),
            RecordingInterpreter::failing_on(tc.fail_on),
        );

        match result {
            Err(Error::EngineCommand { command, message }) => {
                assert!(command.starts_with(tc.fail_on));
                assert_eq!(message, "error: simulated failure");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(interpreter.commands.len(), tc.issued, "{}", tc.fail_on);
        assert!(interpreter.commands.last().unwrap().starts_with(tc.fail_on));
        assert!(!interpreter.finished);
    }
}

#[test]
fn test_json_script_output() {
    let source = StaticSource::new(Some(simulator()), locations());

    let mut orchestrator = Orchestrator::new(
        ScriptWriter::new(Vec::new(), ScriptFormat::Json),
        PlanOptions::default(),
    );
    orchestrator.bootstrap(&source).unwrap();
    let commands: Vec<String> =
        serde_json::from_slice(&orchestrator.into_interpreter().into_inner()).unwrap();
    assert_eq!(commands.len(), 6);
    assert_eq!(commands[5], "process attach --pid 4242");

    let failing = StaticSource::new(None, locations());
    let mut orchestrator = Orchestrator::new(
        ScriptWriter::new(Vec::new(), ScriptFormat::Json),
        PlanOptions::default(),
    );
    assert_eq!(orchestrator.bootstrap(&failing).unwrap(), Outcome::Skipped);
    assert!(orchestrator.into_interpreter().into_inner().is_empty());
}
