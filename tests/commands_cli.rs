use assert_matches::assert_matches;
use clap::Parser;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const REPORT_SPEED_2_LIGHT_50: &str = "533202000032000000B9";

#[derive(Debug, Default)]
struct FakeTerminalClient;

impl fansync::TerminalClient for FakeTerminalClient {
    fn stdout_is_terminal(&self) -> bool {
        false
    }

    fn stderr_is_terminal(&self) -> bool {
        false
    }
}

async fn run_with_argv<const N: usize>(
    argv: [&str; N],
    output_format: fansync::OutputFormat,
) -> anyhow::Result<String> {
    let args = fansync::Args::try_parse_from(argv)?;
    let (command, maybe_fake_args) = args.into_command_and_fake_args()?;
    let Some(fake_args) = maybe_fake_args else {
        anyhow::bail!("command-line tests only run against the fake backend");
    };
    let transport = fansync::fake_transport(fake_args).await?;

    let mut output = Vec::new();
    fansync::run_with_clients(
        command,
        &mut output,
        &FakeTerminalClient,
        transport,
        None,
        output_format,
    )
    .await?;
    Ok(String::from_utf8(output)?)
}

fn json_documents(stdout: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout should hold JSON documents")
}

fn single_json_document(stdout: &str) -> Value {
    let mut documents = json_documents(stdout);
    assert_eq!(1, documents.len());
    documents.remove(0)
}

#[tokio::test(start_paused = true)]
async fn scan_keeps_only_named_fans_matching_the_hint() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-scan",
            "AA:BB|CeilingFan Den|-60;CC:DD|Speaker|-40;EE:FF|-|-",
            "scan",
            "--timeout",
            "2s",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    assert_snapshot!(stdout.trim_end(), @r#"
    [
      {
        "address": "AA:BB",
        "local_name": "CeilingFan Den",
        "rssi": -60
      }
    ]
    "#);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn scan_with_empty_hint_lists_every_named_device() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-scan",
            "AA:BB|CeilingFan Den|-60;CC:DD|Speaker|-40;EE:FF|-|-",
            "scan",
            "--name-hint",
            "",
        ],
        fansync::OutputFormat::Pretty,
    )
    .await?;

    assert!(stdout.starts_with("Found 2 fan(s):"));
    assert!(stdout.contains("Speaker"));
    assert!(!stdout.contains("EE:FF"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn status_prints_the_reported_state() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "status",
            "--address",
            "AA:BB",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    assert_eq!(
        json!({
            "speed": 2,
            "direction": 0,
            "up": 0,
            "down": 50,
            "timer_low": 0,
            "timer_high": 0,
            "fan_type": 0,
            "valid": true
        }),
        single_json_document(&stdout)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn status_of_a_silent_fan_is_the_placeholder() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "--fake-silent",
            "status",
            "--address",
            "AA:BB",
            "--timeout",
            "500ms",
        ],
        fansync::OutputFormat::Pretty,
    )
    .await?;

    assert!(stdout.contains("no report"));
    assert!(!stdout.contains("50%"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn status_of_an_unreachable_fan_fails() {
    let result = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-unreachable",
            "status",
            "--address",
            "AA:BB",
        ],
        fansync::OutputFormat::Json,
    )
    .await;

    let error = result.expect_err("an unreachable fan should fail the command");
    assert_eq!(
        "fake device `AA:BB` is unreachable",
        error.to_string()
    );
}

#[tokio::test(start_paused = true)]
async fn set_speed_keeps_the_other_reported_fields() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "set",
            "--address",
            "AA:BB",
            "speed",
            "3",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    assert_snapshot!(stdout.trim_end(), @r#"
    {
      "action": "speed",
      "speed": 3,
      "frame": {
        "bytes": "53 31 03 00 00 32 00 00 00 B9",
        "fields": {
          "speed": 3,
          "direction": 0,
          "up": 0,
          "down": 50,
          "timer_low": 0,
          "timer_high": 0,
          "fan_type": 0
        },
        "checksum": 185
      }
    }
    "#);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn set_light_clamps_negative_levels() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "set",
            "--address",
            "AA:BB",
            "light",
            "-5",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    let document = single_json_document(&stdout);
    assert_eq!(json!(0), document["frame"]["fields"]["down"]);
    assert_eq!(json!(2), document["frame"]["fields"]["speed"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn set_against_a_silent_fan_uses_fallback_fields() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-silent",
            "set",
            "--address",
            "AA:BB",
            "speed",
            "2",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    let document = single_json_document(&stdout);
    assert_eq!(json!(2), document["frame"]["fields"]["speed"]);
    assert_eq!(json!(100), document["frame"]["fields"]["down"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn control_fan_off_applies_the_change_locally() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "control",
            "--address",
            "AA:BB",
            "fan-off",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    let document = single_json_document(&stdout);
    assert_eq!(json!("fan_off"), document["action"]);
    assert_eq!(json!("53 31 00 00 00 32 00 00 00 B6"), document["frame"]["bytes"]);
    let diagnostics = &document["diagnostics"];
    assert_eq!(json!("AA:BB"), diagnostics["address"]);
    assert_eq!(json!(15), diagnostics["poll_interval"]);
    assert_eq!(json!(0), diagnostics["consecutive_failures"]);
    assert_eq!(Value::Null, diagnostics["last_error"]);
    assert_eq!(json!(0), diagnostics["last_state"]["speed"]);
    assert_eq!(json!(50), diagnostics["last_state"]["down"]);
    assert_eq!(json!(true), diagnostics["last_state"]["valid"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn control_light_on_uses_full_brightness_by_default() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "control",
            "--address",
            "AA:BB",
            "light-on",
        ],
        fansync::OutputFormat::Pretty,
    )
    .await?;

    assert!(stdout.contains("53 31 02 00 00 64 00 00 00 EA"));
    assert!(stdout.contains("100%"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn control_direction_requires_direction_support() {
    let result = run_with_argv(
        [
            "fansync",
            "--fake",
            "control",
            "--address",
            "AA:BB",
            "direction",
            "reverse",
        ],
        fansync::OutputFormat::Json,
    )
    .await;

    let error = result.expect_err("direction changes are off by default");
    assert_eq!(
        "this fan does not support changing direction",
        error.to_string()
    );
}

#[tokio::test(start_paused = true)]
async fn control_after_failed_refresh_records_the_timeout() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-silent",
            "control",
            "--address",
            "AA:BB",
            "--direction-supported",
            "direction",
            "reverse",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    let document = single_json_document(&stdout);
    assert_eq!(json!(1), document["frame"]["fields"]["direction"]);
    let diagnostics = &document["diagnostics"];
    assert_eq!(json!(1), diagnostics["consecutive_failures"]);
    assert_eq!(json!("timeout"), diagnostics["last_error"]);
    assert_eq!(json!(1), diagnostics["last_state"]["direction"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn watch_prints_one_snapshot_per_poll() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-state",
            REPORT_SPEED_2_LIGHT_50,
            "watch",
            "--address",
            "AA:BB",
            "--poll-interval",
            "1",
            "--max-polls",
            "2",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    let documents = json_documents(&stdout);
    assert_eq!(2, documents.len());
    for document in &documents {
        assert_eq!(json!(5), document["poll_interval"]);
        assert_eq!(json!(0), document["consecutive_failures"]);
        assert_eq!(json!(2), document["last_state"]["speed"]);
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn watch_counts_consecutive_failures() -> anyhow::Result<()> {
    let stdout = run_with_argv(
        [
            "fansync",
            "--fake",
            "--fake-silent",
            "watch",
            "--address",
            "AA:BB",
            "--max-polls",
            "2",
        ],
        fansync::OutputFormat::Json,
    )
    .await?;

    let failures: Vec<Value> = json_documents(&stdout)
        .iter()
        .map(|document| document["consecutive_failures"].clone())
        .collect();
    assert_eq!(vec![json!(1), json!(2)], failures);
    Ok(())
}

#[test]
fn fake_args_reject_malformed_scan_records() {
    let error = fansync::FakeArgs::builder()
        .scan_fixture("AA:BB|CeilingFan")
        .err()
        .expect("a two-field record should be rejected");

    assert_matches!(error, fansync::FixtureError::InvalidRecordFieldCount);
}

#[test]
fn fake_options_require_fake_mode() {
    let result = fansync::Args::try_parse_from([
        "fansync",
        "--fake-unreachable",
        "status",
        "--address",
        "AA:BB",
    ]);

    let error = result.expect_err("--fake-unreachable should require --fake");
    assert_eq!(
        clap::error::ErrorKind::MissingRequiredArgument,
        error.kind()
    );
}
