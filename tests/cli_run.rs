//! Running the binary's pipeline in-process

use clap::Parser;
use logpump::app::cli::args::Args;
use logpump::app::startup::{run, StartupError};
use logpump::queue::MessageType;
use std::fs;
use tempfile::TempDir;

fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["logpump".to_string()];
    argv.extend(extra.iter().map(|arg| arg.to_string()));
    Args::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_dry_run_reads_input_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.log");
    fs::write(&input, "starting\n\nerror: disk full\nnotice: rotated\n").unwrap();
    let config = dir.path().join("logpump.toml");
    fs::write(&config, "").unwrap();

    let summary = run(
        args(&[
            "--dry-run",
            "--config-file",
            config.to_str().unwrap(),
            "--input",
            input.to_str().unwrap(),
            "--source",
            "cli-test",
        ]),
        false,
    )
    .await
    .unwrap();

    assert_eq!(summary.produced, 3);
    let messages = summary.dry_run_messages.unwrap();
    let seen: Vec<(MessageType, &str)> = messages
        .iter()
        .map(|m| (m.message_type, m.text.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (MessageType::Info, "starting"),
            (MessageType::Error, "disk full"),
            (MessageType::Notice, "rotated"),
        ]
    );
    assert!(messages.iter().all(|m| m.source == "cli-test"));
    assert_eq!(summary.stats.delivered_messages, 3);
}

#[tokio::test]
async fn test_file_sink_from_config() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.log");
    fs::write(&input, "debug: noisy\nwarning: careful\ncritical: on fire\n").unwrap();
    let output = dir.path().join("out.log");
    let config = dir.path().join("logpump.toml");
    fs::write(
        &config,
        format!(
            "[handler]\nname = \"from-config\"\n\n[[sink]]\nkind = \"file\"\npath = \"{}\"\nmin_type = \"warning\"\n",
            output.display()
        ),
    )
    .unwrap();

    let summary = run(
        args(&[
            "--config-file",
            config.to_str().unwrap(),
            "--input",
            input.to_str().unwrap(),
        ]),
        false,
    )
    .await
    .unwrap();

    assert_eq!(summary.stats.name, "from-config");
    assert_eq!(summary.stats.ignored, 1);
    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("WRN [stdin] careful"));
    assert!(lines[1].ends_with("CRT [stdin] on fire"));
}

#[tokio::test]
async fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = run(args(&["--config-file", missing.to_str().unwrap()]), false).await;
    assert!(matches!(result, Err(StartupError::Config(_))));
}
