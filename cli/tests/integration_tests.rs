use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_skal-demo");

fn run(args: &[&str]) -> Output {
    std::process::Command::new(BIN)
        .args(args)
        .env_remove("SKAL_CONFIG")
        .env_remove("SKAL_LOG")
        .output()
        .expect("failed to run skal-demo")
}

fn run_with_config(config: &Path, args: &[&str]) -> Output {
    std::process::Command::new(BIN)
        .args(args)
        .env("SKAL_CONFIG", config)
        .env_remove("SKAL_LOG")
        .output()
        .expect("failed to run skal-demo")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Writes a config file next to a `commands/` manifest directory.
fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
    fs::create_dir_all(dir.path().join("commands")).expect("failed to create manifest dir");
    let path = dir.path().join("skal.yaml");
    fs::write(&path, yaml).expect("failed to write config");
    path
}

fn write_manifest(dir: &TempDir, file: &str, manifest: &serde_json::Value) {
    let path = dir.path().join("commands").join(file);
    fs::write(&path, serde_json::to_string_pretty(manifest).unwrap())
        .expect("failed to write manifest");
}

// ---------------------------------------------------------------------------
// Application methods
// ---------------------------------------------------------------------------

#[test]
fn first_runs_and_exits_zero() {
    let output = run(&["first"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "first b=false string=-\n");
}

#[test]
fn global_flags_reach_the_command() {
    let output = run(&["-b", "--string=test", "first"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "first b=true string=test\n");
}

#[test]
fn unmarked_method_is_not_a_command() {
    let output = run(&["second"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
}

#[test]
fn command_flags_are_parsed() {
    let output = run(&["third", "-i", "--test", "x"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "third i=true test=x\n");
}

#[test]
fn missing_documentation_is_warned_once() {
    let output = run(&["no_doc"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "no_doc\n");

    let err = stderr(&output);
    assert_eq!(err.matches("Warning: no documentation for \"no_doc\" in ").count(), 1);
    assert!(err.contains("main.rs"));
}

#[test]
fn version_flag_prints_package_version() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_shows_commands_but_not_plain_methods() {
    let output = run(&["--help"]);
    assert!(output.status.success());

    let help = stdout(&output);
    assert!(help.contains("Demo of subcommand applications"));
    assert!(help.contains("first"));
    assert!(help.contains("greetings"));
    assert!(!help.contains("second command"));
}

#[test]
fn command_help_shows_full_description() {
    let output = run(&["third", "-h"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Takes its own flags."));
}

#[test]
fn positional_argument_and_io_failure() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("note.txt");
    fs::write(&file, "hello from a file\n").unwrap();

    let output = run(&["show", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "hello from a file\n");

    let output = run(&["show", dir.path().join("missing.txt").to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: command \"show\" failed: I/O error"));
}

#[test]
fn interrupt_propagates_by_default() {
    let output = run(&["ctrlc"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: command interrupted"));
}

/// Starts `wait`, sends SIGINT once it is running and returns the output.
#[cfg(unix)]
fn interrupt_wait(config: Option<&Path>) -> Output {
    use std::io::{BufRead, BufReader};
    use std::process::Stdio;

    let mut cmd = std::process::Command::new(BIN);
    cmd.arg("wait")
        .env_remove("SKAL_CONFIG")
        .env_remove("SKAL_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(config) = config {
        cmd.env("SKAL_CONFIG", config);
    }
    let mut child = cmd.spawn().expect("failed to start skal-demo");

    let mut line = String::new();
    BufReader::new(child.stdout.take().expect("stdout is piped"))
        .read_line(&mut line)
        .expect("failed to read from skal-demo");
    assert_eq!(line, "waiting\n");

    let status = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());

    child.wait_with_output().expect("failed to wait for skal-demo")
}

#[cfg(unix)]
#[test]
fn ctrl_c_during_command_uses_configured_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "interrupt_exit_code: 4\n");

    let output = interrupt_wait(Some(&config));
    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr(&output));
}

#[cfg(unix)]
#[test]
fn ctrl_c_during_command_propagates_by_default() {
    let output = interrupt_wait(None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error: command interrupted"));
}

#[test]
fn out_of_range_interrupt_exit_code_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "interrupt_exit_code: 300\n");

    let output = run_with_config(&config, &["first"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: failed to load config"));
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

#[test]
fn subcommand_module_with_group_flags() {
    let output = run(&["greetings", "hello"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Hello, world!\n");

    let output = run(&["greetings", "--loud", "hello", "-n", "Ada"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "HELLO, ADA!\n");
}

#[test]
fn subcommand_module_version() {
    let output = run(&["greetings", "--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("v1.0"));
}

#[test]
fn missing_module_is_skipped_with_warning() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "command_modules:\n  - missing_module\n");

    let output = run_with_config(&config, &["first"]);
    assert!(output.status.success());
    assert!(
        stderr(&output).contains("Warning: module \"missing_module\" does not exist, skipping")
    );
}

#[test]
fn broken_manifests_are_skipped_with_warnings() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "manifest_dir: commands\ncommand_modules:\n  - broken\n  - unknown_handler\n",
    );
    fs::write(dir.path().join("commands").join("broken.yaml"), "name: [oops\n").unwrap();
    write_manifest(
        &dir,
        "unknown_handler.json",
        &serde_json::json!({
            "name": "unknown_handler",
            "members": [{ "name": "ghost", "handler": "nope", "command": {} }]
        }),
    );

    let output = run_with_config(&config, &["first"]);
    assert!(output.status.success());

    let err = stderr(&output);
    assert!(err.contains("Warning: syntax error in \"broken\", skipping: "));
    assert!(err.contains("Warning: name error in \"unknown_handler\", skipping: "));
}

#[test]
fn manifest_commands_and_duplicates() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "manifest_dir: commands\ncommand_modules:\n  - tools\n",
    );
    write_manifest(
        &dir,
        "tools.json",
        &serde_json::json!({
            "name": "tools",
            "doc": "Tool commands",
            "members": [
                { "name": "first", "handler": "echo", "doc": "shadowed", "command": {} },
                {
                    "name": "build",
                    "handler": "echo",
                    "doc": "build things",
                    "command": { "flags": [{ "key": ["-r", "--release"], "action": "store_true" }] }
                }
            ]
        }),
    );

    let output = run_with_config(&config, &["-b", "build", "--release"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "build: b=true release=true string=-\n");

    let err = stderr(&output);
    assert_eq!(err.matches("Warning: ignoring duplicate command \"first\"").count(), 1);

    let output = run_with_config(&config, &["first"]);
    assert_eq!(stdout(&output), "first b=false string=-\n");
}

#[test]
fn config_sets_interrupt_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "interrupt_exit_code: 4\n");

    let output = run_with_config(&config, &["ctrlc"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn config_overrides_version() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "version: \"9.9.9\"\n");

    let output = run_with_config(&config, &["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("v9.9.9"));
}

#[test]
fn unreadable_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = run_with_config(&dir.path().join("missing.yaml"), &["first"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: failed to load config"));
}
