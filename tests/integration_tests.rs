//! Integration tests for the taskboard binary.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a taskboard Command isolated from the caller's environment
fn taskboard(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("taskboard");
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("TASKBOARD_STORE")
        .env_remove("TASKBOARD_PORT")
        .env_remove("TASKBOARD_PROJECT_DIR");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_taskboard_help() {
        let dir = create_temp_project();
        taskboard(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("demo"));
    }

    #[test]
    fn test_taskboard_version() {
        let dir = create_temp_project();
        taskboard(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_command_fails() {
        let dir = create_temp_project();
        taskboard(&dir).arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Config Tests
// =============================================================================

mod config_commands {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = create_temp_project();
        taskboard(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created taskboard.toml"));

        let path = dir.path().join(".taskboard/taskboard.toml");
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("[server]"));
        assert!(content.contains("port = 3142"));
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".taskboard")).unwrap();
        fs::write(
            dir.path().join(".taskboard/taskboard.toml"),
            "[server]\nport = 9999\n",
        )
        .unwrap();

        taskboard(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        let content = fs::read_to_string(dir.path().join(".taskboard/taskboard.toml")).unwrap();
        assert!(content.contains("9999"));
    }

    #[test]
    fn test_config_show_reflects_env_override() {
        let dir = create_temp_project();
        taskboard(&dir)
            .args(["config", "show"])
            .env("TASKBOARD_STORE", "offline")
            .assert()
            .success()
            .stdout(predicate::str::contains("backend = \"offline\""));
    }

    #[test]
    fn test_config_show_reads_dotenv() {
        let dir = create_temp_project();
        fs::write(dir.path().join(".env"), "TASKBOARD_USER_EMAIL=dotenv@example.com\n").unwrap();
        taskboard(&dir)
            .env_remove("TASKBOARD_USER_EMAIL")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dotenv@example.com"));
    }

    #[test]
    fn test_config_validate_warns() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".taskboard")).unwrap();
        fs::write(
            dir.path().join(".taskboard/taskboard.toml"),
            "[store]\nbackend = \"http\"\n",
        )
        .unwrap();

        taskboard(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("http_base_url"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".taskboard")).unwrap();
        fs::write(dir.path().join(".taskboard/taskboard.toml"), "[server\n").unwrap();

        taskboard(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse taskboard.toml"));
    }
}

// =============================================================================
// Demo Tests
// =============================================================================

mod demo {
    use super::*;

    #[test]
    fn test_demo_prints_board_and_activity() {
        let dir = create_temp_project();
        taskboard(&dir)
            .arg("demo")
            .assert()
            .success()
            .stdout(predicate::str::contains("Website Redesign Project"))
            .stdout(predicate::str::contains("Write release notes"))
            .stdout(predicate::str::contains("Statistics"))
            .stdout(predicate::str::contains("completed task \"Write release notes\""))
            .stdout(predicate::str::contains("Task created successfully"));
    }

    #[test]
    fn test_demo_other_board() {
        let dir = create_temp_project();
        taskboard(&dir)
            .args(["demo", "--board", "board-3"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Marketing Campaign Q1"));
    }

    #[test]
    fn test_demo_offline_queues_writes() {
        let dir = create_temp_project();
        taskboard(&dir)
            .args(["demo", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("queued for replay"));
    }

    #[test]
    fn test_demo_unknown_board_fails() {
        let dir = create_temp_project();
        taskboard(&dir)
            .args(["demo", "--board", "board-99"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("board-99"));
    }
}
