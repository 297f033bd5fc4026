//! CLI integration tests for mysql-dump.
//!
//! These tests cover argument parsing, help output, exit codes, and the
//! restore path in dry-run mode, which needs no database server.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a command for the mysql-dump binary.
fn cmd() -> Command {
    Command::cargo_bin("mysql-dump").unwrap()
}

fn config_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", yaml).unwrap();
    file
}

fn minimal_config() -> NamedTempFile {
    config_file("connection:\n  host: 127.0.0.1\n  user: backup\n")
}

fn dump_file(sql: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(sql.as_bytes()).unwrap();
    file
}

const SAMPLE_DUMP: &str = "\
-- Table structure for table `t`
DROP TABLE IF EXISTS `t`;
CREATE TABLE `t` (`id` int, `name` varchar(10));
LOCK TABLES `t` WRITE;
INSERT INTO `t` (`id`,`name`) VALUES (1,'a;b');
INSERT INTO `t` (`id`,`name`) VALUES (2,'c');
INSERT INTO `t` (`id`,`name`) VALUES (3,'d');
UNLOCK TABLES;
";

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_dump_subcommand_help() {
    cmd()
        .args(["dump", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--all-databases"))
        .stdout(predicate::str::contains("--rows-per-insert"))
        .stdout(predicate::str::contains("--no-data"))
        .stdout(predicate::str::contains("--compress"));
}

#[test]
fn test_restore_subcommand_help() {
    cmd()
        .args(["restore", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--merge-inserts"))
        .stdout(predicate::str::contains("--merge-mode"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mysql-dump"));
}

#[test]
fn test_global_flag_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_is_io_error() {
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_invalid_yaml_exits_with_code_2() {
    let file = config_file("invalid: yaml: content: [\n");
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_connection_exits_with_code_2() {
    let file = config_file("dump:\n  rows_per_insert: 10\n");
    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(2);
}

#[test]
fn test_zero_merge_size_rejected() {
    let config = minimal_config();
    let input = dump_file(SAMPLE_DUMP);
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["restore", "--dry-run", "--merge-inserts", "0"])
        .arg(input.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("merge_inserts"));
}

#[test]
fn test_tables_with_all_databases_rejected() {
    let config = minimal_config();
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["dump", "--all-databases", "--tables", "orders"])
        .assert()
        .code(2);
}

#[test]
fn test_compression_requires_output_file() {
    let config = config_file("connection:\n  host: 127.0.0.1\n  user: backup\n  database: shop\n");
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["dump", "--compress", "best"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("compression requires an output file"));
}

#[test]
fn test_unknown_verbosity_rejected() {
    let config = minimal_config();
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["--verbosity", "loud", "health-check"])
        .assert()
        .code(2);
}

// =============================================================================
// Dry-run Restore Tests
// =============================================================================

#[test]
fn test_dry_run_restore_reports_counts() {
    let config = minimal_config();
    let input = dump_file(SAMPLE_DUMP);

    let output = cmd()
        .args(["--config", config.path().to_str().unwrap(), "--output-json"])
        .args(["restore", "--dry-run"])
        .arg(input.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["dry_run"], true);
    assert_eq!(summary["statements_read"], 7);
    assert_eq!(summary["statements_executed"], 7);
    assert_eq!(summary["inserts_merged"], 0);
}

#[test]
fn test_dry_run_restore_merges_inserts() {
    let config = minimal_config();
    let input = dump_file(SAMPLE_DUMP);

    let output = cmd()
        .args(["--config", config.path().to_str().unwrap(), "--output-json"])
        .args(["restore", "--dry-run", "--merge-inserts", "2"])
        .arg(input.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["statements_read"], 7);
    assert_eq!(summary["statements_executed"], 6);
    assert_eq!(summary["inserts_merged"], 1);
}

#[test]
fn test_dry_run_restore_from_stdin() {
    let config = minimal_config();
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["restore", "--dry-run", "-"])
        .write_stdin("CREATE TABLE `t` (`id` int);\nINSERT INTO `t` VALUES (1);\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run completed!"))
        .stdout(predicate::str::contains("Statements read: 2"));
}

#[test]
fn test_restore_missing_input_file() {
    let config = minimal_config();
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["restore", "--dry-run", "no_such_dump.sql"])
        .assert()
        .code(1);
}

#[test]
fn test_restore_unterminated_quote_fails() {
    let config = minimal_config();
    let input = dump_file("INSERT INTO `t` VALUES ('never closed);\n");
    cmd()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["restore", "--dry-run"])
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed statement"));
}
