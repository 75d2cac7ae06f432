use assert_cmd::Command;
use chrono::{Local, NaiveDate, TimeZone};
use std::path::{Path, PathBuf};
use tdigest::group::Grouped;
use tdigest::i18n::Language;
use tdigest::storage::Storage;
use tdigest::week::WeekRange;
use tempfile::TempDir;

const OVERRIDES: &[&str] = &[
    "TDIGEST_CONFIG",
    "TDIGEST_LANGUAGE",
    "WORK_PREFIX",
    "PERSONAL_PREFIX",
    "TINKER_PREFIX",
    "TODOIST_API_TOKEN",
    "OPENAI_API_KEY",
    "OPENAI_MODEL",
    "WEEKS_OF_CONTEXT",
    "SMTP_SERVER",
    "SMTP_PORT",
    "EMAIL_FROM",
    "EMAIL_TO",
    "SMTP_PASSWORD",
    "EMAIL_SEND",
];

#[allow(deprecated)]
fn tdigest_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tdigest").unwrap();
    for var in OVERRIDES {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home);
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn full_config(dir: &TempDir) -> PathBuf {
    let storage = dir.path().join("summaries");
    write_config(
        dir,
        &format!(
            r#"
[categories]
work = "Work"
personal = "Personal"
tinker = "Tinker"

[storage]
dir = "{}"
"#,
            storage.display()
        ),
    )
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    let out = tdigest_cmd(home.path()).arg("--help").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    for sub in ["run", "tasks", "history"] {
        assert!(text.contains(sub), "missing {sub} in help");
    }
}

#[test]
fn run_without_categories_fails_fast() {
    let home = TempDir::new().unwrap();
    let out = tdigest_cmd(home.path()).arg("run").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("categories.work"), "{err}");
}

#[test]
fn partial_categories_from_env_still_fail() {
    let home = TempDir::new().unwrap();
    let out = tdigest_cmd(home.path())
        .env("WORK_PREFIX", "Work")
        .env("PERSONAL_PREFIX", "Personal")
        .arg("tasks")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("categories.tinker"), "{err}");
}

#[test]
fn missing_token_is_reported() {
    let home = TempDir::new().unwrap();
    let config = full_config(&home);
    let out = tdigest_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("tasks")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("TODOIST_API_TOKEN"), "{err}");
}

#[test]
fn invalid_week_of_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = full_config(&home);
    let out = tdigest_cmd(home.path())
        .env("TDIGEST_CONFIG", &config)
        .args(["run", "--week-of", "last-tuesday"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("--week-of"), "{err}");
}

#[test]
fn explicit_missing_config_is_error() {
    let home = TempDir::new().unwrap();
    let out = tdigest_cmd(home.path())
        .args(["--config", "/nonexistent/tdigest.toml", "history"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no such file"));
}

#[test]
fn malformed_config_is_error() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "[categories\nwork = ");
    let out = tdigest_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("history")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("config:"));
}

#[test]
fn history_lists_stored_summaries() {
    let home = TempDir::new().unwrap();
    let config = full_config(&home);
    let storage = Storage::open(&home.path().join("summaries"), Language::En).unwrap();
    let at = Local.with_ymd_and_hms(2026, 10, 12, 9, 0, 0).unwrap();
    for (day, text) in [(7, "## Work\nFirst week."), (14, "## Work\nSecond week.")] {
        let week = WeekRange::containing(NaiveDate::from_ymd_opt(2026, 9, day).unwrap());
        storage.save(text, &Grouped::default(), &week, at).unwrap();
    }

    let out = tdigest_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("history")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("2026-09-07 .. 2026-09-13"));
    assert!(lines[0].ends_with("First week."));
    assert!(lines[1].contains("summary_20260914-20260920_20261012_090000.json"));

    let out = tdigest_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .args(["history", "--limit", "1"])
        .output()
        .unwrap();
    let text = String::from_utf8_lossy(&out.stdout);
    assert_eq!(text.lines().count(), 1);
    assert!(text.contains("Second week."));
}

#[test]
fn history_with_empty_storage_succeeds() {
    let home = TempDir::new().unwrap();
    let config = full_config(&home);
    let out = tdigest_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("history")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no stored summaries"));
}

#[test]
fn log_dir_receives_execution_log() {
    let home = TempDir::new().unwrap();
    let logs = home.path().join("logs");
    let config = write_config(
        &home,
        &format!(
            "[storage]\ndir = \"{}\"\n\n[logging]\ndir = \"{}\"\n",
            home.path().join("summaries").display(),
            logs.display()
        ),
    );
    let out = tdigest_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("history")
        .output()
        .unwrap();
    assert!(out.status.success());
    let files: Vec<String> = std::fs::read_dir(&logs)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("execution_") && files[0].ends_with(".log"));
}
