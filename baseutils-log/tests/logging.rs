use std::fs;
use std::path::Path;

use baseutils_log::{LogConfig, LogError, build};
use pretty_assertions::assert_eq;
use tracing::Level;

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn test_file_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let (subscriber, handle) = build(&LogConfig::file(&path).with_level("INFO")).unwrap();
    assert_eq!(handle.file_path(), Some(path.clone()));

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("hidden");
        tracing::info!(user = 7, "logged in");
        tracing::error!("boom");
    });

    let lines = lines(&path);
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].contains(" logging.rs:"), "{}", lines[0]);
    assert!(lines[0].ends_with(">INFO - logged in user=7"), "{}", lines[0]);
    assert!(lines[1].ends_with(">ERROR - boom"), "{}", lines[1]);
    assert!(!lines[0].contains('\x1b'), "file output must not be colored");

    // HH:MM:SS.mmm prefix
    let time = lines[0].split(' ').next().unwrap();
    assert_eq!(time.len(), 12, "{time}");
    assert_eq!(&time[2..3], ":");
    assert_eq!(&time[8..9], ".");
}

#[test]
fn test_reload_changes_levels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = LogConfig::file(&path).with_level("WARNING");
    let (subscriber, handle) = build(&config).unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("before");
        handle
            .reload(&config.clone().with_level("debug").with_err_level("critical"))
            .unwrap();
        tracing::info!("after");
    });

    assert_eq!(handle.level(), Level::DEBUG);
    assert_eq!(handle.err_level(), Level::ERROR);
    let lines = lines(&path);
    assert!(lines.iter().all(|line| !line.contains("before")), "{lines:?}");
    assert!(lines.iter().any(|line| line.ends_with("after")), "{lines:?}");
}

#[test]
fn test_reload_reopens_rotated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let rotated = dir.path().join("app.log.1");
    let config = LogConfig::file(&path).with_level("INFO");
    let (subscriber, handle) = build(&config).unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("first");
        fs::rename(&path, &rotated).unwrap();
        handle.reload(&config).unwrap();
        tracing::info!("second");
    });

    let old = lines(&rotated);
    let new = lines(&path);
    assert_eq!(old.len(), 1);
    assert!(old[0].ends_with("first"));
    assert_eq!(new.len(), 1);
    assert!(new[0].ends_with("second"));
}

#[test]
fn test_reload_to_other_path() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.log");
    let second = dir.path().join("second.log");
    let (subscriber, handle) = build(&LogConfig::file(&first)).unwrap();

    tracing::subscriber::with_default(subscriber, || {
        handle.reload(&LogConfig::file(&second)).unwrap();
        tracing::warn!("moved");
    });

    assert_eq!(handle.file_path(), Some(second.clone()));
    assert!(lines(&first).is_empty());
    let moved = lines(&second);
    assert!(moved.last().is_some_and(|line| line.ends_with(">WARN - moved")), "{moved:?}");
}

#[test]
fn test_reload_cannot_switch_sink_kind() {
    let dir = tempfile::tempdir().unwrap();
    let (_subscriber, handle) = build(&LogConfig::default()).unwrap();
    assert_eq!(handle.file_path(), None);

    let err = handle
        .reload(&LogConfig::file(dir.path().join("app.log")).with_level("ERROR"))
        .unwrap_err();
    assert!(matches!(err, LogError::SinkMismatch));
    assert_eq!(handle.level(), Level::DEBUG);
}

#[test]
fn test_unopenable_file_fails_build() {
    let dir = tempfile::tempdir().unwrap();
    let result = build(&LogConfig::file(dir.path().join("no/such/dir/app.log")));
    assert!(matches!(result, Err(LogError::Io { .. })));
}

#[test]
fn test_config_from_json() {
    let config: LogConfig =
        serde_json::from_str(r#"{ "path": "/tmp/app.log", "level": "NOTICE" }"#).unwrap();
    assert_eq!(config.level(), Level::INFO);
    assert_eq!(config.err_level, "WARNING");
    assert_eq!(config.path.as_deref(), Some(Path::new("/tmp/app.log")));
}
