use clap::Parser;
use dupesweep::cli::Cli;
use dupesweep::config::{Config, RunOptions};
use dupesweep::run;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(path: PathBuf, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn stdin_options(extra: &[&str]) -> RunOptions {
    let mut args = vec!["dupesweep", "--stdin"];
    args.extend_from_slice(extra);
    let cli = Cli::try_parse_from(args).unwrap();
    let config = Config {
        progress: false,
        ..Config::default()
    };
    RunOptions::resolve(&cli, &config).unwrap()
}

#[test]
fn test_stdin_only_listed_files_are_considered() {
    let dir = tempdir().unwrap();
    let a = write(dir.path().join("a"), b"payload");
    let b = write(dir.path().join("b"), b"payload");
    write(dir.path().join("c"), b"payload");

    let input = format!("{}\n\n{}\r\n", a.display(), b.display());
    let mut out = Vec::new();
    let stat = run(&stdin_options(&[]), Cursor::new(input), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(stat.group_count, 1);
    assert_eq!(stat.duplicate_file_count, 2);
    assert!(!text.contains(&dir.path().join("c").display().to_string()));
}

#[test]
fn test_stdin_repeated_and_missing_paths() {
    let dir = tempdir().unwrap();
    let a = write(dir.path().join("a"), b"payload");
    let missing = dir.path().join("gone");

    let input = format!("{}\n{}\n{}\n", a.display(), a.display(), missing.display());
    let mut out = Vec::new();
    let stat = run(&stdin_options(&[]), Cursor::new(input), &mut out).unwrap();

    assert_eq!(stat.group_count, 0);
}

#[test]
fn test_stdin_deletes_under_prefix() {
    let dir = tempdir().unwrap();
    let keep = write(dir.path().join("keep/a"), b"payload");
    let doomed = write(dir.path().join("del/a"), b"payload");
    let prefix = dir.path().join("del");

    let input = format!("{}\n{}\n", keep.display(), doomed.display());
    let mut out = Vec::new();
    let stat = run(
        &stdin_options(&["-d", prefix.to_str().unwrap()]),
        Cursor::new(input),
        &mut out,
    )
    .unwrap();

    assert_eq!(stat.deleted_file_count, 1);
    assert!(keep.exists());
    assert!(!doomed.exists());
}

#[test]
#[cfg(unix)]
fn test_stdin_line_that_is_not_utf8_does_not_abort() {
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let a = write(dir.path().join("a"), b"payload");
    let b = write(dir.path().join("b"), b"payload");

    let mut input = Vec::new();
    input.extend_from_slice(a.as_os_str().as_bytes());
    input.extend_from_slice(b"\n/tmp/bad\xff\xfename\n");
    input.extend_from_slice(b.as_os_str().as_bytes());
    input.push(b'\n');

    let mut out = Vec::new();
    let stat = run(&stdin_options(&[]), Cursor::new(input), &mut out).unwrap();

    assert_eq!(stat.group_count, 1);
    assert_eq!(stat.duplicate_file_count, 2);
}

#[test]
#[cfg(target_os = "linux")]
fn test_stdin_non_utf8_file_name_is_found() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let odd = write(dir.path().join(OsStr::from_bytes(b"caf\xe9")), b"payload");
    let plain = write(dir.path().join("plain"), b"payload");

    let mut input = Vec::new();
    input.extend_from_slice(odd.as_os_str().as_bytes());
    input.push(b'\n');
    input.extend_from_slice(plain.as_os_str().as_bytes());
    input.push(b'\n');

    let mut out = Vec::new();
    let stat = run(&stdin_options(&[]), Cursor::new(input), &mut out).unwrap();

    assert_eq!(stat.group_count, 1);
    assert_eq!(stat.duplicate_file_count, 2);
}
