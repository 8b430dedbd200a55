use clap::Parser;
use dupesweep::cli::Cli;
use dupesweep::config::{Config, RunOptions};
use dupesweep::run;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(path: PathBuf, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn options(args: &[String]) -> RunOptions {
    let mut full = vec!["dupesweep".to_string()];
    full.extend_from_slice(args);
    let cli = Cli::try_parse_from(full).unwrap();
    let config = Config {
        progress: false,
        ..Config::default()
    };
    RunOptions::resolve(&cli, &config).unwrap()
}

fn arg(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn run_text(args: &[String]) -> (dupesweep::actions::DeletionStat, String) {
    let mut out = Vec::new();
    let stat = run(&options(args), io::empty(), &mut out).unwrap();
    (stat, String::from_utf8(out).unwrap())
}

/// Three identical 100-byte files, one of them under the deletable prefix.
fn three_copies() -> (TempDir, [PathBuf; 3]) {
    let dir = tempdir().unwrap();
    let content = [42u8; 100];
    let files = [
        write(dir.path().join("keep1/f"), &content),
        write(dir.path().join("keep2/f"), &content),
        write(dir.path().join("trash/f"), &content),
    ];
    (dir, files)
}

#[test]
fn test_single_deletable_copy_is_removed() {
    let (dir, [keep1, keep2, doomed]) = three_copies();
    let args = vec![arg(dir.path()), "-d".into(), arg(&dir.path().join("trash"))];

    let (stat, text) = run_text(&args);

    assert_eq!(stat.group_count, 1);
    assert_eq!(stat.duplicate_file_count, 3);
    assert_eq!(stat.duplicate_bytes, 300);
    assert_eq!(stat.deleted_bytes, 100);
    assert!(keep1.exists() && keep2.exists());
    assert!(!doomed.exists());

    assert!(text.contains(&format!("deleted {}", doomed.display())));
    assert!(!text.contains("keep "));
    assert!(text.contains("found 1 groups with 3 duplicate files with a total size of 300.00 B"));
    assert!(text.ends_with("deletedFileSize 100.00 B\n"));
}

#[test]
fn test_different_content_reports_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path().join("del/a"), b"aaaa");
    write(dir.path().join("del/b"), b"bbbb");
    let args = vec![arg(dir.path()), "-d".into(), arg(&dir.path().join("del"))];

    let (stat, text) = run_text(&args);

    assert_eq!(stat.group_count, 0);
    assert_eq!(stat.deleted_bytes, 0);
    assert!(dir.path().join("del/a").exists());
    assert!(dir.path().join("del/b").exists());
    assert!(text.contains("found 0 groups with 0 duplicate files with a total size of 0.00 B"));
}

#[test]
fn test_fully_deletable_group_keeps_first_member() {
    let dir = tempdir().unwrap();
    let a = write(dir.path().join("del/a"), b"same bytes");
    let b = write(dir.path().join("del/b"), b"same bytes");
    let c = write(dir.path().join("del/c"), b"same bytes");
    let args = vec![arg(dir.path()), "-d".into(), arg(&dir.path().join("del"))];

    let (stat, text) = run_text(&args);

    assert!(a.exists());
    assert!(!b.exists() && !c.exists());
    assert_eq!(stat.deleted_file_count, 2);
    assert_eq!(stat.deleted_bytes, 20);
    assert!(text.contains(&format!("keep {}", a.display())));
}

#[test]
fn test_no_prefixes_only_reports() {
    let (dir, files) = three_copies();
    let (stat, text) = run_text(&[arg(dir.path())]);

    assert!(files.iter().all(|f| f.exists()));
    assert_eq!(stat.group_count, 1);
    assert_eq!(stat.deleted_bytes, 0);
    assert!(!text.contains("deleted /"));
    assert!(text.starts_with("group by size\ncalculate hashes of 300.00 B\n      size   filename\n"));
    for f in &files {
        assert!(text.contains(&format!("(  100.00 B) {}", f.display())));
    }
}

#[test]
fn test_dry_run_matches_real_run() {
    let (dry_dir, dry_files) = three_copies();
    let (real_dir, _) = three_copies();

    let mut dry_args = vec![arg(dry_dir.path()), "-d".into(), arg(&dry_dir.path().join("trash"))];
    dry_args.push("--dry-run".into());
    let real_args = vec![arg(real_dir.path()), "-d".into(), arg(&real_dir.path().join("trash"))];

    let (dry_stat, dry_text) = run_text(&dry_args);
    let (real_stat, real_text) = run_text(&real_args);

    assert_eq!(dry_stat, real_stat);
    assert!(dry_files.iter().all(|f| f.exists()));

    let normalize = |text: &str, root: &Path| {
        text.replace(&root.display().to_string(), "<root>")
            .replace("simulate deletion of ", "deleted ")
    };
    assert_eq!(
        normalize(&dry_text, dry_dir.path()),
        normalize(&real_text, real_dir.path())
    );
}

#[test]
fn test_rerun_reports_same_groups() {
    let (dir, _) = three_copies();
    let args = vec![arg(dir.path())];

    let (_, first) = run_text(&args);
    let mut dry = args.clone();
    dry.push("--dry".into());
    let (_, second) = run_text(&dry);

    assert_eq!(first, second);
}

#[test]
fn test_every_group_keeps_a_copy_on_disk() {
    let dir = tempdir().unwrap();
    let mut groups = Vec::new();
    for i in 0..5u8 {
        let content = vec![i; 10 + i as usize];
        let members: Vec<PathBuf> = (0..=i)
            .map(|j| write(dir.path().join(format!("del/{}/{}", i, j)), &content))
            .collect();
        groups.push(members);
    }
    let args = vec![arg(dir.path()), "-d".into(), arg(&dir.path().join("del"))];

    let (stat, _) = run_text(&args);

    assert_eq!(stat.group_count, 4);
    for members in groups {
        assert!(members.iter().any(|p| p.exists()));
    }
}

#[test]
fn test_prefix_is_not_a_substring_match() {
    let dir = tempdir().unwrap();
    let a = write(dir.path().join("data/x"), b"content!");
    let b = write(dir.path().join("data-old/x"), b"content!");
    let args = vec![arg(dir.path()), "-d".into(), arg(&dir.path().join("data"))];

    let (stat, _) = run_text(&args);

    assert!(!a.exists());
    assert!(b.exists());
    assert_eq!(stat.deleted_file_count, 1);
}

#[test]
fn test_json_output_records_actions() {
    let (dir, [_, _, doomed]) = three_copies();
    let args = vec![
        arg(dir.path()),
        "-d".into(),
        arg(&dir.path().join("trash")),
        "--dry-run".into(),
        "-o".into(),
        "json".into(),
    ];

    let (stat, text) = run_text(&args);
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(stat.deleted_bytes, 100);
    assert_eq!(value["dry_run"], true);
    assert_eq!(value["approximate"], false);
    assert_eq!(value["groups"][0]["files"].as_array().unwrap().len(), 3);
    assert_eq!(
        value["groups"][0]["deleted"][0],
        doomed.to_str().unwrap()
    );
    assert_eq!(value["summary"]["duplicate_bytes"], 300);
    assert!(doomed.exists());
}

#[test]
fn test_fast_mode_warns_in_report() {
    let (dir, _) = three_copies();
    let (_, text) = run_text(&[arg(dir.path()), "--fast".into()]);

    let header = text.lines().position(|l| l == "      size   filename").unwrap();
    assert!(text.lines().nth(header - 1).unwrap().contains("approximate"));
}

#[test]
#[cfg(unix)]
fn test_root_reached_through_symlink_never_deletes_the_only_copy() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    let only = write(real.join("only.bin"), b"twenty bytes of data");
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let args = vec![arg(&real), arg(&link), "-d".into(), arg(&link)];
    let (stat, text) = run_text(&args);

    assert_eq!(stat.group_count, 0);
    assert_eq!(stat.deleted_file_count, 0);
    assert!(only.exists());
    assert!(!text.contains("deleted "));
}

#[test]
#[cfg(unix)]
fn test_hard_links_are_one_file() {
    let dir = tempdir().unwrap();
    let original = write(dir.path().join("keep/a"), b"shared inode");
    let second = dir.path().join("del/a");
    fs::create_dir_all(second.parent().unwrap()).unwrap();
    fs::hard_link(&original, &second).unwrap();

    let args = vec![arg(dir.path()), "-d".into(), arg(&dir.path().join("del"))];
    let (stat, _) = run_text(&args);

    assert_eq!(stat.group_count, 0);
    assert!(original.exists() && second.exists());
}
