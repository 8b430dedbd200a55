use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
use dupesweep::scanner::{collect_records, HashScope, ScanConfig, Walker};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(path: PathBuf, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::new(FinderConfig::default());

    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_same_size_different_content() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.txt"), b"content a");
    write(dir.path().join("b.txt"), b"content b");

    let finder = DuplicateFinder::new(FinderConfig::default());
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.hashed_files, 2);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.txt"), b"nested duplicate");
    write(dir.path().join("sub/deeper/b.txt"), b"nested duplicate");
    write(dir.path().join("sub/c.txt"), b"nested duplicate");

    let finder = DuplicateFinder::new(FinderConfig::default());
    let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 3);
}

#[test]
fn test_scan_overlapping_roots_yield_each_file_once() {
    let dir = tempdir().unwrap();
    write(dir.path().join("x/one"), b"same");
    write(dir.path().join("x/two"), b"same");

    let roots = vec![
        dir.path().to_path_buf(),
        dir.path().join("x"),
        dir.path().join("x/../x"),
    ];
    let walker = Walker::new(roots.clone(), ScanConfig::default());
    let outcome = collect_records(walker.walk(), None);

    let unique: HashSet<_> = outcome.records.iter().map(|r| r.path.clone()).collect();
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(unique.len(), 2);

    let finder = DuplicateFinder::new(FinderConfig::default());
    let (groups, _) = finder.find_duplicates(&roots).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files.len(), 2);
}

#[test]
fn test_scan_groups_sorted_by_size() {
    let dir = tempdir().unwrap();
    for (name, content) in [
        ("big1", &b"0123456789"[..]),
        ("small1", b"ab"),
        ("big2", b"0123456789"),
        ("small2", b"ab"),
        ("mid1", b"hello"),
        ("mid2", b"hello"),
    ] {
        write(dir.path().join(name), content);
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(3));
    let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    let sizes: Vec<u64> = groups.iter().map(|g| g.size).collect();
    assert_eq!(sizes, vec![2, 5, 10]);
}

#[test]
fn test_scan_empty_files_are_duplicates_without_min_size() {
    let dir = tempdir().unwrap();
    write(dir.path().join("e1"), b"");
    write(dir.path().join("e2"), b"");

    let finder = DuplicateFinder::new(FinderConfig::default());
    let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);

    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(1));
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
}

#[test]
fn test_fast_mode_is_approximate() {
    let dir = tempdir().unwrap();
    let mut a = vec![b'z'; 4096];
    let mut b = a.clone();
    a.extend_from_slice(b"end-a");
    b.extend_from_slice(b"end-b");
    write(dir.path().join("a"), &a);
    write(dir.path().join("b"), &b);

    let exact = DuplicateFinder::new(FinderConfig::default());
    let (groups, summary) = exact.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    assert!(groups.is_empty());
    assert!(!summary.approximate);

    let fast = DuplicateFinder::new(FinderConfig::default().with_scope(HashScope::Prefix(1024)));
    let (groups, summary) = fast.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(groups.len(), 1);
    assert!(summary.approximate);
    assert_eq!(summary.bytes_to_hash, 2048);
}

#[cfg(unix)]
#[test]
fn test_scan_skips_symlinks() {
    let dir = tempdir().unwrap();
    let target = write(dir.path().join("real"), b"linked content");
    std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default());
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_files_are_not_reported() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let a = write(dir.path().join("a"), b"secret");
    let b = write(dir.path().join("b"), b"secret");
    fs::set_permissions(&a, fs::Permissions::from_mode(0o000)).unwrap();
    fs::set_permissions(&b, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; the check only makes sense for normal users.
    if File::open(&a).is_ok() {
        return;
    }

    let finder = DuplicateFinder::new(FinderConfig::default());
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.unreadable_files, 2);
    assert!(a.exists() && b.exists());
}
