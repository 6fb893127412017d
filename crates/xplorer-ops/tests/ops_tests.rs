use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use xplorer_ops::{FileOps, Operation, OperationEvent, OpsConfig, OpsError};

fn write(path: &Path, len: usize) -> Vec<u8> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    fs::write(path, &data).unwrap();
    data
}

fn small_chunks() -> OpsConfig {
    OpsConfig::builder().chunk_size(1024usize).build().unwrap()
}

#[test]
fn test_copy_paste_scenario() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let one = src.path().join("1.txt");
    let two = src.path().join("2.txt");
    let three = src.path().join("dir/3.txt");
    let one_data = write(&one, 10);
    let two_data = write(&two, 20);
    let three_data = write(&three, 30);

    let mut ops = FileOps::new();
    for path in [&one, &two, &three] {
        ops.toggle_selection(path);
    }
    assert_eq!(ops.selection().len(), 3);
    ops.copy_selected();
    assert!(ops.has_clipboard());

    let summary = ops.paste(dest.path()).unwrap();
    assert_eq!(summary.operation, Operation::Copy);
    assert_eq!(summary.paths.len(), 3);

    assert_eq!(fs::read(dest.path().join("1.txt")).unwrap(), one_data);
    assert_eq!(fs::read(dest.path().join("2.txt")).unwrap(), two_data);
    assert_eq!(fs::read(dest.path().join("3.txt")).unwrap(), three_data);

    // Sources untouched.
    assert_eq!(fs::read(&one).unwrap(), one_data);
    assert_eq!(fs::read(&three).unwrap(), three_data);

    let snapshot = ops.progress().snapshot();
    assert_eq!(snapshot.total_bytes, 60);
    assert_eq!(snapshot.processed_bytes, 60);
    assert_eq!(snapshot.processed_files, 3);
    assert!(!snapshot.active);

    // Copy keeps the clipboard for repeated pastes.
    assert!(ops.has_clipboard());
    assert_eq!(ops.clipboard().operation(), Operation::Copy);
}

#[test]
fn test_paste_conflict_gets_copy_suffix() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let one = src.path().join("1.txt");
    let data = write(&one, 10);
    fs::write(dest.path().join("1.txt"), b"original").unwrap();

    let mut ops = FileOps::new();
    ops.copy(vec![one]);
    let summary = ops.paste(dest.path()).unwrap();

    assert_eq!(summary.paths, vec![dest.path().join("1_copy1.txt")]);
    assert_eq!(fs::read(dest.path().join("1.txt")).unwrap(), b"original");
    assert_eq!(fs::read(dest.path().join("1_copy1.txt")).unwrap(), data);

    // Pasting again probes the next free suffix.
    let summary = ops.paste(dest.path()).unwrap();
    assert_eq!(summary.paths, vec![dest.path().join("1_copy2.txt")]);
}

#[test]
fn test_cut_paste_moves_and_clears_clipboard() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let file = src.path().join("move_me.bin");
    let data = write(&file, 5000);
    let tree = src.path().join("tree");
    write(&tree.join("a/b.txt"), 40);

    let mut ops = FileOps::new();
    ops.cut(vec![file.clone(), tree.clone()]);
    let summary = ops.paste(dest.path()).unwrap();

    assert!(!file.exists());
    assert!(!tree.exists());
    assert_eq!(fs::read(dest.path().join("move_me.bin")).unwrap(), data);
    assert!(dest.path().join("tree/a/b.txt").is_file());

    assert_eq!(summary.operation, Operation::Cut);
    assert_eq!(summary.bytes, 5040);
    assert_eq!(summary.files, 2);
    assert!(!ops.has_clipboard());
    assert_eq!(ops.clipboard().operation(), Operation::None);
}

#[test]
fn test_failed_cut_keeps_clipboard_and_prefix() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let first = src.path().join("first.txt");
    let tree = src.path().join("tree");
    let nested = tree.join("nested.txt");
    write(&first, 3);
    write(&nested, 4);

    let mut ops = FileOps::new();
    // Moving the tree first makes the nested path vanish before its turn.
    ops.cut(vec![first.clone(), tree.clone(), nested.clone()]);
    let err = ops.paste(dest.path()).unwrap_err();

    assert!(matches!(err, OpsError::Move { ref path, .. } if *path == nested));
    assert!(dest.path().join("first.txt").exists());
    assert!(dest.path().join("tree/nested.txt").exists());
    assert!(ops.has_clipboard());
    assert!(!ops.progress().is_active());
}

#[test]
fn test_recursive_copy_counts_every_file() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let root = src.path().join("project");
    let mut expected_bytes = 0u64;
    for (i, rel) in ["a.txt", "b/c.txt", "b/d/e.txt", "f/g.txt"].iter().enumerate() {
        let len = 1000 * (i + 1) + 7;
        write(&root.join(rel), len);
        expected_bytes += len as u64;
    }

    let mut ops = FileOps::with_config(small_chunks());
    ops.copy(vec![root.clone()]);
    let summary = ops.paste(dest.path()).unwrap();

    assert_eq!(summary.files, 4);
    assert_eq!(summary.bytes, expected_bytes);

    let snapshot = ops.progress().snapshot();
    assert_eq!(snapshot.processed_files, 4);
    assert_eq!(snapshot.total_files, 4);
    assert_eq!(snapshot.processed_bytes, expected_bytes);
    assert_eq!(snapshot.total_bytes, expected_bytes);
    assert_eq!(snapshot.percent(), 100);

    for rel in ["a.txt", "b/c.txt", "b/d/e.txt", "f/g.txt"] {
        assert_eq!(
            fs::read(dest.path().join("project").join(rel)).unwrap(),
            fs::read(root.join(rel)).unwrap()
        );
    }
}

#[test]
fn test_paste_missing_source_fails_during_sizing() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let present = src.path().join("here.txt");
    write(&present, 5);
    let missing = src.path().join("gone.txt");

    let mut ops = FileOps::new();
    ops.copy(vec![present, missing.clone()]);
    let err = ops.paste(dest.path()).unwrap_err();

    assert!(matches!(err, OpsError::Sizing { ref path, .. } if *path == missing));
    assert!(!dest.path().join("here.txt").exists());
}

#[test]
fn test_delete_removes_all() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file.txt");
    let tree = dir.path().join("tree");
    write(&file, 10);
    write(&tree.join("x/y.txt"), 20);

    let mut ops = FileOps::new();
    ops.toggle_selection(&file);
    let summary = ops.delete(vec![file.clone(), tree.clone()]).unwrap();

    assert!(!file.exists());
    assert!(!tree.exists());
    assert_eq!(summary.operation, Operation::Delete);
    assert_eq!(summary.bytes, 30);
    assert_eq!(summary.files, 2);
    assert!(ops.selection().is_empty());

    let snapshot = ops.progress().snapshot();
    assert_eq!(snapshot.operation, Operation::Delete);
    assert!(!snapshot.active);
}

#[test]
fn test_delete_with_missing_path_reports_error() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    write(&a, 1);
    write(&b, 1);
    let missing = dir.path().join("missing.txt");

    let mut ops = FileOps::new();
    let err = ops.delete(vec![a.clone(), missing.clone(), b.clone()]).unwrap_err();
    assert_eq!(err.path(), Some(&missing));
}

#[test]
fn test_delete_abort_keeps_removed_prefix() {
    let dir = TempDir::new().unwrap();
    let tree = dir.path().join("tree");
    let child = tree.join("child.txt");
    let other = dir.path().join("other.txt");
    write(&child, 8);
    write(&other, 8);

    let mut ops = FileOps::new();
    let err = ops
        .delete(vec![tree.clone(), child.clone(), other.clone()])
        .unwrap_err();

    assert!(matches!(err, OpsError::Delete { ref path, .. } if *path == child));
    assert!(!tree.exists());
    assert!(other.exists(), "batch stops at the first failure");

    let snapshot = ops.progress().snapshot();
    assert_eq!(snapshot.processed_files, 1);
    assert!(!snapshot.active);
}

#[test]
fn test_rename_and_create() {
    let dir = TempDir::new().unwrap();
    let ops = FileOps::new();

    let file = ops.create_file(dir.path(), "a.txt").unwrap();
    let folder = ops.create_folder(dir.path(), "docs").unwrap();
    assert!(file.is_file());
    assert!(folder.is_dir());

    fs::write(dir.path().join("b.txt"), b"keep").unwrap();
    let err = ops.rename(&file, "b.txt").unwrap_err();
    assert!(err.to_string().contains("Already exists"));
    assert!(file.exists());
    assert_eq!(fs::read(dir.path().join("b.txt")).unwrap(), b"keep");

    let renamed = ops.rename(&file, "c.txt").unwrap();
    assert_eq!(renamed, dir.path().join("c.txt"));
    assert_eq!(ops.rename(&renamed, "c.txt").unwrap(), renamed);

    assert!(matches!(
        ops.rename(&renamed, ""),
        Err(OpsError::EmptyName { .. })
    ));
    assert!(matches!(
        ops.create_folder(dir.path(), "docs"),
        Err(OpsError::AlreadyExists { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_background_paste_progress_is_monotonic() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let big = src.path().join("big.bin");
    let data = write(&big, 4 * 1024 * 1024);
    let tree = src.path().join("tree");
    write(&tree.join("one.bin"), 300_000);
    write(&tree.join("two/three.bin"), 200_000);
    let total = (data.len() + 500_000) as u64;

    let mut ops = FileOps::with_config(small_chunks());
    ops.copy(vec![big, tree]);
    let tracker = ops.progress();
    let mut handle = ops.start_paste(dest.path()).unwrap();
    assert_eq!(handle.operation(), Operation::Copy);

    let mut samples = Vec::new();
    let completion = loop {
        samples.push(tracker.snapshot().processed_bytes);
        match handle.try_recv() {
            Some(OperationEvent::Complete(completion)) => break completion,
            Some(OperationEvent::Progress(snapshot)) => {
                assert!(snapshot.processed_bytes <= snapshot.total_bytes);
            }
            None => tokio::time::sleep(Duration::from_micros(200)).await,
        }
    };
    samples.push(tracker.snapshot().processed_bytes);

    assert!(samples.windows(2).all(|w| w[0] <= w[1]), "bytes went backwards");
    assert_eq!(samples.last().copied(), Some(total));

    let summary = ops.finish(completion).unwrap();
    assert_eq!(summary.bytes, total);
    assert_eq!(summary.files, 3);
    assert!(!ops.is_busy());
    assert_eq!(fs::read(dest.path().join("big.bin")).unwrap(), data);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_operation_while_busy_is_rejected() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let big = src.path().join("big.bin");
    write(&big, 16 * 1024 * 1024);
    let victim = src.path().join("victim.txt");
    write(&victim, 1);

    let mut ops = FileOps::with_config(small_chunks());
    ops.copy(vec![big]);
    let handle = ops.start_paste(dest.path()).unwrap();

    assert!(ops.is_busy());
    assert!(matches!(
        ops.start_delete(vec![victim.clone()]),
        Err(OpsError::Busy)
    ));
    assert!(victim.exists());

    let completion = handle.wait().await;
    ops.finish(completion).unwrap();
    assert!(!ops.is_busy());

    let completion = ops.start_delete(vec![victim.clone()]).unwrap().wait().await;
    assert_eq!(completion.operation, Operation::Delete);
    ops.finish(completion).unwrap();
    assert!(!victim.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_background_cut_clears_clipboard_on_finish() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let file = src.path().join("note.md");
    write(&file, 64);

    let mut ops = FileOps::new();
    ops.cut(vec![file.clone()]);
    let completion = ops.start_paste(dest.path()).unwrap().wait().await;

    // Side effects are applied by the input context, not the worker.
    assert!(ops.has_clipboard());
    let summary = ops.finish(completion).unwrap();

    assert_eq!(summary.paths, vec![dest.path().join("note.md")]);
    assert!(!ops.has_clipboard());
    assert!(!file.exists());
}

#[test]
fn test_empty_clipboard_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let mut ops = FileOps::new();
    ops.copy(Vec::<PathBuf>::new());

    let err = ops.paste(dir.path()).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, OpsError::EmptyClipboard));
}

#[cfg(unix)]
#[test]
fn test_copy_tree_with_file_symlink_counts_target_bytes() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let big = src.path().join("big.bin");
    let big_data = write(&big, 100_000);
    let tree = src.path().join("tree");
    write(&tree.join("small.txt"), 10);
    std::os::unix::fs::symlink("../big.bin", tree.join("link.bin")).unwrap();

    let mut ops = FileOps::with_config(small_chunks());
    ops.copy(vec![tree]);
    let summary = ops.paste(dest.path()).unwrap();

    assert_eq!(fs::read(dest.path().join("tree/link.bin")).unwrap(), big_data);
    assert_eq!(summary.bytes, 100_010);
    assert_eq!(summary.files, 2);

    let snapshot = ops.progress().snapshot();
    assert_eq!(snapshot.total_bytes, 100_010);
    assert_eq!(snapshot.processed_bytes, 100_010);
}

#[cfg(unix)]
#[test]
fn test_copy_tree_with_directory_symlink() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    write(&src.path().join("target_dir/inner.txt"), 25);
    let tree = src.path().join("tree");
    write(&tree.join("a.txt"), 5);
    std::os::unix::fs::symlink("../target_dir", tree.join("dirlink")).unwrap();

    let mut ops = FileOps::new();
    ops.copy(vec![tree]);
    let summary = ops.paste(dest.path()).unwrap();

    let copied = dest.path().join("tree/dirlink");
    assert!(copied.is_dir());
    assert_eq!(fs::read(copied.join("inner.txt")).unwrap().len(), 25);
    assert_eq!(summary.files, 2);
    assert_eq!(summary.bytes, 30);
}

#[cfg(unix)]
#[test]
fn test_copy_tree_with_link_loop_fails_before_writing() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let tree = src.path().join("tree");
    write(&tree.join("a.txt"), 5);
    std::os::unix::fs::symlink(".", tree.join("again")).unwrap();

    let mut ops = FileOps::new();
    ops.copy(vec![tree]);
    let err = ops.paste(dest.path()).unwrap_err();

    assert!(matches!(err, OpsError::Sizing { .. }));
    assert!(!dest.path().join("tree").exists());
}

#[test]
fn test_paste_into_missing_directory_reports_os_error() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let file = src.path().join("a.txt");
    write(&file, 3);
    let missing = dest.path().join("nowhere");

    let mut ops = FileOps::new();
    ops.copy(vec![file]);
    let err = ops.paste(&missing).unwrap_err();

    assert!(matches!(err, OpsError::Sizing { ref path, .. } if *path == missing));
    assert!(!err.is_validation());
    assert!(ops.has_clipboard());
}
