use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target/unit-host-fs").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn part_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.to_string_lossy().ends_with(".part"))
        .collect()
}

#[test]
fn temp_sibling_stays_in_directory() {
    let temp = temp_sibling(Path::new("/a/b/front.jpg"));
    assert_eq!(temp.parent(), Some(Path::new("/a/b")));
    let name = temp.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".front.jpg.") && name.ends_with(".part"), "{name}");
}

#[test]
fn temp_sibling_differs_per_call() {
    let dst = Path::new("/a/b/front.jpg");
    assert_ne!(temp_sibling(dst), temp_sibling(dst));
}

#[test]
fn write_creates_parents_and_leaves_no_temp() {
    let dir = scratch("write");
    let dst = dir.join("nested/out.bin");
    LocalFs.write_bytes(&dst, b"hello").unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), b"hello");
    assert!(part_files(&dir.join("nested")).is_empty());

    LocalFs.write_bytes(&dst, b"again").unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), b"again");
}

#[test]
fn concurrent_writers_of_one_path_last_writer_wins() {
    let dir = scratch("concurrent");
    let dst = dir.join("same.bin");
    LocalFs.ensure_directory(&dir).unwrap();

    let large = vec![7u8; 8 * 1024 * 1024];
    let small = b"small".to_vec();
    for _ in 0..5 {
        let barrier = std::sync::Barrier::new(2);
        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| {
                barrier.wait();
                LocalFs.write_bytes(&dst, &large)
            });
            let b = s.spawn(|| {
                barrier.wait();
                LocalFs.write_bytes(&dst, &small)
            });
            (a.join().unwrap(), b.join().unwrap())
        });
        a.unwrap();
        b.unwrap();

        let written = std::fs::read(&dst).unwrap();
        assert!(written == large || written == small, "torn write: {} bytes", written.len());
        assert!(part_files(&dir).is_empty());
    }
}

#[test]
fn ensure_directory_is_idempotent() {
    let dir = scratch("ensure").join("a/b");
    LocalFs.ensure_directory(&dir).unwrap();
    LocalFs.ensure_directory(&dir).unwrap();
    assert!(dir.is_dir());
}

#[test]
fn copy_duplicates_content() {
    let dir = scratch("copy");
    let src = dir.join("src.bin");
    LocalFs.write_bytes(&src, b"payload").unwrap();
    let dst = dir.join("backup/dst.bin");
    LocalFs.copy_file(&src, &dst).unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), b"payload");
}

#[test]
fn copy_into_unwritable_parent_fails_cleanly() {
    let dir = scratch("blocked");
    let blocker = dir.join("blocker");
    LocalFs.write_bytes(&blocker, b"file, not dir").unwrap();

    let err = LocalFs.copy_file(&blocker, &blocker.join("dst.bin")).unwrap_err();
    assert!(matches!(err, SnapError::WriteFailed(_)), "{err:?}");
}

#[test]
fn discard_ignores_missing_files() {
    LocalFs.discard(Path::new("target/unit-host-fs/never-written.part"));
}
