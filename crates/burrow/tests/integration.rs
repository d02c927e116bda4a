// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(clippy::missing_panics_doc, reason = "Tests")]
#![allow(clippy::missing_errors_doc, reason = "Tests")]
#![allow(unused_results, reason = "Tests")]
#![allow(missing_docs, reason = "Tests")]
#![allow(clippy::assertions_on_result_states, reason = "Tests use assert!(x.is_err()) for clarity")]

use std::path::{Path, PathBuf};

use burrow::{
    BufferedFile, DeleteOptions, DirEntry, Directory, EntryType, ErrorKind, Filesystem, OpenMode, OpenOptions, StdFilesystem,
    TreeDeleter, Whence, delete_tree,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Creates `root` with a mix of files, empty directories and nesting.
fn build_tree(root: &Path) {
    std::fs::create_dir_all(root.join("a/b/c")).unwrap();
    std::fs::create_dir_all(root.join("empty")).unwrap();
    std::fs::create_dir_all(root.join("files_only")).unwrap();
    std::fs::write(root.join("top.txt"), b"top").unwrap();
    std::fs::write(root.join("a/one"), b"1").unwrap();
    std::fs::write(root.join("a/b/two"), b"2").unwrap();
    std::fs::write(root.join("a/b/c/three"), b"3").unwrap();
    for i in 0..20 {
        std::fs::write(root.join(format!("files_only/{i}")), b"x").unwrap();
    }
}

/// Removes through [`StdFilesystem`], remembering what went, and refuses to
/// remove one file name.
struct Refusing {
    refused: &'static str,
    removed: std::cell::RefCell<Vec<PathBuf>>,
}

impl Filesystem for Refusing {
    type Enumerator = Directory;

    fn entry_type(&self, path: &Path) -> burrow::Result<EntryType> {
        StdFilesystem.entry_type(path)
    }

    fn open_dir(&self, path: &Path) -> burrow::Result<Directory> {
        StdFilesystem.open_dir(path)
    }

    fn remove_file(&self, path: &Path) -> burrow::Result<()> {
        if path.file_name().is_some_and(|name| name == self.refused) {
            return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into());
        }
        StdFilesystem.remove_file(path)?;
        self.removed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn remove_empty_dir(&self, path: &Path) -> burrow::Result<()> {
        StdFilesystem.remove_empty_dir(path)?;
        self.removed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

// ===========================================================================
// Tree deletion
// ===========================================================================

mod tree_deletion {
    use super::*;

    #[test]
    fn deletes_whole_tree() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("tree");
        build_tree(&root);

        delete_tree(&root).unwrap();
        assert!(!root.exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn reports_stats() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("tree");
        build_tree(&root);

        let stats = TreeDeleter::new(DeleteOptions::new()).delete(&root).unwrap();
        assert_eq!(stats.files_removed, 24);
        assert_eq!(stats.dirs_removed, 6);
    }

    #[test]
    fn deletes_empty_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("empty");
        std::fs::create_dir(&root).unwrap();

        delete_tree(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn deletes_deep_nesting() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deep");
        let mut leaf = root.clone();
        for level in 0..64 {
            leaf.push(format!("d{level}"));
        }
        std::fs::create_dir_all(&leaf).unwrap();
        std::fs::write(leaf.join("bottom"), b"!").unwrap();

        let stats = TreeDeleter::new(DeleteOptions::new()).delete(&root).unwrap();
        assert!(!root.exists());
        assert_eq!(stats.dirs_removed, 65);
    }

    #[test]
    fn wide_directory_keeps_inner_arena_bounded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("wide");
        std::fs::create_dir(&root).unwrap();
        for i in 0..3_000 {
            std::fs::write(root.join(format!("{i:05}")), b"").unwrap();
        }

        let options = DeleteOptions::new().inner_clear_interval(250);
        let stats = TreeDeleter::new(options).delete(&root).unwrap();

        assert!(!root.exists());
        assert_eq!(stats.files_removed, 3_000);
        assert!(stats.inner_peak <= 250, "inner peak {}", stats.inner_peak);
        assert_eq!(stats.inner_clears, 11);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_removed_not_followed() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("keep.txt"), b"keep").unwrap();

        let root = tmp.path().join("tree");
        std::fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link_to_dir")).unwrap();
        std::os::unix::fs::symlink(root.join("missing"), root.join("dangling")).unwrap();

        delete_tree(&root).unwrap();
        assert!(!root.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_root_removes_only_the_link() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(outside.join("nested")).unwrap();
        std::fs::write(outside.join("keep.txt"), b"keep").unwrap();
        std::fs::write(outside.join("nested/also.txt"), b"keep").unwrap();

        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&outside, &link).unwrap();

        let stats = TreeDeleter::new(DeleteOptions::new()).delete(&link).unwrap();
        assert_eq!(stats.files_removed, 1);
        assert_eq!(stats.dirs_removed, 0);
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert!(outside.join("keep.txt").exists());
        assert!(outside.join("nested/also.txt").exists());
    }

    #[test]
    fn missing_root_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let error = delete_tree(tmp.path().join("nope")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("failed to read metadata"), "got: {error}");
    }

    #[test]
    fn file_as_root_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain");
        std::fs::write(&file, b"x").unwrap();

        assert!(delete_tree(&file).is_err());
        assert!(file.exists());
    }

    #[test]
    fn failure_stops_and_keeps_progress() {
        init_tracing();
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("tree");
        build_tree(&root);
        std::fs::write(root.join("a/b/poison"), b"no").unwrap();

        let fs = Refusing {
            refused: "poison",
            removed: std::cell::RefCell::default(),
        };
        let deleter = TreeDeleter::with_filesystem(fs, DeleteOptions::new());
        let error = deleter.delete(&root).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(
            error.io_error().map(std::io::Error::kind),
            Some(std::io::ErrorKind::PermissionDenied)
        );
        assert!(root.join("a/b/poison").exists());
        assert!(root.exists());
        for removed in deleter.filesystem().removed.borrow().iter() {
            assert!(!removed.exists(), "{} came back", removed.display());
        }
    }
}

// ===========================================================================
// Directory handles
// ===========================================================================

mod directory {
    use super::*;

    #[test]
    fn lists_entries_with_types() {
        let tmp = TempDir::new().unwrap();
        build_tree(tmp.path());

        let mut dir = Directory::open(tmp.path()).unwrap();
        let mut entries: Vec<DirEntry> = dir.entries().map(Result::unwrap).collect();
        entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));

        let summary: Vec<(String, EntryType)> = entries
            .iter()
            .map(|e| (e.file_name().to_string_lossy().into_owned(), e.entry_type()))
            .collect();
        assert_eq!(
            summary,
            [
                ("a".to_owned(), EntryType::Directory),
                ("empty".to_owned(), EntryType::Directory),
                ("files_only".to_owned(), EntryType::Directory),
                ("top.txt".to_owned(), EntryType::File),
            ]
        );
    }

    #[test]
    fn closed_handle_rejects_reads() {
        let tmp = TempDir::new().unwrap();
        let mut dir = Directory::open(tmp.path()).unwrap();
        dir.close().unwrap();
        dir.close().unwrap();

        assert_eq!(dir.read().unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(dir.to_string(), format!("closed directory ({})", tmp.path().display()));
    }
}

// ===========================================================================
// Buffered files
// ===========================================================================

mod buffered_file {
    use super::*;

    fn file_with(content: &[u8], capacity: usize) -> (TempDir, PathBuf, BufferedFile) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.bin");
        std::fs::write(&path, content).unwrap();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .buffer_capacity(capacity)
            .open(&path)
            .unwrap();
        (tmp, path, file)
    }

    #[test]
    fn relative_seek_after_read_ahead() {
        let content: Vec<u8> = (0..=255).collect();
        let (_tmp, _path, mut file) = file_with(&content, 64);

        let head = file.read_chars(10).unwrap().unwrap();
        assert_eq!(head, content[..10]);
        assert_eq!(file.seek(Whence::Cur, 0).unwrap(), 10);
        assert_eq!(file.seek(Whence::Cur, -10).unwrap(), 0);
        assert_eq!(file.read_to_end().unwrap(), content);
    }

    #[test]
    fn seek_far_then_read() {
        let content: Vec<u8> = (0..200).collect();
        let (_tmp, _path, mut file) = file_with(&content, 16);

        file.read_chars(3).unwrap();
        assert_eq!(file.seek(Whence::Set, 150).unwrap(), 150);
        assert_eq!(file.read_chars(2).unwrap(), Some(vec![150, 151]));
        assert_eq!(file.seek(Whence::End, -1).unwrap(), 199);
        assert_eq!(file.read_chars(5).unwrap(), Some(vec![199]));
    }

    #[test]
    fn interleaved_reads_and_writes_reach_disk() {
        let (_tmp, path, mut file) = file_with(b"hello world\n", 4);

        assert_eq!(file.read_chars(6).unwrap(), Some(b"hello ".to_vec()));
        file.write("WORLD").unwrap();
        assert_eq!(file.read_line().unwrap(), Some(Vec::new()));

        file.seek(Whence::Set, 0).unwrap();
        assert_eq!(file.read_line().unwrap(), Some(b"hello WORLD".to_vec()));
        file.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello WORLD\n");
    }

    #[test]
    fn drop_flushes() {
        let (_tmp, path, mut file) = file_with(b"", 1024);
        file.write("pending").unwrap();
        drop(file);
        assert_eq!(std::fs::read(&path).unwrap(), b"pending");
    }

    #[test]
    fn numbers_and_lines() {
        let (_tmp, _path, mut file) = file_with(b"3 4.25\nrest of line\n", 8);
        assert_eq!(file.read_number().unwrap(), Some(3.0));
        assert_eq!(file.read_number().unwrap(), Some(4.25));
        assert_eq!(file.read_line().unwrap(), Some(Vec::new()));
        assert_eq!(file.read_line().unwrap(), Some(b"rest of line".to_vec()));
        assert_eq!(file.read_line().unwrap(), None);
    }

    #[test]
    fn use_after_close() {
        let (_tmp, path, mut file) = file_with(b"x", 8);
        assert_eq!(file.to_string(), format!("file ({})", path.display()));
        file.close().unwrap();
        file.close().unwrap();
        assert_eq!(file.to_string(), "file (closed)");
        assert_eq!(file.read_chars(1).unwrap_err().kind(), ErrorKind::Closed);
    }
}

// ===========================================================================
// Open modes
// ===========================================================================

mod open_mode {
    use super::*;

    fn open(path: &Path, mode: &str) -> BufferedFile {
        mode.parse::<OpenMode>().unwrap().options().open(path).unwrap()
    }

    #[test]
    fn write_mode_creates_and_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("w.txt");

        let mut file = open(&path, "w");
        file.write("first version").unwrap();
        file.close().unwrap();

        let mut file = open(&path, "wb");
        file.write("v2").unwrap();
        file.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn append_mode_appends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, b"one\n").unwrap();

        let mut file = open(&path, "a+");
        file.write("two\n").unwrap();
        file.seek(Whence::Set, 0).unwrap();
        assert_eq!(file.read_to_end().unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn read_mode_requires_existing_file() {
        let tmp = TempDir::new().unwrap();
        let error = "r"
            .parse::<OpenMode>()
            .unwrap()
            .options()
            .open(tmp.path().join("missing"))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn read_mode_cannot_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("r.txt");
        std::fs::write(&path, b"data").unwrap();

        let mut file = open(&path, "r");
        file.write("zz").unwrap();
        assert!(file.flush().is_err());
    }
}
