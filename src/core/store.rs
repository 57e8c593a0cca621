//! SE-013: Document file storage with atomic writes.
//!
//! Writers never leave a torn file: content goes to a uniquely named
//! temporary file in the target directory, which is then renamed over the
//! destination. Two racing writers each rename a complete file; the last
//! rename wins.

use std::io::Write;
use std::path::Path;

/// Read a whole document. Returns None if the file doesn't exist.
pub fn read_text(path: &Path) -> Result<Option<String>, String> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

/// Write a document atomically (unique temp file, then rename).
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), String> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| format!("cannot create temp file in {}: {}", parent.display(), e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("cannot write {}: {}", tmp.path().display(), e))?;
    tmp.persist(path)
        .map_err(|e| format!("cannot rename temp file → {}: {}", path.display(), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_se013_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes").join("main.tscn");
        write_atomic(&path, "[gd_scene format=3]\n").unwrap();
        let text = read_text(&path).unwrap().unwrap();
        assert_eq!(text, "[gd_scene format=3]\n");
    }

    #[test]
    fn test_se013_read_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_text(&dir.path().join("ghost.tscn")).unwrap().is_none());
    }

    #[test]
    fn test_se013_atomic_write_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tres");
        write_atomic(&path, "one").unwrap();
        write_atomic(&path, "two").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }

    #[test]
    fn test_se013_concurrent_writers_leave_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.tscn");
        let a = "A".repeat(64 * 1024);
        let b = "B".repeat(64 * 1024);
        std::thread::scope(|s| {
            for content in [&a, &b] {
                let path = &path;
                s.spawn(move || {
                    for _ in 0..10 {
                        write_atomic(path, content).unwrap();
                    }
                });
            }
        });
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text == a || text == b);
    }
}
