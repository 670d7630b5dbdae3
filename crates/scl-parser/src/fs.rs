//! File access for the parser.
//!
//! Imports are resolved through [`FileSystem`], so the parser can run over
//! the disk or over an in-memory set of files in tests.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait FileSystem {
    /// Paths matching a glob pattern. An empty list is not an error.
    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>>;

    /// Open a file for reading, with its last modification time.
    fn open(&self, path: &Path) -> io::Result<(Box<dyn Read + '_>, SystemTime)>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSystem;

impl FileSystem for DiskSystem {
    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let entries = glob::glob(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(io::Error::from)?;
            if path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn open(&self, path: &Path) -> io::Result<(Box<dyn Read + '_>, SystemTime)> {
        let file = File::open(path)?;
        let modified = file.metadata()?.modified()?;
        Ok((Box::new(BufReader::new(file)), modified))
    }
}

/// Files held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemorySystem {
    files: BTreeMap<PathBuf, (String, SystemTime)>,
}

impl MemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .insert(path.into(), (content.into(), SystemTime::UNIX_EPOCH));
    }
}

impl FileSystem for MemorySystem {
    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        Ok(self
            .files
            .keys()
            .filter(|path| pattern.matches_path(path))
            .cloned()
            .collect())
    }

    fn open(&self, path: &Path) -> io::Result<(Box<dyn Read + '_>, SystemTime)> {
        match self.files.get(path) {
            Some((content, modified)) => Ok((Box::new(content.as_bytes()), *modified)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no such file or directory",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> MemorySystem {
        MemorySystem::new()
            .with_file("main.scl", "main")
            .with_file("lib/a.scl", "a")
            .with_file("lib/b.scl", "b")
            .with_file("lib/notes.txt", "notes")
    }

    fn read(fs: &MemorySystem, path: &str) -> io::Result<String> {
        let (mut reader, _) = fs.open(Path::new(path))?;
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(content)
    }

    #[test]
    fn test_memory_glob() {
        let fs = sample();
        assert_eq!(
            fs.glob("lib/*.scl").unwrap(),
            vec![PathBuf::from("lib/a.scl"), PathBuf::from("lib/b.scl")]
        );
        assert_eq!(fs.glob("main.scl").unwrap(), vec![PathBuf::from("main.scl")]);
        assert!(fs.glob("missing/*.scl").unwrap().is_empty());
    }

    #[test]
    fn test_memory_glob_invalid_pattern() {
        let err = sample().glob("lib/[").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_memory_open() {
        let fs = sample();
        assert_eq!(read(&fs, "lib/b.scl").unwrap(), "b");

        let err = read(&fs, "nope.scl").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "no such file or directory");
    }

    #[test]
    fn test_disk_glob_and_open() {
        let dir = std::env::temp_dir().join(format!("scl-fs-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("one.scl"), "one = 1").unwrap();
        std::fs::write(dir.join("two.scl"), "two = 2").unwrap();

        let fs = DiskSystem;
        let pattern = dir.join("*.scl");
        let mut found = fs.glob(&pattern.to_string_lossy()).unwrap();
        found.sort();
        assert_eq!(found, vec![dir.join("one.scl"), dir.join("two.scl")]);

        // Directories never match.
        assert!(fs.glob(&dir.join("su*").to_string_lossy()).unwrap().is_empty());

        let (mut reader, _) = fs.open(&dir.join("two.scl")).unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "two = 2");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
