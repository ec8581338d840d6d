//! Native file-backed host storage
//!
//! One file per record under `<data_dir>/<database>/`. Writes go to a
//! temporary file first and are renamed over the record, so a crash never
//! leaves a half-written save. Completions run on [`FileStore::pump`].

use std::fs;
use std::path::{Path, PathBuf};

use super::queue::CompletionQueue;
use super::{LoadCallback, RecordStore, StoreCallback};
use crate::config::ShellConfig;
use crate::error::StorageError;

pub struct FileStore {
    root: PathBuf,
    queue: CompletionQueue,
}

impl FileStore {
    pub fn new(config: &ShellConfig) -> Result<Self, StorageError> {
        let base = config
            .data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self::at(base.join(&config.database))
    }

    pub fn at(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::debug!("File store at {}", root.display());
        Ok(Self {
            root,
            queue: CompletionQueue::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Perform queued work and deliver completions. Returns how many ran.
    pub fn pump(&self) -> usize {
        self.queue.drain()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn record_path(root: &Path, record: &str) -> PathBuf {
        let name: String = record
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        root.join(format!("{}.bin", name))
    }

    fn write_record(path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_record(path: &Path) -> Result<Vec<u8>, StorageError> {
        match fs::read(path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::Missing),
            Err(e) => Err(e.into()),
        }
    }
}

impl RecordStore for FileStore {
    fn store(&self, record: &str, data: Vec<u8>, on_done: StoreCallback) {
        let path = Self::record_path(&self.root, record);
        self.queue.push(move || on_done(Self::write_record(&path, &data)));
    }

    fn load(&self, record: &str, on_done: LoadCallback) {
        let path = Self::record_path(&self.root, record);
        self.queue.push(move || on_done(Self::read_record(&path)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_dir(name: &str) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "frame_shell_test_{}_{}_{}",
            std::process::id(),
            name,
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_store_then_load() {
        let dir = scratch_dir("roundtrip");
        let store = FileStore::at(&dir).unwrap();

        let stored = Rc::new(RefCell::new(None));
        let sink = stored.clone();
        store.store(
            "savedata",
            vec![1, 2, 3],
            Box::new(move |r: Result<(), StorageError>| *sink.borrow_mut() = Some(r.is_ok())),
        );
        assert!(!dir.join("savedata.bin").exists(), "write happens on pump");
        store.pump();
        assert_eq!(*stored.borrow(), Some(true));
        assert!(!dir.join("savedata.tmp").exists());

        let loaded = Rc::new(RefCell::new(None));
        let sink = loaded.clone();
        store.load(
            "savedata",
            Box::new(move |r: Result<Vec<u8>, StorageError>| *sink.borrow_mut() = r.ok()),
        );
        store.pump();
        assert_eq!(*loaded.borrow(), Some(vec![1, 2, 3]));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_maps_to_missing() {
        let dir = scratch_dir("missing");
        let store = FileStore::at(&dir).unwrap();

        let missing = Rc::new(RefCell::new(false));
        let sink = missing.clone();
        store.load(
            "savedata",
            Box::new(move |r: Result<Vec<u8>, StorageError>| {
                *sink.borrow_mut() = matches!(r, Err(StorageError::Missing))
            }),
        );
        store.pump();
        assert!(*missing.borrow());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_record_names_stay_inside_root() {
        let path = FileStore::record_path(Path::new("/base"), "../etc/passwd");
        assert_eq!(path, PathBuf::from("/base/___etc_passwd.bin"));
    }

    #[test]
    fn test_new_uses_config_dirs() {
        let dir = scratch_dir("config");
        let config = ShellConfig {
            data_dir: Some(dir.to_string_lossy().into_owned()),
            ..ShellConfig::default()
        };
        let store = FileStore::new(&config).unwrap();
        assert_eq!(store.root(), dir.join(&config.database).as_path());
        assert!(store.root().is_dir());

        let _ = fs::remove_dir_all(&dir);
    }
}
