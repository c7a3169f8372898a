//! File access for reading and writing GenBank records
//!
//! Paths are resolved through a [`Storage`] so that the filesystem can be swapped out,
//! for instance by an in-memory store in tests. Input is transparently decompressed
//! (gzip, bzip2, xz and zstd are detected from the stream's magic bytes).

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use auto_impl::auto_impl;
use tracing::debug;

use crate::{build, build_multi, parse, parse_multi, Record, Result};

/// Opens paths for reading and creates them for writing
#[auto_impl(&, Box, Arc)]
pub trait Storage {
    /// Opens an existing path for reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// Creates (or truncates) a path for writing
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;
}

/// The local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;
impl Storage for LocalStorage {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(File::create(path)?))
    }
}

/// Opens a path and wraps it in the matching decompressor
fn open_decompressed<S: Storage>(storage: &S, path: &Path) -> Result<Box<dyn Read>> {
    let handle = storage.open(path)?;
    let (reader, format) = niffler::get_reader(handle)?;
    debug!(path = %path.display(), ?format, "opened input");
    Ok(reader)
}

/// Writes fully rendered bytes to a path
fn create_with<S: Storage>(storage: &S, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut handle = storage.create(path)?;
    handle.write_all(bytes)?;
    handle.flush()?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

/// Reads the first record of a (possibly compressed) file
pub fn read<P: AsRef<Path>>(path: P) -> Result<Record> {
    read_with(&LocalStorage, path)
}

/// Reads the first record of a path opened through `storage`
pub fn read_with<S: Storage, P: AsRef<Path>>(storage: S, path: P) -> Result<Record> {
    parse(open_decompressed(&storage, path.as_ref())?)
}

/// Reads every record of a (possibly compressed) file
pub fn read_multi<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    read_multi_with(&LocalStorage, path)
}

/// Reads every record of a path opened through `storage`
pub fn read_multi_with<S: Storage, P: AsRef<Path>>(storage: S, path: P) -> Result<Vec<Record>> {
    parse_multi(open_decompressed(&storage, path.as_ref())?)
}

/// Writes a single record to a file
///
/// The record is validated and rendered before the file is created, so an invalid record
/// leaves the filesystem untouched.
pub fn write<P: AsRef<Path>>(path: P, record: &Record) -> Result<()> {
    write_with(&LocalStorage, path, record)
}

/// Writes a single record to a path created through `storage`
pub fn write_with<S: Storage, P: AsRef<Path>>(storage: S, path: P, record: &Record) -> Result<()> {
    let bytes = build(record)?;
    create_with(&storage, path.as_ref(), &bytes)
}

/// Writes several records to a file
pub fn write_multi<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<()> {
    write_multi_with(&LocalStorage, path, records)
}

/// Writes several records to a path created through `storage`
pub fn write_multi_with<S: Storage, P: AsRef<Path>>(
    storage: S,
    path: P,
    records: &[Record],
) -> Result<()> {
    let bytes = build_multi(records)?;
    create_with(&storage, path.as_ref(), &bytes)
}

#[cfg(test)]
mod testing {
    use std::{
        collections::HashMap,
        path::PathBuf,
        sync::Arc,
    };

    use parking_lot::Mutex;

    use super::*;
    use crate::Error;
    use anyhow::Result;

    const RECORD: &str = "\
LOCUS       demo     8 bp     DNA     linear     SYN     01-JAN-2000
ORIGIN
        1 acgtacgt
//
";

    /// An in-memory store shared between its clones
    #[derive(Default, Clone)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    }

    struct MemoryFile {
        path: PathBuf,
        files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    }
    impl Write for MemoryFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.files
                .lock()
                .entry(self.path.clone())
                .or_default()
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Storage for MemoryStorage {
        fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
            match self.files.lock().get(path) {
                Some(bytes) => Ok(Box::new(io::Cursor::new(bytes.clone()))),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            }
        }

        fn create(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
            self.files.lock().insert(path.to_path_buf(), Vec::new());
            Ok(Box::new(MemoryFile {
                path: path.to_path_buf(),
                files: self.files.clone(),
            }))
        }
    }

    /// Fails every operation
    struct BrokenStorage;
    impl Storage for BrokenStorage {
        fn open(&self, _path: &Path) -> io::Result<Box<dyn Read + Send>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "open refused"))
        }

        fn create(&self, _path: &Path) -> io::Result<Box<dyn Write + Send>> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "disk full"))
        }
    }

    #[test]
    fn test_memory_roundtrip() -> Result<()> {
        let storage = MemoryStorage::default();
        let record: Record = RECORD.parse()?;
        write_with(&storage, "demo.gb", &record)?;
        assert_eq!(read_with(&storage, "demo.gb")?, record);

        write_multi_with(&storage, "pair.gb", &[record.clone(), record.clone()])?;
        assert_eq!(read_multi_with(storage, "pair.gb")?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_io_errors_propagate() {
        let err = read_with(BrokenStorage, "demo.gb").unwrap_err();
        assert!(matches!(err, Error::IoError(ref e) if e.kind() == io::ErrorKind::PermissionDenied));

        let record = Record::default();
        // the record is rejected before the storage is touched
        let err = write_with(BrokenStorage, "demo.gb", &record).unwrap_err();
        assert!(matches!(err, Error::WriteError(_)));

        let mut named = Record::default();
        named.meta.locus.name = "demo".to_string();
        let err = write_with(BrokenStorage, "demo.gb", &named).unwrap_err();
        assert!(matches!(err, Error::IoError(ref e) if e.kind() == io::ErrorKind::WriteZero));
    }

    #[test]
    fn test_invalid_record_leaves_storage_untouched() {
        let storage = MemoryStorage::default();
        assert!(write_with(&storage, "bad.gb", &Record::default()).is_err());
        assert!(storage.files.lock().is_empty());
    }

    #[test]
    fn test_compressed_input() -> Result<()> {
        let storage = MemoryStorage::default();
        {
            let handle = storage.create(Path::new("demo.gb.gz"))?;
            let mut writer = niffler::get_writer(
                handle,
                niffler::compression::Format::Gzip,
                niffler::Level::Six,
            )?;
            writer.write_all(RECORD.as_bytes())?;
        }
        let record = read_with(&storage, "demo.gb.gz")?;
        assert_eq!(record.sequence, "acgtacgt");
        Ok(())
    }

    #[test]
    fn test_local_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("demo.gb");
        let record: Record = RECORD.parse()?;
        write(&path, &record)?;
        assert_eq!(read(&path)?, record);
        assert_eq!(read_multi(&path)?, vec![record]);
        assert!(read(dir.path().join("missing.gb")).is_err());
        Ok(())
    }
}
