//! Uploaded source images.
//!
//! A [`SourceImage`] is what the host upload subsystem hands over: naming
//! metadata plus a way to get at the bytes. Every render job opens its own
//! reader through [`SourceImage::open`], so concurrent jobs never share a
//! stream. The bytes live either in a file (reopened per job) or in a shared,
//! immutable buffer (a fresh cursor per job).

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A readable, seekable, sendable byte stream. Decoders need all three.
pub trait ReadSeek: BufRead + Seek + Send {}

impl<T: BufRead + Seek + Send> ReadSeek for T {}

#[derive(Clone)]
enum SourceData {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for SourceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// An uploaded image, read-only to this crate.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Original file name, e.g. `"sunset.jpg"`.
    pub name: String,
    /// Storage hash assigned by the uploader, e.g. `"sunset_4f1c2a"`.
    pub hash: String,
    /// Extension with leading dot, e.g. `".jpg"`.
    pub ext: String,
    pub mime: String,
    /// Storage path of the persisted original, if the uploader has one.
    pub path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Size in KB, as reported by the uploader.
    pub size: Option<f64>,
    data: SourceData,
}

impl SourceImage {
    /// A source backed by a file on disk. Name, extension and mime are
    /// derived from the path.
    pub fn from_path(path: impl Into<PathBuf>, hash: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(name, hash.into(), SourceData::File(path))
    }

    /// A source held in memory. The buffer is shared, never copied, per job.
    pub fn from_bytes(
        name: impl Into<String>,
        hash: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self::new(name.into(), hash.into(), SourceData::Bytes(bytes.into()))
    }

    fn new(name: String, hash: String, data: SourceData) -> Self {
        let ext = Path::new(&name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
            .unwrap_or_default();
        let mime = mime_for_extension(&ext).unwrap_or("application/octet-stream");
        Self {
            name,
            hash,
            mime: mime.to_string(),
            ext,
            path: None,
            width: None,
            height: None,
            size: None,
            data,
        }
    }

    /// Record where the uploader persisted the original.
    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Open a fresh, independent reader over the source bytes.
    pub fn open(&self) -> io::Result<Box<dyn ReadSeek>> {
        match &self.data {
            SourceData::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
            SourceData::Bytes(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
        }
    }

    /// Size of the source in bytes.
    pub fn byte_len(&self) -> io::Result<u64> {
        match &self.data {
            SourceData::File(path) => Ok(std::fs::metadata(path)?.len()),
            SourceData::Bytes(bytes) => Ok(bytes.len() as u64),
        }
    }

    /// Path on disk, when file-backed.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.data {
            SourceData::File(path) => Some(path),
            SourceData::Bytes(_) => None,
        }
    }
}

/// Registered mime type for an image extension (with or without the dot).
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    image::ImageFormat::from_extension(ext.trim_start_matches('.')).map(|f| f.to_mime_type())
}

/// SHA-256 of a file's contents, returned as a hex string.
///
/// Streams the file so large uploads are not read into memory at once.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Upload hash for a file: `{stem}_{first 10 hex digits of its SHA-256}`.
pub fn upload_hash(path: &Path) -> io::Result<String> {
    let digest = hash_file(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(format!("{}_{}", stem, &digest[..10]))
}
