//! Storage of uploaded venue images
//!
//! [ImageManager] validates uploads (file type and size), stores them under a freshly generated,
//! collision-free name and hands out stable relative paths below [MANAGED_IMAGE_PREFIX], which are
//! persisted on the venue records by the caller. The bytes themselves are kept by a [BlobStorage]
//! backend, usually a [LocalDiskStorage].
//!
//! Image operations never touch the database. Since storing an image and writing the venue
//! record are not atomic, an image may be left behind when the venue write fails. See
//! [crate::venues::cleanup_orphaned_images] for removing those.

use log::{debug, info, warn};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Maximum size of an uploaded image in bytes (5 MiB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Accepted file extensions of uploaded images (compared case-insensitively)
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Path prefix of all images stored by the [ImageManager]. Only paths below this prefix are ever
/// deleted.
pub const MANAGED_IMAGE_PREFIX: &str = "/images/venues/";

#[derive(Debug)]
pub enum ImageError {
    /// The file's extension is not one of [ALLOWED_IMAGE_EXTENSIONS]
    InvalidFileType(String),
    /// The file exceeds [MAX_IMAGE_SIZE]
    FileTooLarge { size: usize },
    /// There is no stored image at the given path
    NotFound(String),
    /// The storage backend failed. See string description for details.
    StorageFailure(String),
}

impl ImageError {
    /// Check if the upload has been rejected because of its content (as opposed to a storage
    /// fault)
    pub fn is_upload_rejected(&self) -> bool {
        matches!(self, Self::InvalidFileType(_) | Self::FileTooLarge { .. })
    }
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFileType(file_name) => write!(
                f,
                "Only image files (JPG, PNG, GIF) are allowed, got '{}'.",
                file_name
            ),
            Self::FileTooLarge { size } => write!(
                f,
                "File size cannot exceed 5MB (file has {} bytes).",
                size
            ),
            Self::NotFound(path) => write!(f, "Image {} does not exist.", path),
            Self::StorageFailure(e) => write!(f, "Image storage failed: {}", e),
        }
    }
}

impl std::error::Error for ImageError {}

/// An uploaded file, as received from the user
#[derive(Clone, Debug)]
pub struct ImageUpload {
    /// Original file name, only used for determining the file type
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an upload from a local file
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        Ok(Self {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            bytes: std::fs::read(path)?,
        })
    }

    /// An empty file counts as no upload at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Backend for storing image blobs by a flat file name
///
/// Names passed to the backend are always plain file names (no path separators).
pub trait BlobStorage: Send + Sync {
    /// Store the blob and return the path it can be addressed by
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, ImageError>;
    /// Fails with [ImageError::NotFound] if there is no blob with the given name
    fn get(&self, name: &str) -> Result<Vec<u8>, ImageError>;
    /// Remove the blob and return whether it existed
    fn delete(&self, name: &str) -> Result<bool, ImageError>;
    fn list(&self) -> Result<Vec<String>, ImageError>;
}

/// [BlobStorage] implementation storing each blob as a file in a local directory
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    /// The directory is created on the first write, if it does not exist.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl BlobStorage for LocalDiskStorage {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, ImageError> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            ImageError::StorageFailure(format!("Could not create {:?}: {}", self.root, e))
        })?;
        let path = self.root.join(name);
        std::fs::write(&path, bytes).map_err(|e| {
            ImageError::StorageFailure(format!("Could not write {:?}: {}", path, e))
        })?;
        Ok(managed_image_path(name))
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, ImageError> {
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImageError::NotFound(name.to_owned()),
            _ => ImageError::StorageFailure(format!("Could not read {:?}: {}", path, e)),
        })
    }

    fn delete(&self, name: &str) -> Result<bool, ImageError> {
        let path = self.root.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImageError::StorageFailure(format!(
                "Could not delete {:?}: {}",
                path, e
            ))),
        }
    }

    fn list(&self) -> Result<Vec<String>, ImageError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ImageError::StorageFailure(format!(
                    "Could not list {:?}: {}",
                    self.root, e
                )))
            }
        };
        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ImageError::StorageFailure(e.to_string()))?;
            let is_file = entry
                .file_type()
                .map_err(|e| ImageError::StorageFailure(e.to_string()))?
                .is_file();
            if is_file {
                if let Some(name) = entry.file_name().to_str() {
                    result.push(name.to_owned());
                }
            }
        }
        result.sort();
        Ok(result)
    }
}

/// Upload lifecycle of venue images on top of a [BlobStorage]
pub struct ImageManager<S: BlobStorage> {
    storage: S,
}

impl<S: BlobStorage> ImageManager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Validate and store an uploaded image and return its stable relative path.
    ///
    /// The file type is checked before the size. The stored file is named by a fresh UUID plus
    /// the original (lowercased) extension.
    pub fn store_image(&self, upload: &ImageUpload) -> Result<String, ImageError> {
        let extension = validate_upload(upload)?;
        let name = format!("{}.{}", Uuid::now_v7(), extension);
        let path = self.storage.put(&name, &upload.bytes)?;
        info!(
            "Stored image {} ({} bytes) as {}",
            upload.file_name,
            upload.bytes.len(),
            path
        );
        Ok(path)
    }

    /// Replace the image at `old_path` by a new upload and persist the result with `commit`.
    ///
    /// Without an upload, or with an empty file, `commit` is called with `old_path` and no image
    /// is touched. Otherwise, the new image is stored first and its path is passed to `commit`. If
    /// `commit` fails, the new image is removed again and the old one stays in place. After a
    /// successful commit, the old image is removed if `commit` returned `true`, i.e. nothing
    /// refers to it anymore, and it is a managed image. Failing to remove it is only logged.
    ///
    /// Returns the path of the image in use after the replacement.
    pub fn replace_image<E: From<ImageError>>(
        &self,
        old_path: &str,
        upload: Option<&ImageUpload>,
        commit: impl FnOnce(&str) -> Result<bool, E>,
    ) -> Result<String, E> {
        let Some(upload) = upload.filter(|u| !u.is_empty()) else {
            commit(old_path)?;
            return Ok(old_path.to_owned());
        };
        let new_path = self.store_image(upload)?;
        match commit(&new_path) {
            Ok(old_unreferenced) => {
                if old_unreferenced {
                    self.discard_image(old_path);
                }
                Ok(new_path)
            }
            Err(e) => {
                self.discard_image(&new_path);
                Err(e)
            }
        }
    }

    /// Best effort removal of an image, which is no longer (or not yet) referenced
    pub fn discard_image(&self, path: &str) {
        if let Err(e) = self.delete_image(path) {
            warn!("Could not remove image {}, it is orphaned now: {}", path, e);
        }
    }

    /// Remove the image at `path` and return whether a file has been removed.
    ///
    /// Deleting an image that does not exist is not an error. Paths outside the managed image
    /// area are left alone.
    pub fn delete_image(&self, path: &str) -> Result<bool, ImageError> {
        let Some(name) = managed_image_name(path) else {
            debug!("Not deleting unmanaged image path {:?}", path);
            return Ok(false);
        };
        let deleted = self.storage.delete(name)?;
        if deleted {
            info!("Deleted image {}", path);
        }
        Ok(deleted)
    }

    /// Read back the content of a managed image
    pub fn read_image(&self, path: &str) -> Result<Vec<u8>, ImageError> {
        let name = managed_image_name(path).ok_or_else(|| ImageError::NotFound(path.to_owned()))?;
        self.storage.get(name).map_err(|e| match e {
            ImageError::NotFound(_) => ImageError::NotFound(path.to_owned()),
            e => e,
        })
    }

    /// List the paths of all stored images
    pub fn stored_images(&self) -> Result<Vec<String>, ImageError> {
        Ok(self
            .storage
            .list()?
            .into_iter()
            .map(|name| managed_image_path(&name))
            .collect())
    }
}

/// Check the upload's file type and size and return its normalized extension
fn validate_upload(upload: &ImageUpload) -> Result<String, ImageError> {
    let extension = Path::new(&upload.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| ALLOWED_IMAGE_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(|| ImageError::InvalidFileType(upload.file_name.clone()))?;
    if upload.bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::FileTooLarge {
            size: upload.bytes.len(),
        });
    }
    Ok(extension)
}

fn managed_image_path(name: &str) -> String {
    format!("{}{}", MANAGED_IMAGE_PREFIX, name)
}

/// Get the storage name of an image path, if the path lies within the managed image area.
pub fn managed_image_name(path: &str) -> Option<&str> {
    let name = path.strip_prefix(MANAGED_IMAGE_PREFIX)?;
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return None;
    }
    Some(name)
}

/// In-memory [BlobStorage] for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    pub blobs: std::sync::Mutex<std::collections::BTreeMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl BlobStorage for MemoryStorage {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, ImageError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(name.to_owned(), bytes.to_vec());
        Ok(managed_image_path(name))
    }

    fn get(&self, name: &str) -> Result<Vec<u8>, ImageError> {
        self.blobs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ImageError::NotFound(name.to_owned()))
    }

    fn delete(&self, name: &str) -> Result<bool, ImageError> {
        Ok(self.blobs.lock().unwrap().remove(name).is_some())
    }

    fn list(&self) -> Result<Vec<String>, ImageError> {
        Ok(self.blobs.lock().unwrap().keys().cloned().collect())
    }
}
