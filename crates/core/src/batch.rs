//! Uploaded temp files and their pairing with detached signatures.

use std::path::{Path, PathBuf};

/// A file received by the upload layer and spooled to a temp path.
///
/// The temp file is owned by the request until it is either published or
/// removed by cleanup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// Temp location on disk.
    pub path: PathBuf,
    /// File name as sent by the client. Untrusted.
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
}

impl UploadedFile {
    /// Create a new uploaded file record.
    pub fn new(path: impl Into<PathBuf>, original_name: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            original_name: original_name.into(),
            size,
        }
    }

    /// Basename the file is published under.
    ///
    /// Clients may send names containing directory components; anything that
    /// is not a single plain path segment is rejected.
    pub fn target_name(&self) -> crate::Result<&str> {
        let name = self.original_name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            return Err(crate::Error::InvalidFileName(format!("{name:?}")));
        }
        if name.contains(['/', '\\', '\0']) {
            return Err(crate::Error::InvalidFileName(format!(
                "{name:?} contains a path separator"
            )));
        }
        Ok(name)
    }
}

/// One file together with the detached signature that covers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedFile {
    pub file: UploadedFile,
    pub signature: UploadedFile,
}

impl SignedFile {
    /// Path of the signed content.
    pub fn file_path(&self) -> &Path {
        &self.file.path
    }

    /// Path of the detached signature.
    pub fn signature_path(&self) -> &Path {
        &self.signature.path
    }
}

/// A non-empty, index-aligned batch of signed files.
///
/// Construction is the only place pairing is checked; everything downstream
/// relies on every file having exactly one signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBatch {
    pairs: Vec<SignedFile>,
}

impl SignedBatch {
    /// Pair files with signatures by position (`files[i]` is signed by `signatures[i]`).
    pub fn pair(files: Vec<UploadedFile>, signatures: Vec<UploadedFile>) -> crate::Result<Self> {
        if files.is_empty() || signatures.is_empty() {
            return Err(crate::Error::EmptyBatch);
        }
        if files.len() != signatures.len() {
            return Err(crate::Error::CountMismatch {
                files: files.len(),
                signatures: signatures.len(),
            });
        }

        let pairs = files
            .into_iter()
            .zip(signatures)
            .map(|(file, signature)| SignedFile { file, signature })
            .collect();
        Ok(Self { pairs })
    }

    /// Check every file name can be used as a destination basename.
    pub fn validate_names(&self) -> crate::Result<()> {
        for pair in &self.pairs {
            pair.file.target_name()?;
        }
        Ok(())
    }

    /// Number of pairs in the batch (always >= 1).
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the batch has no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over the pairs in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, SignedFile> {
        self.pairs.iter()
    }

    /// Iterate over the signed files only.
    pub fn files(&self) -> impl Iterator<Item = &UploadedFile> {
        self.pairs.iter().map(|p| &p.file)
    }

    /// Total size of the signed files in bytes.
    pub fn total_size(&self) -> u64 {
        self.files().map(|f| f.size).sum()
    }
}

impl<'a> IntoIterator for &'a SignedBatch {
    type Item = &'a SignedFile;
    type IntoIter = std::slice::Iter<'a, SignedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
