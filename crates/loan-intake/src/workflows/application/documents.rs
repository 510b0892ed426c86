use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ceiling for the single-file identity slot.
pub const SINGLE_FILE_LIMIT_BYTES: u64 = 5 * 1024 * 1024;
/// Ceiling for the combined contents of a multi-file slot.
pub const MULTI_FILE_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

/// Named upload target within the documentation bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    Identity,
    Income,
    Bank,
    Additional,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::Identity,
        DocumentSlot::Income,
        DocumentSlot::Bank,
        DocumentSlot::Additional,
    ];

    pub const REQUIRED: [DocumentSlot; 3] = [
        DocumentSlot::Identity,
        DocumentSlot::Income,
        DocumentSlot::Bank,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            DocumentSlot::Identity => "identity",
            DocumentSlot::Income => "income",
            DocumentSlot::Bank => "bank",
            DocumentSlot::Additional => "additional",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentSlot::Identity => "Government-issued ID",
            DocumentSlot::Income => "Proof of income",
            DocumentSlot::Bank => "Bank statements",
            DocumentSlot::Additional => "Additional documents",
        }
    }

    pub const fn is_multi_file(self) -> bool {
        !matches!(self, DocumentSlot::Identity)
    }

    pub const fn is_required(self) -> bool {
        !matches!(self, DocumentSlot::Additional)
    }

    pub const fn limit_bytes(self) -> u64 {
        if self.is_multi_file() {
            MULTI_FILE_LIMIT_BYTES
        } else {
            SINGLE_FILE_LIMIT_BYTES
        }
    }
}

impl FromStr for DocumentSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|slot| slot.key() == value.trim())
            .ok_or_else(|| format!("unknown document slot '{value}'"))
    }
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Jpeg,
    Png,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn mime(self) -> mime::Mime {
        match self {
            DocumentFormat::Pdf => mime::APPLICATION_PDF,
            DocumentFormat::Jpeg => mime::IMAGE_JPEG,
            DocumentFormat::Png => mime::IMAGE_PNG,
        }
    }
}

/// Opaque reference to stored file bytes (storage key, content digest, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHandle(pub String);

/// File as offered by the client, before any derivation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub handle: FileHandle,
}

/// Attached file: enough metadata to validate type and size without the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub extension: String,
    pub content_type: String,
    pub handle: FileHandle,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size_bytes: u64, handle: FileHandle) -> Self {
        let name = name.into();
        let extension = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content_type = mime_guess::from_ext(&extension)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            name,
            size_bytes,
            extension,
            content_type,
            handle,
        }
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_extension(&self.extension)
    }
}

impl From<FileCandidate> for FileDescriptor {
    fn from(candidate: FileCandidate) -> Self {
        Self::new(candidate.name, candidate.size_bytes, candidate.handle)
    }
}

/// Reason an upload batch was refused. Refusal is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UploadRejection {
    #[error("'{file}' is not a PDF, JPG, or PNG file")]
    UnsupportedType { file: String, extension: String },
    #[error("{slot:?} upload would hold {attempted_bytes} bytes, limit is {limit_bytes}")]
    SizeExceeded {
        slot: DocumentSlot,
        limit_bytes: u64,
        attempted_bytes: u64,
    },
    #[error("{slot:?} accepts a single file")]
    TooManyFiles { slot: DocumentSlot },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationBundle {
    pub identity: Option<FileDescriptor>,
    pub income: Vec<FileDescriptor>,
    pub bank: Vec<FileDescriptor>,
    pub additional: Vec<FileDescriptor>,
    pub terms_accepted: bool,
}

impl DocumentationBundle {
    pub fn files(&self, slot: DocumentSlot) -> &[FileDescriptor] {
        match slot {
            DocumentSlot::Identity => self.identity.as_slice(),
            DocumentSlot::Income => &self.income,
            DocumentSlot::Bank => &self.bank,
            DocumentSlot::Additional => &self.additional,
        }
    }

    fn multi_files_mut(&mut self, slot: DocumentSlot) -> Option<&mut Vec<FileDescriptor>> {
        match slot {
            DocumentSlot::Identity => None,
            DocumentSlot::Income => Some(&mut self.income),
            DocumentSlot::Bank => Some(&mut self.bank),
            DocumentSlot::Additional => Some(&mut self.additional),
        }
    }

    pub fn is_populated(&self, slot: DocumentSlot) -> bool {
        !self.files(slot).is_empty()
    }

    pub fn total_bytes(&self, slot: DocumentSlot) -> u64 {
        self.files(slot)
            .iter()
            .fold(0u64, |total, file| total.saturating_add(file.size_bytes))
    }

    /// Add a batch to a slot. Multi-file slots append, the identity slot is
    /// replaced. Any invalid candidate leaves the slot untouched.
    pub fn attach(
        &mut self,
        slot: DocumentSlot,
        batch: Vec<FileDescriptor>,
    ) -> Result<(), UploadRejection> {
        if batch.is_empty() {
            return Ok(());
        }

        if let Some(file) = batch.iter().find(|file| file.format().is_none()) {
            return Err(UploadRejection::UnsupportedType {
                file: file.name.clone(),
                extension: file.extension.clone(),
            });
        }

        let incoming = batch
            .iter()
            .fold(0u64, |total, file| total.saturating_add(file.size_bytes));

        match self.multi_files_mut(slot) {
            Some(files) => {
                let existing = files
                    .iter()
                    .fold(0u64, |total, file| total.saturating_add(file.size_bytes));
                let attempted_bytes = existing.saturating_add(incoming);
                if attempted_bytes > MULTI_FILE_LIMIT_BYTES {
                    return Err(UploadRejection::SizeExceeded {
                        slot,
                        limit_bytes: MULTI_FILE_LIMIT_BYTES,
                        attempted_bytes,
                    });
                }
                files.extend(batch);
            }
            None => {
                if batch.len() > 1 {
                    return Err(UploadRejection::TooManyFiles { slot });
                }
                if incoming > SINGLE_FILE_LIMIT_BYTES {
                    return Err(UploadRejection::SizeExceeded {
                        slot,
                        limit_bytes: SINGLE_FILE_LIMIT_BYTES,
                        attempted_bytes: incoming,
                    });
                }
                self.identity = batch.into_iter().next();
            }
        }

        Ok(())
    }

    /// Drop one file from a multi-file slot, or clear the slot when no index
    /// is given. The identity slot ignores the index. Returns what was removed.
    pub fn remove(&mut self, slot: DocumentSlot, index: Option<usize>) -> Vec<FileDescriptor> {
        if !slot.is_multi_file() {
            return self.identity.take().into_iter().collect();
        }
        let Some(files) = self.multi_files_mut(slot) else {
            return Vec::new();
        };

        match index {
            Some(index) if index < files.len() => vec![files.remove(index)],
            Some(_) => Vec::new(),
            None => std::mem::take(files),
        }
    }

    /// Share of required slots holding at least one file, as a whole percentage.
    pub fn upload_progress_percent(&self) -> u8 {
        let populated = DocumentSlot::REQUIRED
            .iter()
            .filter(|slot| self.is_populated(**slot))
            .count();
        (populated * 100 / DocumentSlot::REQUIRED.len()) as u8
    }
}
