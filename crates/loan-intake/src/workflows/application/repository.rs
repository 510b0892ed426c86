use super::domain::DraftId;
use super::draft::ApplicationDraft;

/// Storage abstraction for in-progress drafts, one entry per applicant session.
pub trait DraftStore: Send + Sync {
    fn insert(&self, draft: ApplicationDraft) -> Result<ApplicationDraft, StoreError>;
    fn update(&self, draft: ApplicationDraft) -> Result<(), StoreError>;
    fn fetch(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError>;
    fn remove(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("draft already exists")]
    Conflict,
    #[error("draft not found")]
    NotFound,
    #[error("draft store unavailable: {0}")]
    Unavailable(String),
}
