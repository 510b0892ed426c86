//! Multi-step loan application wizard.
//!
//! A draft walks five sections in order. Each section is a plain record checked
//! by a pure validation function that reports the failing fields; navigation is
//! gated on those reports and emits events instead of touching any UI.

pub mod documents;
pub mod domain;
pub mod draft;
pub mod fields;
pub mod repository;
pub mod residence;
pub mod router;
pub mod service;
pub mod submission;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use documents::{
    DocumentFormat, DocumentSlot, DocumentationBundle, FileCandidate, FileDescriptor, FileHandle,
    UploadRejection, MULTI_FILE_LIMIT_BYTES, SINGLE_FILE_LIMIT_BYTES,
};
pub use domain::{
    CreditScoreBracket, CurrentResidence, DraftId, EmploymentStatus, FinancialInfo,
    LivingHistory, LoanPurpose, LoanType, OfficerId, PersonalInfo, PreviousResidence,
    PropertyDetails, PropertyInfo, PropertyType, PurchaseDetails, RefinanceDetails,
    RefinanceReason, ResidenceType, SelectedOfficer, SharedFieldLabels,
};
pub use draft::{
    ApplicationDraft, DraftError, DraftStatus, DraftView, NavigationEvent, StepOutcome,
};
pub use fields::{
    FieldFailure, FieldId, FieldRule, FinancialField, PersonalField, PropertyField,
    ResidenceField, Section, SectionReport,
};
pub use repository::{DraftStore, StoreError};
pub use residence::{ResidenceHistory, ResidenceSummary, REQUIRED_HISTORY_MONTHS};
pub use router::application_router;
pub use service::{ApplicationIntakeService, IntakeServiceError};
pub use submission::{
    ConfirmationNotice, RelayError, RelayReceipt, SubmissionPayload, SubmissionRelay,
};
