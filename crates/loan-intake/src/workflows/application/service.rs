use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::documents::{DocumentSlot, FileDescriptor};
use super::domain::{
    DraftId, FinancialInfo, LivingHistory, LoanPurpose, OfficerId, PersonalInfo,
    PreviousResidence, PropertyInfo,
};
use super::draft::{ApplicationDraft, DraftError, DraftView, StepOutcome};
use super::fields::{FieldId, Section, SectionReport};
use super::repository::{DraftStore, StoreError};
use super::submission::{RelayReceipt, SubmissionRelay};
use crate::workflows::officers::OfficerDirectory;

/// Service composing the draft store, officer directory, and submission relay.
///
/// Changes to one draft run one at a time: each is a fetch, change, and write
/// back under that draft's lock. A submitted draft leaves the store and only
/// its receipt is kept, so resubmits can still be refused.
pub struct ApplicationIntakeService<S, R> {
    store: Arc<S>,
    relay: Arc<R>,
    officers: Arc<OfficerDirectory>,
    draft_locks: Mutex<HashMap<DraftId, Arc<Mutex<()>>>>,
    receipts: Mutex<HashMap<DraftId, RelayReceipt>>,
}

impl<S, R> ApplicationIntakeService<S, R>
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    pub fn new(store: Arc<S>, relay: Arc<R>, officers: Arc<OfficerDirectory>) -> Self {
        Self {
            store,
            relay,
            officers,
            draft_locks: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
        }
    }

    pub fn officers(&self) -> &OfficerDirectory {
        &self.officers
    }

    /// Start a new draft, optionally pre-assigned to a loan officer.
    pub fn open(&self, officer: Option<OfficerId>) -> Result<DraftView, IntakeServiceError> {
        let selected = officer
            .map(|id| {
                self.officers
                    .find(id)
                    .map(|officer| officer.selection())
                    .ok_or(IntakeServiceError::UnknownOfficer(id))
            })
            .transpose()?;

        let draft = ApplicationDraft::new(DraftId::generate(), selected);
        let stored = self.store.insert(draft)?;
        info!(draft = %stored.id(), officer = ?officer.map(|id| id.0), "draft opened");
        Ok(stored.view())
    }

    /// Load an in-progress draft. Submitted drafts are gone from the store and
    /// answer with `AlreadySubmitted`.
    pub fn get(&self, id: &DraftId) -> Result<ApplicationDraft, IntakeServiceError> {
        if self.receipt(id).is_some() {
            return Err(DraftError::AlreadySubmitted.into());
        }
        self.store
            .fetch(id)?
            .ok_or(IntakeServiceError::DraftNotFound(*id))
    }

    /// Receipt of a submitted application, if this draft was submitted.
    pub fn receipt(&self, id: &DraftId) -> Option<RelayReceipt> {
        self.receipts
            .lock()
            .expect("receipt table mutex poisoned")
            .get(id)
            .cloned()
    }

    /// Drop a draft; nothing about it is retained.
    pub fn discard(&self, id: &DraftId) -> Result<(), IntakeServiceError> {
        self.exclusive(id, || {
            self.store
                .remove(id)?
                .map(|_| ())
                .ok_or(IntakeServiceError::DraftNotFound(*id))
        })
    }

    /// Run `work` while holding the lock for one draft. The lock entry is
    /// dropped again once nobody else is waiting on it.
    fn exclusive<T>(
        &self,
        id: &DraftId,
        work: impl FnOnce() -> Result<T, IntakeServiceError>,
    ) -> Result<T, IntakeServiceError> {
        let lock = {
            let mut locks = self.draft_locks.lock().expect("draft lock table poisoned");
            Arc::clone(locks.entry(*id).or_default())
        };

        let outcome = {
            let _guard = lock.lock().expect("draft lock poisoned");
            work()
        };

        let mut locks = self.draft_locks.lock().expect("draft lock table poisoned");
        if Arc::strong_count(&lock) == 2 {
            locks.remove(id);
        }
        outcome
    }

    /// Apply a change and persist the draft whether or not the change was
    /// accepted, so touch marks from refused advances survive.
    fn modify<T>(
        &self,
        id: &DraftId,
        change: impl FnOnce(&mut ApplicationDraft) -> Result<T, DraftError>,
    ) -> Result<(T, ApplicationDraft), IntakeServiceError> {
        self.exclusive(id, || {
            let mut draft = self.get(id)?;
            let outcome = change(&mut draft);
            self.store.update(draft.clone())?;
            Ok((outcome?, draft))
        })
    }

    fn modify_view(
        &self,
        id: &DraftId,
        change: impl FnOnce(&mut ApplicationDraft) -> Result<(), DraftError>,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify(id, change).map(|((), draft)| draft.view())
    }

    pub fn select_purpose(
        &self,
        id: &DraftId,
        purpose: LoanPurpose,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.select_purpose(purpose))
    }

    pub fn update_personal(
        &self,
        id: &DraftId,
        info: PersonalInfo,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.update_personal(info))
    }

    pub fn update_property(
        &self,
        id: &DraftId,
        info: PropertyInfo,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.update_property(info))
    }

    pub fn update_financial(
        &self,
        id: &DraftId,
        info: FinancialInfo,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.update_financial(info))
    }

    pub fn update_living_history(
        &self,
        id: &DraftId,
        history: LivingHistory,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.update_living_history(history))
    }

    pub fn add_previous_residence(&self, id: &DraftId) -> Result<usize, IntakeServiceError> {
        self.modify(id, |draft| draft.add_previous_residence())
            .map(|(index, _)| index)
    }

    pub fn update_previous_residence(
        &self,
        id: &DraftId,
        index: usize,
        residence: PreviousResidence,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.update_previous_residence(index, residence))
    }

    pub fn remove_previous_residence(
        &self,
        id: &DraftId,
        index: usize,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.remove_previous_residence(index))
    }

    pub fn attach(
        &self,
        id: &DraftId,
        slot: DocumentSlot,
        batch: Vec<FileDescriptor>,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.attach(slot, batch))
    }

    pub fn remove_document(
        &self,
        id: &DraftId,
        slot: DocumentSlot,
        index: Option<usize>,
    ) -> Result<Vec<FileDescriptor>, IntakeServiceError> {
        self.modify(id, |draft| draft.remove_document(slot, index))
            .map(|(removed, _)| removed)
    }

    pub fn accept_terms(
        &self,
        id: &DraftId,
        accepted: bool,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.accept_terms(accepted))
    }

    pub fn touch(
        &self,
        id: &DraftId,
        fields: Vec<FieldId>,
    ) -> Result<DraftView, IntakeServiceError> {
        self.modify_view(id, |draft| draft.touch(fields))
    }

    pub fn validate(
        &self,
        id: &DraftId,
        section: Section,
    ) -> Result<SectionReport, IntakeServiceError> {
        Ok(self.get(id)?.section_report(section))
    }

    pub fn advance(&self, id: &DraftId) -> Result<StepOutcome, IntakeServiceError> {
        self.modify(id, |draft| draft.advance())
            .map(|(outcome, _)| outcome)
    }

    pub fn retreat(&self, id: &DraftId) -> Result<StepOutcome, IntakeServiceError> {
        self.modify(id, |draft| draft.retreat())
            .map(|(outcome, _)| outcome)
    }

    /// Deliver the application. On success the draft is removed from the
    /// store and only its receipt is kept; on failure it stays editable.
    pub fn submit(&self, id: &DraftId) -> Result<RelayReceipt, IntakeServiceError> {
        self.exclusive(id, || {
            let mut draft = self.get(id)?;
            let receipt = match draft.submit(self.relay.as_ref()) {
                Ok(receipt) => receipt,
                Err(error) => {
                    self.store.update(draft)?;
                    return Err(error.into());
                }
            };

            self.receipts
                .lock()
                .expect("receipt table mutex poisoned")
                .insert(*id, receipt.clone());
            if let Err(error) = self.store.remove(id) {
                warn!(draft = %id, %error, "submitted draft left in store");
            }
            Ok(receipt)
        })
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("draft {0} not found")]
    DraftNotFound(DraftId),
    #[error("loan officer {0} is not in the directory")]
    UnknownOfficer(OfficerId),
}
