use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::application::documents::{DocumentSlot, FileDescriptor, FileHandle};
use crate::workflows::application::domain::{
    CreditScoreBracket, CurrentResidence, DraftId, EmploymentStatus, FinancialInfo,
    LivingHistory, LoanPurpose, LoanType, PersonalInfo, PreviousResidence, PropertyDetails,
    PropertyInfo, PropertyType, PurchaseDetails, RefinanceDetails, RefinanceReason,
    ResidenceType,
};
use crate::workflows::application::draft::ApplicationDraft;
use crate::workflows::application::repository::{DraftStore, StoreError};
use crate::workflows::application::submission::{
    ConfirmationNotice, RelayError, RelayReceipt, SubmissionPayload, SubmissionRelay,
};
use crate::workflows::application::{application_router, ApplicationIntakeService};
use crate::workflows::officers::OfficerDirectory;

pub(super) fn personal() -> PersonalInfo {
    PersonalInfo {
        first_name: "Dana".to_string(),
        last_name: "Whitfield".to_string(),
        email: "dana.whitfield@example.com".to_string(),
        phone: "(515) 555-0142".to_string(),
        address: "418 Locust St".to_string(),
        city: "Des Moines".to_string(),
        state: "IA".to_string(),
        zip_code: "50309".to_string(),
    }
}

pub(super) fn purchase_property() -> PropertyInfo {
    PropertyInfo {
        property_type: Some(PropertyType::SingleFamily),
        purchase_price: Some(300_000),
        down_payment: Some(60_000),
        details: PropertyDetails::Purchase(PurchaseDetails {
            address: "2201 Grand Ave".to_string(),
            city: "West Des Moines".to_string(),
            state: "IA".to_string(),
            zip_code: "50265".to_string(),
        }),
    }
}

pub(super) fn refinance_property() -> PropertyInfo {
    PropertyInfo {
        property_type: Some(PropertyType::Condo),
        purchase_price: Some(25_000),
        down_payment: Some(22),
        details: PropertyDetails::Refinance(RefinanceDetails {
            current_value: Some(410_000),
            current_loan_balance: Some(215_000),
            refinance_reason: Some(RefinanceReason::CashOut),
        }),
    }
}

pub(super) fn financial() -> FinancialInfo {
    FinancialInfo {
        annual_income: Some(96_000),
        employment_status: Some(EmploymentStatus::Employed),
        employer: "Principal Financial".to_string(),
        credit_score: Some(CreditScoreBracket::Good),
        monthly_debt: Some(450),
        loan_type: Some(LoanType::Conventional),
    }
}

pub(super) fn current_residence(years: u8, months: u8) -> CurrentResidence {
    CurrentResidence {
        residence_type: Some(ResidenceType::Rent),
        years: Some(years),
        months: Some(months),
        monthly_payment: Some(1_350),
    }
}

pub(super) fn previous_residence(years: u8, months: u8) -> PreviousResidence {
    PreviousResidence {
        address: "77 Ingersoll Ave".to_string(),
        city: "Des Moines".to_string(),
        state: "IA".to_string(),
        zip_code: "50312".to_string(),
        residence_type: Some(ResidenceType::Rent),
        years: Some(years),
        months: Some(months),
        monthly_payment: Some(1_100),
    }
}

pub(super) fn settled_history() -> LivingHistory {
    LivingHistory {
        current: current_residence(3, 4),
        previous: Vec::new(),
    }
}

pub(super) fn file(name: &str, size_bytes: u64) -> FileDescriptor {
    FileDescriptor::new(name, size_bytes, FileHandle(format!("uploads/{name}")))
}

pub(super) const MB: u64 = 1024 * 1024;

/// Draft sitting on the given section with every earlier section complete.
pub(super) fn draft_at(section_number: u8) -> ApplicationDraft {
    let mut draft = ApplicationDraft::new(DraftId::generate(), None);
    draft.update_personal(personal()).expect("editable");
    draft
        .select_purpose(LoanPurpose::Purchase)
        .expect("editable");
    draft
        .update_property(purchase_property())
        .expect("purpose matches");
    draft.update_financial(financial()).expect("editable");
    draft
        .update_living_history(settled_history())
        .expect("editable");

    for _ in 1..section_number {
        draft.advance().expect("earlier sections complete");
    }
    draft
}

pub(super) fn attach_required_documents(draft: &mut ApplicationDraft) {
    draft
        .attach(DocumentSlot::Identity, vec![file("license.png", MB)])
        .expect("identity accepted");
    draft
        .attach(DocumentSlot::Income, vec![file("w2-2024.pdf", 2 * MB)])
        .expect("income accepted");
    draft
        .attach(
            DocumentSlot::Bank,
            vec![file("march.pdf", MB), file("april.pdf", MB)],
        )
        .expect("bank accepted");
    draft.accept_terms(true).expect("editable");
}

pub(super) fn completed_draft() -> ApplicationDraft {
    let mut draft = draft_at(5);
    attach_required_documents(&mut draft);
    draft
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) drafts: Arc<Mutex<HashMap<DraftId, ApplicationDraft>>>,
}

impl MemoryStore {
    pub(super) fn put(&self, draft: ApplicationDraft) {
        self.drafts
            .lock()
            .expect("store mutex poisoned")
            .insert(draft.id(), draft);
    }
}

impl DraftStore for MemoryStore {
    fn insert(&self, draft: ApplicationDraft) -> Result<ApplicationDraft, StoreError> {
        let mut guard = self.drafts.lock().expect("store mutex poisoned");
        if guard.contains_key(&draft.id()) {
            return Err(StoreError::Conflict);
        }
        guard.insert(draft.id(), draft.clone());
        Ok(draft)
    }

    fn update(&self, draft: ApplicationDraft) -> Result<(), StoreError> {
        let mut guard = self.drafts.lock().expect("store mutex poisoned");
        guard.insert(draft.id(), draft);
        Ok(())
    }

    fn fetch(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        let guard = self.drafts.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        let mut guard = self.drafts.lock().expect("store mutex poisoned");
        Ok(guard.remove(id))
    }
}

/// Store whose first fetch waits briefly for a second reader, so two
/// unserialised read-modify-write cycles would both start from the same copy.
pub(super) struct GatedStore {
    pub(super) inner: MemoryStore,
    readers: Mutex<usize>,
    arrived: Condvar,
}

impl GatedStore {
    pub(super) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            readers: Mutex::new(0),
            arrived: Condvar::new(),
        }
    }
}

impl DraftStore for GatedStore {
    fn insert(&self, draft: ApplicationDraft) -> Result<ApplicationDraft, StoreError> {
        self.inner.insert(draft)
    }

    fn update(&self, draft: ApplicationDraft) -> Result<(), StoreError> {
        self.inner.update(draft)
    }

    fn fetch(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        let draft = self.inner.fetch(id)?;
        let mut readers = self.readers.lock().expect("gate mutex poisoned");
        *readers += 1;
        self.arrived.notify_all();
        let _released = self
            .arrived
            .wait_timeout_while(readers, Duration::from_millis(250), |readers| *readers < 2)
            .expect("gate mutex poisoned");
        Ok(draft)
    }

    fn remove(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        self.inner.remove(id)
    }
}

pub(super) struct UnavailableStore;

impl DraftStore for UnavailableStore {
    fn insert(&self, _draft: ApplicationDraft) -> Result<ApplicationDraft, StoreError> {
        Err(StoreError::Unavailable("cache offline".to_string()))
    }

    fn update(&self, _draft: ApplicationDraft) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("cache offline".to_string()))
    }

    fn fetch(&self, _id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        Err(StoreError::Unavailable("cache offline".to_string()))
    }

    fn remove(&self, _id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        Err(StoreError::Unavailable("cache offline".to_string()))
    }
}

/// Records deliveries and honours idempotency keys.
#[derive(Default, Clone)]
pub(super) struct MemoryRelay {
    deliveries: Arc<Mutex<Vec<SubmissionPayload>>>,
    receipts: Arc<Mutex<HashMap<String, RelayReceipt>>>,
    confirmations: Arc<Mutex<Vec<ConfirmationNotice>>>,
}

impl MemoryRelay {
    pub(super) fn deliveries(&self) -> Vec<SubmissionPayload> {
        self.deliveries.lock().expect("relay mutex poisoned").clone()
    }

    pub(super) fn confirmations(&self) -> Vec<ConfirmationNotice> {
        self.confirmations
            .lock()
            .expect("relay mutex poisoned")
            .clone()
    }
}

impl SubmissionRelay for MemoryRelay {
    fn deliver(&self, payload: &SubmissionPayload) -> Result<RelayReceipt, RelayError> {
        let mut receipts = self.receipts.lock().expect("relay mutex poisoned");
        if let Some(receipt) = receipts.get(&payload.idempotency_key) {
            return Ok(receipt.clone());
        }

        let mut deliveries = self.deliveries.lock().expect("relay mutex poisoned");
        deliveries.push(payload.clone());
        let receipt = RelayReceipt {
            reference: format!("loan-{:04}", deliveries.len()),
            idempotency_key: payload.idempotency_key.clone(),
            delivered_at: Utc::now(),
        };
        receipts.insert(payload.idempotency_key.clone(), receipt.clone());
        Ok(receipt)
    }

    fn confirm(&self, notice: ConfirmationNotice) -> Result<(), RelayError> {
        self.confirmations
            .lock()
            .expect("relay mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Relay whose deliveries fail for the listed keys and whose confirmations always fail.
#[derive(Default)]
pub(super) struct FlakyRelay {
    pub(super) failing_keys: Mutex<HashSet<String>>,
}

impl SubmissionRelay for FlakyRelay {
    fn deliver(&self, payload: &SubmissionPayload) -> Result<RelayReceipt, RelayError> {
        let mut failing = self.failing_keys.lock().expect("relay mutex poisoned");
        if failing.remove(&payload.idempotency_key) {
            return Err(RelayError::Unavailable("smtp timeout".to_string()));
        }
        Ok(RelayReceipt {
            reference: "loan-flaky".to_string(),
            idempotency_key: payload.idempotency_key.clone(),
            delivered_at: Utc::now(),
        })
    }

    fn confirm(&self, _notice: ConfirmationNotice) -> Result<(), RelayError> {
        Err(RelayError::Rejected("mailbox full".to_string()))
    }
}

pub(super) fn build_service() -> (
    ApplicationIntakeService<MemoryStore, MemoryRelay>,
    Arc<MemoryStore>,
    Arc<MemoryRelay>,
) {
    let store = Arc::new(MemoryStore::default());
    let relay = Arc::new(MemoryRelay::default());
    let service = ApplicationIntakeService::new(
        store.clone(),
        relay.clone(),
        Arc::new(OfficerDirectory::standard()),
    );
    (service, store, relay)
}

pub(super) fn router_with_service(
    service: ApplicationIntakeService<MemoryStore, MemoryRelay>,
) -> axum::Router {
    application_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
