use chrono::Utc;
use loan_intake::config::DraftConfig;
use loan_intake::workflows::application::{
    ApplicationDraft, ConfirmationNotice, DraftId, DraftStore, RelayError, RelayReceipt,
    StoreError, SubmissionPayload, SubmissionRelay,
};
use loan_intake::workflows::officers::OfficerDirectory;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) officers: Arc<OfficerDirectory>,
}

/// Session drafts held in process memory; lost on restart. Drafts nobody has
/// touched within the idle timeout are treated as abandoned and dropped.
#[derive(Clone)]
pub(crate) struct InMemoryDraftStore {
    drafts: Arc<Mutex<HashMap<DraftId, StoredDraft>>>,
    idle_timeout: Duration,
}

struct StoredDraft {
    draft: ApplicationDraft,
    last_active: Instant,
}

impl StoredDraft {
    fn new(draft: ApplicationDraft) -> Self {
        Self {
            draft,
            last_active: Instant::now(),
        }
    }

    fn is_idle(&self, timeout: Duration) -> bool {
        self.last_active.elapsed() >= timeout
    }
}

impl Default for InMemoryDraftStore {
    fn default() -> Self {
        Self::with_idle_timeout(DraftConfig::default().idle_timeout)
    }
}

impl InMemoryDraftStore {
    pub(crate) fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            drafts: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.drafts.lock().expect("draft store mutex poisoned").len()
    }

    /// Whether `id` holds a live draft; an idle one is dropped on the way.
    fn keep_if_live(&self, drafts: &mut HashMap<DraftId, StoredDraft>, id: &DraftId) -> bool {
        match drafts.get(id).map(|stored| stored.is_idle(self.idle_timeout)) {
            Some(false) => true,
            Some(true) => {
                drafts.remove(id);
                false
            }
            None => false,
        }
    }

    fn evict_idle(&self, drafts: &mut HashMap<DraftId, StoredDraft>) {
        let before = drafts.len();
        drafts.retain(|_, stored| !stored.is_idle(self.idle_timeout));
        let evicted = before - drafts.len();
        if evicted > 0 {
            info!(evicted, "abandoned drafts dropped");
        }
    }
}

impl DraftStore for InMemoryDraftStore {
    fn insert(&self, draft: ApplicationDraft) -> Result<ApplicationDraft, StoreError> {
        let mut guard = self.drafts.lock().expect("draft store mutex poisoned");
        self.evict_idle(&mut guard);
        if guard.contains_key(&draft.id()) {
            return Err(StoreError::Conflict);
        }
        guard.insert(draft.id(), StoredDraft::new(draft.clone()));
        Ok(draft)
    }

    fn update(&self, draft: ApplicationDraft) -> Result<(), StoreError> {
        let mut guard = self.drafts.lock().expect("draft store mutex poisoned");
        if !self.keep_if_live(&mut guard, &draft.id()) {
            return Err(StoreError::NotFound);
        }
        guard.insert(draft.id(), StoredDraft::new(draft));
        Ok(())
    }

    fn fetch(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        let mut guard = self.drafts.lock().expect("draft store mutex poisoned");
        if !self.keep_if_live(&mut guard, id) {
            return Ok(None);
        }
        Ok(guard.get_mut(id).map(|stored| {
            stored.last_active = Instant::now();
            stored.draft.clone()
        }))
    }

    fn remove(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
        let mut guard = self.drafts.lock().expect("draft store mutex poisoned");
        Ok(guard
            .remove(id)
            .filter(|stored| !stored.is_idle(self.idle_timeout))
            .map(|stored| stored.draft))
    }
}

/// Relay that records submissions in the log instead of mailing them.
/// Repeated deliveries of one idempotency key return the original receipt.
#[derive(Default, Clone)]
pub(crate) struct LoggingRelay {
    receipts: Arc<Mutex<HashMap<String, RelayReceipt>>>,
}

impl SubmissionRelay for LoggingRelay {
    fn deliver(&self, payload: &SubmissionPayload) -> Result<RelayReceipt, RelayError> {
        let mut guard = self.receipts.lock().expect("relay mutex poisoned");
        if let Some(receipt) = guard.get(&payload.idempotency_key) {
            info!(reference = %receipt.reference, "duplicate submission ignored");
            return Ok(receipt.clone());
        }

        let receipt = RelayReceipt {
            reference: format!("LA-{:06}", guard.len() + 1),
            idempotency_key: payload.idempotency_key.clone(),
            delivered_at: Utc::now(),
        };
        info!(
            reference = %receipt.reference,
            applicant = %payload.applicant_name(),
            purpose = payload.loan_purpose.label(),
            documents = payload.document_count(),
            officer = payload
                .selected_officer
                .as_ref()
                .map(|officer| officer.name.as_str())
                .unwrap_or("unassigned"),
            "loan application relayed"
        );
        guard.insert(payload.idempotency_key.clone(), receipt.clone());
        Ok(receipt)
    }

    fn confirm(&self, notice: ConfirmationNotice) -> Result<(), RelayError> {
        info!(email = %notice.email, name = %notice.name, "confirmation e-mail queued");
        Ok(())
    }
}

impl LoggingRelay {
    pub(crate) fn delivered(&self) -> usize {
        self.receipts.lock().expect("relay mutex poisoned").len()
    }
}
