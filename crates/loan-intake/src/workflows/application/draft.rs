use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::documents::{DocumentSlot, DocumentationBundle, FileDescriptor, UploadRejection};
use super::domain::{
    DraftId, FinancialInfo, LivingHistory, LoanPurpose, PersonalInfo, PreviousResidence,
    PropertyInfo, SelectedOfficer, SharedFieldLabels,
};
use super::fields::{FieldFailure, FieldId, Section, SectionReport};
use super::residence::{ResidenceHistory, ResidenceSummary};
use super::submission::{RelayError, RelayReceipt, SubmissionPayload, SubmissionRelay};
use super::validation;

/// Emitted when the visible step changes; the UI decides how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationEvent {
    ScrollToFormTop { section: Section },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub section: Section,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<NavigationEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftStatus {
    InProgress,
    Submitted { receipt: RelayReceipt },
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("{}", .0.summary())]
    SectionIncomplete(SectionReport),
    #[error("property details are for {found:?} but the loan purpose is {expected:?}")]
    PurposeMismatch {
        expected: LoanPurpose,
        found: LoanPurpose,
    },
    #[error(transparent)]
    Upload(#[from] UploadRejection),
    #[error("no previous residence at position {index}")]
    UnknownResidence { index: usize },
    #[error("application has already been submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// In-memory aggregate for one applicant's in-progress application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    id: DraftId,
    created_at: DateTime<Utc>,
    loan_purpose: Option<LoanPurpose>,
    current_section: Section,
    selected_officer: Option<SelectedOfficer>,
    personal: PersonalInfo,
    property: PropertyInfo,
    financial: FinancialInfo,
    living_history: LivingHistory,
    documents: DocumentationBundle,
    touched: BTreeSet<FieldId>,
    status: DraftStatus,
}

impl ApplicationDraft {
    pub fn new(id: DraftId, selected_officer: Option<SelectedOfficer>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            loan_purpose: None,
            current_section: Section::FIRST,
            selected_officer,
            personal: PersonalInfo::default(),
            property: PropertyInfo::default(),
            financial: FinancialInfo::default(),
            living_history: LivingHistory::default(),
            documents: DocumentationBundle::default(),
            touched: BTreeSet::new(),
            status: DraftStatus::InProgress,
        }
    }

    pub fn id(&self) -> DraftId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn loan_purpose(&self) -> Option<LoanPurpose> {
        self.loan_purpose
    }

    pub fn current_section(&self) -> Section {
        self.current_section
    }

    pub fn selected_officer(&self) -> Option<&SelectedOfficer> {
        self.selected_officer.as_ref()
    }

    pub fn personal(&self) -> &PersonalInfo {
        &self.personal
    }

    pub fn property(&self) -> &PropertyInfo {
        &self.property
    }

    pub fn financial(&self) -> &FinancialInfo {
        &self.financial
    }

    pub fn living_history(&self) -> &LivingHistory {
        &self.living_history
    }

    pub fn documents(&self) -> &DocumentationBundle {
        &self.documents
    }

    pub fn status(&self) -> &DraftStatus {
        &self.status
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.status, DraftStatus::Submitted { .. })
    }

    fn ensure_editable(&self) -> Result<(), DraftError> {
        if self.is_submitted() {
            return Err(DraftError::AlreadySubmitted);
        }
        Ok(())
    }

    /// Purpose whose property subset is active; purchase until one is chosen.
    fn active_purpose(&self) -> LoanPurpose {
        self.loan_purpose.unwrap_or(LoanPurpose::Purchase)
    }

    /// Choose the loan purpose. Property details always start over so values
    /// from the other purpose's subset cannot leak into validation.
    pub fn select_purpose(&mut self, purpose: LoanPurpose) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.loan_purpose = Some(purpose);
        self.property = PropertyInfo::empty(purpose);
        self.touched
            .retain(|field| field.section() != Section::Property);
        debug!(draft = %self.id, purpose = purpose.label(), "loan purpose selected");
        Ok(())
    }

    pub fn update_personal(&mut self, info: PersonalInfo) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.personal = info;
        Ok(())
    }

    pub fn update_property(&mut self, info: PropertyInfo) -> Result<(), DraftError> {
        self.ensure_editable()?;
        let expected = self.active_purpose();
        let found = info.purpose();
        if expected != found {
            return Err(DraftError::PurposeMismatch { expected, found });
        }
        self.property = info;
        Ok(())
    }

    pub fn update_financial(&mut self, info: FinancialInfo) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.financial = info;
        Ok(())
    }

    pub fn update_living_history(&mut self, history: LivingHistory) -> Result<(), DraftError> {
        self.ensure_editable()?;
        if self.living_history.previous != history.previous {
            self.forget_previous_residence_touches();
        }
        self.living_history = history;
        Ok(())
    }

    /// Append an empty previous-residence record and return its position.
    pub fn add_previous_residence(&mut self) -> Result<usize, DraftError> {
        self.ensure_editable()?;
        self.living_history
            .previous
            .push(PreviousResidence::default());
        Ok(self.living_history.previous.len() - 1)
    }

    pub fn update_previous_residence(
        &mut self,
        index: usize,
        residence: PreviousResidence,
    ) -> Result<(), DraftError> {
        self.ensure_editable()?;
        let slot = self
            .living_history
            .previous
            .get_mut(index)
            .ok_or(DraftError::UnknownResidence { index })?;
        *slot = residence;
        Ok(())
    }

    pub fn remove_previous_residence(&mut self, index: usize) -> Result<(), DraftError> {
        self.ensure_editable()?;
        if index >= self.living_history.previous.len() {
            return Err(DraftError::UnknownResidence { index });
        }
        self.living_history.previous.remove(index);
        self.forget_previous_residence_touches();
        Ok(())
    }

    /// Touch marks are positional, so they go stale once the list is reshaped.
    fn forget_previous_residence_touches(&mut self) {
        self.touched
            .retain(|field| !matches!(field, FieldId::PreviousResidence { .. }));
    }

    pub fn attach(
        &mut self,
        slot: DocumentSlot,
        batch: Vec<FileDescriptor>,
    ) -> Result<(), DraftError> {
        self.ensure_editable()?;
        let count = batch.len();
        match self.documents.attach(slot, batch) {
            Ok(()) => {
                self.touched.insert(FieldId::Document(slot));
                debug!(draft = %self.id, slot = slot.key(), count, "documents attached");
                Ok(())
            }
            Err(rejection) => {
                warn!(draft = %self.id, slot = slot.key(), %rejection, "upload rejected");
                Err(rejection.into())
            }
        }
    }

    pub fn remove_document(
        &mut self,
        slot: DocumentSlot,
        index: Option<usize>,
    ) -> Result<Vec<FileDescriptor>, DraftError> {
        self.ensure_editable()?;
        Ok(self.documents.remove(slot, index))
    }

    pub fn accept_terms(&mut self, accepted: bool) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.documents.terms_accepted = accepted;
        self.touched.insert(FieldId::TermsAccepted);
        Ok(())
    }

    /// Record fields the applicant has interacted with.
    pub fn touch(&mut self, fields: impl IntoIterator<Item = FieldId>) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.touched.extend(fields);
        Ok(())
    }

    pub fn touched(&self) -> &BTreeSet<FieldId> {
        &self.touched
    }

    pub fn section_report(&self, section: Section) -> SectionReport {
        match section {
            Section::Personal => validation::personal_report(&self.personal),
            Section::Property => validation::property_report(&self.property),
            Section::Financial => validation::financial_report(&self.financial),
            Section::LivingHistory => validation::living_history_report(&self.living_history),
            Section::Documentation => validation::documentation_report(&self.documents),
        }
    }

    pub fn is_section_valid(&self, section: Section) -> bool {
        self.section_report(section).valid
    }

    /// Failures the applicant should see: only fields they have touched.
    pub fn visible_failures(&self, section: Section) -> Vec<FieldFailure> {
        self.section_report(section)
            .failures
            .into_iter()
            .filter(|failure| self.touched.contains(&failure.field))
            .collect()
    }

    pub fn residence_summary(&self) -> ResidenceSummary {
        ResidenceHistory::evaluate(&self.living_history)
    }

    pub fn upload_progress_percent(&self) -> u8 {
        self.documents.upload_progress_percent()
    }

    /// Move to the next section if the current one validates. A refusal marks
    /// the failing fields as touched and reports them.
    pub fn advance(&mut self) -> Result<StepOutcome, DraftError> {
        self.ensure_editable()?;
        let section = self.current_section;
        let report = self.section_report(section);

        if !report.valid {
            self.touched.extend(report.failed_fields());
            warn!(
                draft = %self.id,
                section = section.key(),
                failures = report.failures.len(),
                "advance refused"
            );
            return Err(DraftError::SectionIncomplete(report));
        }

        match section.next() {
            Some(next) => {
                self.current_section = next;
                debug!(draft = %self.id, from = section.key(), to = next.key(), "advanced");
                Ok(StepOutcome {
                    section: next,
                    event: Some(NavigationEvent::ScrollToFormTop { section: next }),
                })
            }
            None => Ok(StepOutcome {
                section,
                event: None,
            }),
        }
    }

    /// Step back one section without validating; a no-op on the first section.
    pub fn retreat(&mut self) -> Result<StepOutcome, DraftError> {
        self.ensure_editable()?;
        let section = self.current_section;

        match section.previous() {
            Some(previous) => {
                self.current_section = previous;
                debug!(draft = %self.id, from = section.key(), to = previous.key(), "retreated");
                Ok(StepOutcome {
                    section: previous,
                    event: Some(NavigationEvent::ScrollToFormTop { section: previous }),
                })
            }
            None => Ok(StepOutcome {
                section,
                event: None,
            }),
        }
    }

    fn first_incomplete(&self) -> Option<SectionReport> {
        Section::ALL
            .iter()
            .map(|section| self.section_report(*section))
            .find(|report| !report.valid)
    }

    fn payload(&self, submitted_at: DateTime<Utc>) -> SubmissionPayload {
        SubmissionPayload {
            idempotency_key: self.id.to_string(),
            loan_purpose: self.property.purpose(),
            personal_info: self.personal.clone(),
            property_info: self.property.clone(),
            financial_info: self.financial.clone(),
            living_history: self.living_history.clone(),
            documents: self.documents.clone(),
            selected_officer: self.selected_officer.clone(),
            submitted_at,
        }
    }

    /// Hand the completed application to the relay. On success the draft is
    /// frozen; on relay failure it stays editable so the applicant can retry.
    pub fn submit<R>(&mut self, relay: &R) -> Result<RelayReceipt, DraftError>
    where
        R: SubmissionRelay + ?Sized,
    {
        self.ensure_editable()?;
        if let Some(report) = self.first_incomplete() {
            return Err(DraftError::SectionIncomplete(report));
        }

        let payload = self.payload(Utc::now());
        let receipt = relay.deliver(&payload)?;
        info!(
            draft = %self.id,
            reference = %receipt.reference,
            purpose = payload.loan_purpose.label(),
            documents = payload.document_count(),
            "application submitted"
        );

        if let Err(err) = relay.confirm(payload.confirmation_notice()) {
            warn!(draft = %self.id, error = %err, "confirmation e-mail not sent");
        }

        self.status = DraftStatus::Submitted {
            receipt: receipt.clone(),
        };
        Ok(receipt)
    }

    pub fn view(&self) -> DraftView {
        let current = self.current_section;
        DraftView {
            id: self.id,
            status: self.status.clone(),
            loan_purpose: self.loan_purpose,
            current_section: current,
            step: current.number(),
            total_steps: Section::LAST.number(),
            selected_officer: self.selected_officer.clone(),
            personal: self.personal.clone(),
            property: self.property.clone(),
            property_labels: self.property.labels(),
            financial: self.financial.clone(),
            living_history: self.living_history.clone(),
            residence_summary: self.residence_summary(),
            documents: self.documents.clone(),
            upload_progress_percent: self.upload_progress_percent(),
            visible_failures: self.visible_failures(current),
        }
    }
}

/// Serializable snapshot for clients, including derived state.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub id: DraftId,
    pub status: DraftStatus,
    pub loan_purpose: Option<LoanPurpose>,
    pub current_section: Section,
    pub step: u8,
    pub total_steps: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_officer: Option<SelectedOfficer>,
    pub personal: PersonalInfo,
    pub property: PropertyInfo,
    pub property_labels: SharedFieldLabels,
    pub financial: FinancialInfo,
    pub living_history: LivingHistory,
    pub residence_summary: ResidenceSummary,
    pub documents: DocumentationBundle,
    pub upload_progress_percent: u8,
    pub visible_failures: Vec<FieldFailure>,
}
