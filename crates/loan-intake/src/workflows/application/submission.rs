use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::documents::DocumentationBundle;
use super::domain::{
    FinancialInfo, LivingHistory, LoanPurpose, PersonalInfo, PropertyInfo, SelectedOfficer,
};

/// Everything collected by the wizard, frozen at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// Stable per draft so relays can deliver at most once.
    pub idempotency_key: String,
    pub loan_purpose: LoanPurpose,
    pub personal_info: PersonalInfo,
    pub property_info: PropertyInfo,
    pub financial_info: FinancialInfo,
    pub living_history: LivingHistory,
    pub documents: DocumentationBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_officer: Option<SelectedOfficer>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionPayload {
    pub fn applicant_name(&self) -> String {
        self.personal_info.full_name()
    }

    pub fn document_count(&self) -> usize {
        let bundle = &self.documents;
        usize::from(bundle.identity.is_some())
            + bundle.income.len()
            + bundle.bank.len()
            + bundle.additional.len()
    }

    pub fn confirmation_notice(&self) -> ConfirmationNotice {
        ConfirmationNotice {
            email: self.personal_info.email.trim().to_string(),
            name: self.applicant_name(),
            loan_officer_name: self
                .selected_officer
                .as_ref()
                .map(|officer| officer.name.clone()),
        }
    }
}

/// Acknowledgement returned by a relay after accepting a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReceipt {
    pub reference: String,
    pub idempotency_key: String,
    pub delivered_at: DateTime<Utc>,
}

/// Applicant-facing confirmation e-mail request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationNotice {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_officer_name: Option<String>,
}

/// Outbound hand-off for completed applications (e-mail relay, CRM, ...).
pub trait SubmissionRelay: Send + Sync {
    fn deliver(&self, payload: &SubmissionPayload) -> Result<RelayReceipt, RelayError>;
    fn confirm(&self, notice: ConfirmationNotice) -> Result<(), RelayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("submission relay unavailable: {0}")]
    Unavailable(String),
    #[error("submission relay rejected the application: {0}")]
    Rejected(String),
}
