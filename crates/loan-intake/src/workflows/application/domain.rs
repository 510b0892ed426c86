use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one in-progress application; scoped to a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub Uuid);

impl DraftId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DraftId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Directory identifier of a loan officer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficerId(pub u32);

impl fmt::Display for OfficerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    Purchase,
    Refinance,
}

impl LoanPurpose {
    pub const fn label(self) -> &'static str {
        match self {
            LoanPurpose::Purchase => "Purchase",
            LoanPurpose::Refinance => "Refinance",
        }
    }
}

impl FromStr for LoanPurpose {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "purchase" => Ok(Self::Purchase),
            "refinance" => Ok(Self::Refinance),
            other => Err(format!("unknown loan purpose '{other}'")),
        }
    }
}

/// Contact details of the primary applicant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Condo,
    Townhouse,
    MultiFamily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinanceReason {
    LowerRate,
    CashOut,
    ShortenTerm,
    ConsolidateDebt,
}

/// Property record. The shared amount slots are always required; the
/// purpose-specific subset lives in `details`, so only one subset can exist
/// at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    /// Purchase price, or the cash-out amount when refinancing.
    #[serde(default)]
    pub purchase_price: Option<u64>,
    /// Down payment, or the years remaining on the current loan when refinancing.
    #[serde(default)]
    pub down_payment: Option<u64>,
    pub details: PropertyDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum PropertyDetails {
    Purchase(PurchaseDetails),
    Refinance(RefinanceDetails),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseDetails {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinanceDetails {
    pub current_value: Option<u64>,
    pub current_loan_balance: Option<u64>,
    pub refinance_reason: Option<RefinanceReason>,
}

/// Display labels for the shared amount slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SharedFieldLabels {
    pub purchase_price: &'static str,
    pub down_payment: &'static str,
}

impl PropertyInfo {
    pub fn empty(purpose: LoanPurpose) -> Self {
        let details = match purpose {
            LoanPurpose::Purchase => PropertyDetails::Purchase(PurchaseDetails::default()),
            LoanPurpose::Refinance => PropertyDetails::Refinance(RefinanceDetails::default()),
        };

        Self {
            property_type: None,
            purchase_price: None,
            down_payment: None,
            details,
        }
    }

    pub fn purpose(&self) -> LoanPurpose {
        match self.details {
            PropertyDetails::Purchase(_) => LoanPurpose::Purchase,
            PropertyDetails::Refinance(_) => LoanPurpose::Refinance,
        }
    }

    pub fn labels(&self) -> SharedFieldLabels {
        match self.purpose() {
            LoanPurpose::Purchase => SharedFieldLabels {
                purchase_price: "Purchase price",
                down_payment: "Down payment",
            },
            LoanPurpose::Refinance => SharedFieldLabels {
                purchase_price: "Cash-out amount",
                down_payment: "Years remaining on loan",
            },
        }
    }
}

impl Default for PropertyInfo {
    fn default() -> Self {
        Self::empty(LoanPurpose::Purchase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Retired,
    Unemployed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditScoreBracket {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    Conventional,
    Fha,
    Va,
    Usda,
    Jumbo,
}

impl LoanType {
    pub const fn label(self) -> &'static str {
        match self {
            LoanType::Conventional => "Conventional Loan",
            LoanType::Fha => "FHA Loan",
            LoanType::Va => "VA Loan",
            LoanType::Usda => "USDA Loan",
            LoanType::Jumbo => "Jumbo Loan",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialInfo {
    pub annual_income: Option<u64>,
    pub employment_status: Option<EmploymentStatus>,
    pub employer: String,
    pub credit_score: Option<CreditScoreBracket>,
    pub monthly_debt: Option<u64>,
    pub loan_type: Option<LoanType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidenceType {
    Own,
    Rent,
    LivingWithFamily,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentResidence {
    pub residence_type: Option<ResidenceType>,
    pub years: Option<u8>,
    pub months: Option<u8>,
    pub monthly_payment: Option<u64>,
}

impl CurrentResidence {
    pub fn total_months(&self) -> u32 {
        duration_months(self.years, self.months)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviousResidence {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub residence_type: Option<ResidenceType>,
    pub years: Option<u8>,
    pub months: Option<u8>,
    pub monthly_payment: Option<u64>,
}

impl PreviousResidence {
    pub fn total_months(&self) -> u32 {
        duration_months(self.years, self.months)
    }
}

/// Where the applicant has lived; previous residences are ordered most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivingHistory {
    pub current: CurrentResidence,
    pub previous: Vec<PreviousResidence>,
}

fn duration_months(years: Option<u8>, months: Option<u8>) -> u32 {
    u32::from(years.unwrap_or(0)) * 12 + u32::from(months.unwrap_or(0))
}

/// Officer chosen when the wizard was opened (e.g. from the staff directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOfficer {
    pub id: OfficerId,
    pub name: String,
}
