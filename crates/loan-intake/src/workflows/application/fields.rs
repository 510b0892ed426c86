use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::documents::DocumentSlot;

/// The fixed sequence of wizard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Personal,
    Property,
    Financial,
    LivingHistory,
    Documentation,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Personal,
        Section::Property,
        Section::Financial,
        Section::LivingHistory,
        Section::Documentation,
    ];

    pub const FIRST: Section = Section::Personal;
    pub const LAST: Section = Section::Documentation;

    /// One-based position shown to applicants ("Step 2 of 5").
    pub const fn number(self) -> u8 {
        match self {
            Section::Personal => 1,
            Section::Property => 2,
            Section::Financial => 3,
            Section::LivingHistory => 4,
            Section::Documentation => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|section| section.number() == number)
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.number()
            .checked_sub(1)
            .and_then(Self::from_number)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Section::Personal => "Personal Info",
            Section::Property => "Property Info",
            Section::Financial => "Financial Info",
            Section::LivingHistory => "Living History",
            Section::Documentation => "Documentation",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Section::Personal => "personal",
            Section::Property => "property",
            Section::Financial => "financial",
            Section::LivingHistory => "living_history",
            Section::Documentation => "documentation",
        }
    }
}

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::from_number(number).ok_or_else(|| UnknownSection(value.to_string()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|section| section.key() == trimmed)
            .ok_or_else(|| UnknownSection(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section '{0}'")]
pub struct UnknownSection(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PersonalField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    State,
    ZipCode,
}

impl PersonalField {
    pub const ALL: [PersonalField; 8] = [
        PersonalField::FirstName,
        PersonalField::LastName,
        PersonalField::Email,
        PersonalField::Phone,
        PersonalField::Address,
        PersonalField::City,
        PersonalField::State,
        PersonalField::ZipCode,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            PersonalField::FirstName => "first_name",
            PersonalField::LastName => "last_name",
            PersonalField::Email => "email",
            PersonalField::Phone => "phone",
            PersonalField::Address => "address",
            PersonalField::City => "city",
            PersonalField::State => "state",
            PersonalField::ZipCode => "zip_code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyField {
    PropertyType,
    PurchasePrice,
    DownPayment,
    PropertyAddress,
    PropertyCity,
    PropertyState,
    PropertyZipCode,
    CurrentValue,
    CurrentLoanBalance,
    RefinanceReason,
}

impl PropertyField {
    pub const ALL: [PropertyField; 10] = [
        PropertyField::PropertyType,
        PropertyField::PurchasePrice,
        PropertyField::DownPayment,
        PropertyField::PropertyAddress,
        PropertyField::PropertyCity,
        PropertyField::PropertyState,
        PropertyField::PropertyZipCode,
        PropertyField::CurrentValue,
        PropertyField::CurrentLoanBalance,
        PropertyField::RefinanceReason,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            PropertyField::PropertyType => "property_type",
            PropertyField::PurchasePrice => "purchase_price",
            PropertyField::DownPayment => "down_payment",
            PropertyField::PropertyAddress => "property_address",
            PropertyField::PropertyCity => "property_city",
            PropertyField::PropertyState => "property_state",
            PropertyField::PropertyZipCode => "property_zip_code",
            PropertyField::CurrentValue => "current_value",
            PropertyField::CurrentLoanBalance => "current_loan_balance",
            PropertyField::RefinanceReason => "refinance_reason",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FinancialField {
    AnnualIncome,
    EmploymentStatus,
    Employer,
    CreditScore,
    MonthlyDebt,
    LoanType,
}

impl FinancialField {
    pub const ALL: [FinancialField; 6] = [
        FinancialField::AnnualIncome,
        FinancialField::EmploymentStatus,
        FinancialField::Employer,
        FinancialField::CreditScore,
        FinancialField::MonthlyDebt,
        FinancialField::LoanType,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            FinancialField::AnnualIncome => "annual_income",
            FinancialField::EmploymentStatus => "employment_status",
            FinancialField::Employer => "employer",
            FinancialField::CreditScore => "credit_score",
            FinancialField::MonthlyDebt => "monthly_debt",
            FinancialField::LoanType => "loan_type",
        }
    }
}

/// Fields shared by the current and previous residence records. The address
/// fields only exist on previous residences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResidenceField {
    Address,
    City,
    State,
    ZipCode,
    ResidenceType,
    Years,
    Months,
    Duration,
    MonthlyPayment,
}

impl ResidenceField {
    pub const ALL: [ResidenceField; 9] = [
        ResidenceField::Address,
        ResidenceField::City,
        ResidenceField::State,
        ResidenceField::ZipCode,
        ResidenceField::ResidenceType,
        ResidenceField::Years,
        ResidenceField::Months,
        ResidenceField::Duration,
        ResidenceField::MonthlyPayment,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            ResidenceField::Address => "address",
            ResidenceField::City => "city",
            ResidenceField::State => "state",
            ResidenceField::ZipCode => "zip_code",
            ResidenceField::ResidenceType => "residence_type",
            ResidenceField::Years => "years",
            ResidenceField::Months => "months",
            ResidenceField::Duration => "duration",
            ResidenceField::MonthlyPayment => "monthly_payment",
        }
    }
}

/// Identifies one validated input. Renders as a dotted path such as
/// `living_history.previous[1].zip_code` and parses back from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    Personal(PersonalField),
    Property(PropertyField),
    Financial(FinancialField),
    CurrentResidence(ResidenceField),
    PreviousResidence { index: usize, field: ResidenceField },
    ResidenceHistory,
    Document(DocumentSlot),
    TermsAccepted,
}

impl FieldId {
    pub const fn section(&self) -> Section {
        match self {
            FieldId::Personal(_) => Section::Personal,
            FieldId::Property(_) => Section::Property,
            FieldId::Financial(_) => Section::Financial,
            FieldId::CurrentResidence(_)
            | FieldId::PreviousResidence { .. }
            | FieldId::ResidenceHistory => Section::LivingHistory,
            FieldId::Document(_) | FieldId::TermsAccepted => Section::Documentation,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Personal(field) => write!(f, "personal.{}", field.key()),
            FieldId::Property(field) => write!(f, "property.{}", field.key()),
            FieldId::Financial(field) => write!(f, "financial.{}", field.key()),
            FieldId::CurrentResidence(field) => {
                write!(f, "living_history.current.{}", field.key())
            }
            FieldId::PreviousResidence { index, field } => {
                write!(f, "living_history.previous[{index}].{}", field.key())
            }
            FieldId::ResidenceHistory => write!(f, "living_history.total_months"),
            FieldId::Document(slot) => write!(f, "documents.{}", slot.key()),
            FieldId::TermsAccepted => write!(f, "documents.terms_accepted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);

fn find_key<T: Copy>(all: &[T], key: &str, key_of: fn(T) -> &'static str) -> Option<T> {
    all.iter().copied().find(|candidate| key_of(*candidate) == key)
}

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownField(value.to_string());
        let (scope, rest) = value.trim().split_once('.').ok_or_else(unknown)?;

        let parsed = match scope {
            "personal" => find_key(&PersonalField::ALL, rest, PersonalField::key)
                .map(FieldId::Personal),
            "property" => find_key(&PropertyField::ALL, rest, PropertyField::key)
                .map(FieldId::Property),
            "financial" => find_key(&FinancialField::ALL, rest, FinancialField::key)
                .map(FieldId::Financial),
            "documents" if rest == "terms_accepted" => Some(FieldId::TermsAccepted),
            "documents" => find_key(&DocumentSlot::ALL, rest, DocumentSlot::key)
                .map(FieldId::Document),
            "living_history" if rest == "total_months" => Some(FieldId::ResidenceHistory),
            "living_history" => parse_residence_path(rest),
            _ => None,
        };

        parsed.ok_or_else(unknown)
    }
}

fn parse_residence_path(rest: &str) -> Option<FieldId> {
    let (record, field) = rest.split_once('.')?;
    let field = find_key(&ResidenceField::ALL, field, ResidenceField::key)?;

    if record == "current" {
        return Some(FieldId::CurrentResidence(field));
    }

    let index = record
        .strip_prefix("previous[")?
        .strip_suffix(']')?
        .parse::<usize>()
        .ok()?;
    Some(FieldId::PreviousResidence { index, field })
}

impl Serialize for FieldId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Why a single field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    Required,
    InvalidFormat,
    OutOfRange,
    InsufficientHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: FieldId,
    pub rule: FieldRule,
}

/// Outcome of validating one section: the failing fields, never just a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionReport {
    pub section: Section,
    pub valid: bool,
    pub failures: Vec<FieldFailure>,
}

impl SectionReport {
    pub fn new(section: Section, failures: Vec<FieldFailure>) -> Self {
        Self {
            section,
            valid: failures.is_empty(),
            failures,
        }
    }

    pub fn failed_fields(&self) -> Vec<FieldId> {
        self.failures.iter().map(|failure| failure.field).collect()
    }

    pub fn has_failure(&self, field: FieldId) -> bool {
        self.failures.iter().any(|failure| failure.field == field)
    }

    pub fn summary(&self) -> String {
        if self.valid {
            return format!("{} complete", self.section.label());
        }
        let fields = self
            .failures
            .iter()
            .map(|failure| failure.field.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} incomplete: {fields}", self.section.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_numbers_walk_forward_and_back() {
        assert_eq!(Section::FIRST.previous(), None);
        assert_eq!(Section::Personal.next(), Some(Section::Property));
        assert_eq!(Section::LAST.next(), None);
        assert_eq!(Section::from_number(4), Some(Section::LivingHistory));
        assert_eq!("3".parse::<Section>(), Ok(Section::Financial));
        assert_eq!("documentation".parse::<Section>(), Ok(Section::Documentation));
        assert!("9".parse::<Section>().is_err());
    }

    #[test]
    fn field_paths_parse_back() {
        let fields = [
            FieldId::Personal(PersonalField::Email),
            FieldId::Property(PropertyField::RefinanceReason),
            FieldId::Financial(FinancialField::LoanType),
            FieldId::CurrentResidence(ResidenceField::Duration),
            FieldId::PreviousResidence {
                index: 2,
                field: ResidenceField::ZipCode,
            },
            FieldId::ResidenceHistory,
            FieldId::Document(DocumentSlot::Bank),
            FieldId::TermsAccepted,
        ];

        for field in fields {
            let rendered = field.to_string();
            assert_eq!(rendered.parse::<FieldId>(), Ok(field), "{rendered}");
        }
        assert_eq!(
            FieldId::PreviousResidence {
                index: 2,
                field: ResidenceField::ZipCode
            }
            .to_string(),
            "living_history.previous[2].zip_code"
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        for raw in [
            "email",
            "personal.nickname",
            "living_history.previous[x].city",
            "living_history.previous[1]",
            "documents.passport",
        ] {
            assert!(raw.parse::<FieldId>().is_err(), "{raw}");
        }
    }

    #[test]
    fn report_serializes_field_paths() {
        let report = SectionReport::new(
            Section::Personal,
            vec![FieldFailure {
                field: FieldId::Personal(PersonalField::Email),
                rule: FieldRule::InvalidFormat,
            }],
        );
        let json = serde_json::to_value(&report).expect("serializes");
        assert_eq!(json["valid"], false);
        assert_eq!(json["failures"][0]["field"], "personal.email");
        assert_eq!(json["failures"][0]["rule"], "invalid_format");
    }
}
