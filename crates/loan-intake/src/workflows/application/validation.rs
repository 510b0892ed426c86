use std::sync::OnceLock;

use regex::Regex;

use super::documents::{DocumentSlot, DocumentationBundle};
use super::domain::{
    FinancialInfo, LivingHistory, PersonalInfo, PreviousResidence, PropertyDetails, PropertyInfo,
};
use super::fields::{
    FieldFailure, FieldId, FieldRule, FinancialField, PersonalField, PropertyField,
    ResidenceField, Section, SectionReport,
};
use super::residence::ResidenceHistory;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

fn zip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip pattern compiles"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_pattern().is_match(value.trim())
}

/// Ten digits once punctuation is stripped; a leading country code 1 is allowed.
pub fn is_valid_phone(value: &str) -> bool {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    let allowed_punctuation = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')' | '+'));
    allowed_punctuation
        && (digits.len() == 10 || (digits.len() == 11 && digits.starts_with('1')))
}

pub fn is_valid_state(value: &str) -> bool {
    let value = value.trim();
    value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_valid_zip(value: &str) -> bool {
    zip_pattern().is_match(value.trim())
}

/// Accumulates failures for one section.
#[derive(Default)]
struct Checks {
    failures: Vec<FieldFailure>,
}

impl Checks {
    fn fail(&mut self, field: FieldId, rule: FieldRule) {
        self.failures.push(FieldFailure { field, rule });
    }

    fn text(&mut self, field: FieldId, value: &str) -> bool {
        if value.trim().is_empty() {
            self.fail(field, FieldRule::Required);
            return false;
        }
        true
    }

    fn formatted(&mut self, field: FieldId, value: &str, valid: fn(&str) -> bool) {
        if self.text(field, value) && !valid(value) {
            self.fail(field, FieldRule::InvalidFormat);
        }
    }

    fn present<T>(&mut self, field: FieldId, value: &Option<T>) -> bool {
        if value.is_none() {
            self.fail(field, FieldRule::Required);
            return false;
        }
        true
    }

    fn positive(&mut self, field: FieldId, value: Option<u64>) {
        if self.present(field, &value) && value == Some(0) {
            self.fail(field, FieldRule::OutOfRange);
        }
    }

    fn duration(
        &mut self,
        field: impl Fn(ResidenceField) -> FieldId,
        years: Option<u8>,
        months: Option<u8>,
        total_months: u32,
    ) {
        let has_years = self.present(field(ResidenceField::Years), &years);
        let has_months = self.present(field(ResidenceField::Months), &months);
        if let Some(months) = months {
            if months > 11 {
                self.fail(field(ResidenceField::Months), FieldRule::OutOfRange);
            }
        }
        if has_years && has_months && total_months == 0 {
            self.fail(field(ResidenceField::Duration), FieldRule::OutOfRange);
        }
    }

    fn finish(self, section: Section) -> SectionReport {
        SectionReport::new(section, self.failures)
    }
}

pub fn personal_report(info: &PersonalInfo) -> SectionReport {
    let field = FieldId::Personal;
    let mut checks = Checks::default();

    checks.text(field(PersonalField::FirstName), &info.first_name);
    checks.text(field(PersonalField::LastName), &info.last_name);
    checks.formatted(field(PersonalField::Email), &info.email, is_valid_email);
    checks.formatted(field(PersonalField::Phone), &info.phone, is_valid_phone);
    checks.text(field(PersonalField::Address), &info.address);
    checks.text(field(PersonalField::City), &info.city);
    checks.formatted(field(PersonalField::State), &info.state, is_valid_state);
    checks.formatted(field(PersonalField::ZipCode), &info.zip_code, is_valid_zip);

    checks.finish(Section::Personal)
}

/// Only the subset carried by `details` is checked; the other purpose's
/// fields do not exist on the record.
pub fn property_report(info: &PropertyInfo) -> SectionReport {
    let field = FieldId::Property;
    let mut checks = Checks::default();

    checks.present(field(PropertyField::PropertyType), &info.property_type);

    match &info.details {
        PropertyDetails::Purchase(purchase) => {
            checks.text(field(PropertyField::PropertyAddress), &purchase.address);
            checks.text(field(PropertyField::PropertyCity), &purchase.city);
            checks.formatted(
                field(PropertyField::PropertyState),
                &purchase.state,
                is_valid_state,
            );
            checks.formatted(
                field(PropertyField::PropertyZipCode),
                &purchase.zip_code,
                is_valid_zip,
            );
        }
        PropertyDetails::Refinance(refinance) => {
            checks.positive(field(PropertyField::CurrentValue), refinance.current_value);
            checks.present(
                field(PropertyField::CurrentLoanBalance),
                &refinance.current_loan_balance,
            );
            checks.present(
                field(PropertyField::RefinanceReason),
                &refinance.refinance_reason,
            );
        }
    }

    checks.positive(field(PropertyField::PurchasePrice), info.purchase_price);
    checks.present(field(PropertyField::DownPayment), &info.down_payment);

    checks.finish(Section::Property)
}

pub fn financial_report(info: &FinancialInfo) -> SectionReport {
    let field = FieldId::Financial;
    let mut checks = Checks::default();

    checks.positive(field(FinancialField::AnnualIncome), info.annual_income);
    checks.present(
        field(FinancialField::EmploymentStatus),
        &info.employment_status,
    );
    checks.text(field(FinancialField::Employer), &info.employer);
    checks.present(field(FinancialField::CreditScore), &info.credit_score);
    checks.present(field(FinancialField::MonthlyDebt), &info.monthly_debt);
    checks.present(field(FinancialField::LoanType), &info.loan_type);

    checks.finish(Section::Financial)
}

fn previous_residence_checks(checks: &mut Checks, index: usize, residence: &PreviousResidence) {
    let field = |field: ResidenceField| FieldId::PreviousResidence { index, field };

    checks.text(field(ResidenceField::Address), &residence.address);
    checks.text(field(ResidenceField::City), &residence.city);
    checks.formatted(field(ResidenceField::State), &residence.state, is_valid_state);
    checks.formatted(field(ResidenceField::ZipCode), &residence.zip_code, is_valid_zip);
    checks.present(field(ResidenceField::ResidenceType), &residence.residence_type);
    checks.duration(
        field,
        residence.years,
        residence.months,
        residence.total_months(),
    );
    checks.present(field(ResidenceField::MonthlyPayment), &residence.monthly_payment);
}

/// The current residence is always validated. Previous residences are only in
/// scope while the current one covers less than the required history.
pub fn living_history_report(history: &LivingHistory) -> SectionReport {
    let mut checks = Checks::default();
    let current = &history.current;

    checks.present(
        FieldId::CurrentResidence(ResidenceField::ResidenceType),
        &current.residence_type,
    );
    checks.duration(
        FieldId::CurrentResidence,
        current.years,
        current.months,
        current.total_months(),
    );
    checks.present(
        FieldId::CurrentResidence(ResidenceField::MonthlyPayment),
        &current.monthly_payment,
    );

    let summary = ResidenceHistory::evaluate(history);
    if !summary.current_is_sufficient() {
        for (index, residence) in history.previous.iter().enumerate() {
            previous_residence_checks(&mut checks, index, residence);
        }
        if history.previous.is_empty() || !summary.sufficient_history {
            checks.fail(FieldId::ResidenceHistory, FieldRule::InsufficientHistory);
        }
    }

    checks.finish(Section::LivingHistory)
}

pub fn documentation_report(bundle: &DocumentationBundle) -> SectionReport {
    let mut checks = Checks::default();

    for slot in DocumentSlot::REQUIRED {
        if !bundle.is_populated(slot) {
            checks.fail(FieldId::Document(slot), FieldRule::Required);
        }
    }
    if !bundle.terms_accepted {
        checks.fail(FieldId::TermsAccepted, FieldRule::Required);
    }

    checks.finish(Section::Documentation)
}
