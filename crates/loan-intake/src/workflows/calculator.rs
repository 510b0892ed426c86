//! Mortgage payment estimate shown on the calculator page.

use serde::{Deserialize, Serialize};

use super::application::domain::LoanType;

/// Inputs of the calculator widget. Rates are annual percentages, taxes and
/// insurance annual amounts, PMI a monthly amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanScenario {
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub down_payment: f64,
    pub property_tax: f64,
    pub home_insurance: f64,
    pub pmi: f64,
    pub loan_type: LoanType,
}

impl Default for LoanScenario {
    fn default() -> Self {
        Self {
            loan_amount: 300_000.0,
            interest_rate: 4.5,
            loan_term_years: 30,
            down_payment: 60_000.0,
            property_tax: 2_400.0,
            home_insurance: 1_200.0,
            pmi: 0.0,
            loan_type: LoanType::Conventional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculatorError {
    #[error("{field} must be {requirement}")]
    InvalidInput {
        field: &'static str,
        requirement: &'static str,
    },
}

fn invalid(field: &'static str, requirement: &'static str) -> CalculatorError {
    CalculatorError::InvalidInput { field, requirement }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), CalculatorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "a non-negative amount"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentBreakdown {
    pub principal: f64,
    pub principal_and_interest: f64,
    pub property_tax: f64,
    pub home_insurance: f64,
    pub pmi: f64,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub remaining_balance: f64,
}

impl LoanScenario {
    pub fn validate(&self) -> Result<(), CalculatorError> {
        if !(self.loan_amount.is_finite() && self.loan_amount >= 1_000.0) {
            return Err(invalid("loan_amount", "at least 1000"));
        }
        if !(self.interest_rate.is_finite() && (0.1..=25.0).contains(&self.interest_rate)) {
            return Err(invalid("interest_rate", "between 0.1 and 25 percent"));
        }
        if !(1..=40).contains(&self.loan_term_years) {
            return Err(invalid("loan_term_years", "between 1 and 40 years"));
        }
        non_negative("down_payment", self.down_payment)?;
        non_negative("property_tax", self.property_tax)?;
        non_negative("home_insurance", self.home_insurance)?;
        non_negative("pmi", self.pmi)?;
        if self.down_payment >= self.loan_amount {
            return Err(invalid("down_payment", "less than the loan amount"));
        }
        Ok(())
    }

    fn principal(&self) -> f64 {
        self.loan_amount - self.down_payment
    }

    fn monthly_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }

    fn payment_count(&self) -> u32 {
        self.loan_term_years * 12
    }

    /// Fixed monthly principal-and-interest payment (standard annuity formula).
    fn principal_and_interest(&self) -> f64 {
        let rate = self.monthly_rate();
        let growth = (1.0 + rate).powi(self.payment_count() as i32);
        self.principal() * (rate * growth) / (growth - 1.0)
    }

    pub fn breakdown(&self) -> Result<PaymentBreakdown, CalculatorError> {
        self.validate()?;

        let principal = self.principal();
        let principal_and_interest = self.principal_and_interest();
        let property_tax = self.property_tax / 12.0;
        let home_insurance = self.home_insurance / 12.0;
        let monthly_payment = principal_and_interest + property_tax + home_insurance + self.pmi;
        let payments = f64::from(self.payment_count());

        Ok(PaymentBreakdown {
            principal,
            principal_and_interest,
            property_tax,
            home_insurance,
            pmi: self.pmi,
            monthly_payment,
            total_payment: monthly_payment * payments,
            total_interest: principal_and_interest * payments - principal,
        })
    }

    /// Yearly totals of the amortization schedule, ending when the balance is paid.
    pub fn amortization_schedule(&self) -> Result<Vec<AmortizationYear>, CalculatorError> {
        self.validate()?;

        let rate = self.monthly_rate();
        let payment = self.principal_and_interest();
        let mut balance = self.principal();
        let mut remaining_payments = self.payment_count();
        let mut schedule = Vec::with_capacity(self.loan_term_years as usize);

        for year in 1..=self.loan_term_years {
            let months = remaining_payments.min(12);
            remaining_payments -= months;

            let mut principal_paid = 0.0;
            let mut interest_paid = 0.0;
            for _ in 0..months {
                if balance <= 0.0 {
                    break;
                }
                let interest = balance * rate;
                let principal = (payment - interest).min(balance);
                interest_paid += interest;
                principal_paid += principal;
                balance -= principal;
            }
            // Absorb floating-point residue from the last payment.
            if balance < 0.005 {
                balance = 0.0;
            }

            schedule.push(AmortizationYear {
                year,
                principal_paid,
                interest_paid,
                remaining_balance: balance,
            });

            if balance <= 0.0 {
                break;
            }
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 0.01
    }

    #[test]
    fn default_scenario_matches_published_rates() {
        let breakdown = LoanScenario::default().breakdown().expect("valid scenario");
        assert!(close(breakdown.principal, 240_000.0));
        assert!(close(breakdown.principal_and_interest, 1_216.045));
        assert!(close(breakdown.property_tax, 200.0));
        assert!(close(breakdown.home_insurance, 100.0));
        assert!(close(breakdown.monthly_payment, 1_516.045));
        assert!((breakdown.total_payment - 545_776.11).abs() < 1.0);
        assert!((breakdown.total_interest - 197_776.11).abs() < 1.0);
    }

    #[test]
    fn schedule_pays_off_principal() {
        let scenario = LoanScenario {
            loan_term_years: 15,
            ..LoanScenario::default()
        };
        let schedule = scenario.amortization_schedule().expect("valid scenario");
        assert_eq!(schedule.len(), 15);
        let paid: f64 = schedule.iter().map(|year| year.principal_paid).sum();
        assert!(close(paid, 240_000.0), "paid {paid}");
        assert_eq!(schedule.last().map(|year| year.remaining_balance), Some(0.0));
        assert!(schedule[0].interest_paid > schedule[14].interest_paid);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        let low_amount = LoanScenario {
            loan_amount: 500.0,
            down_payment: 0.0,
            ..LoanScenario::default()
        };
        assert_eq!(
            low_amount.breakdown(),
            Err(CalculatorError::InvalidInput {
                field: "loan_amount",
                requirement: "at least 1000",
            })
        );

        let zero_rate = LoanScenario {
            interest_rate: 0.0,
            ..LoanScenario::default()
        };
        assert!(zero_rate.breakdown().is_err());

        let long_term = LoanScenario {
            loan_term_years: 50,
            ..LoanScenario::default()
        };
        assert!(long_term.amortization_schedule().is_err());

        let negative_tax = LoanScenario {
            property_tax: -1.0,
            ..LoanScenario::default()
        };
        assert!(negative_tax.breakdown().is_err());
    }
}
