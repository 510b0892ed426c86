use crate::infra::{InMemoryDraftStore, LoggingRelay};
use clap::Args;
use loan_intake::error::AppError;
use loan_intake::workflows::application::{
    ApplicationIntakeService, CreditScoreBracket, CurrentResidence, DocumentSlot, DraftError,
    DraftId, EmploymentStatus, FileDescriptor, FileHandle, FinancialInfo, IntakeServiceError,
    LivingHistory, LoanPurpose, LoanType, OfficerId, PersonalInfo, PreviousResidence,
    PropertyDetails, PropertyInfo, PropertyType, PurchaseDetails, RefinanceDetails,
    RefinanceReason, ResidenceType, StepOutcome,
};
use loan_intake::workflows::calculator::{LoanScenario, PaymentBreakdown};
use loan_intake::workflows::officers::OfficerDirectory;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct CalculateArgs {
    /// Home price in dollars
    #[arg(long)]
    pub(crate) loan_amount: Option<f64>,
    /// Annual interest rate in percent
    #[arg(long)]
    pub(crate) interest_rate: Option<f64>,
    /// Loan term in years
    #[arg(long)]
    pub(crate) term_years: Option<u32>,
    /// Down payment in dollars
    #[arg(long)]
    pub(crate) down_payment: Option<f64>,
    /// Annual property tax in dollars
    #[arg(long)]
    pub(crate) property_tax: Option<f64>,
    /// Annual home insurance in dollars
    #[arg(long)]
    pub(crate) home_insurance: Option<f64>,
    /// Monthly PMI in dollars
    #[arg(long)]
    pub(crate) pmi: Option<f64>,
    /// Print the yearly amortization schedule as well
    #[arg(long)]
    pub(crate) schedule: bool,
}

impl CalculateArgs {
    fn scenario(&self) -> LoanScenario {
        let defaults = LoanScenario::default();
        LoanScenario {
            loan_amount: self.loan_amount.unwrap_or(defaults.loan_amount),
            interest_rate: self.interest_rate.unwrap_or(defaults.interest_rate),
            loan_term_years: self.term_years.unwrap_or(defaults.loan_term_years),
            down_payment: self.down_payment.unwrap_or(defaults.down_payment),
            property_tax: self.property_tax.unwrap_or(defaults.property_tax),
            home_insurance: self.home_insurance.unwrap_or(defaults.home_insurance),
            pmi: self.pmi.unwrap_or(defaults.pmi),
            loan_type: defaults.loan_type,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Loan purpose to walk through: purchase or refinance
    #[arg(long, default_value = "purchase")]
    pub(crate) purpose: LoanPurpose,
    /// Loan officer id to assign the sample application to
    #[arg(long, default_value_t = 1)]
    pub(crate) officer: u32,
}

pub(crate) fn run_calculator(args: CalculateArgs) -> Result<(), AppError> {
    let scenario = args.scenario();
    let breakdown = scenario.breakdown()?;

    println!("Mortgage estimate");
    println!(
        "- ${:.0} home | ${:.0} down | {:.2}% over {} years",
        scenario.loan_amount,
        scenario.down_payment,
        scenario.interest_rate,
        scenario.loan_term_years
    );
    render_breakdown(&breakdown);

    if args.schedule {
        println!("\nAmortization schedule");
        for year in scenario.amortization_schedule()? {
            println!(
                "  Year {:>2}: principal ${:>10.2} | interest ${:>10.2} | balance ${:>11.2}",
                year.year, year.principal_paid, year.interest_paid, year.remaining_balance
            );
        }
    }

    Ok(())
}

fn render_breakdown(breakdown: &PaymentBreakdown) {
    println!("- Loan principal: ${:.2}", breakdown.principal);
    println!(
        "- Principal & interest: ${:.2}",
        breakdown.principal_and_interest
    );
    println!("- Property tax: ${:.2}", breakdown.property_tax);
    println!("- Home insurance: ${:.2}", breakdown.home_insurance);
    if breakdown.pmi > 0.0 {
        println!("- PMI: ${:.2}", breakdown.pmi);
    }
    println!("- Monthly payment: ${:.2}", breakdown.monthly_payment);
    println!(
        "- Total of payments: ${:.2} (interest ${:.2})",
        breakdown.total_payment, breakdown.total_interest
    );
}

pub(crate) fn run_officers() -> Result<(), AppError> {
    let directory = OfficerDirectory::standard();
    println!("Loan officers");
    for officer in directory.all() {
        println!("- [{}] {} ({})", officer.id, officer.name, officer.title);
        println!("  {}", officer.bio);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { purpose, officer } = args;

    let relay = Arc::new(LoggingRelay::default());
    let service = ApplicationIntakeService::new(
        Arc::new(InMemoryDraftStore::default()),
        relay.clone(),
        Arc::new(OfficerDirectory::standard()),
    );

    println!("Loan application wizard demo ({})", purpose.label());
    let view = service.open(Some(OfficerId(officer)))?;
    let id = view.id;
    println!(
        "- Opened draft {} with {}",
        id,
        view.selected_officer
            .as_ref()
            .map(|officer| officer.name.as_str())
            .unwrap_or("no officer")
    );

    println!("\nStep {} of {}: Personal Info", view.step, view.total_steps);
    report_refusal(service.advance(&id))?;
    service.update_personal(&id, demo_personal())?;
    report_step(service.advance(&id)?);

    println!("\nProperty Info");
    let view = service.select_purpose(&id, purpose)?;
    println!(
        "- Shared fields read '{}' and '{}'",
        view.property_labels.purchase_price, view.property_labels.down_payment
    );
    service.update_property(&id, demo_property(purpose))?;
    report_step(service.advance(&id)?);

    println!("\nFinancial Info");
    service.update_financial(&id, demo_financial())?;
    report_step(service.advance(&id)?);

    println!("\nLiving History");
    let view = service.update_living_history(&id, demo_short_history())?;
    println!(
        "- Current residence covers {} months",
        view.residence_summary.current_months
    );
    report_refusal(service.advance(&id))?;
    let index = service.add_previous_residence(&id)?;
    let view = service.update_previous_residence(&id, index, demo_previous_residence())?;
    println!(
        "- Added previous residence, {} months on file",
        view.residence_summary.total_months
    );
    report_step(service.advance(&id)?);

    println!("\nDocumentation");
    match service.attach(
        &id,
        DocumentSlot::Income,
        vec![demo_file("offer-letter.docx", 40_000)],
    ) {
        Err(IntakeServiceError::Draft(DraftError::Upload(rejection))) => {
            println!("- Upload refused: {rejection}");
        }
        Err(err) => return Err(err.into()),
        Ok(_) => println!("- Unexpectedly accepted a .docx upload"),
    }
    for (slot, name, size) in [
        (DocumentSlot::Identity, "drivers-license.jpg", 850_000),
        (DocumentSlot::Income, "w2-2024.pdf", 320_000),
        (DocumentSlot::Bank, "statements-q1.pdf", 2_400_000),
    ] {
        let view = service.attach(&id, slot, vec![demo_file(name, size)])?;
        println!(
            "- {} uploaded ({}% of required documents)",
            slot.label(),
            view.upload_progress_percent
        );
    }
    service.accept_terms(&id, true)?;

    let receipt = service.submit(&id)?;
    println!(
        "\nSubmitted as {} at {}",
        receipt.reference,
        receipt.delivered_at.format("%Y-%m-%d %H:%M UTC")
    );
    match service.submit(&id) {
        Err(IntakeServiceError::Draft(DraftError::AlreadySubmitted)) => {
            println!("- Second submit refused: application already submitted");
        }
        Err(err) => return Err(err.into()),
        Ok(_) => println!("- Second submit unexpectedly accepted"),
    }
    println!("- Relay deliveries: {}", relay.delivered());

    Ok(())
}

fn report_step(outcome: StepOutcome) {
    println!(
        "- Advanced to step {}: {}",
        outcome.section.number(),
        outcome.section.label()
    );
}

fn report_refusal(result: Result<StepOutcome, IntakeServiceError>) -> Result<(), AppError> {
    match result {
        Err(IntakeServiceError::Draft(DraftError::SectionIncomplete(report))) => {
            println!("- Advance refused: {}", report.summary());
            Ok(())
        }
        Err(err) => Err(err.into()),
        Ok(outcome) => {
            report_step(outcome);
            Ok(())
        }
    }
}

fn demo_personal() -> PersonalInfo {
    PersonalInfo {
        first_name: "Jordan".to_string(),
        last_name: "Alvarez".to_string(),
        email: "jordan.alvarez@example.com".to_string(),
        phone: "(319) 555-0117".to_string(),
        address: "640 Oak Park Ave".to_string(),
        city: "Cedar Rapids".to_string(),
        state: "IA".to_string(),
        zip_code: "52402".to_string(),
    }
}

fn demo_property(purpose: LoanPurpose) -> PropertyInfo {
    match purpose {
        LoanPurpose::Purchase => PropertyInfo {
            property_type: Some(PropertyType::SingleFamily),
            purchase_price: Some(300_000),
            down_payment: Some(60_000),
            details: PropertyDetails::Purchase(PurchaseDetails {
                address: "1515 2nd Ave SE".to_string(),
                city: "Cedar Rapids".to_string(),
                state: "IA".to_string(),
                zip_code: "52403".to_string(),
            }),
        },
        LoanPurpose::Refinance => PropertyInfo {
            property_type: Some(PropertyType::SingleFamily),
            purchase_price: Some(30_000),
            down_payment: Some(24),
            details: PropertyDetails::Refinance(RefinanceDetails {
                current_value: Some(345_000),
                current_loan_balance: Some(182_000),
                refinance_reason: Some(RefinanceReason::LowerRate),
            }),
        },
    }
}

fn demo_financial() -> FinancialInfo {
    FinancialInfo {
        annual_income: Some(88_000),
        employment_status: Some(EmploymentStatus::Employed),
        employer: "Collins Aerospace".to_string(),
        credit_score: Some(CreditScoreBracket::Good),
        monthly_debt: Some(620),
        loan_type: Some(LoanType::Conventional),
    }
}

fn demo_short_history() -> LivingHistory {
    LivingHistory {
        current: CurrentResidence {
            residence_type: Some(ResidenceType::Rent),
            years: Some(0),
            months: Some(10),
            monthly_payment: Some(1_250),
        },
        previous: Vec::new(),
    }
}

fn demo_previous_residence() -> PreviousResidence {
    PreviousResidence {
        address: "22 Ellis Blvd NW".to_string(),
        city: "Cedar Rapids".to_string(),
        state: "IA".to_string(),
        zip_code: "52405".to_string(),
        residence_type: Some(ResidenceType::Rent),
        years: Some(1),
        months: Some(8),
        monthly_payment: Some(1_050),
    }
}

fn demo_file(name: &str, size_bytes: u64) -> FileDescriptor {
    FileDescriptor::new(name, size_bytes, FileHandle(format!("demo/{}", DraftId::generate())))
}
