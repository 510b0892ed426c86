//! Integration specifications for the loan application wizard.
//!
//! Scenarios drive the public service facade and HTTP router the way a browser
//! client would: open a draft, fill sections in order, upload documents, submit.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use loan_intake::workflows::application::{
        ApplicationDraft, ApplicationIntakeService, ConfirmationNotice, CreditScoreBracket,
        CurrentResidence, DraftId, DraftStore, EmploymentStatus, FileDescriptor, FileHandle,
        FinancialInfo, LivingHistory, LoanType, PersonalInfo, PreviousResidence,
        PropertyDetails, PropertyInfo, PropertyType, PurchaseDetails, RelayError, RelayReceipt,
        ResidenceType, StoreError, SubmissionPayload, SubmissionRelay,
    };
    use loan_intake::workflows::officers::OfficerDirectory;

    pub(super) fn personal() -> PersonalInfo {
        PersonalInfo {
            first_name: "Marcus".to_string(),
            last_name: "Oyelaran".to_string(),
            email: "marcus.oyelaran@example.net".to_string(),
            phone: "515-555-0199".to_string(),
            address: "1200 Keo Way".to_string(),
            city: "Des Moines".to_string(),
            state: "IA".to_string(),
            zip_code: "50309-2410".to_string(),
        }
    }

    pub(super) fn purchase() -> PropertyInfo {
        PropertyInfo {
            property_type: Some(PropertyType::Townhouse),
            purchase_price: Some(300_000),
            down_payment: Some(60_000),
            details: PropertyDetails::Purchase(PurchaseDetails {
                address: "3900 Ingersoll Ave".to_string(),
                city: "Des Moines".to_string(),
                state: "IA".to_string(),
                zip_code: "50312".to_string(),
            }),
        }
    }

    pub(super) fn financial() -> FinancialInfo {
        FinancialInfo {
            annual_income: Some(120_000),
            employment_status: Some(EmploymentStatus::SelfEmployed),
            employer: "Oyelaran Design LLC".to_string(),
            credit_score: Some(CreditScoreBracket::Excellent),
            monthly_debt: Some(0),
            loan_type: Some(LoanType::Fha),
        }
    }

    pub(super) fn short_history() -> LivingHistory {
        LivingHistory {
            current: CurrentResidence {
                residence_type: Some(ResidenceType::Rent),
                years: Some(0),
                months: Some(10),
                monthly_payment: Some(1_450),
            },
            previous: Vec::new(),
        }
    }

    pub(super) fn previous() -> PreviousResidence {
        PreviousResidence {
            address: "88 Court Ave".to_string(),
            city: "Des Moines".to_string(),
            state: "IA".to_string(),
            zip_code: "50309".to_string(),
            residence_type: Some(ResidenceType::LivingWithFamily),
            years: Some(1),
            months: Some(8),
            monthly_payment: Some(0),
        }
    }

    pub(super) fn file(name: &str, size_bytes: u64) -> FileDescriptor {
        FileDescriptor::new(name, size_bytes, FileHandle(format!("blob/{name}")))
    }

    #[derive(Default)]
    pub(super) struct Store {
        drafts: Mutex<HashMap<DraftId, ApplicationDraft>>,
    }

    impl DraftStore for Store {
        fn insert(&self, draft: ApplicationDraft) -> Result<ApplicationDraft, StoreError> {
            let mut guard = self.drafts.lock().expect("store mutex poisoned");
            if guard.contains_key(&draft.id()) {
                return Err(StoreError::Conflict);
            }
            guard.insert(draft.id(), draft.clone());
            Ok(draft)
        }

        fn update(&self, draft: ApplicationDraft) -> Result<(), StoreError> {
            self.drafts
                .lock()
                .expect("store mutex poisoned")
                .insert(draft.id(), draft);
            Ok(())
        }

        fn fetch(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
            Ok(self
                .drafts
                .lock()
                .expect("store mutex poisoned")
                .get(id)
                .cloned())
        }

        fn remove(&self, id: &DraftId) -> Result<Option<ApplicationDraft>, StoreError> {
            Ok(self.drafts.lock().expect("store mutex poisoned").remove(id))
        }
    }

    #[derive(Default)]
    pub(super) struct Relay {
        delivered: Mutex<Vec<SubmissionPayload>>,
    }

    impl Relay {
        pub(super) fn delivered(&self) -> Vec<SubmissionPayload> {
            self.delivered.lock().expect("relay mutex poisoned").clone()
        }
    }

    impl SubmissionRelay for Relay {
        fn deliver(&self, payload: &SubmissionPayload) -> Result<RelayReceipt, RelayError> {
            let mut delivered = self.delivered.lock().expect("relay mutex poisoned");
            delivered.push(payload.clone());
            Ok(RelayReceipt {
                reference: format!("relay-{}", delivered.len()),
                idempotency_key: payload.idempotency_key.clone(),
                delivered_at: Utc::now(),
            })
        }

        fn confirm(&self, _notice: ConfirmationNotice) -> Result<(), RelayError> {
            Ok(())
        }
    }

    pub(super) fn build_service() -> (
        Arc<ApplicationIntakeService<Store, Relay>>,
        Arc<Relay>,
    ) {
        let relay = Arc::new(Relay::default());
        let service = ApplicationIntakeService::new(
            Arc::new(Store::default()),
            relay.clone(),
            Arc::new(OfficerDirectory::standard()),
        );
        (Arc::new(service), relay)
    }
}

mod wizard {
    use super::common::*;
    use loan_intake::workflows::application::{
        DocumentSlot, DraftError, FieldId, FieldRule, IntakeServiceError, LoanPurpose,
        NavigationEvent, OfficerId, Section,
    };

    const MB: u64 = 1024 * 1024;

    #[test]
    fn short_residence_needs_a_previous_address_before_documents() {
        let (service, relay) = build_service();
        let id = service.open(Some(OfficerId(2))).expect("draft opened").id;

        service.update_personal(&id, personal()).expect("stored");
        service.advance(&id).expect("personal info complete");
        service
            .select_purpose(&id, LoanPurpose::Purchase)
            .expect("stored");
        service.update_property(&id, purchase()).expect("stored");
        let outcome = service.advance(&id).expect("property info complete");
        assert_eq!(
            outcome.event,
            Some(NavigationEvent::ScrollToFormTop {
                section: Section::Financial
            })
        );
        service.update_financial(&id, financial()).expect("stored");
        service.advance(&id).expect("financial info complete");

        service
            .update_living_history(&id, short_history())
            .expect("stored");
        let refused = service.advance(&id).expect_err("ten months is not enough");
        let IntakeServiceError::Draft(DraftError::SectionIncomplete(report)) = refused else {
            panic!("expected an incomplete living history, got {refused:?}");
        };
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].field, FieldId::ResidenceHistory);
        assert_eq!(report.failures[0].rule, FieldRule::InsufficientHistory);

        let index = service.add_previous_residence(&id).expect("added");
        let view = service
            .update_previous_residence(&id, index, previous())
            .expect("stored");
        assert_eq!(view.residence_summary.total_months, 30);
        assert!(view.residence_summary.sufficient_history);
        assert_eq!(
            service.advance(&id).expect("history complete").section,
            Section::Documentation
        );

        service
            .attach(&id, DocumentSlot::Identity, vec![file("id.png", MB)])
            .expect("accepted");
        service
            .attach(
                &id,
                DocumentSlot::Income,
                vec![file("schedule-c.pdf", 3 * MB), file("1099-nec.pdf", MB)],
            )
            .expect("accepted");
        service
            .attach(&id, DocumentSlot::Bank, vec![file("statements.pdf", 9 * MB)])
            .expect("accepted");
        service.accept_terms(&id, true).expect("stored");

        let receipt = service.submit(&id).expect("delivered");

        let delivered = relay.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].idempotency_key, receipt.idempotency_key);
        assert_eq!(delivered[0].living_history.previous.len(), 1);
        assert_eq!(
            delivered[0]
                .selected_officer
                .as_ref()
                .map(|officer| officer.name.as_str()),
            Some("Emilee Smith")
        );
    }
}

mod http {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use loan_intake::workflows::application::application_router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        router: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, payload)
    }

    #[tokio::test]
    async fn refinance_walkthrough_over_http() {
        let (service, relay) = build_service();
        let router = application_router(service);

        let (status, draft) = send(&router, "POST", "/api/v1/applications", Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = draft["id"].as_str().expect("draft id").to_string();
        let base = format!("/api/v1/applications/{id}");

        let (status, _) = send(
            &router,
            "PUT",
            &format!("{base}/personal"),
            Some(serde_json::to_value(personal()).expect("serialize")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, step) = send(&router, "POST", &format!("{base}/advance"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(step["section"], "property");

        let (status, view) = send(
            &router,
            "PUT",
            &format!("{base}/purpose"),
            Some(json!({ "purpose": "refinance" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["property"]["details"]["purpose"], "refinance");
        assert_eq!(view["property_labels"]["purchase_price"], "Cash-out amount");

        let (status, mismatch) = send(
            &router,
            "PUT",
            &format!("{base}/property"),
            Some(serde_json::to_value(purchase()).expect("serialize")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(mismatch["error"].as_str().is_some());

        let (status, _) = send(
            &router,
            "PUT",
            &format!("{base}/property"),
            Some(json!({
                "property_type": "single_family",
                "purchase_price": 40000,
                "down_payment": 18,
                "details": {
                    "purpose": "refinance",
                    "current_value": 350000,
                    "current_loan_balance": 190000,
                    "refinance_reason": "lower_rate"
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, step) = send(&router, "POST", &format!("{base}/advance"), None).await;
        assert_eq!(step["section"], "financial");

        send(
            &router,
            "PUT",
            &format!("{base}/financial"),
            Some(serde_json::to_value(financial()).expect("serialize")),
        )
        .await;
        send(&router, "POST", &format!("{base}/advance"), None).await;

        let mut history = short_history();
        history.previous.push(previous());
        send(
            &router,
            "PUT",
            &format!("{base}/living-history"),
            Some(serde_json::to_value(history).expect("serialize")),
        )
        .await;
        let (_, step) = send(&router, "POST", &format!("{base}/advance"), None).await;
        assert_eq!(step["section"], "documentation");

        for (slot, name) in [("identity", "id.pdf"), ("income", "w2.pdf"), ("bank", "bank.pdf")] {
            let (status, _) = send(
                &router,
                "POST",
                &format!("{base}/documents/{slot}"),
                Some(json!({
                    "files": [{ "name": name, "size_bytes": 2048, "handle": format!("blob/{name}") }]
                })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, view) = send(
            &router,
            "PUT",
            &format!("{base}/terms"),
            Some(json!({ "accepted": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["upload_progress_percent"], 100);

        let (status, receipt) = send(&router, "POST", &format!("{base}/submit"), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(receipt["idempotency_key"], id.as_str());

        let (status, body) = send(&router, "GET", &base, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"]
            .as_str()
            .expect("message")
            .contains("already been submitted"));
        assert_eq!(relay.delivered().len(), 1);
    }

    #[tokio::test]
    async fn touched_fields_surface_visible_failures() {
        let (service, _) = build_service();
        let router = application_router(service);
        let (_, draft) = send(&router, "POST", "/api/v1/applications", Some(json!({}))).await;
        let id = draft["id"].as_str().expect("draft id").to_string();

        let (status, view) = send(
            &router,
            "POST",
            &format!("/api/v1/applications/{id}/touched"),
            Some(json!({ "fields": ["personal.phone"] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let failures = view["visible_failures"].as_array().expect("failures");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["field"], "personal.phone");
        assert_eq!(failures[0]["rule"], "required");
    }
}
