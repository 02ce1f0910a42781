use chrono::{Duration, Utc};
use common::RegistrationStatus;
use reqwest::multipart::{Form, Part};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use crate::common::{JPEG, PNG, Sent, TestApp, WEBHOOK_SECRET, file_part, routes};
use server::entity::registration;

fn full_draft(email: &str) -> Value {
    json!({
        "name": "Ayu Lestari",
        "whatsapp": "+62 812-3456-7890",
        "email": email,
        "role": "Student",
        "college": "Institut Teknologi Bandung",
        "year": "3",
        "category": "Photography",
        "discount_flag": false,
    })
}

fn submit_form(draft: &Value, proof1: Option<Part>, proof2: Option<Part>) -> Form {
    let mut form = Form::new().text("draft", draft.to_string());
    if let Some(p) = proof1 {
        form = form.part("proof1", p);
    }
    if let Some(p) = proof2 {
        form = form.part("proof2", p);
    }
    form
}

async fn stored_status(app: &TestApp, email: &str) -> RegistrationStatus {
    registration::Entity::find_by_id(email.to_string())
        .one(&app.db)
        .await
        .unwrap()
        .expect("registration row")
        .status
}

mod draft_autosave {
    use super::*;

    #[tokio::test]
    async fn draft_without_email_is_not_persisted() {
        let app = TestApp::spawn().await;

        let res = app
            .put_json(routes::DRAFT, &json!({"name": "Ayu", "role": "Student"}))
            .await;

        assert_eq!(res.status, 202);
        assert_eq!(res.body["persisted"], false);
        assert_eq!(
            registration::Entity::find().count(&app.db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn repeated_autosaves_keep_one_partial_row() {
        let app = TestApp::spawn().await;

        app.save_draft(&json!({"email": "A@X.com"})).await;
        app.save_draft(&json!({"email": "a@x.com", "name": "Ayu"}))
            .await;
        let res = app
            .save_draft(&json!({"email": " a@x.com ", "name": "Ayu", "role": "Student"}))
            .await;

        assert_eq!(res.body["persisted"], true);
        assert_eq!(res.body["registration"]["email"], "a@x.com");
        assert_eq!(res.body["registration"]["role"], "Student");
        assert_eq!(res.body["registration"]["status"], "Partial");
        assert_eq!(
            registration::Entity::find().count(&app.db).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .put_json(routes::DRAFT, &json!({"email": 42}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn get_unknown_registration_is_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::registration("nobody@x.com")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod completion {
    use super::*;

    #[tokio::test]
    async fn autosaves_then_single_proof_submit() {
        let app = TestApp::spawn().await;

        app.save_draft(&json!({"email": "a@x.com"})).await;
        app.save_draft(&json!({"email": "a@x.com", "name": "Ayu Lestari", "role": "Student"}))
            .await;
        app.save_draft(&full_draft("a@x.com")).await;

        let res = app
            .post_multipart(
                routes::SUBMIT,
                submit_form(
                    &full_draft("a@x.com"),
                    Some(file_part(JPEG, "receipt.jpg", "image/jpeg")),
                    None,
                ),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Completed");
        assert_eq!(res.body["amount"], 150_000);
        assert!(res.body["proof2_url"].is_null());
        let proof_url = res.body["proof1_url"].as_str().unwrap().to_string();

        assert_eq!(
            registration::Entity::find().count(&app.db).await.unwrap(),
            1
        );
        assert_eq!(
            stored_status(&app, "a@x.com").await,
            RegistrationStatus::Completed
        );

        let sent = app.notifier.sent();
        assert_eq!(sent.len(), 1, "{sent:?}");
        match &sent[0] {
            Sent::Photo { url, caption } => {
                assert_eq!(url, &proof_url);
                assert!(caption.contains("Amount: 150.000"));
            }
            other => panic!("expected single photo, got {other:?}"),
        }

        // The returned proof URL is retrievable.
        let file = app.client.get(&proof_url).send().await.unwrap();
        assert_eq!(file.status(), 200);
        assert_eq!(file.bytes().await.unwrap().as_ref(), JPEG);
    }

    #[tokio::test]
    async fn discount_with_two_proofs_takes_group_path() {
        let app = TestApp::spawn().await;
        let mut draft = full_draft("b@x.com");
        draft["discount_flag"] = json!(true);
        app.save_draft(&draft).await;

        let res = app
            .post_multipart(
                routes::SUBMIT,
                submit_form(
                    &draft,
                    Some(file_part(JPEG, "receipt.jpg", "image/jpeg")),
                    Some(file_part(PNG, "student-card.png", "image/png")),
                ),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["amount"], 100_000);

        let sent = app.notifier.sent();
        assert_eq!(sent.len(), 2, "{sent:?}");
        assert!(matches!(&sent[0], Sent::Text(t) if t.contains("Discount: yes")));
        assert!(matches!(&sent[1], Sent::Group(urls) if urls.len() == 2));
    }

    #[tokio::test]
    async fn submit_without_prior_autosave_completes() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::SUBMIT,
                submit_form(
                    &full_draft("c@x.com"),
                    Some(file_part(JPEG, "receipt.jpg", "image/jpeg")),
                    None,
                ),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Completed");
    }

    #[tokio::test]
    async fn invalid_submit_leaves_lead_partial() {
        let app = TestApp::spawn().await;
        app.save_draft(&full_draft("d@x.com")).await;

        let mut draft = full_draft("d@x.com");
        draft["whatsapp"] = json!("12");
        let res = app
            .post_multipart(
                routes::SUBMIT,
                submit_form(&draft, None, None),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        let message = res.body["message"].as_str().unwrap();
        assert!(message.contains("WhatsApp"));
        assert!(message.contains("Payment proof is required"));
        assert_eq!(
            stored_status(&app, "d@x.com").await,
            RegistrationStatus::Partial
        );
        assert!(app.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn second_proof_without_discount_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::SUBMIT,
                submit_form(
                    &full_draft("e@x.com"),
                    Some(file_part(JPEG, "a.jpg", "image/jpeg")),
                    Some(file_part(JPEG, "b.jpg", "image/jpeg")),
                ),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn non_image_proof_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::SUBMIT,
                submit_form(
                    &full_draft("f@x.com"),
                    Some(file_part(b"%PDF-1.4 receipt", "receipt.jpg", "image/jpeg")),
                    None,
                ),
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"]
            .as_str()
            .unwrap()
            .contains("Payment proof must be one of"));
    }

    #[tokio::test]
    async fn completed_lead_is_never_downgraded() {
        let app = TestApp::spawn().await;
        let draft = full_draft("g@x.com");
        let form = submit_form(&draft, Some(file_part(JPEG, "r.jpg", "image/jpeg")), None);
        assert_eq!(app.post_multipart(routes::SUBMIT, form).await.status, 200);

        let res = app.put_json(routes::DRAFT, &draft).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["ignored"], true);
        assert_eq!(res.body["registration"]["status"], "Completed");

        let form = submit_form(&draft, Some(file_part(JPEG, "r.jpg", "image/jpeg")), None);
        let again = app.post_multipart(routes::SUBMIT, form).await;
        assert_eq!(again.status, 409);
        assert_eq!(again.code(), "CONFLICT");

        assert_eq!(
            stored_status(&app, "g@x.com").await,
            RegistrationStatus::Completed
        );
        assert_eq!(app.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_fail_completion() {
        let app = TestApp::spawn().await;
        app.notifier.set_failing(true);

        let form = submit_form(
            &full_draft("h@x.com"),
            Some(file_part(JPEG, "r.jpg", "image/jpeg")),
            None,
        );
        let res = app.post_multipart(routes::SUBMIT, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            stored_status(&app, "h@x.com").await,
            RegistrationStatus::Completed
        );
    }
}

mod abandonment {
    use super::*;

    #[tokio::test]
    async fn abandon_requires_secret() {
        let app = TestApp::spawn().await;
        app.save_draft(&full_draft("a@x.com")).await;

        let missing = app
            .post_json(&routes::abandon("a@x.com"), &Value::Null)
            .await;
        assert_eq!(missing.status, 401);
        assert_eq!(missing.code(), "TOKEN_MISSING");

        let wrong = app
            .post_with_secret(&routes::abandon("a@x.com"), &Value::Null, "nope")
            .await;
        assert_eq!(wrong.status, 401);
        assert_eq!(wrong.code(), "TOKEN_INVALID");

        assert_eq!(
            stored_status(&app, "a@x.com").await,
            RegistrationStatus::Partial
        );
    }

    #[tokio::test]
    async fn partial_lead_is_abandoned_once() {
        let app = TestApp::spawn().await;
        app.save_draft(&full_draft("a@x.com")).await;

        let res = app.post_operator(&routes::abandon("A@x.com")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "Abandoned");

        let again = app.post_operator(&routes::abandon("a@x.com")).await;
        assert_eq!(again.status, 409);

        let sent = app.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Sent::Text(t) if t.starts_with("Registration abandoned")));
    }

    #[tokio::test]
    async fn completed_lead_cannot_be_abandoned() {
        let app = TestApp::spawn().await;
        let form = submit_form(
            &full_draft("a@x.com"),
            Some(file_part(JPEG, "r.jpg", "image/jpeg")),
            None,
        );
        assert_eq!(app.post_multipart(routes::SUBMIT, form).await.status, 200);

        let res = app.post_operator(&routes::abandon("a@x.com")).await;

        assert_eq!(res.status, 409);
        assert_eq!(
            stored_status(&app, "a@x.com").await,
            RegistrationStatus::Completed
        );
    }

    #[tokio::test]
    async fn abandoned_lead_ignores_autosave() {
        let app = TestApp::spawn().await;
        app.save_draft(&full_draft("a@x.com")).await;
        assert_eq!(
            app.post_operator(&routes::abandon("a@x.com")).await.status,
            200
        );

        let res = app.put_json(routes::DRAFT, &full_draft("a@x.com")).await;

        assert_eq!(res.body["ignored"], true);
        assert_eq!(
            stored_status(&app, "a@x.com").await,
            RegistrationStatus::Abandoned
        );
    }

    #[tokio::test]
    async fn sweep_only_abandons_idle_partial_leads() {
        let app = TestApp::spawn().await;
        app.save_draft(&full_draft("idle@x.com")).await;
        app.save_draft(&full_draft("busy@x.com")).await;
        let form = submit_form(
            &full_draft("done@x.com"),
            Some(file_part(JPEG, "r.jpg", "image/jpeg")),
            None,
        );
        assert_eq!(app.post_multipart(routes::SUBMIT, form).await.status, 200);

        let long_ago = Utc::now() - Duration::hours(3);
        app.backdate("idle@x.com", long_ago).await;
        app.backdate("done@x.com", long_ago).await;

        let res = app.post_operator(&routes::sweep(60)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["abandoned"], 1);
        assert_eq!(res.body["emails"], json!(["idle@x.com"]));
        assert_eq!(
            stored_status(&app, "idle@x.com").await,
            RegistrationStatus::Abandoned
        );
        assert_eq!(
            stored_status(&app, "busy@x.com").await,
            RegistrationStatus::Partial
        );
        assert_eq!(
            stored_status(&app, "done@x.com").await,
            RegistrationStatus::Completed
        );
    }

    #[tokio::test]
    async fn sweep_rejects_non_positive_threshold() {
        let app = TestApp::spawn().await;

        let res = app
            .post_with_secret(&routes::sweep(0), &Value::Null, WEBHOOK_SECRET)
            .await;

        assert_eq!(res.status, 400);
    }
}
