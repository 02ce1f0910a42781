use chrono::{Duration, Utc};
use common::CodeCategory;
use futures::future::join_all;
use reqwest::multipart::Form;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{
    ESSAY_SHEET, JPEG, PDF, PHOTO_SHEET, PNG, TestApp, file_part, open_window, routes,
};
use server::entity::{code, submission};
use server::redemption::SubmissionWindow;

fn photo_form(code: &str) -> Form {
    Form::new()
        .text("code", code.to_string())
        .part("image1", file_part(JPEG, "sunrise.jpg", "image/jpeg"))
        .text("caption1", "Sunrise over Bromo")
}

fn essay_form(code: &str) -> Form {
    Form::new()
        .text("code", code.to_string())
        .part("document", file_part(PDF, "essay.pdf", "application/pdf"))
}

async fn is_used(app: &TestApp, value: &str) -> bool {
    code::Entity::find_by_id(value.to_string())
        .one(&app.db)
        .await
        .unwrap()
        .expect("code row")
        .used
}

async fn submission_count(app: &TestApp, value: &str) -> u64 {
    submission::Entity::find()
        .filter(submission::Column::Code.eq(value))
        .count(&app.db)
        .await
        .unwrap()
}

mod window {
    use super::*;

    #[tokio::test]
    async fn reports_open_window() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::WINDOW).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "Open");
    }

    #[tokio::test]
    async fn valid_code_is_rejected_before_open() {
        let now = Utc::now();
        let app = TestApp::spawn_with_window(SubmissionWindow {
            open: now + Duration::hours(1),
            close: now + Duration::days(1),
        })
        .await;
        app.issue(&[("PHOTO-001", CodeCategory::PhotoSet)]).await;

        let verify = app
            .post_json(routes::VERIFY, &json!({"code": "PHOTO-001"}))
            .await;
        assert_eq!(verify.status, 403);
        assert_eq!(verify.code(), "WINDOW_NOT_OPEN");

        let submit = app
            .post_multipart(routes::SUBMISSIONS, photo_form("PHOTO-001"))
            .await;
        assert_eq!(submit.status, 403);
        assert_eq!(submit.code(), "WINDOW_NOT_OPEN");
        assert!(!is_used(&app, "PHOTO-001").await);
    }

    #[tokio::test]
    async fn essay_redeemed_one_second_after_close_is_rejected() {
        let now = Utc::now();
        let app = TestApp::spawn_with_window(SubmissionWindow {
            open: now - Duration::days(1),
            close: now - Duration::seconds(1),
        })
        .await;
        app.issue(&[("ESSAY-042", CodeCategory::Essay)]).await;

        let res = app
            .post_multipart(routes::SUBMISSIONS, essay_form("ESSAY-042"))
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "WINDOW_CLOSED");
        assert_eq!(submission_count(&app, "ESSAY-042").await, 0);
        assert!(!is_used(&app, "ESSAY-042").await);
        assert!(app.sheets.rows().is_empty());
    }
}

mod verification {
    use super::*;

    #[tokio::test]
    async fn verify_returns_category_for_normalized_code() {
        let app = TestApp::spawn().await;
        app.issue(&[("ESSAY-042", CodeCategory::Essay)]).await;

        let res = app
            .post_json(routes::VERIFY, &json!({"code": "  essay-042 "}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["code"], "ESSAY-042");
        assert_eq!(res.body["category"], "Essay");
        assert!(!is_used(&app, "ESSAY-042").await);
    }

    #[tokio::test]
    async fn unknown_code_is_404() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::VERIFY, &json!({"code": "NOPE-000"}))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "CODE_NOT_FOUND");
    }
}

mod acceptance {
    use super::*;

    #[tokio::test]
    async fn photo_code_redeemed_once_then_rejected() {
        let app = TestApp::spawn().await;
        app.issue(&[("PHOTO-001", CodeCategory::PhotoSet)]).await;

        let res = app
            .post_multipart(routes::SUBMISSIONS, photo_form("PHOTO-001"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["code"], "PHOTO-001");
        assert_eq!(res.body["type"], "PhotoSet");
        assert_eq!(res.body["desc1"], "Sunrise over Bromo");
        assert_eq!(res.body["status"], "submitted");
        assert!(res.body["file2_url"].is_null());
        assert!(is_used(&app, "PHOTO-001").await);

        let rows = app.sheets.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, PHOTO_SHEET);
        assert_eq!(rows[0].1.len(), 6);
        assert_eq!(rows[0].1[1], "PHOTO-001");
        assert_eq!(rows[0].1[3], "Sunrise over Bromo");
        assert_eq!(rows[0].1[4], "");

        let again = app
            .post_multipart(routes::SUBMISSIONS, photo_form("PHOTO-001"))
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.code(), "CODE_ALREADY_USED");
        assert_eq!(submission_count(&app, "PHOTO-001").await, 1);

        let verify = app
            .post_json(routes::VERIFY, &json!({"code": "PHOTO-001"}))
            .await;
        assert_eq!(verify.code(), "CODE_ALREADY_USED");
    }

    #[tokio::test]
    async fn two_captioned_images_are_stored() {
        let app = TestApp::spawn().await;
        app.issue(&[("PHOTO-002", CodeCategory::PhotoSet)]).await;

        let form = photo_form("PHOTO-002")
            .part("image2", file_part(PNG, "dusk.png", "image/png"))
            .text("caption2", "Dusk");
        let res = app.post_multipart(routes::SUBMISSIONS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["desc2"], "Dusk");
        let file2 = res.body["file2_url"].as_str().unwrap();
        let fetched = app.client.get(file2).send().await.unwrap();
        assert_eq!(fetched.status(), 200);
        assert_eq!(fetched.bytes().await.unwrap().as_ref(), PNG);
    }

    #[tokio::test]
    async fn essay_is_ingested_into_essay_sheet() {
        let app = TestApp::spawn().await;
        app.issue(&[("ESSAY-042", CodeCategory::Essay)]).await;

        let res = app
            .post_multipart(routes::SUBMISSIONS, essay_form("essay-042"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["pdf_url"].as_str().unwrap().ends_with("essay.pdf"));
        let rows = app.sheets.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, ESSAY_SHEET);
        assert_eq!(rows[0].1.len(), 3);
        assert_eq!(rows[0].1[1], "ESSAY-042");
    }

    #[tokio::test]
    async fn missing_caption_keeps_code_unused() {
        let app = TestApp::spawn().await;
        app.issue(&[("PHOTO-003", CodeCategory::PhotoSet)]).await;

        let form = Form::new()
            .text("code", "PHOTO-003")
            .part("image1", file_part(JPEG, "a.jpg", "image/jpeg"));
        let res = app.post_multipart(routes::SUBMISSIONS, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Caption 1 is required");
        assert!(!is_used(&app, "PHOTO-003").await);
    }

    #[tokio::test]
    async fn files_must_match_the_code_category() {
        let app = TestApp::spawn().await;
        app.issue(&[("ESSAY-043", CodeCategory::Essay)]).await;

        let res = app
            .post_multipart(routes::SUBMISSIONS, photo_form("ESSAY-043"))
            .await;

        assert_eq!(res.status, 400);
        assert!(!is_used(&app, "ESSAY-043").await);
    }

    #[tokio::test]
    async fn ingestion_failure_does_not_undo_acceptance() {
        let app = TestApp::spawn().await;
        app.issue(&[("PHOTO-004", CodeCategory::PhotoSet)]).await;
        app.sheets.set_failing(true);

        let res = app
            .post_multipart(routes::SUBMISSIONS, photo_form("PHOTO-004"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(is_used(&app, "PHOTO-004").await);
        assert_eq!(submission_count(&app, "PHOTO-004").await, 1);
    }

    #[tokio::test]
    async fn concurrent_redemptions_create_one_submission() {
        const ATTEMPTS: usize = 8;
        let app = TestApp::spawn_with_window(open_window()).await;
        app.issue(&[("PHOTO-RACE", CodeCategory::PhotoSet)]).await;

        let attempts = (0..ATTEMPTS).map(|_| {
            app.post_multipart(routes::SUBMISSIONS, photo_form("PHOTO-RACE"))
        });
        let results = join_all(attempts).await;

        let accepted = results.iter().filter(|r| r.status == 201).count();
        let rejected = results
            .iter()
            .filter(|r| r.status == 409 && r.code() == "CODE_ALREADY_USED")
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(rejected, ATTEMPTS - 1);
        assert_eq!(submission_count(&app, "PHOTO-RACE").await, 1);
        assert!(is_used(&app, "PHOTO-RACE").await);
        assert_eq!(app.sheets.rows().len(), 1);
    }
}
