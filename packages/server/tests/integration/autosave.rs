use std::time::Duration;

use common::RegistrationStatus;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::common::TestApp;
use server::entity::registration;
use server::config::RegistrationConfig;
use server::lifecycle::autosave::DraftAutosaver;
use server::lifecycle::{FieldEdit, LeadService};

const SETTLE: Duration = Duration::from_millis(400);

fn fast_autosave() -> RegistrationConfig {
    RegistrationConfig {
        draft_quiet_period_ms: 50,
        ..Default::default()
    }
}

async fn stored(app: &TestApp, email: &str) -> Option<registration::Model> {
    registration::Entity::find_by_id(email.to_string())
        .one(&app.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn typing_burst_persists_latest_snapshot() {
    let app = TestApp::spawn().await;
    let saver = DraftAutosaver::spawn_for_store(app.db.clone(), &fast_autosave());

    for partial in ["A", "Ay", "Ayu"] {
        saver.edit(FieldEdit::Name(partial.into()));
    }
    tokio::time::sleep(SETTLE).await;
    assert_eq!(
        registration::Entity::find().count(&app.db).await.unwrap(),
        0,
        "nothing is stored before an email is typed"
    );

    saver.edit(FieldEdit::Email("Ayu@X.com".into()));
    tokio::time::sleep(SETTLE).await;
    let row = stored(&app, "ayu@x.com").await.expect("lead row");
    assert_eq!(row.name.as_deref(), Some("Ayu"));
    assert_eq!(row.status, RegistrationStatus::Partial);

    saver.edit(FieldEdit::College("ITB".into()));
    tokio::time::sleep(SETTLE).await;
    saver.close().await;

    let row = stored(&app, "ayu@x.com").await.expect("lead row");
    assert_eq!(row.college.as_deref(), Some("ITB"));
    assert_eq!(registration::Entity::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn autosave_after_abandonment_leaves_row_alone() {
    let app = TestApp::spawn().await;
    let saver = DraftAutosaver::spawn_for_store(app.db.clone(), &fast_autosave());

    saver.edit(FieldEdit::Email("late@x.com".into()));
    saver.edit(FieldEdit::Name("Late".into()));
    tokio::time::sleep(SETTLE).await;
    LeadService::new(&app.db)
        .mark_abandoned("late@x.com", None)
        .await
        .unwrap();

    saver.edit(FieldEdit::Name("Changed".into()));
    tokio::time::sleep(SETTLE).await;
    saver.close().await;

    let row = stored(&app, "late@x.com").await.expect("lead row");
    assert_eq!(row.status, RegistrationStatus::Abandoned);
    assert_eq!(row.name.as_deref(), Some("Late"));
}
