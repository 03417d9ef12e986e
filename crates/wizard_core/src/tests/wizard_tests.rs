use super::*;

use shared::domain::{FieldSpec, FieldType, ResourceStatus, TemplateId};

use crate::{
    error::ApiFailure,
    memory::{InMemoryResourceApi, Operation},
};

fn churn_template() -> Template {
    let mut customer_id = FieldSpec::named("customer_id", FieldType::Number);
    customer_id.is_primary_key = true;
    Template {
        template_id: TemplateId(11),
        kind: ResourceKind::PredictionModel,
        name: "Churn Classifier".into(),
        description: "binary churn model".into(),
        source_type: SourceType::Database,
        fields: vec![
            customer_id,
            FieldSpec::named("tenure_months", FieldType::Number),
            FieldSpec::named("churned", FieldType::Boolean),
        ],
    }
}

struct Harness {
    api: Arc<InMemoryResourceApi>,
    coordinator: Arc<CommitCoordinator>,
    page: ResourcePage,
}

fn harness(kind: ResourceKind) -> Harness {
    let api = Arc::new(InMemoryResourceApi::with_templates(vec![churn_template()]));
    Harness {
        coordinator: CommitCoordinator::new(api.clone()),
        page: ResourcePage::new(kind, api.clone()),
        api,
    }
}

#[tokio::test]
async fn template_wizard_commits_and_closes() {
    let mut h = harness(ResourceKind::PredictionModel);
    let mut wizard = DraftWizard::open(ResourceKind::PredictionModel, h.coordinator.clone())
        .expect("open");

    wizard.choose_template(&churn_template()).expect("choose");
    assert!(wizard.advance().expect("advance"));
    let extra = wizard.add_field().expect("add");
    wizard
        .update_field(extra, &FieldPatch::name("plan_tier"))
        .expect("rename");
    assert!(wizard.advance().expect("advance"));
    assert_eq!(wizard.current_step(), WizardStep::Review);
    assert!(wizard.can_confirm());

    let resource = wizard.confirm(&mut h.page).await.expect("confirm");

    assert_eq!(resource.status, ResourceStatus::Ready);
    assert_eq!(resource.fields.len(), 4);
    assert_eq!(wizard.status(), WizardStatus::Closed);
    assert!(wizard.draft().is_none());
    assert_eq!(h.page.resources().as_slice(), &[resource]);
    assert_eq!(
        h.api.operations().await,
        vec![
            Operation::CreateFromTemplate,
            Operation::Update,
            Operation::MarkReady
        ]
    );
}

#[tokio::test]
async fn datablock_custom_wizard_walks_all_five_steps() {
    let mut h = harness(ResourceKind::Datablock);
    let mut wizard =
        DraftWizard::open(ResourceKind::Datablock, h.coordinator.clone()).expect("open");
    assert_eq!(wizard.steps().len(), 5);

    // Source
    wizard.choose_custom().expect("custom");
    assert!(!wizard.advance().expect("blocked"), "needs a source type");
    wizard.set_source_type(SourceType::Stream).expect("source");
    assert!(wizard.advance().expect("advance"));

    // Configuration
    assert!(!wizard.advance().expect("blocked"), "needs a display name");
    wizard.set_display_name("Web Click Events").expect("name");
    wizard.set_description("raw clickstream").expect("description");
    assert!(wizard.advance().expect("advance"));

    // Schema
    assert!(!wizard.advance().expect("blocked"), "needs fields");
    let event_id = wizard.add_field().expect("add");
    assert!(!wizard.advance().expect("blocked"), "needs field names");
    wizard
        .update_field(event_id, &FieldPatch::name("event_id"))
        .expect("rename");
    let url = wizard.add_field().expect("add");
    wizard
        .update_field(url, &FieldPatch::name("url"))
        .expect("rename");
    assert!(wizard.advance().expect("advance"));

    // Target
    assert!(!wizard.advance().expect("blocked"), "needs a primary key");
    wizard
        .update_field(event_id, &FieldPatch::primary_key(true))
        .expect("pk");
    wizard.remove_field(event_id).expect("no-op on primary key");
    assert_eq!(wizard.draft().map(|d| d.fields().len()), Some(2));
    assert!(wizard.advance().expect("advance"));
    assert_eq!(wizard.current_step(), WizardStep::Review);

    let resource = wizard.confirm(&mut h.page).await.expect("confirm");

    assert_eq!(resource.name, "web_click_events");
    assert_eq!(resource.source_type, Some(SourceType::Stream));
    assert_eq!(resource.status, ResourceStatus::Ready);
    assert_eq!(
        h.api.operations().await,
        vec![Operation::Create, Operation::MarkReady]
    );
}

#[tokio::test]
async fn choose_step_blocks_without_selection() {
    let h = harness(ResourceKind::TrainingJob);
    let mut events = h.coordinator.subscribe_events();
    let mut wizard =
        DraftWizard::open(ResourceKind::TrainingJob, h.coordinator.clone()).expect("open");

    assert!(!wizard.can_advance());
    assert!(!wizard.advance().expect("advance"));
    assert!(!wizard.retreat().expect("retreat"), "already on the first step");
    assert_eq!(wizard.current_step(), WizardStep::Choose);
    assert!(events.try_recv().is_err(), "no step change was emitted");

    wizard.choose_custom().expect("custom");
    assert!(wizard.advance().expect("advance"));
    assert_eq!(
        events.try_recv().expect("event"),
        WizardEvent::StepChanged {
            kind: ResourceKind::TrainingJob,
            step: WizardStep::Configure,
        }
    );
}

#[tokio::test]
async fn confirm_before_the_last_step_is_not_ready() {
    let mut h = harness(ResourceKind::PredictionModel);
    let mut wizard =
        DraftWizard::open(ResourceKind::PredictionModel, h.coordinator.clone()).expect("open");
    wizard.choose_template(&churn_template()).expect("choose");

    assert_eq!(
        wizard.confirm(&mut h.page).await,
        Err(WizardError::NotReady(WizardStep::Choose))
    );
    assert!(h.api.calls().await.is_empty());
    assert_eq!(wizard.status(), WizardStatus::Editing);
}

#[tokio::test]
async fn failed_confirm_keeps_draft_for_retry() {
    let mut h = harness(ResourceKind::TrainingJob);
    h.api
        .fail_next(
            Operation::Create,
            ApiFailure::client(409, "a training job named 'nightly' already exists"),
        )
        .await;
    let mut wizard =
        DraftWizard::open(ResourceKind::TrainingJob, h.coordinator.clone()).expect("open");
    wizard.choose_custom().expect("custom");
    wizard.advance().expect("advance");
    wizard.set_display_name("Nightly").expect("name");
    wizard.advance().expect("advance");

    let err = wizard.confirm(&mut h.page).await.expect_err("must fail");

    assert!(matches!(err, WizardError::Api { .. }));
    assert_eq!(wizard.status(), WizardStatus::Editing);
    assert_eq!(
        wizard.error(),
        Some("a training job named 'nightly' already exists")
    );
    assert_eq!(wizard.draft().map(Draft::display_name), Some("Nightly"));
    assert_eq!(wizard.current_step(), WizardStep::Review);
    assert!(h.page.resources().is_empty());

    let resource = wizard.confirm(&mut h.page).await.expect("retry");
    assert_eq!(resource.name, "nightly");
    assert!(wizard.error().is_none());
    assert_eq!(h.page.resources().len(), 1);
}

#[tokio::test]
async fn cancelled_wizard_rejects_further_edits() {
    let mut h = harness(ResourceKind::PredictionModel);
    let mut wizard =
        DraftWizard::open(ResourceKind::PredictionModel, h.coordinator.clone()).expect("open");
    wizard.choose_custom().expect("custom");
    wizard.set_display_name("Scratch").expect("name");

    wizard.cancel();

    assert!(!wizard.is_open());
    assert!(wizard.draft().is_none());
    assert_eq!(wizard.set_description("late"), Err(WizardError::Closed));
    assert_eq!(wizard.advance(), Err(WizardError::Closed));
    assert_eq!(
        wizard.confirm(&mut h.page).await,
        Err(WizardError::Closed)
    );
    assert!(h.api.calls().await.is_empty());
}

#[test]
fn template_of_another_kind_is_rejected() {
    let api = Arc::new(InMemoryResourceApi::new());
    let mut wizard =
        DraftWizard::open(ResourceKind::TrainingJob, CommitCoordinator::new(api)).expect("open");

    assert_eq!(
        wizard.choose_template(&churn_template()),
        Err(WizardError::UnknownTemplate(TemplateId(11)))
    );
    assert_eq!(wizard.draft().and_then(Draft::origin), None);
}

#[tokio::test]
async fn edits_after_review_must_still_pass_earlier_steps() {
    let mut h = harness(ResourceKind::Datablock);
    let mut wizard =
        DraftWizard::open(ResourceKind::Datablock, h.coordinator.clone()).expect("open");
    wizard.choose_custom().expect("custom");
    wizard.set_source_type(SourceType::File).expect("source");
    wizard.advance().expect("advance");
    wizard.set_display_name("Invoices").expect("name");
    wizard.advance().expect("advance");
    let invoice_id = wizard.add_field().expect("add");
    wizard
        .update_field(
            invoice_id,
            &FieldPatch {
                name: Some("invoice_id".into()),
                is_primary_key: Some(true),
                ..FieldPatch::default()
            },
        )
        .expect("field");
    wizard.advance().expect("advance");
    wizard.advance().expect("advance");
    assert_eq!(wizard.current_step(), WizardStep::Review);

    wizard
        .update_field(invoice_id, &FieldPatch::primary_key(false))
        .expect("demote");
    assert!(!wizard.can_confirm());
    assert_eq!(
        wizard.confirm(&mut h.page).await,
        Err(WizardError::NotReady(WizardStep::Target))
    );

    wizard
        .update_field(invoice_id, &FieldPatch::name("   "))
        .expect("blank");
    assert_eq!(
        wizard.confirm(&mut h.page).await,
        Err(WizardError::NotReady(WizardStep::Schema))
    );
    assert!(h.api.calls().await.is_empty());
    assert_eq!(wizard.status(), WizardStatus::Editing);

    wizard
        .update_field(
            invoice_id,
            &FieldPatch {
                name: Some("invoice_id".into()),
                is_primary_key: Some(true),
                ..FieldPatch::default()
            },
        )
        .expect("restore");
    let resource = wizard.confirm(&mut h.page).await.expect("confirm");
    assert_eq!(resource.fields[0].name, "invoice_id");
    assert!(resource.fields[0].is_primary_key);
}

#[tokio::test]
async fn replaced_fields_override_template_defaults() {
    let mut h = harness(ResourceKind::PredictionModel);
    let mut wizard = DraftWizard::open(ResourceKind::PredictionModel, h.coordinator.clone())
        .expect("open");
    wizard.choose_template(&churn_template()).expect("choose");

    let mut account_id = FieldSpec::named("account_id", FieldType::String);
    account_id.is_primary_key = true;
    wizard
        .replace_fields(&[account_id, FieldSpec::named("seats", FieldType::Number)])
        .expect("replace");
    while !wizard.on_last_step() {
        assert!(wizard.advance().expect("advance"));
    }

    let resource = wizard.confirm(&mut h.page).await.expect("confirm");
    let names: Vec<_> = resource.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["account_id", "seats"]);
    assert!(resource.fields[0].is_primary_key);
}
