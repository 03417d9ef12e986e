//! Step lists and gates for each resource kind's creation wizard.

use shared::domain::ResourceKind;

use crate::{
    draft::{Draft, DraftOrigin},
    error::WizardResult,
    sequencer::{StepSequencer, WizardStep},
};

const DATABLOCK_STEPS: &[WizardStep] = &[
    WizardStep::Source,
    WizardStep::Configuration,
    WizardStep::Schema,
    WizardStep::Target,
    WizardStep::Review,
];

const CHOOSE_CONFIGURE_REVIEW: &[WizardStep] = &[
    WizardStep::Choose,
    WizardStep::Configure,
    WizardStep::Review,
];

pub fn steps_for(kind: ResourceKind) -> &'static [WizardStep] {
    match kind {
        ResourceKind::Datablock => DATABLOCK_STEPS,
        ResourceKind::PredictionModel | ResourceKind::TrainingJob => CHOOSE_CONFIGURE_REVIEW,
    }
}

pub fn sequencer_for(kind: ResourceKind) -> WizardResult<StepSequencer> {
    StepSequencer::new(steps_for(kind).to_vec(), can_advance)
}

/// Gate shared by every creation wizard.
pub fn can_advance(step: WizardStep, draft: &Draft) -> bool {
    match step {
        WizardStep::Choose => draft.origin().is_some(),
        WizardStep::Source => match draft.origin() {
            Some(DraftOrigin::Template(_)) => true,
            Some(DraftOrigin::Custom) => draft.source_type().is_some(),
            None => false,
        },
        WizardStep::Configure | WizardStep::Configuration => {
            !draft.is_custom() || !draft.display_name().trim().is_empty()
        }
        WizardStep::Schema => {
            !draft.fields().is_empty()
                && draft
                    .fields()
                    .iter()
                    .all(|field| !field.name.trim().is_empty())
        }
        WizardStep::Target => {
            draft
                .fields()
                .iter()
                .filter(|field| field.is_primary_key)
                .count()
                == 1
        }
        WizardStep::Review => true,
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{SourceType, Template, TemplateId};

    use super::*;
    use crate::field_editor::{add_field, update_field, FieldPatch};

    #[test]
    fn choose_needs_template_or_custom_mode() {
        let kind = ResourceKind::PredictionModel;
        assert!(!can_advance(WizardStep::Choose, &Draft::new(kind)));
        assert!(can_advance(WizardStep::Choose, &Draft::custom(kind)));
    }

    #[test]
    fn configure_needs_display_name_only_in_custom_mode() {
        let custom = Draft::custom(ResourceKind::TrainingJob);
        assert!(!can_advance(WizardStep::Configure, &custom));
        assert!(!can_advance(
            WizardStep::Configure,
            &custom.clone().with_display_name("   ")
        ));
        assert!(can_advance(
            WizardStep::Configure,
            &custom.with_display_name("Nightly retrain")
        ));

        let template = Template {
            template_id: TemplateId(1),
            kind: ResourceKind::TrainingJob,
            name: String::new(),
            description: String::new(),
            source_type: SourceType::File,
            fields: Vec::new(),
        };
        assert!(can_advance(
            WizardStep::Configure,
            &Draft::from_template(&template)
        ));
    }

    #[test]
    fn custom_source_needs_a_source_type() {
        let draft = Draft::custom(ResourceKind::Datablock);
        assert!(!can_advance(WizardStep::Source, &draft));
        assert!(can_advance(
            WizardStep::Source,
            &draft.with_source_type(SourceType::Database)
        ));
    }

    #[test]
    fn schema_and_target_gates_follow_the_field_list() {
        let draft = add_field(&Draft::custom(ResourceKind::Datablock));
        assert!(!can_advance(WizardStep::Schema, &draft), "blank name");

        let id = draft.fields()[0].id;
        let draft = update_field(&draft, id, &FieldPatch::name("customer_id"));
        assert!(can_advance(WizardStep::Schema, &draft));
        assert!(!can_advance(WizardStep::Target, &draft));

        let draft = update_field(&draft, id, &FieldPatch::primary_key(true));
        assert!(can_advance(WizardStep::Target, &draft));
    }

    #[test]
    fn datablock_wizard_uses_five_steps() {
        let sequencer = sequencer_for(ResourceKind::Datablock).expect("sequencer");
        assert_eq!(sequencer.steps().len(), 5);
        assert_eq!(sequencer.current(), WizardStep::Source);
        assert_eq!(
            steps_for(ResourceKind::PredictionModel),
            &[WizardStep::Choose, WizardStep::Configure, WizardStep::Review]
        );
    }
}
