pub mod api;
pub mod commit;
pub mod draft;
pub mod edit;
pub mod error;
pub mod events;
pub mod field_editor;
pub mod flows;
pub mod memory;
pub mod page;
pub mod resource_list;
pub mod sequencer;
pub mod templates;
pub mod transport;
pub mod wizard;

pub use api::{MissingResourceApi, ResourceApi};
pub use commit::CommitCoordinator;
pub use draft::{Draft, DraftOrigin};
pub use edit::DeleteOutcome;
pub use error::{ApiFailure, CommitStage, WizardError, WizardResult};
pub use events::WizardEvent;
pub use field_editor::FieldPatch;
pub use memory::InMemoryResourceApi;
pub use page::ResourcePage;
pub use resource_list::ResourceList;
pub use sequencer::{StepSequencer, WizardStep};
pub use templates::TemplateCache;
pub use transport::HttpResourceApi;
pub use wizard::{DraftWizard, WizardStatus};
