pub mod commit;

pub use commit::{CommitEvent, CommitState, CommitWorkflow, WorkflowError};
