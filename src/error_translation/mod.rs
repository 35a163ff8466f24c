pub mod translator;

pub use translator::{UserFriendlyError, translate_git_failure};
