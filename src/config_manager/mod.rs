pub mod llm_profile;
pub mod utils;

pub use llm_profile::*;
