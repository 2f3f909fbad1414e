pub mod classifier;
pub mod composer;
pub mod orchestrator;
pub mod prompt_builder;
pub mod table;

pub use classifier::*;
pub use composer::*;
pub use orchestrator::*;
pub use prompt_builder::*;
