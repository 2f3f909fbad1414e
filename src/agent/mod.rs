pub mod input_types;
pub mod output_types;
pub mod agent_factory;
pub mod stateless_llm_factory;

pub mod agents;
pub mod stateless_llm;

pub use input_types::*;
pub use output_types::*;
pub use agent_factory::*;
pub use stateless_llm_factory::*;
pub use agents::*;
pub use stateless_llm::*;
