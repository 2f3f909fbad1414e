pub mod stateless_llm_interface;
pub mod azure_openai_llm;
pub mod openai_compatible_llm;

pub use stateless_llm_interface::*;
pub use azure_openai_llm::*;
pub use openai_compatible_llm::*;
