pub mod agent_interface;
pub mod sql_agent;
pub mod sql_tool_agent;

pub use agent_interface::*;
pub use sql_agent::*;
pub use sql_tool_agent::*;
