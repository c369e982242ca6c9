mod agent;
pub mod callbacks;
pub mod crew;
mod error;
pub mod llm;
pub mod sink;
pub mod tools;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use agent::{Agent, AgentBuilder, StopCondition};
pub use crew::{AgentConfig, Crew, Orchestrator, TaskConfig};
pub use sink::SharedWriter;
