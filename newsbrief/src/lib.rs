// Library interface for newsbrief modules
// This allows tests and the two binaries to share the pipeline

pub mod archive;
pub mod brief;
pub mod error;
pub mod llm;
pub mod mailer;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod search;
