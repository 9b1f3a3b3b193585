//! Reply strategy adapters.

mod llm;
mod template_pool;

pub use llm::{LlmReplyConfig, LlmReplyStrategy};
pub use template_pool::{TemplatePool, DEFAULT_STALL_LINES};
