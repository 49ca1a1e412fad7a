//! runway-insight: prompt assembly, the completion-service boundary, response caching and text reports

pub mod cache;
pub mod prompts;
pub mod report;
pub mod service;

pub use cache::{CachedCompletion, DEFAULT_TTL};
pub use prompts::{
    ChatContext, DEFAULT_PREVIEW_ROWS, DEFAULT_SYSTEM_PROMPT, InsightRequest, PreviewRow,
    PromptBuilder, Purchase,
};
pub use report::{
    format_money, format_number, render_breakdown, render_daily, render_report, render_runway,
    render_summary,
};
pub use service::{CompletionError, CompletionService, advise};
