//! Highlight extraction, prompt summaries and the rule-based fallback analysis
//! for DART key-account statements.

pub mod extractor;
pub mod fallback;
pub mod summary;

pub use extractor::{extract_highlights, HighlightExtractor};
pub use fallback::{generate_fallback_analysis, NO_FINANCIAL_DATA};
pub use summary::compose_summary;
