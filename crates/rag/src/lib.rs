//! # RAG Engine
//!
//! Document ingestion and context retrieval over a vector store:
//!
//! - [`TextSplitter`]: overlapping chunks with natural-breakpoint preference
//! - [`extract_pdf_text`]: PDF text extraction on a blocking thread
//! - [`RagEngine`]: chunk → embed → upsert (ingestion) and
//!   embed → search → merge (retrieval)
//!
//! Retrieval never fails the caller: store or embedding trouble degrades to
//! an explicit [`Retrieval::Degraded`] outcome and chat proceeds without
//! document context.

mod engine;
mod pdf;
mod splitter;

pub use engine::{RagEngine, Retrieval};
pub use pdf::extract_pdf_text;
pub use splitter::TextSplitter;
