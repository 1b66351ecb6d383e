//! Request Flows
//!
//! Each flow turns a validated request into one or two chat completions:
//!
//! ```text
//! consultation      user context ─► call 1 ─► (trigger / forced) ─► web search ─► call 2
//! document analysis upload ─► image (vision) | extracted text ─► report call ─► HTML cleanup
//! search chat       SEO refine ─► CSE + News RSS ─► concurrent extraction ─► answer call
//! ```
//!
//! Flows borrow their collaborators so they can run against any `LLMAdapter`.

pub mod consultation;
pub mod context;
pub mod document_analysis;
pub mod search_chat;

pub use consultation::ConsultationAgent;
pub use context::UserContext;
pub use document_analysis::{AnalysisInput, DocumentAnalysisAgent};
pub use search_chat::{SearchChatAgent, SearchChatOutcome};
