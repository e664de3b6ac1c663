//! Core logic of the comment-umpire backend.
//!
//! The crate owns everything with real invariants: flattening paginated
//! comment threads into a capped ordered sequence, building conversation
//! context for a target comment, composing analysis prompts, normalizing
//! drifted completion schemas into one result shape, and driving the
//! protest negotiation state machine.
//!
//! Transports (the comment source and the completion service) and the
//! template files are collaborators behind the [`source::CommentSource`],
//! [`completion::TextCompletion`] and [`templates::TemplateStore`] traits;
//! every operation here is a pure function of its inputs plus collaborator
//! responses, with no shared mutable state across requests.

pub mod analysis;
pub mod completion;
pub mod context;
pub mod errors;
pub mod flatten;
pub mod model;
pub mod protest;
pub mod source;
pub mod taxonomy;
pub mod templates;

pub use analysis::analyze_comment;
pub use completion::TextCompletion;
pub use context::context_for;
pub use errors::{Error, ResponseFormatError, SourceError, TemplateError, UmpResult};
pub use flatten::{FlattenPolicy, FlattenedThread, flatten_thread};
pub use model::{AnalysisResult, Comment, CommentThread, ThreadPage, Validity, Verdict, VideoInfo};
pub use protest::{ProtestSession, SessionState, protest_turn};
pub use source::CommentSource;
pub use templates::{FsTemplateStore, TemplateStore};
