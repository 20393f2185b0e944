//! Core domain model types for articleflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Article input and the per-run state record
//! - Stage names, kinds, run status and run phases
//! - Stage updates that write a single state field
//! - The output projection

mod result;
mod state;
mod status;
mod update;

pub use result::{ArticleResult, RunWarning};
pub use state::{ArticleInput, ArticleState, ContentStructure, Sentiment, Urgency};
pub use status::{RunPhase, RunStatus, StageName};
pub use update::StageUpdate;
