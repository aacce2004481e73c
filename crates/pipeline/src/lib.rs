//! Orchestrates the two flows of the application: documents in, persisted
//! index out; question in, grounded answer out.

pub mod error;
pub mod pipeline;
pub mod state;

pub use error::PipelineError;
pub use pipeline::{IngestReport, Pipeline, PipelineOptions, QueryOutcome};
pub use state::{IngestState, QueryState};
