//! ReactRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Child processes
//! - Runtime specifics
//!
//! All types here describe a single agent job: what goes in, which
//! lifecycle events come out, and how the job ends.

pub mod error;
pub mod event;
pub mod ids;
pub mod job;
pub mod status;

// Re-export commonly used types
pub use error::CoreError;
pub use event::{
    EventData, EventEnvelope, EventType, OutputData, CREW_FINISHED_JOB_ID, REACT_CREW_TYPE,
};
pub use ids::JobId;
pub use job::{is_present, JobInputs};
pub use status::{JobOutcome, JobState, JobStatus};
