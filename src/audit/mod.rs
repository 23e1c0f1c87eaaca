//! Audit trail — append-only records for sanitizations and incidents
//!
//! Records are persisted as JSON files under the configured directory and
//! mirrored in memory for newest-first queries. The only mutation beyond
//! append is the irreversible bulk purge.

pub mod recorder;
pub mod types;

pub use recorder::AuditRecorder;
pub use types::{
    AuditDetail, AuditRecord, DEFAULT_SOURCE, DEFAULT_SUBMITTER, INCIDENT_SOURCE,
    INCIDENT_SUBMITTER,
};
