//! ShieldGate - Content sanitization, provenance watermarking, and
//! security telemetry core
//!
//! ShieldGate sits between endpoint agents and the services they talk to:
//! submitted text is classified and redacted, stamped with an invisible
//! provenance marker, scored for residual risk, and recorded in an
//! append-only audit trail, while security events fan out to live observers
//! in real time.
//!
//! ## Architecture
//!
//! ```text
//!                submit text
//!                     │
//!  ┌──────────────────▼──────────────────┐
//!  │           SecurityEngine            │
//!  │                                     │
//!  │  Classifier ─► Scorer ─► Watermark  │──► SanitizationResult
//!  │                     │               │
//!  │                     ▼               │
//!  │              AuditRecorder          │  (best-effort JSON store)
//!  └──────────────────┬──────────────────┘
//!                     │ incidents / heartbeats / session links
//!  ┌──────────────────▼──────────────────┐
//!  │  EvidenceBuffer   LivenessMonitor   │
//!  │          │              │           │
//!  │          └──► Broadcaster ◄─────────│──► observers / rooms
//!  └─────────────────────────────────────┘
//! ```
//!
//! ## Key behaviors
//!
//! - Classification is a fixed, ordered pipeline of structural matchers —
//!   email-, phone-, card-, and credential-shaped text — each replacing its
//!   matches with a category-unique placeholder.
//! - The watermark is a three-code-point zero-width sequence, invisible
//!   under normal rendering and detectable by containment.
//! - Broadcast delivery is at-most-once and best-effort: no replay, no
//!   persistence of missed frames.
//! - Audit writes are bounded-timeout and non-fatal to the caller.
//!
//! ## Modules
//!
//! - [`engine`]: the facade wiring the pipeline and telemetry together
//! - [`sanitize`]: classifier, scorer, watermark codec, forensic export
//! - [`audit`]: append-only audit recorder
//! - [`telemetry`]: broadcaster, evidence buffer, liveness monitor
//! - [`session`]: single-use session link handshake
//! - [`config`]: configuration management

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod sanitize;
pub mod session;
pub mod telemetry;

pub use config::ShieldGateConfig;
pub use engine::{IncidentReport, SecurityEngine, SystemStats};
pub use error::{Error, Result};
pub use sanitize::{CategoryTag, SanitizationRequest, SanitizationResult};
pub use telemetry::Severity;
