//! rankcheck-core: behavioural oracle for a multi-tenant competition
//! ranking and billing platform.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ValidationRun                           │
//! │  steps 1..14 ──▶ Operation ──▶ Agent ──▶ RawResponse         │
//! │       │                                     │                │
//! │       │                          Expectation::evaluate       │
//! │       │                          (status ▸ decode ▸ predicate)│
//! │       ▼                                     │                │
//! │  ReferenceModel ◀── update only after pass ─┘                │
//! │       │                                                      │
//! │       └── expected_ranking / expected_billing ──▶ invariants │
//! └───────────────┬──────────────────────────────────────────────┘
//!                 │ CheckRecord
//!                 ▼
//!             StepSink (tracing, memory, tee)
//! ```
//!
//! The oracle never talks HTTP. An [`AccountProvider`] hands out
//! role-scoped [`Agent`]s; the binary crate supplies an HTTP one and
//! [`MemoryPlatform`] serves the whole contract in process.

pub mod agent;
pub mod assertion;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod invariants;
pub mod model;
pub mod naming;
pub mod platform_memory;
pub mod sequencer;
pub mod settle;
pub mod sink;
pub mod types;

pub use agent::{AccountProvider, Agent, Method, Operation, RawResponse, RequestBody, Role};
pub use config::{BillingRates, ConfigError, OracleConfig};
pub use context::{CancelHandle, RunContext};
pub use error::{CheckError, ModelError, OracleError, TransportError};
pub use ids::SequenceAllocator;
pub use platform_memory::{MemoryPlatform, PlatformFault, PlatformOptions};
pub use sequencer::{RunSummary, ValidationRun, ADMIN_TENANT};
pub use sink::{CheckOutcome, CheckRecord, MemorySink, StepSink, TeeSink, TracingSink};
