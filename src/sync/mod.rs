//! # Sync Ingestion Core
//!
//! Everything behind `POST /sync`: payload schema and validation, the shared
//! secret access guard, external-to-internal question id resolution, the
//! batch reconciler that upserts questions, solution steps, attempts, and
//! feedback in dependency order, and the append-only ingestion audit log.
//!
//! The reconciler is deliberately sequential within one call: later entries
//! may reference question ids established by earlier entries of the same
//! batch, so array order is a correctness requirement. Across calls, the
//! store's unique constraints serialize conflicting upserts; no in-process
//! locking is used.

pub mod audit;
pub mod guard;
pub mod payload;
pub mod reconciler;
pub mod resolver;

pub use audit::CallerMeta;
pub use payload::SyncPayload;
pub use reconciler::{BatchReconciler, SyncAbort, SyncFailure, SyncSummary};
