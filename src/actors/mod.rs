//! Actor-based scheduling
//!
//! Each monitored target gets two independent repeating tasks, one probe
//! actor and one check actor, communicating only through the shared store.
//! There is no central loop.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌─────────────────┐
//!                  │  main (binary)  │
//!                  └────────┬────────┘
//!                           │ spawns per target
//!            ┌──────────────┴───────────────┐
//!            │                              │
//!    ┌───────▼────────┐            ┌────────▼────────┐
//!    │  ProbeActor    │            │   CheckActor    │
//!    │ (GET + sample) │            │ (stats + alert) │
//!    └───────┬────────┘            └───┬────────┬────┘
//!            │ insert_sample           │ read   │ publish
//!            │                         │        │
//!    ┌───────▼─────────────────────────▼──┐  ┌──▼───────────────────┐
//!    │        shared StorageBackend       │  │  Broadcast Channel   │
//!    │   (samples + alert-event log)      │  │ (NotificationEvent)  │
//!    └────────────────────────────────────┘  └──────────────────────┘
//! ```
//!
//! ## Scheduling model
//!
//! Every actor re-arms by sleeping *after* the previous execution finishes,
//! not on a fixed wall-clock cadence. Drift therefore accumulates by the
//! duration of each execution. That is a deliberate property: interval
//! granularity (seconds to minutes) dwarfs execution latency
//! (milliseconds), and a slow probe can never pile up overlapping runs of
//! itself.
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: each actor has an mpsc command channel
//!    (`ProbeNow`/`CheckNow`, `UpdateInterval`, `Shutdown`)
//! 2. **Events**: check actors publish notifications to a broadcast channel
//! 3. **Request/Response**: oneshot channels for synchronous queries
//!
//! Shutdown is graceful: the actor stops re-arming and exits after the
//! in-flight operation completes.

pub mod checker;
pub mod messages;
pub mod prober;
