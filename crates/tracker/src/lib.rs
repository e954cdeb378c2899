//! Client-side job tracking for the sift screening workflow.
//!
//! The tracker owns the session's job collection and its concurrency:
//!
//! * [`store`] -- the job store actor; all mutation flows through one
//!   task over an mpsc channel, so merges never race.
//! * [`poll`] -- one watcher task per submitted job, polling the backend
//!   until the job settles or the retry budgets run out.
//! * [`compare`] -- the bounded side-by-side comparison and its
//!   transient detail view.
//! * [`manager`] -- the [`ScreeningTracker`] facade tying submission to
//!   poll-task spawning, plus deletion and shutdown.

pub mod compare;
pub mod manager;
pub mod poll;
pub mod store;

pub use compare::{CompareCoordinator, CompareView};
pub use manager::{ScreeningTracker, TrackerError};
pub use poll::{PollConfig, PollOutcome};
pub use store::{JobStoreHandle, StoreClosed, StoreEvent};
