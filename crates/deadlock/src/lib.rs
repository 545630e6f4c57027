//! Deadlock detection over a static snapshot of resource allocations.
//!
//! A snapshot ([`SystemState`]) holds, for a fixed set of processes and
//! resource types, what every process currently holds and what it still
//! requests, plus the instances nobody holds. The [`ProgressEngine`]
//! repeatedly runs every process whose request can be served, returning its
//! resources to the pool, until no process can make progress. Whatever is left
//! is deadlocked.
//!
//! Detection is offline: requests are never granted or denied ahead of time,
//! and the snapshot does not change while it is analyzed apart from processes
//! finishing.
//!
//! # Examples
//!
//! ```
//! use deadlock::{ProcessId, SystemState};
//!
//! // P1 and P2 each hold one instance the other one needs.
//! let mut state = SystemState::new(
//!     vec![1, 1, 1],
//!     vec![vec![1, 0, 0], vec![0, 1, 0], vec![0, 0, 0]],
//!     vec![vec![1, 1, 0], vec![1, 1, 0], vec![0, 0, 1]],
//! )?;
//! let outcome = deadlock::detect(&mut state);
//! assert_eq!(outcome.completion_order(), &[ProcessId::new(2)]);
//! assert_eq!(outcome.deadlocked(), &[ProcessId::new(0), ProcessId::new(1)]);
//! # Ok::<(), deadlock::BuildStateError>(())
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub use self::{
    engine::{Observer, Outcome, Phase, ProgressEngine},
    state::{BuildStateError, Matrix, Process, ProcessId, ProcessStatus, ResourceId, SystemState},
};

pub mod engine;
pub mod input;
mod safety;
pub mod state;

/// Runs `state` to its fixed point and returns the final partition.
pub fn detect(state: &mut SystemState) -> Outcome {
    ProgressEngine::new(state).run()
}
