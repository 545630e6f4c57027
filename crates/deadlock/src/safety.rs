//! Safety evaluation: which processes can currently run to completion.

use core::iter;

use crate::state::{ProcessId, SystemState};

impl SystemState {
    /// Returns `true` if `pid` is active and its whole outstanding request can
    /// be served by what it already holds plus the available pool.
    ///
    /// A finished process is never runnable, so it cannot be run twice.
    ///
    /// # Panics
    ///
    /// Panics if `pid` is out of range.
    #[must_use]
    pub fn is_runnable(&self, pid: ProcessId) -> bool {
        let process = self.process(pid);
        if process.status().is_finished() {
            return false;
        }
        iter::zip(process.request(), process.allocation())
            .zip(self.available())
            .all(|((&request, &held), &avail)| {
                u64::from(request) <= u64::from(held) + u64::from(avail)
            })
    }

    /// Returns `true` if at least one process is runnable.
    #[must_use]
    pub fn exists_runnable_process(&self) -> bool {
        self.process_ids().any(|pid| self.is_runnable(pid))
    }

    /// Processes runnable in the current state, in index order.
    ///
    /// The state is not modified, so running one of them may make more
    /// processes runnable than listed here.
    pub fn runnable_processes(&self) -> impl Iterator<Item = ProcessId> {
        self.process_ids().filter(|&pid| self.is_runnable(pid))
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::*;

    #[test]
    fn test_request_compared_against_held_plus_available() {
        // available = [1]
        let state = SystemState::new(vec![3], vec![vec![1], vec![1]], vec![vec![2], vec![3]])
            .unwrap();
        assert!(state.is_runnable(ProcessId::new(0)));
        assert!(!state.is_runnable(ProcessId::new(1)));
    }

    #[test]
    fn test_every_resource_must_be_satisfied() {
        let state = SystemState::new(vec![2, 2], vec![vec![0, 0]], vec![vec![2, 3]]).unwrap();
        assert!(!state.is_runnable(ProcessId::new(0)));
        assert!(!state.exists_runnable_process());
    }

    #[test]
    fn test_finished_process_is_not_runnable() {
        let mut state = SystemState::new(vec![1], vec![vec![0]], vec![vec![0]]).unwrap();
        assert!(state.is_runnable(ProcessId::new(0)));
        state.run(ProcessId::new(0));
        assert!(!state.is_runnable(ProcessId::new(0)));
        assert!(!state.exists_runnable_process());
    }

    #[test]
    fn test_runnable_processes_in_index_order() {
        let state = SystemState::new(
            vec![2],
            vec![vec![0], vec![0], vec![0]],
            vec![vec![1], vec![3], vec![2]],
        )
        .unwrap();
        assert!(state.exists_runnable_process());
        assert_eq!(
            state.runnable_processes().collect::<Vec<_>>(),
            vec![ProcessId::new(0), ProcessId::new(2)]
        );
    }

    #[test]
    fn test_large_counts_do_not_overflow() {
        let state = SystemState::new(
            vec![u32::MAX],
            vec![vec![u32::MAX], vec![0]],
            vec![vec![u32::MAX], vec![1]],
        )
        .unwrap();
        assert!(state.is_runnable(ProcessId::new(0)));
        assert!(!state.is_runnable(ProcessId::new(1)));
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_out_of_range() {
        let state = SystemState::new(vec![1], vec![vec![0]], vec![vec![0]]).unwrap();
        let _ = state.is_runnable(ProcessId::new(1));
    }
}
