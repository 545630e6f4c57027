//! The state store: per-process allocations and requests plus the pool of
//! available resources.

use alloc::vec::Vec;
use core::{fmt, iter};

use snafu::{Snafu, ensure};
use snafu_utils::{Located, Location};

/// Index of a process, displayed 1-based as `P1`, `P2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct ProcessId(usize);

impl ProcessId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

/// Index of a resource type, displayed 1-based as `R1`, `R2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct ResourceId(usize);

impl ResourceId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ProcessStatus {
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    allocation: Vec<u32>,
    request: Vec<u32>,
    status: ProcessStatus,
}

impl Process {
    /// Instances currently held, per resource type.
    ///
    /// Kept as loaded even after the process finished and its allocation was
    /// returned to the pool.
    #[must_use]
    pub fn allocation(&self) -> &[u32] {
        &self.allocation
    }

    /// Instances still needed, per resource type.
    #[must_use]
    pub fn request(&self) -> &[u32] {
        &self.request
    }

    #[must_use]
    pub fn status(&self) -> ProcessStatus {
        self.status
    }
}

/// Which of the two per-process matrices a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Matrix {
    #[display("allocation")]
    Allocation,
    #[display("request")]
    Request,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum BuildStateError {
    #[snafu(display("at least one resource type is required"))]
    NoResources {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("at least one process is required"))]
    NoProcesses {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "{matrix} matrix has {actual} processes, expected {expected} to match the allocation matrix"
    ))]
    ProcessCount {
        matrix: Matrix,
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "{matrix} row of {process} has {actual} entries, expected one per resource type ({expected})"
    ))]
    RowLength {
        matrix: Matrix,
        process: ProcessId,
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "resource accounting failed: {resource} has {total} instances but {allocated} are allocated"
    ))]
    ResourceAccounting {
        resource: ResourceId,
        total: u32,
        allocated: u64,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Located for BuildStateError {
    fn location(&self) -> Location {
        match self {
            Self::NoResources { location }
            | Self::NoProcesses { location }
            | Self::ProcessCount { location, .. }
            | Self::RowLength { location, .. }
            | Self::ResourceAccounting { location, .. } => *location,
        }
    }
}

/// A snapshot of every process and of the available resources.
///
/// Built once from validated input; afterwards only [`SystemState::run`]
/// mutates it. Cloning yields an independent snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    totals: Vec<u32>,
    available: Vec<u32>,
    processes: Vec<Process>,
}

impl SystemState {
    /// Builds the state from resource totals and per-process rows.
    ///
    /// `allocation[p][r]` is the number of instances of resource `r` held by
    /// process `p`, `request[p][r]` the number it still needs. All processes
    /// start [`ProcessStatus::Active`].
    ///
    /// # Examples
    ///
    /// ```
    /// use deadlock::SystemState;
    ///
    /// let state = SystemState::new(vec![3], vec![vec![1], vec![1]], vec![vec![2], vec![2]])?;
    /// assert_eq!(state.available(), &[1]);
    /// # Ok::<(), deadlock::BuildStateError>(())
    /// ```
    pub fn new(
        totals: Vec<u32>,
        allocation: Vec<Vec<u32>>,
        request: Vec<Vec<u32>>,
    ) -> Result<Self, BuildStateError> {
        let resource_count = totals.len();
        ensure!(resource_count > 0, NoResourcesSnafu);
        ensure!(!allocation.is_empty(), NoProcessesSnafu);
        ensure!(
            request.len() == allocation.len(),
            ProcessCountSnafu {
                matrix: Matrix::Request,
                expected: allocation.len(),
                actual: request.len(),
            }
        );

        for (matrix, rows) in [(Matrix::Allocation, &allocation), (Matrix::Request, &request)] {
            for (index, row) in rows.iter().enumerate() {
                ensure!(
                    row.len() == resource_count,
                    RowLengthSnafu {
                        matrix,
                        process: ProcessId(index),
                        expected: resource_count,
                        actual: row.len(),
                    }
                );
            }
        }

        let mut available = Vec::with_capacity(resource_count);
        for (index, &total) in totals.iter().enumerate() {
            let allocated = allocation
                .iter()
                .map(|row| u64::from(row[index]))
                .sum::<u64>();
            let free = u64::from(total).checked_sub(allocated);
            let Some(free) = free.and_then(|free| u32::try_from(free).ok()) else {
                return ResourceAccountingSnafu {
                    resource: ResourceId(index),
                    total,
                    allocated,
                }
                .fail();
            };
            available.push(free);
        }

        let processes = iter::zip(allocation, request)
            .map(|(allocation, request)| Process {
                allocation,
                request,
                status: ProcessStatus::Active,
            })
            .collect();

        Ok(Self {
            totals,
            available,
            processes,
        })
    }

    #[must_use]
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.totals.len()
    }

    /// System-wide instance count of each resource type.
    #[must_use]
    pub fn totals(&self) -> &[u32] {
        &self.totals
    }

    /// Instances of each resource type not held by any active process.
    #[must_use]
    pub fn available(&self) -> &[u32] {
        &self.available
    }

    /// # Panics
    ///
    /// Panics if `pid` is out of range.
    #[must_use]
    pub fn process(&self, pid: ProcessId) -> &Process {
        &self.processes[pid.0]
    }

    pub fn processes(&self) -> impl ExactSizeIterator<Item = (ProcessId, &Process)> {
        self.processes
            .iter()
            .enumerate()
            .map(|(index, process)| (ProcessId(index), process))
    }

    /// Ids of all processes in index order.
    ///
    /// The iterator does not borrow the state, so it can drive a loop that
    /// mutates it.
    pub fn process_ids(&self) -> impl ExactSizeIterator<Item = ProcessId> + use<> {
        (0..self.processes.len()).map(ProcessId)
    }

    pub fn resource_ids(&self) -> impl ExactSizeIterator<Item = ResourceId> + use<> {
        (0..self.totals.len()).map(ResourceId)
    }

    /// Runs `pid` to completion: returns its allocation to the pool and marks
    /// it finished.
    ///
    /// Returns `false` without touching the state if the process had already
    /// finished. Whether the process is runnable is not checked here.
    ///
    /// # Panics
    ///
    /// Panics if `pid` is out of range.
    pub fn run(&mut self, pid: ProcessId) -> bool {
        let process = &mut self.processes[pid.0];
        if process.status.is_finished() {
            return false;
        }
        for (avail, &held) in iter::zip(&mut self.available, &process.allocation) {
            *avail += held;
        }
        process.status = ProcessStatus::Finished;
        true
    }

    /// Processes that have not finished, in index order.
    #[must_use]
    pub fn active(&self) -> Vec<ProcessId> {
        self.processes()
            .filter(|(_, process)| process.status.is_active())
            .map(|(pid, _)| pid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn sample() -> SystemState {
        SystemState::new(
            vec![4, 3],
            vec![vec![1, 0], vec![2, 1]],
            vec![vec![0, 2], vec![1, 1]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_computes_available() {
        let state = sample();
        assert_eq!(state.process_count(), 2);
        assert_eq!(state.resource_count(), 2);
        assert_eq!(state.totals(), &[4, 3]);
        assert_eq!(state.available(), &[1, 2]);
        assert!(state.processes().all(|(_, p)| p.status().is_active()));
    }

    #[test]
    fn test_new_rejects_empty_dimensions() {
        let err = SystemState::new(vec![], vec![vec![]], vec![vec![]]).unwrap_err();
        assert!(matches!(err, BuildStateError::NoResources { .. }));

        let err = SystemState::new(vec![1], vec![], vec![]).unwrap_err();
        assert!(matches!(err, BuildStateError::NoProcesses { .. }));
    }

    #[test]
    fn test_new_rejects_mismatched_shapes() {
        let err = SystemState::new(vec![1], vec![vec![0]], vec![vec![0], vec![0]]).unwrap_err();
        assert!(matches!(
            err,
            BuildStateError::ProcessCount {
                matrix: Matrix::Request,
                expected: 1,
                actual: 2,
                ..
            }
        ));

        let err = SystemState::new(vec![1, 1], vec![vec![0, 0], vec![0]], vec![vec![0, 0]; 2])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "allocation row of P2 has 1 entries, expected one per resource type (2)"
        );

        let err = SystemState::new(vec![1], vec![vec![0]], vec![vec![0, 1]]).unwrap_err();
        assert!(matches!(
            err,
            BuildStateError::RowLength {
                matrix: Matrix::Request,
                process: ProcessId(0),
                ..
            }
        ));
    }

    #[test]
    fn test_new_rejects_overallocation() {
        let err = SystemState::new(vec![2, 1], vec![vec![1, 1], vec![0, 1]], vec![vec![0, 0]; 2])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource accounting failed: R2 has 1 instances but 2 are allocated"
        );
    }

    #[test]
    fn test_run_releases_allocation_once() {
        let mut state = sample();
        assert!(state.run(ProcessId::new(1)));
        assert_eq!(state.available(), &[3, 3]);
        assert!(state.process(ProcessId::new(1)).status().is_finished());
        assert_eq!(state.process(ProcessId::new(1)).allocation(), &[2, 1]);

        assert!(!state.run(ProcessId::new(1)));
        assert_eq!(state.available(), &[3, 3]);
        assert_eq!(state.active(), vec![ProcessId::new(0)]);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn test_run_out_of_range() {
        let mut state = sample();
        state.run(ProcessId::new(2));
    }

    #[test]
    fn test_ids_display_one_based() {
        assert_eq!(ProcessId::new(0).to_string(), "P1");
        assert_eq!(ResourceId::new(4).to_string(), "R5");
        assert_eq!(ProcessId::from(3), ProcessId::new(3));
    }
}
