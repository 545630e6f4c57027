//! The progress engine: runs every runnable process until a fixed point is
//! reached, then reports the processes left blocked.
//!
//! The engine is a small state machine:
//!
//! - [`Phase::Scanning`] checks whether any process is runnable. If none is,
//!   the engine terminates.
//! - [`Phase::Sweeping`] visits every process once, in index order, and runs
//!   each one that is runnable at the moment it is visited. Resources released
//!   earlier in the sweep are visible to the processes visited after it.
//! - [`Phase::Terminated`] is final. The processes still active form the
//!   deadlock set.
//!
//! Every sweep runs at least one process, so there are at most as many sweeps
//! as processes.

use alloc::vec::Vec;

use crate::state::{ProcessId, SystemState};

/// Receives progress notifications from a [`ProgressEngine`].
///
/// All methods default to doing nothing.
pub trait Observer {
    /// Called when sweep number `sweep` (starting at 1) begins.
    fn sweep_started(&mut self, sweep: usize, state: &SystemState) {
        let _ = (sweep, state);
    }

    /// Called right after `pid` ran; `state.available()` already includes the
    /// resources it released.
    fn process_ran(&mut self, pid: ProcessId, state: &SystemState) {
        let _ = (pid, state);
    }

    /// Called once, when the engine reaches [`Phase::Terminated`].
    fn terminated(&mut self, outcome: &Outcome) {
        let _ = outcome;
    }
}

impl Observer for () {}

impl<O> Observer for &mut O
where
    O: Observer + ?Sized,
{
    fn sweep_started(&mut self, sweep: usize, state: &SystemState) {
        (**self).sweep_started(sweep, state);
    }

    fn process_ran(&mut self, pid: ProcessId, state: &SystemState) {
        (**self).process_ran(pid, state);
    }

    fn terminated(&mut self, outcome: &Outcome) {
        (**self).terminated(outcome);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Phase {
    Scanning,
    Sweeping,
    Terminated,
}

/// The final partition of the processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    completion_order: Vec<ProcessId>,
    deadlocked: Vec<ProcessId>,
    sweeps: usize,
}

impl Outcome {
    /// Processes in the order they ran.
    #[must_use]
    pub fn completion_order(&self) -> &[ProcessId] {
        &self.completion_order
    }

    /// Processes that never became runnable, in index order.
    #[must_use]
    pub fn deadlocked(&self) -> &[ProcessId] {
        &self.deadlocked
    }

    /// Number of sweeps performed.
    #[must_use]
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    #[must_use]
    pub fn is_deadlock_free(&self) -> bool {
        self.deadlocked.is_empty()
    }
}

/// Drives a [`SystemState`] to its fixed point.
///
/// # Examples
///
/// ```
/// use deadlock::{ProcessId, ProgressEngine, SystemState};
///
/// let mut state = SystemState::new(vec![1], vec![vec![0]], vec![vec![2]])?;
/// let outcome = ProgressEngine::new(&mut state).run();
/// assert!(outcome.completion_order().is_empty());
/// assert_eq!(outcome.deadlocked(), &[ProcessId::new(0)]);
/// # Ok::<(), deadlock::BuildStateError>(())
/// ```
#[derive(Debug)]
pub struct ProgressEngine<'s, O = ()> {
    state: &'s mut SystemState,
    observer: O,
    phase: Phase,
    completion_order: Vec<ProcessId>,
    sweeps: usize,
    outcome: Option<Outcome>,
}

impl<'s> ProgressEngine<'s> {
    pub fn new(state: &'s mut SystemState) -> Self {
        Self::with_observer(state, ())
    }
}

impl<'s, O> ProgressEngine<'s, O>
where
    O: Observer,
{
    pub fn with_observer(state: &'s mut SystemState, observer: O) -> Self {
        let completion_order = Vec::with_capacity(state.process_count());
        Self {
            state,
            observer,
            phase: Phase::Scanning,
            completion_order,
            sweeps: 0,
            outcome: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &SystemState {
        self.state
    }

    /// Processes run so far, in order.
    #[must_use]
    pub fn completion_order(&self) -> &[ProcessId] {
        &self.completion_order
    }

    /// The final partition, once the engine has terminated.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Performs a single transition of the state machine and returns the new
    /// phase. Does nothing once terminated.
    pub fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::Scanning => {
                if self.state.exists_runnable_process() {
                    Phase::Sweeping
                } else {
                    self.terminate();
                    Phase::Terminated
                }
            }
            Phase::Sweeping => {
                self.sweep();
                Phase::Scanning
            }
            Phase::Terminated => Phase::Terminated,
        };
        self.phase
    }

    /// Steps until the engine terminates and returns the final partition.
    pub fn run(mut self) -> Outcome {
        loop {
            self.step();
            if let Some(outcome) = self.outcome.take() {
                return outcome;
            }
        }
    }

    fn sweep(&mut self) {
        self.sweeps += 1;
        self.observer.sweep_started(self.sweeps, self.state);

        let ran_before = self.completion_order.len();
        for pid in self.state.process_ids() {
            if !self.state.is_runnable(pid) {
                continue;
            }
            self.state.run(pid);
            self.completion_order.push(pid);
            self.observer.process_ran(pid, self.state);
        }
        debug_assert!(
            self.completion_order.len() > ran_before,
            "sweep {} made no progress",
            self.sweeps
        );
    }

    fn terminate(&mut self) {
        let outcome = Outcome {
            completion_order: self.completion_order.clone(),
            deadlocked: self.state.active(),
            sweeps: self.sweeps,
        };
        self.observer.terminated(&outcome);
        self.outcome = Some(outcome);
    }
}
