//! Human-readable rendering of a snapshot and of the analysis progress.

use std::fmt;

use ansi_term::{Color, Palette};
use deadlock::{Observer, Outcome, ProcessId, SystemState};

use crate::log::{self, LogLevel};

/// Allocation and request of every process.
pub struct ProcessListing<'a>(pub &'a SystemState);

impl fmt::Display for ProcessListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        for (pid, process) in state.processes() {
            writeln!(f, "Information for process: {pid}")?;
            write!(f, "Allocated Resources:")?;
            for (rid, count) in state.resource_ids().zip(process.allocation()) {
                write!(f, " {rid}:{count}")?;
            }
            writeln!(f)?;
            write!(f, "Resource Request:   ")?;
            for (rid, count) in state.resource_ids().zip(process.request()) {
                write!(f, " {rid}:{count}")?;
            }
            writeln!(f)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The available pool as a two-line table, resource labels over counts.
pub struct AvailableTable<'a>(pub &'a SystemState);

impl fmt::Display for AvailableTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        let labels = state
            .resource_ids()
            .map(|rid| rid.to_string())
            .collect::<Vec<_>>();
        let values = state
            .available()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        let widths = labels
            .iter()
            .zip(&values)
            .map(|(l, v)| usize::max(l.len(), v.len()))
            .collect::<Vec<_>>();

        writeln!(f, "Available Resources")?;
        write_row(f, &labels, &widths)?;
        write_row(f, &values, &widths)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let last = cells.len().saturating_sub(1);
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        if i == last {
            write!(f, "{cell}")?;
        } else {
            write!(f, "{cell:<width$}")?;
        }
    }
    writeln!(f)
}

pub struct RunBanner(pub ProcessId, pub Palette);

impl fmt::Display for RunBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(pid, palette) = self;
        writeln!(f, "{}", palette.paint(Color::Green, format_args!("---{pid} RAN---")))
    }
}

struct IdList<'a>(&'a [ProcessId]);

impl fmt::Display for IdList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pid in self.0 {
            write!(f, " {pid}")?;
        }
        Ok(())
    }
}

/// Completion order followed by the deadlock verdict.
pub struct Summary<'a>(pub &'a Outcome, pub Palette);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(outcome, palette) = self;
        writeln!(
            f,
            "Running Order for Processes:{}",
            IdList(outcome.completion_order())
        )?;
        if outcome.is_deadlock_free() {
            let msg = "There is no deadlock. All processes ran to completion.";
            writeln!(f, "{}", palette.paint(Color::Green, msg))
        } else {
            writeln!(
                f,
                "{}",
                palette.paint(
                    Color::Red,
                    format_args!(
                        "There is a deadlock. Processes{} are the cause of deadlock.",
                        IdList(outcome.deadlocked())
                    )
                )
            )
        }
    }
}

/// Prints every run as it happens and logs the engine's progress.
pub struct ProgressPrinter {
    palette: Palette,
    quiet: bool,
}

impl ProgressPrinter {
    pub fn new(palette: Palette, quiet: bool) -> Self {
        Self { palette, quiet }
    }
}

impl Observer for ProgressPrinter {
    fn sweep_started(&mut self, sweep: usize, state: &SystemState) {
        if !log::enabled(LogLevel::Debug) {
            return;
        }
        debug!(
            "sweep {sweep} started, runnable:{}",
            IdList(&state.runnable_processes().collect::<Vec<_>>())
        );
    }

    fn process_ran(&mut self, pid: ProcessId, state: &SystemState) {
        debug!("{pid} ran, available={:?}", state.available());
        if !self.quiet {
            print!("{}", RunBanner(pid, self.palette));
            println!("{}", AvailableTable(state));
        }
    }

    fn terminated(&mut self, outcome: &Outcome) {
        info!(
            "fixed point reached after {} sweeps: {} completed, {} deadlocked",
            outcome.sweeps(),
            outcome.completion_order().len(),
            outcome.deadlocked().len()
        );
    }
}
