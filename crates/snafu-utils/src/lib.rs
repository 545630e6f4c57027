//! Error helpers shared by the workspace crates.
//!
//! [`Location`] records where an error was created, [`GenericError`] is the
//! catch-all `whatever` error used at application boundaries, and [`Report`]
//! renders an error together with its chain of causes.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::{boxed::Box, string::String};
use core::{error::Error, fmt};

use ansi_term::{Color, Palette};
use snafu::{GenerateImplicitData, Snafu};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location(&'static core::panic::Location<'static>);

impl Default for Location {
    #[track_caller]
    fn default() -> Self {
        Self(core::panic::Location::caller())
    }
}

impl GenerateImplicitData for Location {
    #[track_caller]
    fn generate() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Errors that know where they were created.
///
/// [`Report`] prints the location of every error in the chain that implements
/// this trait and can be recovered by downcasting.
pub trait Located {
    fn location(&self) -> Location;
}

#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct GenericError {
    message: String,
    #[snafu(implicit)]
    location: Location,
    #[snafu(source(from(Box<dyn Error>, Some)))]
    source: Option<Box<dyn Error>>,
}

impl Located for GenericError {
    fn location(&self) -> Location {
        self.location
    }
}

/// Renders an error and its causes, one per line.
pub struct Report<E> {
    error: E,
    palette: Palette,
    locate: fn(&(dyn Error + 'static)) -> Option<Location>,
}

fn locate_generic(err: &(dyn Error + 'static)) -> Option<Location> {
    err.downcast_ref::<GenericError>().map(Located::location)
}

impl<E> Report<E> {
    pub fn new(error: E) -> Self {
        Self {
            error,
            palette: Palette::PLAIN,
            locate: locate_generic,
        }
    }

    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Replaces the function used to find the location of each error in the
    /// chain. The default only recognizes [`GenericError`].
    #[must_use]
    pub fn locate_with(mut self, locate: fn(&(dyn Error + 'static)) -> Option<Location>) -> Self {
        self.locate = locate;
        self
    }
}

impl<E> fmt::Debug for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<E> fmt::Display for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.palette;
        let error: &(dyn Error + 'static) = &self.error;
        writeln!(f, "Error: {}", p.paint(Color::Red, error))?;
        if let Some(loc) = (self.locate)(error) {
            writeln!(f, "  at {}", p.paint(Color::DarkGray, loc))?;
        }
        let mut source = error.source();
        if source.is_some() {
            writeln!(f)?;
            writeln!(f, "Caused by:")?;
        }
        let mut index = 0;
        while let Some(s) = source {
            writeln!(f, "{index:4}: {}", p.paint(Color::Red, s))?;
            if let Some(loc) = (self.locate)(s) {
                writeln!(f, "      at {}", p.paint(Color::DarkGray, loc))?;
            }
            source = s.source();
            index += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use snafu::{ResultExt as _, whatever};

    use super::*;

    #[derive(Debug, Snafu)]
    enum LeafError {
        #[snafu(display("disk on fire"))]
        OnFire,
    }

    fn leaf() -> Result<(), LeafError> {
        OnFireSnafu.fail()
    }

    fn middle() -> Result<(), GenericError> {
        leaf().whatever_context("failed to read input")
    }

    fn outer() -> Result<(), GenericError> {
        middle().whatever_context("failed to analyze snapshot")
    }

    fn nothing() -> Result<(), GenericError> {
        whatever!("nothing to do")
    }

    #[test]
    fn test_report_without_source() {
        let report = Report::new(nothing().unwrap_err()).to_string();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("Error: nothing to do"));
        assert!(lines.next().unwrap().starts_with("  at "));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_report_lists_causes_in_order() {
        let report = Report::new(outer().unwrap_err()).to_string();
        let lines = report.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Error: failed to analyze snapshot");
        assert!(lines[1].starts_with("  at ") && lines[1].contains("lib.rs"));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Caused by:");
        assert_eq!(lines[4], "   0: failed to read input");
        assert!(lines[5].starts_with("      at "));
        assert_eq!(lines[6], "   1: disk on fire");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_report_with_colors() {
        let report = Report::new(outer().unwrap_err())
            .palette(Palette::ANSI)
            .to_string();
        assert!(report.starts_with("Error: \x1B[31;1mfailed to analyze snapshot\x1B[0m\n"));
    }
}
