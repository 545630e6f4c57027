//! Parsing of the whitespace-separated text inputs.
//!
//! Three inputs describe a snapshot:
//!
//! - the resource totals, one count per resource type,
//! - the allocation matrix, row-major by process then resource type,
//! - the request matrix, in the same layout.
//!
//! Line breaks carry no meaning beyond separating numbers; they are only
//! tracked to point at the offending token in error messages.

use alloc::{string::String, vec::Vec};
use core::{error::Error, fmt};

use snafu::{ResultExt as _, Snafu};
use snafu_utils::{Located, Location};

use crate::state::{BuildStateError, SystemState};

/// The kinds of errors that can occur when parsing an input.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[non_exhaustive]
pub enum InputFormatErrorKind {
    #[display("input contains no numbers")]
    Empty,
    #[display("invalid number at line {line}: `{token}`")]
    InvalidNumber { line: usize, token: String },
    #[display("negative count at line {line}: {value}")]
    Negative { line: usize, value: i64 },
    #[display(
        "{count} numbers cannot be split into rows of {columns} (one per resource type)"
    )]
    Ragged { count: usize, columns: usize },
}

/// The error type returned when an input is not a well-formed list of counts.
#[derive(Debug)]
pub struct InputFormatError {
    location: Location,
    kind: InputFormatErrorKind,
}

impl InputFormatError {
    #[track_caller]
    #[must_use]
    pub fn new(kind: InputFormatErrorKind) -> Self {
        Self {
            location: Location::default(),
            kind,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &InputFormatErrorKind {
        &self.kind
    }
}

impl From<InputFormatErrorKind> for InputFormatError {
    #[track_caller]
    fn from(kind: InputFormatErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for InputFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Error for InputFormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}

impl Located for InputFormatError {
    fn location(&self) -> Location {
        self.location
    }
}

/// Names the input an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum InputKind {
    #[display("resource totals")]
    Totals,
    #[display("allocation matrix")]
    Allocations,
    #[display("request matrix")]
    Requests,
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum LoadStateError {
    #[snafu(display("malformed {input}"))]
    Format {
        input: InputKind,
        #[snafu(implicit)]
        location: Location,
        source: InputFormatError,
    },
    #[snafu(display("inconsistent snapshot"))]
    Build {
        #[snafu(implicit)]
        location: Location,
        source: BuildStateError,
    },
}

impl Located for LoadStateError {
    fn location(&self) -> Location {
        match self {
            Self::Format { location, .. } | Self::Build { location, .. } => *location,
        }
    }
}

/// Parses a list of non-negative counts separated by whitespace.
///
/// An empty input yields an empty list.
pub fn parse_counts(text: &str) -> Result<Vec<u32>, InputFormatError> {
    let mut counts = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        for token in line.split_whitespace() {
            let invalid = || InputFormatErrorKind::InvalidNumber {
                line: line_no,
                token: token.into(),
            };
            let Ok(value) = token.parse::<i64>() else {
                return Err(invalid().into());
            };
            if value < 0 {
                return Err(InputFormatErrorKind::Negative {
                    line: line_no,
                    value,
                }
                .into());
            }
            let Ok(value) = u32::try_from(value) else {
                return Err(invalid().into());
            };
            counts.push(value);
        }
    }
    Ok(counts)
}

/// Parses the resource totals. At least one resource type is required.
pub fn parse_totals(text: &str) -> Result<Vec<u32>, InputFormatError> {
    let totals = parse_counts(text)?;
    if totals.is_empty() {
        return Err(InputFormatErrorKind::Empty.into());
    }
    Ok(totals)
}

/// Parses a matrix with `columns` entries per row.
///
/// # Panics
///
/// Panics if `columns` is zero.
pub fn parse_matrix(text: &str, columns: usize) -> Result<Vec<Vec<u32>>, InputFormatError> {
    assert!(columns > 0, "matrix must have at least one column");
    let counts = parse_counts(text)?;
    if counts.is_empty() {
        return Err(InputFormatErrorKind::Empty.into());
    }
    if counts.len() % columns != 0 {
        return Err(InputFormatErrorKind::Ragged {
            count: counts.len(),
            columns,
        }
        .into());
    }
    Ok(counts.chunks_exact(columns).map(<[u32]>::to_vec).collect())
}

/// Parses the three inputs and builds the snapshot they describe.
///
/// The number of resource types comes from the totals, the number of
/// processes from the allocation matrix.
///
/// # Examples
///
/// ```
/// use deadlock::input;
///
/// let state = input::parse_state("3 2", "1 0\n1 1", "2 1\n0 0")?;
/// assert_eq!(state.process_count(), 2);
/// assert_eq!(state.available(), &[1, 1]);
/// # Ok::<(), deadlock::input::LoadStateError>(())
/// ```
pub fn parse_state(
    totals: &str,
    allocations: &str,
    requests: &str,
) -> Result<SystemState, LoadStateError> {
    let totals = parse_totals(totals).context(FormatSnafu {
        input: InputKind::Totals,
    })?;
    let columns = totals.len();
    let allocation = parse_matrix(allocations, columns).context(FormatSnafu {
        input: InputKind::Allocations,
    })?;
    let request = parse_matrix(requests, columns).context(FormatSnafu {
        input: InputKind::Requests,
    })?;
    SystemState::new(totals, allocation, request).context(BuildSnafu)
}
