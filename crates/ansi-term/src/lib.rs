//! Minimal ANSI escape sequence coloring for terminal output.
//!
//! Coloring goes through a [`Palette`], which can be switched off so that the
//! same rendering code produces plain text when the output is not a terminal.

#![cfg_attr(not(test), no_std)]

use core::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    DarkGray,
    Red,
    LightRed,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Default,
}

impl Color {
    fn fg(self) -> u8 {
        match self {
            Self::DarkGray => 90,
            Self::Red => 31,
            Self::LightRed => 91,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
            Self::Default => 39,
        }
    }
}

/// When to emit color escape sequences.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    /// Colorize only when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolves the choice against the properties of the output stream.
    ///
    /// `no_color` reflects the `NO_COLOR` convention and only affects
    /// [`ColorChoice::Auto`].
    #[must_use]
    pub fn should_colorize(self, is_terminal: bool, no_color: bool) -> bool {
        match self {
            Self::Auto => is_terminal && !no_color,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorChoiceError;

impl fmt::Display for ParseColorChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of `auto`, `always` or `never`")
    }
}

impl core::error::Error for ParseColorChoiceError {}

impl FromStr for ColorChoice {
    type Err = ParseColorChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(ParseColorChoiceError),
        }
    }
}

/// Decides whether painted values carry escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// A palette that never emits escape sequences.
    pub const PLAIN: Self = Self { enabled: false };
    /// A palette that always emits escape sequences.
    pub const ANSI: Self = Self { enabled: true };

    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.enabled
    }

    /// Wraps `value` so that it is displayed in bold `color`.
    pub fn paint<T>(self, color: Color, value: T) -> Painted<T> {
        Painted {
            color: self.enabled.then_some(color),
            value,
        }
    }
}

pub struct Painted<T> {
    color: Option<Color>,
    value: T,
}

impl<T> fmt::Display for Painted<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = &self.value;
        match self.color {
            Some(color) => write!(f, "\x1B[{};1m{value}\x1B[0m", color.fg()),
            None => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_palette_passes_value_through() {
        let painted = Palette::PLAIN.paint(Color::Red, "deadlock");
        assert_eq!(painted.to_string(), "deadlock");
    }

    #[test]
    fn test_ansi_palette_wraps_value() {
        let painted = Palette::ANSI.paint(Color::Green, 42);
        assert_eq!(painted.to_string(), "\x1B[32;1m42\x1B[0m");
        let painted = Palette::ANSI.paint(Color::DarkGray, "at");
        assert_eq!(painted.to_string(), "\x1B[90;1mat\x1B[0m");
    }

    #[test]
    fn test_color_choice_from_str() {
        assert_eq!("auto".parse(), Ok(ColorChoice::Auto));
        assert_eq!("always".parse(), Ok(ColorChoice::Always));
        assert_eq!("never".parse(), Ok(ColorChoice::Never));
        assert_eq!("sometimes".parse::<ColorChoice>(), Err(ParseColorChoiceError));
    }

    #[test]
    fn test_should_colorize() {
        assert!(ColorChoice::Auto.should_colorize(true, false));
        assert!(!ColorChoice::Auto.should_colorize(false, false));
        assert!(!ColorChoice::Auto.should_colorize(true, true));
        assert!(ColorChoice::Always.should_colorize(false, true));
        assert!(!ColorChoice::Never.should_colorize(true, false));
    }
}
