//! Line tokenizing and typed field extraction
//!
//! This module turns one tokenized line into a typed record: a
//! [`Placement`] for command code 1, an [`Element`] for codes 2 to 5. Token
//! counts are validated here; routing into the model store happens in the
//! parent module.

use std::borrow::Cow;

use nalgebra::Point3;

use crate::color::parse_color_code;
use crate::error::{Error, ErrorContext, Result};
use crate::model::{ColorCode, Element, Placement};

use super::state::ParserState;

/// Minimum tokens on a placement line: code, color, 3 position, 9 matrix, name
pub const PLACEMENT_MIN_TOKENS: usize = 15;
/// Tokens on a line segment
pub const SEGMENT_TOKENS: usize = 8;
/// Tokens on a triangle
pub const TRIANGLE_TOKENS: usize = 11;
/// Minimum tokens on a quadrilateral
pub const QUAD_MIN_TOKENS: usize = 14;
/// Tokens on an optional line
pub const OPTIONAL_LINE_TOKENS: usize = 14;

/// Leading command code of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// 0: comment or meta command
    Meta,
    /// 1: sub-component placement
    Placement,
    /// 2: line segment
    Segment,
    /// 3: triangle
    Triangle,
    /// 4: quadrilateral
    Quad,
    /// 5: optional line
    OptionalLine,
}

impl Command {
    /// Map a numeric code to a command
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Command::Meta),
            1 => Some(Command::Placement),
            2 => Some(Command::Segment),
            3 => Some(Command::Triangle),
            4 => Some(Command::Quad),
            5 => Some(Command::OptionalLine),
            _ => None,
        }
    }

    /// Parse the leading token of a line
    pub fn from_token(token: &str) -> Option<Self> {
        token.parse::<u8>().ok().and_then(Self::from_code)
    }
}

/// Rewrite backslash path separators to forward slashes
pub fn normalize_separators(line: &str) -> Cow<'_, str> {
    if line.contains('\\') {
        Cow::Owned(line.replace('\\', "/"))
    } else {
        Cow::Borrowed(line)
    }
}

/// Where a line came from, for error reporting
#[derive(Debug, Clone, Copy)]
pub struct LineInfo<'a> {
    /// Source label
    pub source: Option<&'a str>,
    /// 1-based line number
    pub number: usize,
    /// Raw line text
    pub raw: &'a str,
    /// State the line is handled in
    pub state: &'a ParserState,
}

impl LineInfo<'_> {
    /// Build an error context for this line
    pub fn context(&self) -> ErrorContext {
        let mut context = ErrorContext::new()
            .line(self.number)
            .content(self.raw.trim())
            .state(format!("{:?}", self.state));
        if let Some(source) = self.source {
            context = context.file(source);
        }
        context
    }
}

fn parse_color(token: &str, info: &LineInfo<'_>) -> Result<ColorCode> {
    parse_color_code(token)
        .ok_or_else(|| Error::malformed(format!("invalid color code '{}'", token), info.context()))
}

fn parse_number(token: &str, info: &LineInfo<'_>) -> Result<f64> {
    let value = token.parse::<f64>().map_err(|_| {
        Error::malformed(
            format!("expected a number, got '{}'", token),
            info.context(),
        )
    })?;
    if !value.is_finite() {
        return Err(Error::malformed(
            format!("number must be finite (got {})", token),
            info.context(),
        ));
    }
    Ok(value)
}

fn parse_numbers<const N: usize>(tokens: &[&str], info: &LineInfo<'_>) -> Result<[f64; N]> {
    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(tokens) {
        *value = parse_number(token, info)?;
    }
    Ok(values)
}

/// Parse a type-1 placement line
pub fn parse_placement(tokens: &[&str], info: &LineInfo<'_>) -> Result<Placement> {
    if tokens.len() < PLACEMENT_MIN_TOKENS {
        return Err(Error::token_count(
            "placement",
            "at least 15",
            tokens.len(),
            info.context()
                .hint("Expected: 1 <color> x y z a b c d e f g h i <file>"),
        ));
    }
    let color = parse_color(tokens[1], info)?;
    let position = parse_numbers::<3>(&tokens[2..5], info)?;
    let rows = parse_numbers::<9>(&tokens[5..14], info)?;
    let name = tokens[14..].join(" ");
    Ok(Placement::from_line_fields(color, position, rows, name))
}

/// Parse a geometry line with `N` points
///
/// `exact` selects between "exactly `expected`" and "at least `expected`"
/// token counts. Extra tokens on a line with a minimum count are ignored.
pub fn parse_element<const N: usize>(
    command: &str,
    tokens: &[&str],
    expected: usize,
    exact: bool,
    info: &LineInfo<'_>,
) -> Result<Element<N>> {
    let count_ok = if exact {
        tokens.len() == expected
    } else {
        tokens.len() >= expected
    };
    if !count_ok {
        let qualifier = if exact { "exactly" } else { "at least" };
        return Err(Error::token_count(
            command,
            &format!("{} {}", qualifier, expected),
            tokens.len(),
            info.context(),
        ));
    }
    let color = parse_color(tokens[1], info)?;
    let mut points = [Point3::origin(); N];
    for (i, point) in points.iter_mut().enumerate() {
        let [x, y, z] = parse_numbers::<3>(&tokens[2 + 3 * i..5 + 3 * i], info)?;
        *point = Point3::new(x, y, z);
    }
    Ok(Element::new(color, points))
}
