//! Color table
//!
//! `0 !COLOUR` meta lines define color codes. The parser forwards them to the
//! [`ColorTable`] owned by its [`Parser`](crate::Parser); an LDConfig file can
//! also be loaded up front with [`ColorTable::from_ldconfig`]. Malformed
//! definitions are logged and ignored.

use indexmap::IndexMap;

use crate::model::{ColorCode, EDGE_COLOR, MAIN_COLOR};

/// Lowest code of the direct-color range `0x2RRGGBB`
const DIRECT_COLOR_BASE: ColorCode = 0x200_0000;

/// An RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Create a color from components
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `0xRRGGBB`
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text
            .strip_prefix('#')
            .or_else(|| text.strip_prefix("0x"))
            .or_else(|| text.strip_prefix("0X"))?;
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::from_u24(value))
    }

    fn from_u24(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// The RGB value of a direct color code, if `code` is one
    pub fn from_direct(code: ColorCode) -> Option<Self> {
        is_direct_color(code).then(|| Self::from_u24(code & 0xFF_FFFF))
    }
}

/// Whether `code` is in the direct-color range `0x2RRGGBB`
pub fn is_direct_color(code: ColorCode) -> bool {
    (DIRECT_COLOR_BASE..DIRECT_COLOR_BASE + 0x100_0000).contains(&code)
}

/// Parse a color code token: decimal, or hexadecimal with a `0x`/`#` prefix
pub fn parse_color_code(token: &str) -> Option<ColorCode> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .or_else(|| token.strip_prefix('#'))
    {
        return ColorCode::from_str_radix(hex, 16).ok();
    }
    token.parse().ok()
}

/// One `!COLOUR` definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDefinition {
    /// Color name, e.g. `Bright_Red`
    pub name: String,
    /// Color code
    pub code: ColorCode,
    /// Face color
    pub value: Rgb,
    /// Edge color
    pub edge: Rgb,
    /// Transparency, 0 (clear) to 255 (opaque)
    pub alpha: Option<u8>,
    /// Glow brightness
    pub luminance: Option<u8>,
    /// Finish keyword (`CHROME`, `PEARLESCENT`, `RUBBER`, `MATTE_METALLIC`, `METAL`, `MATERIAL`)
    pub finish: Option<String>,
}

const FINISHES: &[&str] = &[
    "CHROME",
    "PEARLESCENT",
    "RUBBER",
    "MATTE_METALLIC",
    "METAL",
    "MATERIAL",
];

/// Color definitions keyed by code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    colors: IndexMap<ColorCode, ColorDefinition>,
}

impl ColorTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from LDConfig-style source text
    pub fn from_ldconfig(source: &str) -> Self {
        let mut table = Self::new();
        for line in source.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if let ["0", "!COLOUR", rest @ ..] = tokens.as_slice() {
                table.apply(rest);
            }
        }
        table
    }

    /// Number of defined colors
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether no colors are defined
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Look up a definition
    pub fn get(&self, code: ColorCode) -> Option<&ColorDefinition> {
        self.colors.get(&code)
    }

    /// Whether a code can be drawn without a definition lookup failing
    ///
    /// Main and edge color, direct colors and defined codes are all known.
    pub fn is_known(&self, code: ColorCode) -> bool {
        code == MAIN_COLOR
            || code == EDGE_COLOR
            || is_direct_color(code)
            || self.colors.contains_key(&code)
    }

    /// Add or replace a definition, returning the previous one
    pub fn define(&mut self, definition: ColorDefinition) -> Option<ColorDefinition> {
        self.colors.insert(definition.code, definition)
    }

    /// Apply the tokens following `0 !COLOUR`
    ///
    /// Returns the defined code, or `None` if the definition was malformed
    /// and ignored.
    pub fn apply(&mut self, tokens: &[&str]) -> Option<ColorCode> {
        match self.parse_definition(tokens) {
            Ok(definition) => {
                let code = definition.code;
                tracing::trace!(code, name = %definition.name, "Defined color");
                self.define(definition);
                Some(code)
            }
            Err(reason) => {
                tracing::warn!("Ignoring malformed !COLOUR definition ({}): {}", reason, tokens.join(" "));
                None
            }
        }
    }

    fn parse_definition(&self, tokens: &[&str]) -> Result<ColorDefinition, String> {
        let (name, rest) = tokens
            .split_first()
            .ok_or_else(|| "missing name".to_string())?;

        let mut code = None;
        let mut value = None;
        let mut edge = None;
        let mut alpha = None;
        let mut luminance = None;
        let mut finish = None;

        let mut iter = rest.iter();
        while let Some(&keyword) = iter.next() {
            match keyword {
                "CODE" => {
                    let token = iter.next().ok_or("CODE without value")?;
                    code = Some(token.parse::<ColorCode>().map_err(|_| format!("bad CODE '{}'", token))?);
                }
                "VALUE" => {
                    let token = iter.next().ok_or("VALUE without value")?;
                    value = Some(Rgb::parse_hex(token).ok_or_else(|| format!("bad VALUE '{}'", token))?);
                }
                "EDGE" => {
                    let token = iter.next().ok_or("EDGE without value")?;
                    edge = Some(self.parse_edge(token)?);
                }
                "ALPHA" => {
                    let token = iter.next().ok_or("ALPHA without value")?;
                    alpha = Some(token.parse::<u8>().map_err(|_| format!("bad ALPHA '{}'", token))?);
                }
                "LUMINANCE" => {
                    let token = iter.next().ok_or("LUMINANCE without value")?;
                    luminance = Some(
                        token
                            .parse::<u8>()
                            .map_err(|_| format!("bad LUMINANCE '{}'", token))?,
                    );
                }
                // Finish parameters (e.g. MATERIAL GLITTER VALUE ...) follow the
                // keyword and are not interpreted
                f if FINISHES.contains(&f) => {
                    finish = Some(f.to_string());
                    break;
                }
                other => return Err(format!("unexpected token '{}'", other)),
            }
        }

        Ok(ColorDefinition {
            name: name.to_string(),
            code: code.ok_or("missing CODE")?,
            value: value.ok_or("missing VALUE")?,
            edge: edge.ok_or("missing EDGE")?,
            alpha,
            luminance,
            finish,
        })
    }

    // EDGE is either a hex color or the code of an already defined color
    fn parse_edge(&self, token: &str) -> Result<Rgb, String> {
        if let Some(rgb) = Rgb::parse_hex(token) {
            return Ok(rgb);
        }
        token
            .parse::<ColorCode>()
            .ok()
            .and_then(|code| self.get(code))
            .map(|def| def.value)
            .ok_or_else(|| format!("bad EDGE '{}'", token))
    }
}
