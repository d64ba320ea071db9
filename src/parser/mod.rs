//! Single-pass LDraw line parser
//!
//! A [`Parser`] owns the [`ParserConfig`] and the [`ColorTable`] context and
//! feeds every line of a source through one handler, threading a
//! [`ParserState`] value from line to line. The first failing line aborts the
//! parse; its error carries the raw line and the state it was handled in.

mod core;
mod meta;
mod state;

use crate::color::ColorTable;
use crate::error::{Error, Result};
use crate::model::{
    ColorCode, ModelStore, NameKind, ParserConfig, PartGeometry, PartScope, Placement,
};

pub use self::core::{
    Command, LineInfo, OPTIONAL_LINE_TOKENS, PLACEMENT_MIN_TOKENS, QUAD_MIN_TOKENS,
    SEGMENT_TOKENS, TRIANGLE_TOKENS, normalize_separators, parse_element, parse_placement,
};
pub use meta::{MetaKeyword, lookup as lookup_meta};
pub use state::{FileType, ParserState, TypeSource};

/// Parse a source into a new model store with the default configuration
pub fn parse(source: &str) -> Result<ModelStore> {
    Parser::default().parse(source)
}

/// Parse a source into a new model store with a custom configuration
pub fn parse_with_config(source: &str, config: ParserConfig) -> Result<ModelStore> {
    Parser::new(config).parse(source)
}

/// Parse a source into an existing store, starting from `initial_state`
///
/// Returns the state after the last line.
pub fn parse_into(
    store: &mut ModelStore,
    source: &str,
    initial_state: Option<ParserState>,
) -> Result<ParserState> {
    Parser::default().parse_into(store, source, initial_state.unwrap_or_default())
}

/// Parsing context: configuration plus the color table built while parsing
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
    colors: ColorTable,
}

impl Parser {
    /// Create a parser with an empty color table
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            colors: ColorTable::new(),
        }
    }

    /// Start from an existing color table, e.g. one loaded from LDConfig
    pub fn with_colors(mut self, colors: ColorTable) -> Self {
        self.colors = colors;
        self
    }

    /// The configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The color table, including definitions parsed so far
    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Parse a source into a new model store
    ///
    /// # Example
    ///
    /// ```
    /// use ldraw_plan::Parser;
    ///
    /// # fn main() -> ldraw_plan::Result<()> {
    /// let source = "0 FILE main.ldr\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n0 STEP\n";
    /// let store = Parser::default().parse(source)?;
    /// assert_eq!(store.model("main.ldr").unwrap().steps.len(), 2);
    /// assert!(store.is_part("3001.dat"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(&mut self, source: &str) -> Result<ModelStore> {
        let mut store = ModelStore::new();
        self.parse_into(&mut store, source, ParserState::new())?;
        Ok(store)
    }

    /// Parse a source into an existing store, starting from `state`
    ///
    /// An active model or part named by `state` is registered first if the
    /// store does not know it yet, and an active part counts as defined by
    /// `source`. Returns the state after the last line.
    pub fn parse_into(
        &mut self,
        store: &mut ModelStore,
        source: &str,
        state: ParserState,
    ) -> Result<ParserState> {
        let label = self.config.source_name().map(str::to_owned);
        self.parse_source(store, source, state, label.as_deref())
    }

    pub(crate) fn parse_source(
        &mut self,
        store: &mut ModelStore,
        source: &str,
        mut state: ParserState,
        label: Option<&str>,
    ) -> Result<ParserState> {
        if let Some(model) = state.active_model.as_deref() {
            store.register_model(model)?;
        }
        if let Some(name) = state.active_part.as_deref() {
            store.register_part(name, PartScope::TopLevel)?;
            if let Some(part) = store.part_mut(name) {
                part.defined = true;
            }
        }

        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        for (index, raw) in source.lines().enumerate() {
            let line = normalize_separators(raw);
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let info_state = state.clone();
            let info = LineInfo {
                source: label,
                number: index + 1,
                raw,
                state: &info_state,
            };
            state = self.handle_line(store, state, &tokens, &info)?;
        }
        Ok(state)
    }

    fn handle_line(
        &mut self,
        store: &mut ModelStore,
        state: ParserState,
        tokens: &[&str],
        info: &LineInfo<'_>,
    ) -> Result<ParserState> {
        let Some(command) = Command::from_token(tokens[0]) else {
            if self.config.is_strict() {
                return Err(Error::UnknownCommandCode {
                    code: tokens[0].to_string(),
                    context: info.context(),
                });
            }
            tracing::warn!(
                line = info.number,
                "Skipping line with unknown command code '{}'",
                tokens[0]
            );
            return Ok(state);
        };

        match command {
            Command::Meta => meta::handle(store, &mut self.colors, state, &tokens[1..]),
            Command::Placement => {
                let placement = parse_placement(tokens, info)?;
                self.check_color(placement.color, info);
                route_placement(store, &state, placement, info)?;
                Ok(state)
            }
            Command::Segment => {
                let element = parse_element::<2>("line", tokens, SEGMENT_TOKENS, true, info)?;
                self.check_color(element.color, info);
                active_part(store, &state, info)?.segments.push(element);
                Ok(state)
            }
            Command::Triangle => {
                let element = parse_element::<3>("triangle", tokens, TRIANGLE_TOKENS, true, info)?;
                self.check_color(element.color, info);
                active_part(store, &state, info)?.triangles.push(element);
                Ok(state)
            }
            Command::Quad => {
                let element =
                    parse_element::<4>("quadrilateral", tokens, QUAD_MIN_TOKENS, false, info)?;
                self.check_color(element.color, info);
                active_part(store, &state, info)?.quads.push(element);
                Ok(state)
            }
            Command::OptionalLine => {
                let element = parse_element::<4>(
                    "optional line",
                    tokens,
                    OPTIONAL_LINE_TOKENS,
                    true,
                    info,
                )?;
                self.check_color(element.color, info);
                active_part(store, &state, info)?.optional_lines.push(element);
                Ok(state)
            }
        }
    }

    fn check_color(&self, code: ColorCode, info: &LineInfo<'_>) {
        if !self.colors.is_empty() && !self.colors.is_known(code) {
            tracing::debug!(line = info.number, code, "Unresolved color code");
        }
    }
}

fn active_part<'s>(
    store: &'s mut ModelStore,
    state: &ParserState,
    info: &LineInfo<'_>,
) -> Result<&'s mut PartGeometry> {
    state
        .active_part
        .as_deref()
        .and_then(|name| store.part_mut(name))
        .ok_or_else(|| Error::NoActivePart {
            context: info
                .context()
                .hint("Declare the part first with 0 FILE <name>.dat"),
        })
}

// Append a placement to the active model's current step (model files) or the
// active part's nested list (everything else), then record the reference.
// Submodel names are registered only by their own declaration.
fn route_placement(
    store: &mut ModelStore,
    state: &ParserState,
    placement: Placement,
    info: &LineInfo<'_>,
) -> Result<()> {
    let target = placement.name.clone();

    if state.routes_to_model() {
        let plan = state
            .active_model
            .as_deref()
            .and_then(|name| store.model_mut(name))
            .ok_or_else(|| Error::NoActiveModel {
                context: info
                    .context()
                    .hint("Declare the model first with 0 FILE <name>.ldr"),
            })?;
        plan.current_step_mut().placements.push(placement);
    } else {
        active_part(store, state, info)?.nested.push(placement);
    }

    register_reference(store, state, &target)
}

fn register_reference(store: &mut ModelStore, state: &ParserState, name: &str) -> Result<()> {
    if store.is_model(name) || NameKind::of(name) == Some(NameKind::Model) {
        return Ok(());
    }
    let scope = if state.active_part.is_some() {
        PartScope::Nested
    } else {
        PartScope::TopLevel
    };
    store.reference_part(name, scope)
}
