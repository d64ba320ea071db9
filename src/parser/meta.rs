//! Meta-command dispatch
//!
//! Meta keywords are looked up by the first two tokens jointly before the
//! first token alone, so `ROTSTEP END` is never mistaken for
//! `ROTSTEP <angles>`.

use nalgebra::Vector3;

use crate::color::ColorTable;
use crate::error::Result;
use crate::model::{ModelStore, NameKind, PartScope, RotationMode, StepRotation};

use super::state::{FileType, ParserState, TypeSource};

/// Recognized meta keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKeyword {
    /// `FILE <name>`: start of an embedded file
    File,
    /// `Name: <name>` header
    Name,
    /// `NOFILE`: end of an embedded file
    NoFile,
    /// `STEP`
    Step,
    /// `ROTSTEP <x> <y> <z> [REL|ABS|ADD]`
    RotStep,
    /// `ROTSTEP END`
    RotStepEnd,
    /// `!LDRAW_ORG <type>` header
    LdrawOrg,
    /// `!COLOUR` definition
    Colour,
}

const TWO_TOKEN_KEYWORDS: &[(&str, &str, MetaKeyword)] = &[("ROTSTEP", "END", MetaKeyword::RotStepEnd)];

const ONE_TOKEN_KEYWORDS: &[(&str, MetaKeyword)] = &[
    ("FILE", MetaKeyword::File),
    ("NAME:", MetaKeyword::Name),
    ("NAME", MetaKeyword::Name),
    ("NOFILE", MetaKeyword::NoFile),
    ("STEP", MetaKeyword::Step),
    ("ROTSTEP", MetaKeyword::RotStep),
    ("!LDRAW_ORG", MetaKeyword::LdrawOrg),
    ("!COLOUR", MetaKeyword::Colour),
];

/// Look up the keyword of a meta line
///
/// `tokens` are the tokens after the leading `0`. Returns the keyword and
/// the number of tokens it consumed.
pub fn lookup(tokens: &[&str]) -> Option<(MetaKeyword, usize)> {
    if let [first, second, ..] = tokens {
        let joint = TWO_TOKEN_KEYWORDS.iter().find(|(a, b, _)| {
            first.eq_ignore_ascii_case(a) && second.eq_ignore_ascii_case(b)
        });
        if let Some(&(_, _, keyword)) = joint {
            return Some((keyword, 2));
        }
    }
    let first = tokens.first()?;
    ONE_TOKEN_KEYWORDS
        .iter()
        .find(|(k, _)| first.eq_ignore_ascii_case(k))
        .map(|&(_, keyword)| (keyword, 1))
}

/// Handle the tokens of a meta line (after the leading `0`)
///
/// Returns the next parser state. Unknown meta commands leave the state
/// unchanged.
pub fn handle(
    store: &mut ModelStore,
    colors: &mut ColorTable,
    state: ParserState,
    tokens: &[&str],
) -> Result<ParserState> {
    let Some((keyword, consumed)) = lookup(tokens) else {
        tracing::trace!("Ignoring meta command: {}", tokens.join(" "));
        return Ok(state);
    };
    let args = &tokens[consumed..];

    match keyword {
        MetaKeyword::File | MetaKeyword::Name => {
            if args.is_empty() {
                tracing::warn!("{:?} command without a name", keyword);
                return Ok(state);
            }
            declare(store, state, &args.join(" "), keyword == MetaKeyword::File)
        }
        MetaKeyword::NoFile => Ok(state.cleared()),
        MetaKeyword::Step => {
            close_step(store, &state, None);
            Ok(state)
        }
        MetaKeyword::RotStepEnd => {
            close_step(store, &state, Some(StepRotation::Reset));
            Ok(state)
        }
        MetaKeyword::RotStep => {
            let rotation = parse_rotation(args);
            if rotation.is_none() {
                tracing::warn!("ROTSTEP without valid angles: {}", args.join(" "));
            }
            close_step(store, &state, rotation);
            Ok(state)
        }
        MetaKeyword::LdrawOrg => {
            let Some(value) = args.first() else {
                return Ok(state);
            };
            match FileType::from_header(value) {
                Some(file_type) => Ok(state.with_file_type(file_type, TypeSource::Header)),
                None => {
                    tracing::debug!("Unrecognized !LDRAW_ORG type '{}'", value);
                    Ok(state)
                }
            }
        }
        MetaKeyword::Colour => {
            colors.apply(args);
            Ok(state)
        }
    }
}

// Switch context to `name`, registering it on first sight. Re-declaring an
// existing name keeps the existing entry.
fn declare(
    store: &mut ModelStore,
    state: ParserState,
    name: &str,
    is_file_command: bool,
) -> Result<ParserState> {
    if !is_file_command {
        let current = state.active_part.as_deref().or(state.active_model.as_deref());
        if current.is_some_and(|c| c.eq_ignore_ascii_case(name)) {
            return Ok(state);
        }
    }

    let infer = is_file_command || state.may_infer_type();
    match NameKind::of(name) {
        Some(NameKind::Part) => {
            store.register_part(name, PartScope::TopLevel)?;
            if let Some(part) = store.part_mut(name) {
                part.defined = true;
            }
            tracing::debug!(part = name, "Entering part");
            let next = state.with_part(name);
            Ok(if infer {
                next.with_file_type(FileType::Part, TypeSource::FileName)
            } else {
                next
            })
        }
        Some(NameKind::Model) => {
            store.register_model(name)?;
            tracing::debug!(model = name, "Entering model");
            let next = state.with_model(name);
            Ok(if infer {
                next.with_file_type(FileType::Model, TypeSource::FileName)
            } else {
                next
            })
        }
        None => {
            tracing::warn!("Ignoring declaration of '{}' with unknown extension", name);
            Ok(state)
        }
    }
}

fn close_step(store: &mut ModelStore, state: &ParserState, rotation: Option<StepRotation>) {
    let Some(plan) = state
        .active_model
        .as_deref()
        .and_then(|name| store.model_mut(name))
    else {
        return;
    };
    plan.close_step(rotation);
    tracing::trace!(model = %plan.name, steps = plan.steps.len(), "Closed building step");
}

fn parse_rotation(args: &[&str]) -> Option<StepRotation> {
    let [x, y, z, rest @ ..] = args else {
        return None;
    };
    let angles = Vector3::new(
        x.parse::<f64>().ok()?,
        y.parse::<f64>().ok()?,
        z.parse::<f64>().ok()?,
    );
    let mode = match rest.first().map(|m| m.to_ascii_uppercase()).as_deref() {
        None | Some("REL") => RotationMode::Relative,
        Some("ABS") => RotationMode::Absolute,
        Some("ADD") => RotationMode::Additive,
        Some(_) => return None,
    };
    Some(StepRotation::Set { angles, mode })
}
