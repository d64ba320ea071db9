//! Recursive geometry composition
//!
//! [`populate_geometry`] runs in two phases. Discovery walks the nested
//! references of the requested parts, loading every part that has no parsed
//! definition yet through the configured [`PartResolver`](crate::PartResolver).
//! Composition then folds each part's nested geometry into it through the
//! placement transforms, children first, so every element of a populated part
//! is expressed in that part's own frame.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;
use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::model::{ModelStore, PartGeometry, PartScope, Placement};
use crate::parser::{Parser, ParserState};
use crate::resolver::normalize_name;
use crate::transform::Affine;

/// Load and fold the geometry of `names`, or of every registered part
///
/// Already populated parts are left untouched, so calling this twice yields
/// the same geometry as calling it once. Names of submodels are skipped.
///
/// The configured geometry scale is applied exactly once per part, when it
/// is populated: its own elements are scaled and children are folded with
/// scaled placement offsets.
///
/// Part references are assumed to be acyclic. A part whose nested references
/// lead back to itself, and every part above it, is left unpopulated with
/// only its own elements, and a warning is logged.
///
/// # Errors
///
/// [`Error::UnresolvedPartFile`] when a part without a definition cannot be
/// loaded, plus any error raised while parsing a loaded file.
///
/// # Example
///
/// ```
/// use ldraw_plan::{MemoryResolver, Parser, ParserConfig, populate_geometry};
/// use std::sync::Arc;
///
/// # fn main() -> ldraw_plan::Result<()> {
/// let resolver = MemoryResolver::new()
///     .with_source("tri.dat", "0 Name: tri.dat\n3 4 0 0 0 1 0 0 0 1 0\n");
/// let mut parser = Parser::new(ParserConfig::new().with_resolver(Arc::new(resolver)));
///
/// let mut store = parser.parse("0 FILE main.ldr\n1 16 5 0 0 1 0 0 0 1 0 0 0 1 tri.dat\n")?;
/// populate_geometry(&mut store, &mut parser, None)?;
///
/// let part = store.part("tri.dat").unwrap();
/// assert!(part.is_populated());
/// assert_eq!(part.triangles.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn populate_geometry(
    store: &mut ModelStore,
    parser: &mut Parser,
    names: Option<&[&str]>,
) -> Result<()> {
    let seeds: Vec<String> = match names {
        Some(names) => names.iter().map(|n| n.to_string()).collect(),
        None => store.part_names(),
    };

    let explored = discover(store, parser, seeds)?;
    tracing::debug!(parts = explored.len(), "Discovered part definitions");

    let scale = parser.config().geometry_scale();
    let mut in_progress = HashSet::new();
    for name in &explored {
        compose_part(store, name, scale, &mut in_progress)?;
    }
    Ok(())
}

// Phase 1: load every reachable part that lacks a definition. Returns the
// normalized names of the explored parts in discovery order.
fn discover(
    store: &mut ModelStore,
    parser: &mut Parser,
    seeds: Vec<String>,
) -> Result<IndexSet<String>> {
    let resolver = parser.config().resolver().cloned();
    let mut frontier: VecDeque<String> = seeds.into();
    let mut explored = IndexSet::new();

    while let Some(name) = frontier.pop_front() {
        let key = normalize_name(&name);
        if explored.contains(&key) || store.is_model(&name) {
            continue;
        }

        let needs_load = store.part(&name).is_none_or(|part| !part.defined);
        if needs_load {
            let source = match &resolver {
                Some(resolver) => resolver.load(&name)?,
                None => None,
            };
            let Some(source) = source else {
                return Err(Error::UnresolvedPartFile(name));
            };

            store.register_part(&name, PartScope::TopLevel)?;
            parser.parse_source(store, &source, ParserState::for_part(&name), Some(&name))?;
            tracing::debug!(part = %name, "Loaded part definition");
        }

        if let Some(part) = store.part(&name) {
            frontier.extend(
                part.nested
                    .iter()
                    .filter(|p| !explored.contains(&normalize_name(&p.name)))
                    .map(|p| p.name.clone()),
            );
        }
        explored.insert(key);
    }

    Ok(explored)
}

// Phase 2: fold nested geometry into `name`, composing every child first.
// Returns whether the part is populated afterwards.
fn compose_part(
    store: &mut ModelStore,
    name: &str,
    scale: f64,
    in_progress: &mut HashSet<String>,
) -> Result<bool> {
    let nested = match store.part(name) {
        Some(part) if part.is_populated() => return Ok(true),
        Some(part) => part.nested.clone(),
        None => return Err(Error::UnresolvedPartFile(name.to_string())),
    };
    let key = normalize_name(name);
    if !in_progress.insert(key.clone()) {
        tracing::warn!(part = name, "Cyclic part reference, part left unpopulated");
        return Ok(false);
    }

    let mut complete = true;
    for placement in &nested {
        if store.is_model(&placement.name) {
            continue;
        }
        complete &= compose_part(store, &placement.name, scale, in_progress)?;
    }
    in_progress.remove(&key);
    if !complete {
        return Ok(false);
    }

    let mut folded = PartGeometry::new(name);
    for placement in &nested {
        if let Some(child) = store.part(&placement.name) {
            let map = fold_map(placement, scale);
            folded.extend_mapped(child, |p| map.apply_point(p));
        }
    }

    if let Some(part) = store.part_mut(name) {
        if scale != 1.0 {
            part.map_points(|p| Point3::from(p.coords * scale));
        }
        part.absorb(folded);
        part.mark_populated();
        tracing::trace!(part = name, elements = part.element_count(), "Composed part");
    }
    Ok(true)
}

// Child geometry is already scaled, so only the placement offset is.
fn fold_map(placement: &Placement, scale: f64) -> Affine {
    let local = placement.local();
    Affine::new(local.linear, local.translation * scale)
}
