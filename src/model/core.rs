//! Core LDraw model types and the model store

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::{Error, Result};
use crate::resolver::{PartResolver, normalize_name};
use crate::transform::Affine;

use super::geometry::PartGeometry;

/// LDraw color code
///
/// Codes below 0x2000000 index the color table; codes of the form
/// `0x2RRGGBB` are direct RGB colors.
pub type ColorCode = u32;

/// The "main color" code, inherited from the enclosing placement
pub const MAIN_COLOR: ColorCode = 16;

/// The "edge color" code, derived from the enclosing placement's color
pub const EDGE_COLOR: ColorCode = 24;

/// How a name is classified by its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    /// `.ldr` / `.mpd`: a decomposable submodel
    Model,
    /// `.dat`: a geometry-bearing part
    Part,
}

impl NameKind {
    /// Classify a name by its extension, case-insensitively
    pub fn of(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "ldr" | "mpd" => Some(NameKind::Model),
            "dat" => Some(NameKind::Part),
            _ => None,
        }
    }
}

/// Which part map a part lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartScope {
    /// Placed directly by a submodel, or declared at file level
    TopLevel,
    /// Only ever referenced from inside another part
    Nested,
}

/// One positioned, rotated instance of a part or submodel
///
/// The linear part is stored in row-vector convention: a local point `p`
/// maps to `p · linear + position`. This is the transpose of the row-major
/// `a b c d e f g h i` block written on the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Color code the instance is drawn with
    pub color: ColorCode,
    /// Position of the instance origin in the parent frame
    pub position: Vector3<f64>,
    /// Linear map, row-vector convention
    pub linear: Matrix3<f64>,
    /// Referenced part or submodel name
    pub name: String,
}

impl Placement {
    /// Create a placement from its stored parts
    pub fn new(
        color: ColorCode,
        position: Vector3<f64>,
        linear: Matrix3<f64>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            color,
            position,
            linear,
            name: name.into(),
        }
    }

    /// A placement at the origin with no rotation
    pub fn identity(color: ColorCode, name: impl Into<String>) -> Self {
        Self::new(color, Vector3::zeros(), Matrix3::identity(), name)
    }

    /// Create a placement from the fields as written on a type-1 line
    ///
    /// `rows` is the row-major `a b c d e f g h i` block; it is transposed
    /// into the stored linear map.
    pub fn from_line_fields(
        color: ColorCode,
        position: [f64; 3],
        rows: [f64; 9],
        name: impl Into<String>,
    ) -> Self {
        Self::new(
            color,
            Vector3::from(position),
            Matrix3::from_row_slice(&rows).transpose(),
            name,
        )
    }

    /// The local transform in column-vector convention
    pub fn local(&self) -> Affine {
        Affine::new(self.linear.transpose(), self.position)
    }

    /// Replace the local transform
    pub fn set_local(&mut self, local: &Affine) {
        self.linear = local.linear.transpose();
        self.position = local.translation;
    }

    /// Map a point from the referenced part's frame into the parent frame
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.local().apply_point(point)
    }
}

/// Rotation mode of a `ROTSTEP` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    /// Relative to the default view (`REL`, the default)
    Relative,
    /// Absolute angles (`ABS`)
    Absolute,
    /// Added to the previous step's rotation (`ADD`)
    Additive,
}

/// View rotation recorded when a step is closed by `ROTSTEP`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepRotation {
    /// `ROTSTEP x y z [mode]`
    Set {
        /// Rotation angles in degrees about x, y, z
        angles: Vector3<f64>,
        /// How the angles combine with earlier rotations
        mode: RotationMode,
    },
    /// `ROTSTEP END`: return to the default view
    Reset,
}

/// An ordered group of placements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildingStep {
    /// Placements in file order
    pub placements: Vec<Placement>,
    /// View rotation set by the `ROTSTEP` that closed this step
    pub rotation: Option<StepRotation>,
}

impl BuildingStep {
    /// Create an empty step
    pub fn new() -> Self {
        Self::default()
    }
}

/// A named, step-decomposable build target
#[derive(Debug, Clone, PartialEq)]
pub struct SubmodelPlan {
    /// Model name
    pub name: String,
    /// Steps in order; never empty
    pub steps: Vec<BuildingStep>,
}

impl SubmodelPlan {
    /// Create a plan with one open, empty step
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: vec![BuildingStep::new()],
        }
    }

    /// The step placements are currently appended to
    pub fn current_step_mut(&mut self) -> &mut BuildingStep {
        if self.steps.is_empty() {
            self.steps.push(BuildingStep::new());
        }
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// Close the current step and open a new empty one
    pub fn close_step(&mut self, rotation: Option<StepRotation>) {
        self.current_step_mut().rotation = rotation;
        self.steps.push(BuildingStep::new());
    }

    /// All placements across all steps, in order
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.steps.iter().flat_map(|step| step.placements.iter())
    }
}

/// Root aggregate built while parsing
///
/// A name lives in at most one of the three maps. Parts referenced only from
/// inside other parts live in `nested_parts`; everything else in `parts`.
///
/// Maps are keyed by [`normalize_name`], so lookups ignore case and path
/// separator style. The spelling first seen is kept in
/// [`SubmodelPlan::name`] and [`PartGeometry::name`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStore {
    /// Submodels by normalized name, in declaration order
    pub models: IndexMap<String, SubmodelPlan>,
    /// Top-level parts by normalized name
    pub parts: IndexMap<String, PartGeometry>,
    /// Nested-only parts by normalized name
    pub nested_parts: IndexMap<String, PartGeometry>,
    model_placed: IndexSet<String>,
}

impl ModelStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is registered in any map
    pub fn contains(&self, name: &str) -> bool {
        self.is_model(name) || self.is_part(name)
    }

    /// Whether `name` is a submodel
    pub fn is_model(&self, name: &str) -> bool {
        self.models.contains_key(&normalize_name(name))
    }

    /// Whether `name` is a part of either scope
    pub fn is_part(&self, name: &str) -> bool {
        self.scope_of(name).is_some()
    }

    /// Scope of a registered part
    pub fn scope_of(&self, name: &str) -> Option<PartScope> {
        let key = normalize_name(name);
        if self.parts.contains_key(&key) {
            Some(PartScope::TopLevel)
        } else if self.nested_parts.contains_key(&key) {
            Some(PartScope::Nested)
        } else {
            None
        }
    }

    /// Look up a submodel
    pub fn model(&self, name: &str) -> Option<&SubmodelPlan> {
        self.models.get(&normalize_name(name))
    }

    /// Look up a submodel mutably
    pub fn model_mut(&mut self, name: &str) -> Option<&mut SubmodelPlan> {
        self.models.get_mut(&normalize_name(name))
    }

    /// The first declared submodel, conventionally the main model of a file
    pub fn main_model(&self) -> Option<&SubmodelPlan> {
        self.models.values().next()
    }

    /// Look up a part in either scope
    pub fn part(&self, name: &str) -> Option<&PartGeometry> {
        let key = normalize_name(name);
        self.parts.get(&key).or_else(|| self.nested_parts.get(&key))
    }

    /// Look up a part in either scope mutably
    pub fn part_mut(&mut self, name: &str) -> Option<&mut PartGeometry> {
        let key = normalize_name(name);
        match self.parts.get_mut(&key) {
            Some(part) => Some(part),
            None => self.nested_parts.get_mut(&key),
        }
    }

    /// Names of all parts as first spelled, top-level first
    pub fn part_names(&self) -> Vec<String> {
        self.parts
            .values()
            .chain(self.nested_parts.values())
            .map(|part| part.name.clone())
            .collect()
    }

    /// Insert a new submodel; the name must not be registered yet
    pub fn insert_model(&mut self, plan: SubmodelPlan) -> Result<()> {
        if self.contains(&plan.name) {
            return Err(Error::DuplicateRegistration(plan.name));
        }
        self.models.insert(normalize_name(&plan.name), plan);
        Ok(())
    }

    /// Insert a new part; the name must not be registered yet
    pub fn insert_part(&mut self, part: PartGeometry, scope: PartScope) -> Result<()> {
        if self.contains(&part.name) {
            return Err(Error::DuplicateRegistration(part.name));
        }
        let map = match scope {
            PartScope::TopLevel => &mut self.parts,
            PartScope::Nested => &mut self.nested_parts,
        };
        map.insert(normalize_name(&part.name), part);
        Ok(())
    }

    /// Register a submodel unless it already exists
    ///
    /// Returns `true` when a new plan was created. Fails when the name is
    /// already a part.
    pub fn register_model(&mut self, name: &str) -> Result<bool> {
        if self.is_model(name) {
            return Ok(false);
        }
        self.insert_model(SubmodelPlan::new(name))?;
        Ok(true)
    }

    /// Register a part unless it already exists in either scope
    ///
    /// Returns `true` when a new part was created. Fails when the name is
    /// already a submodel.
    pub fn register_part(&mut self, name: &str, scope: PartScope) -> Result<bool> {
        if self.is_part(name) {
            return Ok(false);
        }
        self.insert_part(PartGeometry::new(name), scope)?;
        Ok(true)
    }

    /// Record a placement of part `name` made from `scope`
    ///
    /// `TopLevel` means placed by a submodel, `Nested` placed from inside
    /// another part. A part placed by any submodel is top-level from then on.
    /// Otherwise a nested reference makes it nested-only, even when its
    /// definition was declared earlier. Unknown names are registered.
    pub fn reference_part(&mut self, name: &str, scope: PartScope) -> Result<()> {
        let key = normalize_name(name);
        let moved = match scope {
            PartScope::TopLevel => {
                self.model_placed.insert(key.clone());
                move_entry(&mut self.nested_parts, &mut self.parts, key)
            }
            PartScope::Nested if !self.model_placed.contains(&key) => {
                move_entry(&mut self.parts, &mut self.nested_parts, key)
            }
            PartScope::Nested => false,
        };
        if !moved {
            self.register_part(name, scope)?;
        }
        Ok(())
    }
}

fn move_entry(
    from: &mut IndexMap<String, PartGeometry>,
    to: &mut IndexMap<String, PartGeometry>,
    key: String,
) -> bool {
    match from.shift_remove(&key) {
        Some(part) => {
            to.insert(key, part);
            true
        }
        None => false,
    }
}

/// Configuration for parsing and geometry composition
#[derive(Clone)]
pub struct ParserConfig {
    strict: bool,
    resolver: Option<Arc<dyn PartResolver>>,
    geometry_scale: f64,
    source_name: Option<String>,
}

impl ParserConfig {
    /// Lenient parsing, no resolver, unit geometry scale
    pub fn new() -> Self {
        Self {
            strict: false,
            resolver: None,
            geometry_scale: 1.0,
            source_name: None,
        }
    }

    /// Treat unknown command codes as errors instead of skipping them
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolver used to load part definitions during geometry composition
    ///
    /// # Example
    ///
    /// ```
    /// use ldraw_plan::{MemoryResolver, ParserConfig};
    /// use std::sync::Arc;
    ///
    /// let resolver = MemoryResolver::new().with_source("stud.dat", "0 Name: stud.dat\n");
    /// let config = ParserConfig::new().with_resolver(Arc::new(resolver));
    /// assert!(config.resolver().is_some());
    /// ```
    pub fn with_resolver(mut self, resolver: Arc<dyn PartResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Scale applied once to every part as it is populated
    ///
    /// A populated part is expressed entirely in scaled units: its own
    /// elements are scaled and nested geometry is folded with scaled
    /// placement offsets.
    pub fn with_geometry_scale(mut self, scale: f64) -> Self {
        self.geometry_scale = scale;
        self
    }

    /// Label used in error context for the main source
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Whether unknown command codes are errors
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The configured resolver, if any
    pub fn resolver(&self) -> Option<&Arc<dyn PartResolver>> {
        self.resolver.as_ref()
    }

    /// Scale applied to populated geometry
    pub fn geometry_scale(&self) -> f64 {
        self.geometry_scale
    }

    /// Label of the main source
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserConfig")
            .field("strict", &self.strict)
            .field("has_resolver", &self.resolver.is_some())
            .field("geometry_scale", &self.geometry_scale)
            .field("source_name", &self.source_name)
            .finish()
    }
}
