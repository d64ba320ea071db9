//! Data structures representing parsed LDraw models

mod core;
mod geometry;

pub use core::{
    BuildingStep, ColorCode, EDGE_COLOR, MAIN_COLOR, ModelStore, NameKind, ParserConfig, PartScope,
    Placement, RotationMode, StepRotation, SubmodelPlan,
};

pub use geometry::{
    BoundingBox, Element, OptionalLine, PartGeometry, Quad, Segment, Triangle,
};
