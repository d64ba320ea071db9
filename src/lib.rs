//! # ldraw-plan
//!
//! A pure Rust library for parsing LDraw model files and deriving build
//! schedules from them.
//!
//! LDraw files are line oriented: every line starts with a command code
//! (meta command, placement, or one of four geometric primitives). A single
//! `.mpd` file may embed several submodels and parts. This crate parses them
//! into a [`ModelStore`] of submodels (ordered building steps of placements)
//! and parts (geometry, possibly composed of nested parts).
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Single-pass line parser with strict or lenient handling of unknown commands
//! - On-demand loading of part definitions from an LDraw library
//! - Recursive folding of nested part geometry into each part's frame
//! - Tree-shaped build schedules with shared submodels expanded per placement
//! - Coordinate rebasing of a whole store under an affine map
//!
//! ## Example
//!
//! ```
//! use ldraw_plan::{ModelStore, build_schedule, extract_single_model};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ModelStore::from_source(
//!     "0 FILE house.ldr\n\
//!      1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n\
//!      0 STEP\n\
//!      1 16 0 -24 0 1 0 0 0 1 0 0 0 1 roof.ldr\n\
//!      0 FILE roof.ldr\n\
//!      1 4 0 0 0 1 0 0 0 1 0 0 0 1 3039.dat\n",
//! )?;
//! println!("Model contains {} submodels", store.models.len());
//!
//! let schedule = build_schedule(&store)?;
//! let house = extract_single_model(&schedule, "house.ldr")?;
//! for id in house.graph.build_order() {
//!     println!("{}", house.graph.node(id).unwrap());
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod color;
pub mod compose;
pub mod error;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod schedule;
pub mod transform;

pub use color::{ColorDefinition, ColorTable, Rgb};
pub use compose::populate_geometry;
pub use error::{Error, ErrorContext, Result};
pub use model::{
    BoundingBox, BuildingStep, ColorCode, EDGE_COLOR, Element, MAIN_COLOR, ModelStore, NameKind,
    OptionalLine, ParserConfig, PartGeometry, PartScope, Placement, Quad, RotationMode, Segment,
    StepRotation, SubmodelPlan, Triangle,
};
pub use parser::{FileType, Parser, ParserState, TypeSource, parse, parse_into, parse_with_config};
pub use resolver::{LibraryResolver, MemoryResolver, PartResolver};
pub use schedule::{
    DuplicateIds, NodeId, Schedule, ScheduleGraph, ScheduleNode, build_assembly_graph,
    build_schedule, build_step_graph, extract_single_model,
};
pub use transform::{Affine, transform_coordinates};

use std::io::Read;
use std::path::Path;

impl ModelStore {
    /// Parse LDraw source text with the default configuration
    pub fn from_source(source: &str) -> Result<Self> {
        parser::parse(source)
    }

    /// Parse LDraw source text with a custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use ldraw_plan::{Error, ModelStore, ParserConfig};
    ///
    /// let config = ParserConfig::new().strict(true);
    /// let result = ModelStore::from_source_with_config("9 unknown\n", config);
    /// assert!(matches!(result, Err(Error::UnknownCommandCode { .. })));
    /// ```
    pub fn from_source_with_config(source: &str, config: ParserConfig) -> Result<Self> {
        parser::parse_with_config(source, config)
    }

    /// Parse LDraw data from a reader
    ///
    /// Invalid UTF-8 is replaced rather than rejected, since older library
    /// files are frequently Latin-1 encoded.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_source(&String::from_utf8_lossy(&bytes))
    }

    /// Parse an LDraw file from disk
    ///
    /// The file name is used as the source label in error context unless
    /// `config` already carries one.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ldraw_plan::{LibraryResolver, ModelStore, Parser, ParserConfig, populate_geometry};
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let library = LibraryResolver::new("/usr/share/ldraw")?;
    /// let config = ParserConfig::new().with_resolver(Arc::new(library));
    ///
    /// let mut store = ModelStore::from_path("car.mpd", config.clone())?;
    /// populate_geometry(&mut store, &mut Parser::new(config), None)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_path(path: impl AsRef<Path>, config: ParserConfig) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let config = match config.source_name() {
            Some(_) => config,
            None => config.with_source_name(path.display().to_string()),
        };
        parser::parse_with_config(&String::from_utf8_lossy(&bytes), config)
    }
}
