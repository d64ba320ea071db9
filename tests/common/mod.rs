//! Shared fixtures for integration tests
//!
//! Sources are small but realistic multi-part documents: submodels placed
//! from several places, parts composed of nested sub-parts, and a library of
//! part definitions served from memory.

#![allow(dead_code)]

use ldraw_plan::{MemoryResolver, Parser, ParserConfig};
use std::sync::Arc;

/// A car with two identical axles, each carrying two wheels
pub const CAR_MPD: &str = "\
0 FILE car.ldr
0 Name: car.ldr
0 Author: Test Author
1 71 0 0 0 1 0 0 0 1 0 0 0 1 chassis.dat
0 STEP
1 16 0 8 -40 1 0 0 0 1 0 0 0 1 axle.ldr
1 16 0 8 40 1 0 0 0 1 0 0 0 1 axle.ldr
0 STEP
0 NOFILE
0 FILE axle.ldr
1 0 0 0 0 1 0 0 0 1 0 0 0 1 3705.dat
0 STEP
1 16 -30 0 0 0 0 1 0 1 0 -1 0 0 wheel.ldr
1 16 30 0 0 0 0 -1 0 1 0 1 0 0 wheel.ldr
0 NOFILE
0 FILE wheel.ldr
1 72 0 0 0 1 0 0 0 1 0 0 0 1 rim.dat
1 0 0 0 0 1 0 0 0 1 0 0 0 1 tyre.dat
0 NOFILE
";

/// Part library for [`CAR_MPD`]
pub fn car_library() -> MemoryResolver {
    MemoryResolver::new()
        .with_source(
            "chassis.dat",
            "0 Chassis\n0 Name: chassis.dat\n0 !LDRAW_ORG Part\n\
             4 16 -20 0 -60 20 0 -60 20 0 60 -20 0 60\n\
             1 16 0 0 -60 1 0 0 0 1 0 0 0 1 stud.dat\n\
             1 16 0 0 60 1 0 0 0 1 0 0 0 1 stud.dat\n",
        )
        .with_source(
            "3705.dat",
            "0 Technic Axle 4\n0 Name: 3705.dat\n0 !LDRAW_ORG Part\n\
             2 24 -40 0 0 40 0 0\n",
        )
        .with_source(
            "rim.dat",
            "0 Rim\n0 Name: rim.dat\n0 !LDRAW_ORG Part\n\
             3 16 0 0 0 0 10 0 0 0 10\n\
             1 16 0 0 0 1 0 0 0 1 0 0 0 1 stud.dat\n",
        )
        .with_source(
            "tyre.dat",
            "0 Tyre\n0 Name: tyre.dat\n0 !LDRAW_ORG Part\n\
             3 0 0 0 0 0 15 0 0 0 15\n",
        )
        .with_source(
            "stud.dat",
            "0 Stud\n0 Name: stud.dat\n0 !LDRAW_ORG Primitive\n\
             2 24 0 0 0 0 -4 0\n\
             5 24 6 0 0 6 -4 0 6 0 1 6 0 -1\n",
        )
}

/// A parser that resolves parts from [`car_library`]
pub fn car_parser() -> Parser {
    Parser::new(ParserConfig::new().with_resolver(Arc::new(car_library())))
}
