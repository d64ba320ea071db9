//! Integration tests for the line parser and its state machine

mod common;

use ldraw_plan::{
    Error, FileType, ModelStore, ParserConfig, ParserState, PartScope, StepRotation, parse,
    parse_into,
};
use nalgebra::{Matrix3, Point3, Vector3};

#[test]
fn test_root_and_part_scenario() {
    let source = "0 FILE root.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 part.dat\n\
                  0 FILE part.dat\n\
                  3 4 0 0 0 1 0 0 0 1 0\n";
    let store = parse(source).expect("Parsing should succeed");

    let root = store.model("root.ldr").expect("root model registered");
    assert_eq!(root.steps.len(), 1);
    assert_eq!(root.steps[0].placements.len(), 1);
    assert_eq!(root.steps[0].placements[0].name, "part.dat");
    assert_eq!(root.steps[0].placements[0].color, 16);

    let part = store.part("part.dat").expect("part registered");
    assert_eq!(part.triangles.len(), 1);
    assert_eq!(part.triangles[0].color, 4);
    assert_eq!(
        part.triangles[0].points,
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0)
        ]
    );
}

#[test]
fn test_two_steps_give_three_building_steps() {
    let source = "0 FILE m.ldr\n\
                  1 1 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n\
                  0 STEP\n\
                  1 2 0 0 0 1 0 0 0 1 0 0 0 1 b.dat\n\
                  0 STEP\n";
    let store = parse(source).unwrap();
    let steps = &store.model("m.ldr").unwrap().steps;
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].placements[0].name, "a.dat");
    assert_eq!(steps[1].placements[0].name, "b.dat");
    assert!(steps[2].placements.is_empty());
}

#[test]
fn test_short_placement_aborts() {
    let source = "0 FILE m.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 never.dat\n";
    let err = parse(source).unwrap_err();
    match &err {
        Error::MalformedLine { message, context } => {
            assert!(message.contains("found 14"));
            assert_eq!(context.line, Some(2));
            assert_eq!(context.content.as_deref(), Some("1 16 0 0 0 1 0 0 0 1 0 0 0 1"));
            assert!(context.state.as_deref().unwrap().contains("m.ldr"));
        }
        other => panic!("Expected MalformedLine, got {:?}", other),
    }
    assert!(err.to_string().contains("[E2001]"));
}

#[test]
fn test_token_counts_per_primitive() {
    let cases = [
        ("2 24 0 0 0 1 1 1 9", "line"),
        ("3 4 0 0 0 1 0 0 0 1", "triangle"),
        ("4 4 0 0 0 1 0 0 1 1 0 0 1", "quadrilateral"),
        ("5 24 0 0 0 1 0 0 0 1 0 0 -1", "optional line"),
    ];
    for (line, command) in cases {
        let source = format!("0 FILE p.dat\n{}\n", line);
        let err = parse(&source).unwrap_err();
        assert!(
            err.to_string().contains(command),
            "error for '{}' should name {}: {}",
            line,
            command,
            err
        );
    }
}

#[test]
fn test_primitives_land_in_matching_collections() {
    let source = "0 FILE p.dat\n\
                  2 24 0 0 0 1 1 1\n\
                  3 4 0 0 0 1 0 0 0 1 0\n\
                  4 4 0 0 0 1 0 0 1 1 0 0 1 0\n\
                  5 24 0 0 0 1 0 0 0 1 0 0 -1 0\n";
    let store = parse(source).unwrap();
    let part = store.part("p.dat").unwrap();
    assert_eq!(part.segments.len(), 1);
    assert_eq!(part.triangles.len(), 1);
    assert_eq!(part.quads.len(), 1);
    assert_eq!(part.optional_lines.len(), 1);
    assert_eq!(part.element_count(), 4);
}

#[test]
fn test_rotation_matrix_transposed() {
    let source = "0 FILE m.ldr\n1 16 5 6 7 1 2 3 4 5 6 7 8 9 a.dat\n";
    let store = parse(source).unwrap();
    let placement = &store.model("m.ldr").unwrap().steps[0].placements[0];
    assert_eq!(placement.position, Vector3::new(5.0, 6.0, 7.0));
    assert_eq!(
        placement.linear,
        Matrix3::new(1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0)
    );
}

#[test]
fn test_mpd_document() {
    let store = ModelStore::from_source(common::CAR_MPD).unwrap();

    assert_eq!(
        store.models.keys().collect::<Vec<_>>(),
        vec!["car.ldr", "axle.ldr", "wheel.ldr"]
    );
    assert_eq!(store.main_model().unwrap().name, "car.ldr");
    assert_eq!(store.model("car.ldr").unwrap().steps.len(), 3);
    assert_eq!(store.model("axle.ldr").unwrap().steps.len(), 2);
    assert_eq!(store.model("wheel.ldr").unwrap().steps.len(), 1);

    for part in ["chassis.dat", "3705.dat", "rim.dat", "tyre.dat"] {
        assert_eq!(store.scope_of(part), Some(PartScope::TopLevel), "{}", part);
        assert!(!store.part(part).unwrap().defined);
    }
    assert!(!store.is_part("axle.ldr"));
}

#[test]
fn test_model_and_part_never_both() {
    let store = ModelStore::from_source(common::CAR_MPD).unwrap();
    for name in store.models.keys() {
        assert!(!store.is_part(name));
    }
    for name in store.parts.keys() {
        assert!(!store.nested_parts.contains_key(name));
    }
}

#[test]
fn test_nested_only_part() {
    let source = "0 FILE m.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 brick.dat\n\
                  0 FILE brick.dat\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 stud.dat\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 m.ldr\n";
    let store = parse(source).unwrap();
    assert_eq!(store.scope_of("stud.dat"), Some(PartScope::Nested));
    assert_eq!(store.scope_of("brick.dat"), Some(PartScope::TopLevel));
    assert_eq!(store.part("brick.dat").unwrap().nested.len(), 2);
    assert!(!store.is_part("m.ldr"));
}

#[test]
fn test_part_declared_before_nested_reference() {
    let source = "0 FILE main.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 brick.dat\n\
                  0 FILE stud.dat\n\
                  2 24 0 0 0 1 0 0\n\
                  0 FILE brick.dat\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 stud.dat\n";
    let store = parse(source).unwrap();
    assert_eq!(store.scope_of("stud.dat"), Some(PartScope::Nested));
    assert_eq!(store.scope_of("brick.dat"), Some(PartScope::TopLevel));
    assert!(store.part("stud.dat").unwrap().defined);
    assert_eq!(store.part("stud.dat").unwrap().segments.len(), 1);
}

#[test]
fn test_part_placed_by_model_and_part_stays_top_level() {
    let source = "0 FILE main.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 brick.dat\n\
                  0 FILE brick.dat\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 stud.dat\n\
                  0 FILE extra.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 stud.dat\n\
                  0 FILE plate.dat\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 stud.dat\n";
    let store = parse(source).unwrap();
    assert_eq!(store.scope_of("stud.dat"), Some(PartScope::TopLevel));
    assert!(store.nested_parts.is_empty());
}

#[test]
fn test_names_match_case_insensitively() {
    let source = "0 FILE main.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 Sub.LDR\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.DAT\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n\
                  0 FILE sub.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n";
    let store = parse(source).unwrap();
    assert_eq!(store.models.len(), 2);
    assert_eq!(store.model("SUB.ldr").unwrap().name, "sub.ldr");
    assert_eq!(store.part_names(), vec!["3001.DAT".to_string()]);
    assert!(!store.is_part("Sub.LDR"));
}

#[test]
fn test_redeclaration_keeps_first() {
    let source = "0 FILE m.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n\
                  0 FILE other.ldr\n\
                  0 FILE m.ldr\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 b.dat\n";
    let store = parse(source).unwrap();
    let plan = store.model("m.ldr").unwrap();
    assert_eq!(store.models.len(), 2);
    assert_eq!(plan.steps.len(), 1);
    let names: Vec<_> = plan.placements().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a.dat", "b.dat"]);
}

#[test]
fn test_header_type_routes_placements() {
    // A shortcut part placed by file name: placements are nested, not steps
    let source = "0 FILE shortcut.dat\n\
                  0 !LDRAW_ORG Shortcut\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 b.dat\n";
    let store = parse(source).unwrap();
    assert_eq!(store.part("shortcut.dat").unwrap().nested.len(), 2);
    assert!(store.models.is_empty());
}

#[test]
fn test_unknown_meta_and_comments_ignored() {
    let source = "0 Just a comment\n\
                  0 FILE m.ldr\n\
                  0 Author: Someone\n\
                  0 !CATEGORY Brick\n\
                  0 BFC CERTIFY CCW\n\
                  0\n\
                  \n\
                  1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n";
    let store = parse(source).unwrap();
    assert_eq!(store.model("m.ldr").unwrap().placements().count(), 1);
}

#[test]
fn test_unknown_command_lenient_and_strict() {
    let source = "0 FILE m.ldr\n6 something new\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n";
    let store = parse(source).unwrap();
    assert_eq!(store.model("m.ldr").unwrap().placements().count(), 1);

    let strict = ModelStore::from_source_with_config(source, ParserConfig::new().strict(true));
    match strict {
        Err(Error::UnknownCommandCode { code, context }) => {
            assert_eq!(code, "6");
            assert_eq!(context.line, Some(2));
        }
        other => panic!("Expected UnknownCommandCode, got {:?}", other),
    }
}

#[test]
fn test_rotstep_variants() {
    let source = "0 FILE m.ldr\n\
                  0 ROTSTEP 30 45 0 ABS\n\
                  0 ROTSTEP END\n\
                  0 ROTSTEP 1 2 3\n";
    let store = parse(source).unwrap();
    let steps = &store.model("m.ldr").unwrap().steps;
    assert_eq!(steps.len(), 4);
    assert!(matches!(steps[0].rotation, Some(StepRotation::Set { .. })));
    assert_eq!(steps[1].rotation, Some(StepRotation::Reset));
    assert!(matches!(steps[2].rotation, Some(StepRotation::Set { .. })));
    assert_eq!(steps[3].rotation, None);
}

#[test]
fn test_windows_line_endings_and_bom() {
    let source = "\u{feff}0 FILE m.ldr\r\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 parts\\3001.dat\r\n";
    let store = parse(source).unwrap();
    assert!(store.is_model("m.ldr"));
    assert!(store.is_part("parts/3001.dat"));
}

#[test]
fn test_placement_with_spaces_in_name() {
    let source = "0 FILE m.ldr\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 Technic Beam 3.dat\n";
    let store = parse(source).unwrap();
    assert!(store.is_part("Technic Beam 3.dat"));
}

#[test]
fn test_parse_into_continues_existing_store() {
    let mut store = parse("0 FILE m.ldr\n1 16 0 0 0 1 0 0 0 1 0 0 0 1 a.dat\n").unwrap();
    let state = parse_into(
        &mut store,
        "1 16 0 0 0 1 0 0 0 1 0 0 0 1 b.dat\n0 STEP\n",
        Some(ParserState::for_model("m.ldr")),
    )
    .unwrap();

    assert_eq!(state.active_model.as_deref(), Some("m.ldr"));
    assert_eq!(state.file_type, Some(FileType::Model));
    let plan = store.model("m.ldr").unwrap();
    assert_eq!(plan.steps.len(), 2);
    assert_eq!(plan.placements().count(), 2);
}

#[test]
fn test_geometry_in_model_fails() {
    let err = parse("0 FILE m.ldr\n2 24 0 0 0 1 1 1\n").unwrap_err();
    assert!(matches!(err, Error::NoActivePart { .. }));
    assert!(err.to_string().contains("[E2004]"));
}

#[test]
fn test_from_reader() {
    let bytes = common::CAR_MPD.as_bytes();
    let store = ModelStore::from_reader(bytes).unwrap();
    assert_eq!(store.models.len(), 3);
}
