#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Build and normalize a schedule, then extract every submodel
    let source = String::from_utf8_lossy(data);
    let Ok(store) = ldraw_plan::parse(&source) else {
        return;
    };
    let Ok(schedule) = ldraw_plan::build_schedule(&store) else {
        return;
    };
    assert!(schedule.graph.is_tree());
    for plan in store.models.values() {
        let single = ldraw_plan::extract_single_model(&schedule, &plan.name);
        assert!(single.is_ok());
    }
});
