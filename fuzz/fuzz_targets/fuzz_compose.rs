#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parse, then fold geometry for whatever parts the input defines
    // inline; undefined parts fail with UnresolvedPartFile
    let source = String::from_utf8_lossy(data);
    let mut parser = ldraw_plan::Parser::default();
    if let Ok(mut store) = parser.parse(&source) {
        let _ = ldraw_plan::populate_geometry(&mut store, &mut parser, None);
    }
});
