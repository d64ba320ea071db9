#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz the line parser in both lenient and strict mode
    let source = String::from_utf8_lossy(data);
    let _ = ldraw_plan::parse(&source);

    let config = ldraw_plan::ParserConfig::new().strict(true);
    let _ = ldraw_plan::parse_with_config(&source, config);
});
