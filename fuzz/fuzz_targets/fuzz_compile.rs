#![no_main]

use libfuzzer_sys::fuzz_target;

use hlslc_ir::ShaderType;
use hlslc_parser::{compile, CompileOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        // The front-end must never panic on any input; errors flow
        // through the diagnostic sink.
        let options = CompileOptions::new("main", ShaderType::Pixel, 2, 0);
        let output = compile(source, "fuzz.fx", &options);
        if let Some(program) = &output.program {
            assert!(hlslc_analysis::collect_violations(program).is_empty());
        }
    }
});
