#![no_main]

use libfuzzer_sys::fuzz_target;

use hlslc_ir::ShaderType;
use hlslc_parser::{compile, CompileOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        // Exercise the lexer-heavy path: wrap arbitrary text in a
        // function body so the statement grammar drives the lexer
        // through it.
        let wrapped = format!("float4 main() : COLOR {{ {source} ; return 0; }}");
        let options = CompileOptions::new("main", ShaderType::Pixel, 2, 0);
        let _ = compile(&wrapped, "fuzz.fx", &options);
    }
});
