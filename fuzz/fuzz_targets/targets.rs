#![no_main]

use libfuzzer_sys::fuzz_target;
use rigor::driver::parse_targets;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Each whitespace-separated word is one command-line argument
        let args: Vec<&str> = s.split_whitespace().collect();
        if let Ok(targets) = parse_targets(&args) {
            for target in &targets {
                if let Some(filter) = &target.filter {
                    let _ = filter.matches_type(&target.module);
                }
            }
        }
    }
});
