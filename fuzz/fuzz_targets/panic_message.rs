#![no_main]

use libfuzzer_sys::fuzz_target;
use rigor::Failure;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data).into_owned();
    let failure = Failure::from_panic(Box::new(text), None);
    // Classification never loses the kind chain back to the root.
    assert!(failure.kind().is_subkind_of(&rigor::kinds::ERROR));
});
