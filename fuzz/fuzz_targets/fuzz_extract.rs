#![no_main]

use libfuzzer_sys::fuzz_target;
use nfe_tabular::core::ExtractOptions;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        let _ = nfe_tabular::table::extract_rows(s, &ExtractOptions::default());
    }
});
