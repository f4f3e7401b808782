//! Fuzz target for redaction rule parsing and validation.
//!
//! Tests that YAML and JSON redaction configs handle arbitrary input without
//! panicking, and that validation never panics on whatever parses.

#![no_main]

use hc_config::redaction::RedactionConfig;
use hc_config::validate::validate_redaction;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = RedactionConfig::from_yaml(text) {
        let _ = validate_redaction(&config);
    }
    if let Ok(config) = serde_json::from_str::<RedactionConfig>(text) {
        let _ = validate_redaction(&config);
    }
});
