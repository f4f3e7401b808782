//! Fuzz target for collector settings parsing.

#![no_main]

use hc_config::collector::CollectorConfig;
use hc_config::validate::validate_collector;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<CollectorConfig>(data) {
        let _ = validate_collector(&config);
    }
});
