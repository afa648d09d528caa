#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        // Decoding arbitrary filter tuples must never panic
        if let Ok(filters) = mongopod::query::parse_filter_json(s) {
            let _ = filters.to_document();
        }
        let _ = mongopod::query::decode_value(s);
    }
});
