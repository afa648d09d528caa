#![no_main]
use libfuzzer_sys::fuzz_target;
use mongopod::query::eval::{compare_docs, matches_filter, project};

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(filters) = mongopod::query::parse_filter_json(s) {
            let filter = filters.to_document();
            // A tiny doc set to exercise the matcher, sorter and projector
            let docs = [
                bson::doc! {"a": 1, "b": 2, "name": "x"},
                bson::doc! {"a": 10, "b": -5, "name": "y", "nested": {"z": 3}},
                bson::doc! {"active": true, "tags": ["x", "y"]},
            ];
            for d in &docs {
                let _ = matches_filter(d, &filter);
                let _ = project(d, &filter);
                let _ = compare_docs(d, &docs[0], &filter);
            }
        }
    }
});
