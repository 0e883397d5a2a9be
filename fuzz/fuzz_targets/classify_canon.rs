#![no_main]

use libfuzzer_sys::fuzz_target;

use keywarden::{canon_len, classify, shadow_info, shadow_key};

fuzz_target!(|data: &[u8]| {
    let _ = classify(data);

    let len = canon_len(data);
    assert!(len <= data.len());

    let _ = shadow_info(data);
    let _ = shadow_key(data, b"(4:info)");
});
