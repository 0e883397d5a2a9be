#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the passphrase split; the rest is the key buffer.
    let split = (data[0] as usize) % data.len();
    let (pw, key) = data[1..].split_at(split.min(data.len() - 1));
    let pw = core::str::from_utf8(pw).unwrap_or("fuzz");

    let _ = keywarden::unprotect(key, pw);
    let _ = keywarden::protect(key, pw);
});
