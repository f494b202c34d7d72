#![no_main]
use certlab_kernel::Instance;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(instance) = Instance::from_json(s) {
            // Anything that decodes must re-encode to a record that decodes
            // to the same payload.
            let text = instance.to_json_pretty().unwrap();
            let again = Instance::from_json(&text).unwrap();
            assert_eq!(again.payload, instance.payload);
            assert_eq!(again.payload_sha256, instance.payload_sha256);
        }
    }
    let _ = certlab_kernel::sha256_hex_bytes(data);
});
