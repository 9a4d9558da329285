//! Address-list parsing must never panic, and accepted entries are trimmed.

#![no_main]

use libfuzzer_sys::fuzz_target;
use redisbloom_pool::parse_addresses;

fuzz_target!(|data: &[u8]| {
    if let Ok(list) = std::str::from_utf8(data) {
        if let Ok(addresses) = parse_addresses(list) {
            assert!(!addresses.is_empty());
            for address in addresses {
                assert_eq!(address.trim(), address);
                assert!(address.contains(':'));
            }
        }
    }
});
