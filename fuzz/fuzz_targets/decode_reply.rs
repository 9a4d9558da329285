//! Feed arbitrary bytes to the incremental reply decoder.

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use resp_protocol::decode;

fuzz_target!(|data: &[u8]| {
    let mut buf = BytesMut::from(data);
    // Drain every complete reply; stop on partial input or the first error.
    while let Ok(Some(value)) = decode(&mut buf) {
        let mut out = BytesMut::new();
        value.encode(&mut out);
        let mut again = out.clone();
        assert_eq!(decode(&mut again).ok().flatten(), Some(value));
        assert!(again.is_empty());
    }
});
