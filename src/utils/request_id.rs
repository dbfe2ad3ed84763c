use uuid::Uuid;

use crate::model::request::RequestId;

/// Hex characters in a request id: 64 bits of entropy.
pub const REQUEST_ID_LEN: usize = 16;

/// Folds a v4 UUID into 8 bytes. XOR-ing the halves keeps every output bit
/// random even though the version and variant bits are fixed.
pub fn generate_request_id() -> RequestId {
    let bytes = Uuid::new_v4();
    let bytes = bytes.as_bytes();
    let half = REQUEST_ID_LEN / 2;

    let hex: String = (0..half)
        .map(|i| format!("{:02x}", bytes[i] ^ bytes[i + half]))
        .collect();

    RequestId::new(hex)
}

/// Keeps generating until `taken` says the id is free.
pub fn generate_unique_request_id(taken: impl Fn(&RequestId) -> bool) -> RequestId {
    loop {
        let id = generate_request_id();
        if !taken(&id) {
            return id;
        }
        tracing::warn!(request_id = %id, "Request id collision, regenerating");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn ids_are_sixteen_lowercase_hex_chars() {
        let id = generate_request_id();
        assert_eq!(id.as_str().len(), REQUEST_ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<_> = (0..10_000).map(|_| generate_request_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn taken_ids_are_skipped() {
        let calls = Cell::new(0);
        let id = generate_unique_request_id(|_| {
            calls.set(calls.get() + 1);
            calls.get() < 3
        });
        assert_eq!(calls.get(), 3);
        assert_eq!(id.as_str().len(), REQUEST_ID_LEN);
    }
}
