use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{self, RngCore};
use sha2::{Digest, Sha256};

/// Random bytes rendered as lowercase hex; `len` is the number of bytes.
pub fn generate_secure_token(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

/// Keyed one-way fingerprint of sensitive data, e.g. gateway validation ids.
pub fn fingerprint<K: AsRef<[u8]>>(data: &str, key: K) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_ref());
    hasher.update(b":");
    hasher.update(data.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secure_token_is_hex_of_requested_length() {
        let token = generate_secure_token(8);
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_secure_token(8));
    }

    #[test]
    fn fingerprint_depends_on_key_and_data() {
        let a = fingerprint("val-1", "k1");
        assert_eq!(a, fingerprint("val-1", "k1"));
        assert_ne!(a, fingerprint("val-1", "k2"));
        assert_ne!(a, fingerprint("val-2", "k1"));
        assert!(!a.contains("val-1"));
    }
}
