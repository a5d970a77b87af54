use sha2::{Digest, Sha256};

pub fn compute_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Eight hex characters of the digest; enough to disambiguate generated
/// filenames that already carry a second-resolution timestamp.
pub fn short_hash(input: &str) -> String {
    compute_hash(input)[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_digest_prefix() {
        let full = compute_hash("misty.jpg");
        assert_eq!(short_hash("misty.jpg"), full[..8]);
        assert_eq!(short_hash("misty.jpg").len(), 8);
    }

    #[test]
    fn distinct_inputs_diverge() {
        assert_ne!(short_hash("a"), short_hash("b"));
    }
}
