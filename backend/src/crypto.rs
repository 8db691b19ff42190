use anyhow::{Context, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Marker shown in place of the hidden part of a secret
pub const MASK_MARKER: &str = "••••••";

/// Number of trailing characters a masked key keeps visible
const VISIBLE_SUFFIX: usize = 4;

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
  bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Verify a password against a bcrypt hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
  bcrypt::verify(password, hash).unwrap_or(false)
}

/// Generate a session token: 32 random bytes, hex-encoded
pub fn generate_session_token() -> String {
  let mut bytes = [0u8; 32];
  rand::thread_rng().fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// SHA-256 of the input, hex-encoded. Used to fingerprint submitted code.
pub fn sha256_hex(input: &str) -> String {
  let digest = Sha256::digest(input.as_bytes());
  hex::encode(digest)
}

/// Mask an API key for display, keeping only the last four characters.
///
/// Keys of four characters or fewer are fully masked so nothing of a short
/// secret leaks.
pub fn mask_api_key(key: &str) -> String {
  let chars: Vec<char> = key.chars().collect();
  if chars.len() <= VISIBLE_SUFFIX {
    return MASK_MARKER.to_string();
  }

  let suffix: String = chars[chars.len() - VISIBLE_SUFFIX..].iter().collect();
  format!("{}{}", MASK_MARKER, suffix)
}

/// True when a submitted value is a masked display string rather than a new key
pub fn is_masked(value: &str) -> bool {
  value.contains(MASK_MARKER) || value.contains("...")
}

/// True for the `your-<service>-api-key` style placeholders shipped in templates
pub fn is_placeholder_key(value: &str) -> bool {
  let trimmed = value.trim();
  trimmed.is_empty() || trimmed.starts_with("your-") || trimmed.starts_with("sk-...")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mask_keeps_last_four() {
    assert_eq!(mask_api_key("sk-ant-1234567890abcd"), "••••••abcd");
  }

  #[test]
  fn test_mask_short_keys_fully() {
    assert_eq!(mask_api_key("abcd"), MASK_MARKER);
    assert_eq!(mask_api_key(""), MASK_MARKER);
    assert_eq!(mask_api_key("abcde"), "••••••bcde");
  }

  #[test]
  fn test_session_token_shape() {
    let a = generate_session_token();
    let b = generate_session_token();
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }

  #[test]
  fn test_sha256_known_vector() {
    assert_eq!(
      sha256_hex("abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn test_password_round_trip() {
    let hash = hash_password("testlab2024", 4).expect("Failed to hash password");
    assert!(verify_password("testlab2024", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("testlab2024", "not-a-bcrypt-hash"));
  }

  #[test]
  fn test_masked_and_placeholder_detection() {
    assert!(is_masked("••••••abcd"));
    assert!(is_masked("sk-...abcd"));
    assert!(!is_masked("sk-live-abcdef"));
    assert!(is_placeholder_key("your-openai-api-key"));
    assert!(is_placeholder_key("  "));
    assert!(!is_placeholder_key("sk-live-abcdef"));
  }
}
