use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::warn;

use crate::resolver::REQUEST_ID_LENGTH;

// Token layout: "ey" + 9 random + "." + 2 random + payload + 6 random + "." + 24 random
const PAYLOAD_START: usize = 14;
const PAYLOAD_END_OFFSET: usize = 31;

/// Hide a secret inside a JWT-looking, three segment token.
///
/// The payload is base64 with `=` padding replaced by `-`, wrapped in random characters.
pub fn obfuscate(plaintext: &str) -> String {
    let payload = STANDARD.encode(plaintext).replace('=', "-");
    format!(
        "ey{}.{}{}{}.{}",
        random_chars(9),
        random_chars(2),
        payload,
        random_chars(6),
        random_chars(24)
    )
}

/// Recover the plaintext from an [`obfuscate`]d token.
///
/// Never fails: an undecodable token yields an empty string and a warning.
pub fn deobfuscate(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }

    let end = token.len().saturating_sub(PAYLOAD_END_OFFSET);
    let Some(payload) = token.get(PAYLOAD_START..end) else {
        warn!("Decryption failed: token too short ({} bytes)", token.len());
        return String::new();
    };

    let decoded = match STANDARD.decode(payload.replace('-', "=")) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Decryption failed: {}", e);
            return String::new();
        }
    };

    String::from_utf8(decoded).unwrap_or_else(|e| {
        warn!("Decryption failed: {}", e);
        String::new()
    })
}

/// Fresh random request id / secret hash (10 lowercase hex characters).
pub fn new_hex_id() -> String {
    let bytes: [u8; REQUEST_ID_LENGTH / 2] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn random_chars(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::is_valid_request_id;

    #[test]
    fn test_round_trip() {
        for plaintext in [
            "ThisIsMySecretText",
            "a",
            "p@ss:w0rd=with=padding==",
            "ünïcødé 🔑",
            "",
        ] {
            assert_eq!(deobfuscate(&obfuscate(plaintext)), plaintext);
        }
    }

    #[test]
    fn test_token_shape() {
        let token = obfuscate("secret");
        assert!(token.starts_with("ey"));
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_obfuscation_is_randomized() {
        assert_ne!(obfuscate("secret"), obfuscate("secret"));
    }

    #[test]
    fn test_deobfuscate_garbage() {
        assert_eq!(deobfuscate(""), "");
        assert_eq!(deobfuscate("too-short"), "");
        assert_eq!(
            deobfuscate("eyAAAAAAAAA.BB!!not*base64!!CCCCCC.DDDDDDDDDDDDDDDDDDDDDDDD"),
            ""
        );
    }

    #[test]
    fn test_new_hex_id() {
        let id = new_hex_id();
        assert!(is_valid_request_id(&id), "{id}");
    }
}
