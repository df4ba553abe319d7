//! Authorization code generation

use sha2::{Digest, Sha256};
use sso_shared::constants::AUTH_CODE_BYTES;

/// Generate an opaque one-time authorization code: 32 bytes from the
/// thread-local CSPRNG, hex encoded.
pub fn generate_auth_code() -> String {
    let bytes: [u8; AUTH_CODE_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Short, non-reversible tag for a code or token, safe to write to logs.
pub fn code_fingerprint(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex::encode(digest)[..12].to_string()
}
