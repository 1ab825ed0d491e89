//! Client secret generation.

use base64::prelude::*;
use rand::RngCore;

/// Number of random bytes used for generating the client secret
pub const CLIENT_SECRET_LEN: usize = 24;

/// Generate a new client secret: 24 bytes from the OS-seeded CSPRNG, base64 encoded
pub fn generate_client_secret() -> String {
    let mut bytes = [0u8; CLIENT_SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64_STANDARD.encode(bytes)
}
