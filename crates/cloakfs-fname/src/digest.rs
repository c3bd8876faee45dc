//! Shared strong-hash handle
//!
//! Long nokey names are abbreviated with a strong hash of the ciphertext
//! tail. The hash handle is process-wide state: constructed on first use
//! and shared by every caller afterwards. Initialization races resolve
//! through the once-cell's get-or-init: a thread that loses the install
//! race drops its instance and adopts the winner's, and nobody blocks
//! beyond the cell itself.

use std::sync::OnceLock;

use sha2::{Digest, Sha256};

/// Size of the strong-hash output carried in a digested nokey name.
pub const DIGEST_SIZE: usize = 32;

/// The strong-hash capability.
pub trait NameHasher: Send + Sync {
    fn digest(&self, data: &[u8]) -> [u8; DIGEST_SIZE];
}

/// SHA-256 via RustCrypto.
pub struct Sha256Hasher;

impl NameHasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> [u8; DIGEST_SIZE] {
        Sha256::digest(data).into()
    }
}

static SHARED: OnceLock<Box<dyn NameHasher>> = OnceLock::new();

/// The process-wide hash handle.
pub fn shared() -> &'static dyn NameHasher {
    SHARED.get_or_init(|| Box::new(Sha256Hasher)).as_ref()
}
