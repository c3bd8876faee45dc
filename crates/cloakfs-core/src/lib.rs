//! cloakfs-core: shared types for the CloakFS encryption core
//!
//! This crate holds what both halves of the core (policy management and the
//! filename codec) agree on: the policy data model, the error taxonomy, the
//! host-facing configuration schema, and the in-place filename cipher
//! capability.
//!
//! Key hierarchy is deliberately absent here: CloakFS identifies keys by an
//! 8-byte descriptor and receives an opened cipher from the host's key
//! source. See `cloakfs-policy` for the collaborator traits.

pub mod cipher;
pub mod config;
pub mod error;
pub mod types;

pub use cipher::{CtrNameCipher, NameCipher};
pub use config::EncryptionConfig;
pub use error::{CryptError, CryptResult};
pub use types::{
    policies_equal, ContentsMode, FilenamesMode, KeyDescriptor, Policy, PolicyFlags, PolicyV1,
};

/// Size of one filename cipher block in bytes. Encrypted names are never
/// shorter than this, and corrupt on-disk names shorter than this are
/// rejected outright.
pub const FNAME_BLOCK_SIZE: usize = 16;

/// Size of the initialization vector handed to a [`NameCipher`].
pub const IV_SIZE: usize = 16;

/// Size of the opaque master key descriptor carried in a policy.
pub const KEY_DESCRIPTOR_SIZE: usize = 8;

/// Size of the per-inode nonce stored in an on-disk encryption context.
pub const NONCE_SIZE: usize = 16;

/// Maximum length of a directory entry name, on disk or presented.
pub const NAME_MAX: usize = 255;
