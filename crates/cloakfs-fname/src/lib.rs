//! cloakfs-fname: the filename codec
//!
//! Transforms names between their plaintext, on-disk ciphertext, and
//! presented forms. With the key, names round-trip through the per-inode
//! cipher. Without it, an encrypted name is still presentable: a packed
//! binary record (dirhash pair, ciphertext prefix, and, for long names,
//! a strong hash of the remainder) encoded with a filename-safe
//! 64-character alphabet. The prefix bound is chosen so the worst-case
//! encoding never exceeds the filesystem's name length ceiling, while
//! short names stay fully decodable back to their exact ciphertext.
//!
//! Policy resolution is not decided here; the codec consumes the resolved
//! [`cloakfs_policy::EncryptionInfo`] (or its absence) handed to it.

pub mod base64;
pub mod crypt;
pub mod digest;
pub mod lookup;
pub mod nokey;
pub mod present;

pub use crypt::{encrypted_size, fname_decrypt, fname_encrypt};
pub use digest::{NameHasher, Sha256Hasher, DIGEST_SIZE};
pub use lookup::{setup_filename, FileName};
pub use nokey::{NokeyName, NOKEY_BYTES_MAX, NOKEY_ENCODED_MAX, NOKEY_NAME_MAX};
pub use present::{disk_to_presented, is_dot_dotdot, presented_capacity};
