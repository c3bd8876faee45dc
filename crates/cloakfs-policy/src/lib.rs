//! cloakfs-policy: encryption policy management
//!
//! Governs which encryption settings apply to a directory subtree and keeps
//! the subtree internally consistent: every entry reachable through an
//! encrypted directory must carry the same policy as that directory.
//!
//! Entry points:
//! - [`set_policy`] / [`get_policy`]: the privileged "encrypt this tree"
//!   transition and its read-back.
//! - [`inherit_context`]: stamp a new child with its parent's policy under
//!   a fresh nonce.
//! - [`has_permitted_context`]: the fail-closed parent/child consistency
//!   guard filesystems must consult before exposing or linking an entry.
//! - [`resolve_info`]: populate the per-inode [`EncryptionInfo`] cache from
//!   the stored context and the host's key source.
//!
//! Locking contract: mutating operations (`set_policy`, `inherit_context`,
//! first-time `resolve_info`) assume the caller already holds the target
//! inode's exclusive lock. Read paths are lock-free.

pub mod context;
pub mod info;
pub mod manager;
pub mod ops;

pub use context::{Context, CONTEXT_V1_SIZE};
pub use info::{resolve_info, CryptInfoSlot, EncryptionInfo};
pub use manager::{get_policy, has_permitted_context, inherit_context, set_policy};
pub use ops::{ContextStore, CryptInode, FileKind, KeySource};
