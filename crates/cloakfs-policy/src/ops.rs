//! Collaborator seams
//!
//! The encryption core never touches disk or key material directly. A host
//! filesystem plugs in through three traits: inode attribute access
//! ([`CryptInode`]), durable context storage ([`ContextStore`]), and key
//! resolution ([`KeySource`]).

use cloakfs_core::types::{KeyDescriptor, PolicyV1};
use cloakfs_core::{CryptResult, NameCipher, NONCE_SIZE};

use crate::info::CryptInfoSlot;

/// File type as far as encryption policy is concerned. `Special` covers
/// everything that is never subject to a policy (devices, fifos, sockets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Special,
}

/// Attribute view of an inode, plus its encryption-info cache slot.
///
/// The slot is owned by the inode's lifecycle: it is empty until the first
/// operation that needs key material, filled at most once, and torn down
/// with the inode.
pub trait CryptInode {
    fn kind(&self) -> FileKind;

    /// Whether the inode carries the on-disk "encrypted" marker.
    fn is_encrypted(&self) -> bool;

    /// Whether the inode has been unlinked and only lingers in memory.
    fn is_deleted(&self) -> bool;

    /// Whether name lookups under this inode are case-insensitive.
    fn is_casefolded(&self) -> bool;

    fn crypt_info(&self) -> &CryptInfoSlot;

    fn is_directory(&self) -> bool {
        self.kind() == FileKind::Directory
    }
}

/// Durable storage for encryption contexts, plus the directory attributes
/// policy decisions depend on. Calls may block on the backing store; errors
/// propagate to the caller unchanged.
pub trait ContextStore {
    type Inode: CryptInode;
    /// Filesystem-private payload threaded through [`ContextStore::set_context`]
    /// when a context is written as part of a larger transaction.
    type FsData: ?Sized;

    /// Read the raw context blob recorded against the inode.
    fn get_context(&self, inode: &Self::Inode) -> CryptResult<Vec<u8>>;

    /// Durably record a context blob against the inode.
    fn set_context(
        &self,
        inode: &Self::Inode,
        context: &[u8],
        fs_data: Option<&Self::FsData>,
    ) -> CryptResult<()>;

    fn is_empty_dir(&self, inode: &Self::Inode) -> bool;

    /// Maximum on-disk name length for entries under the inode.
    fn max_name_len(&self, inode: &Self::Inode) -> u32;
}

/// Resolves a policy's key descriptor to an opened filename cipher.
///
/// `Ok(None)` means the key is simply not present (a keyless mount of an
/// encrypted tree); `Err` means the key service itself failed. The per-inode
/// nonce participates in key derivation, so it is part of the request.
pub trait KeySource {
    fn resolve(
        &self,
        descriptor: &KeyDescriptor,
        policy: &PolicyV1,
        nonce: &[u8; NONCE_SIZE],
    ) -> CryptResult<Option<Box<dyn NameCipher>>>;
}
