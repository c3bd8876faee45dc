use thiserror::Error;

pub type CryptResult<T> = Result<T, CryptError>;

/// Error taxonomy of the encryption core.
///
/// Every failure is per-operation and returned to the caller; nothing here
/// is fatal to the process. Validation and parse failures are never
/// transient, so callers should not retry them. Storage backend failures
/// travel through [`CryptError::Storage`] unchanged.
#[derive(Debug, Error)]
pub enum CryptError {
    /// The policy's version, mode pair, or flags are not supported.
    #[error("unsupported encryption policy")]
    InvalidPolicy,

    /// An encryption policy is already set on the inode. Re-asserting the
    /// identical policy is also reported this way, never as a silent
    /// success.
    #[error("an encryption policy is already set")]
    PolicyConflict,

    /// Policies may only be set on directories.
    #[error("not a directory")]
    NotDirectory,

    /// Policies may only be set on empty directories.
    #[error("directory not empty")]
    DirectoryNotEmpty,

    /// The inode carries no encryption marker.
    #[error("inode is not encrypted")]
    NotEncrypted,

    /// The operation needs key material that is not currently resolvable.
    #[error("encryption key not available")]
    NoKey,

    /// The target does not exist: a deleted inode, or a presented name that
    /// cannot correspond to any directory entry.
    #[error("no such entry")]
    NotFound,

    /// An on-disk name failed structural validation.
    #[error("corrupt encrypted name")]
    CorruptName,

    /// The name exceeds the filesystem's on-disk name length ceiling.
    #[error("name too long")]
    NameTooLong,

    /// The caller-supplied output buffer is too small.
    #[error("output buffer too small")]
    NoBufferSpace,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Propagated verbatim from the storage or key collaborator.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

impl CryptError {
    /// Wrap a collaborator failure for pass-through propagation.
    pub fn storage(err: impl Into<anyhow::Error>) -> Self {
        CryptError::Storage(err.into())
    }
}
