//! Policy Manager entry points
//!
//! The state machine around a directory tree's encryption policy: the
//! privileged set/get transition, child inheritance, and the parent/child
//! consistency guard. All mutating entry points assume the caller holds the
//! target inode's exclusive lock for the whole check-then-act sequence, so
//! two callers can never both observe "no policy yet" and install
//! conflicting policies.

use tracing::debug;

use cloakfs_core::{policies_equal, CryptError, CryptResult, Policy};

use crate::context::Context;
use crate::info::resolve_info;
use crate::ops::{ContextStore, CryptInode, FileKind, KeySource};

/// Read back the inode's encryption policy.
///
/// The cached resolved info is the fast path; otherwise the stored context
/// is read and converted. An inode without the encryption marker is
/// `NotEncrypted`; a context of unrecognized size or version is
/// `InvalidPolicy`; other storage failures pass through.
pub fn get_policy<S: ContextStore>(store: &S, inode: &S::Inode) -> CryptResult<Policy> {
    if let Some(info) = inode.crypt_info().get() {
        return Ok(info.policy());
    }
    if !inode.is_encrypted() {
        return Err(CryptError::NotEncrypted);
    }
    let raw = store.get_context(inode)?;
    Ok(Context::from_bytes(&raw)?.policy())
}

/// Apply an encryption policy to an empty directory.
///
/// Caller holds the inode's exclusive lock. Any already-present policy,
/// byte-identical or not, or even unreadable, is reported as
/// `PolicyConflict`; a policy is never silently replaced or re-asserted.
/// Only a live, empty directory accepts a policy, and only after
/// [`Policy::supported`] passes for the target.
pub fn set_policy<S: ContextStore>(
    store: &S,
    inode: &S::Inode,
    policy: &Policy,
) -> CryptResult<()> {
    match get_policy(store, inode) {
        Ok(_) | Err(CryptError::InvalidPolicy) => Err(CryptError::PolicyConflict),
        Err(CryptError::NotEncrypted) => {
            if !inode.is_directory() {
                return Err(CryptError::NotDirectory);
            }
            if inode.is_deleted() {
                return Err(CryptError::NotFound);
            }
            if !store.is_empty_dir(inode) {
                return Err(CryptError::DirectoryNotEmpty);
            }
            if !policy.supported(inode.is_casefolded()) {
                return Err(CryptError::InvalidPolicy);
            }
            let ctx = Context::new_from_policy(policy)?;
            store.set_context(inode, &ctx.to_bytes(), None)?;
            debug!(key = %policy.master_key_descriptor(), "encryption policy set");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Is the child's encryption policy permitted within its parent directory?
///
/// Filesystems must consult this both before exposing a child through an
/// encrypted parent (lookup/open, which catches offline tampering) and
/// before any operation that links an inode into an encrypted directory
/// (link, rename, cross-rename, which prevents online violations).
/// Skipping either check reopens the consistency hole.
///
/// Fail-closed: whenever any sub-step cannot complete, the answer is
/// forbidden.
pub fn has_permitted_context<S, K>(
    store: &S,
    keys: &K,
    parent: &S::Inode,
    child: &S::Inode,
) -> bool
where
    S: ContextStore,
    K: KeySource,
{
    // File types that are never encrypted are unrestricted.
    if child.kind() == FileKind::Special {
        return true;
    }
    if !parent.is_encrypted() {
        return true;
    }
    // An encrypted directory must not contain unencrypted entries.
    if !child.is_encrypted() {
        return false;
    }

    // Resolve both sides so cached policies are used when keys are
    // available; a keyless mount still compares the stored contexts.
    if resolve_info(store, keys, parent).is_err() {
        return false;
    }
    if resolve_info(store, keys, child).is_err() {
        return false;
    }

    let (Ok(parent_policy), Ok(child_policy)) =
        (get_policy(store, parent), get_policy(store, child))
    else {
        return false;
    };
    policies_equal(&parent_policy, &child_policy)
}

/// Stamp a newly created child with its parent's policy.
///
/// Requires the parent's resolved info: a child cannot be created under a
/// directory whose policy cannot be confirmed key-bearing. The child's
/// context carries the parent's policy fields under a fresh nonce. With
/// `preload`, the child's own info is resolved eagerly so the caller can
/// use it immediately.
pub fn inherit_context<S, K>(
    store: &S,
    keys: &K,
    parent: &S::Inode,
    child: &S::Inode,
    fs_data: Option<&S::FsData>,
    preload: bool,
) -> CryptResult<()>
where
    S: ContextStore,
    K: KeySource,
{
    let info = resolve_info(store, keys, parent)?.ok_or(CryptError::NoKey)?;

    let ctx = Context::new_from_policy(&info.policy())?;
    store.set_context(child, &ctx.to_bytes(), fs_data)?;
    debug!(key = %info.policy_v1().master_key_descriptor, "context inherited");

    if preload {
        resolve_info(store, keys, child)?;
    }
    Ok(())
}
