//! End-to-end flow over a mock filesystem: policy application, name
//! encryption, presentation with and without the key, and keyless lookup
//! against previously presented names.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use hkdf::Hkdf;
use sha2::Sha256;

use cloakfs_core::types::{
    ContentsMode, FilenamesMode, KeyDescriptor, Policy, PolicyFlags, PolicyV1,
};
use cloakfs_core::{CryptError, CryptResult, CtrNameCipher, NameCipher, NONCE_SIZE};
use cloakfs_fname::{disk_to_presented, setup_filename};
use cloakfs_policy::{
    resolve_info, set_policy, ContextStore, CryptInfoSlot, CryptInode, FileKind, KeySource,
};

struct TestInode {
    id: u64,
    kind: FileKind,
    encrypted: Cell<bool>,
    slot: CryptInfoSlot,
}

impl TestInode {
    fn dir(id: u64) -> Self {
        TestInode {
            id,
            kind: FileKind::Directory,
            encrypted: Cell::new(false),
            slot: CryptInfoSlot::new(),
        }
    }

    /// A second in-memory view of the same on-disk directory, as after a
    /// remount: the stored context is still there, the resolved info is not.
    fn keyless_view(&self) -> Self {
        TestInode {
            id: self.id,
            kind: self.kind,
            encrypted: Cell::new(self.encrypted.get()),
            slot: CryptInfoSlot::new(),
        }
    }
}

impl CryptInode for TestInode {
    fn kind(&self) -> FileKind {
        self.kind
    }
    fn is_encrypted(&self) -> bool {
        self.encrypted.get()
    }
    fn is_deleted(&self) -> bool {
        false
    }
    fn is_casefolded(&self) -> bool {
        false
    }
    fn crypt_info(&self) -> &CryptInfoSlot {
        &self.slot
    }
}

#[derive(Default)]
struct TestFs {
    contexts: RefCell<HashMap<u64, Vec<u8>>>,
}

impl ContextStore for TestFs {
    type Inode = TestInode;
    type FsData = ();

    fn get_context(&self, inode: &TestInode) -> CryptResult<Vec<u8>> {
        self.contexts
            .borrow()
            .get(&inode.id)
            .cloned()
            .ok_or_else(|| CryptError::storage(anyhow::anyhow!("no context recorded")))
    }

    fn set_context(&self, inode: &TestInode, context: &[u8], _fs_data: Option<&()>) -> CryptResult<()> {
        self.contexts
            .borrow_mut()
            .insert(inode.id, context.to_vec());
        inode.encrypted.set(true);
        Ok(())
    }

    fn is_empty_dir(&self, _inode: &TestInode) -> bool {
        true
    }

    fn max_name_len(&self, _inode: &TestInode) -> u32 {
        255
    }
}

/// Derives the per-inode filename key from a master secret, the key
/// descriptor, and the context nonce via HKDF-SHA256.
struct MasterKeySource {
    master: [u8; 32],
}

impl KeySource for MasterKeySource {
    fn resolve(
        &self,
        descriptor: &KeyDescriptor,
        _policy: &PolicyV1,
        nonce: &[u8; NONCE_SIZE],
    ) -> CryptResult<Option<Box<dyn NameCipher>>> {
        let hkdf = Hkdf::<Sha256>::new(None, &self.master);
        let mut info = Vec::with_capacity(8 + NONCE_SIZE);
        info.extend_from_slice(&descriptor.0);
        info.extend_from_slice(nonce);

        let mut key = [0u8; 32];
        hkdf.expand(&info, &mut key)
            .map_err(|e| CryptError::storage(anyhow::anyhow!("hkdf expand: {e}")))?;
        Ok(Some(Box::new(CtrNameCipher::new(key))))
    }
}

struct NoKeys;

impl KeySource for NoKeys {
    fn resolve(
        &self,
        _descriptor: &KeyDescriptor,
        _policy: &PolicyV1,
        _nonce: &[u8; NONCE_SIZE],
    ) -> CryptResult<Option<Box<dyn NameCipher>>> {
        Ok(None)
    }
}

fn test_keys() -> MasterKeySource {
    MasterKeySource { master: [0xD4; 32] }
}

fn test_policy() -> Policy {
    Policy::V1(PolicyV1 {
        contents_mode: ContentsMode::Aes256Xts,
        filenames_mode: FilenamesMode::Aes256Cts,
        flags: PolicyFlags::PAD_32,
        master_key_descriptor: KeyDescriptor([0x42; 8]),
    })
}

/// Encrypt `name` under a fresh policy on `dir`, returning its ciphertext.
fn encrypt_name(fs: &TestFs, keys: &MasterKeySource, dir: &TestInode, name: &[u8]) -> Vec<u8> {
    let fname = setup_filename(fs, keys, dir, name, false).unwrap();
    fname.disk_name().unwrap().to_vec()
}

#[test]
fn unencrypted_directory_passes_names_through() {
    let fs = TestFs::default();
    let dir = TestInode::dir(1);

    let fname = setup_filename(&fs, &test_keys(), &dir, b"plain.txt", false).unwrap();
    assert_eq!(fname.disk_name().unwrap(), b"plain.txt");
    assert!(!fname.is_nokey());
    assert!(fname.matches(b"plain.txt"));
    assert!(!fname.matches(b"other.txt"));
}

#[test]
fn dot_names_bypass_the_codec() {
    let fs = TestFs::default();
    let keys = test_keys();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();

    for name in [b".".as_slice(), b"..".as_slice()] {
        let fname = setup_filename(&fs, &keys, &dir, name, false).unwrap();
        assert_eq!(fname.disk_name().unwrap(), name);
    }
}

#[test]
fn encrypt_then_present_roundtrip() {
    let fs = TestFs::default();
    let keys = test_keys();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();

    let name = b"project-plan.md";
    let ciphertext = encrypt_name(&fs, &keys, &dir, name);
    // 15 bytes rounded up to the 32-byte padding granularity.
    assert_eq!(ciphertext.len(), 32);

    let info = resolve_info(&fs, &keys, &dir).unwrap().unwrap();
    let presented = disk_to_presented(Some(info.as_ref()), 0, 0, &ciphertext).unwrap();
    assert_eq!(presented, name);
}

#[test]
fn keyless_lookup_of_short_name_recovers_ciphertext() {
    let fs = TestFs::default();
    let keys = test_keys();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();

    let ciphertext = encrypt_name(&fs, &keys, &dir, b"project-plan.md");
    let presented = disk_to_presented(None, 0xABCD1234, 5, &ciphertext).unwrap();

    let keyless_dir = dir.keyless_view();
    let fname = setup_filename(&fs, &NoKeys, &keyless_dir, &presented, true).unwrap();

    assert!(fname.is_nokey());
    assert_eq!(fname.disk_name().unwrap(), ciphertext.as_slice());
    assert_eq!(fname.dirhash(), Some((0xABCD1234, 5)));
    assert!(fname.matches(&ciphertext));
}

#[test]
fn keyless_lookup_of_long_name_matches_by_digest() {
    let fs = TestFs::default();
    let keys = test_keys();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();

    let long_name = vec![b'x'; 180];
    let other_name = vec![b'y'; 180];
    let ciphertext = encrypt_name(&fs, &keys, &dir, &long_name);
    let other_ciphertext = encrypt_name(&fs, &keys, &dir, &other_name);
    assert_eq!(ciphertext.len(), 192);

    let presented = disk_to_presented(None, 0x00BEEF00, 0, &ciphertext).unwrap();

    let keyless_dir = dir.keyless_view();
    let fname = setup_filename(&fs, &NoKeys, &keyless_dir, &presented, true).unwrap();

    // Digested: no disk name can be recovered, only the hash pair and the
    // digest matcher are usable.
    assert!(fname.is_nokey());
    assert!(fname.disk_name().is_none());
    assert_eq!(fname.dirhash(), Some((0x00BEEF00, 0)));
    assert!(fname.matches(&ciphertext));
    assert!(!fname.matches(&other_ciphertext));
    assert!(!fname.matches(&ciphertext[..150]));
}

#[test]
fn keyless_create_is_rejected() {
    let fs = TestFs::default();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();

    let keyless_dir = dir.keyless_view();
    let result = setup_filename(&fs, &NoKeys, &keyless_dir, b"new-file.txt", false);
    assert!(matches!(result, Err(CryptError::NoKey)));
}

#[test]
fn undecodable_keyless_name_is_not_found() {
    let fs = TestFs::default();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();
    let keyless_dir = dir.keyless_view();

    // Contains characters outside the presentation alphabet.
    let result = setup_filename(&fs, &NoKeys, &keyless_dir, b"definitely not encoded!", true);
    assert!(matches!(result, Err(CryptError::NotFound)));

    // Valid alphabet, impossible decoded length (between full and digested).
    let mid = cloakfs_fname::NokeyName {
        hash: 0,
        minor_hash: 0,
        bytes: vec![0u8; 149],
        digest: None,
    };
    let mut record = mid.to_presented();
    record.push(b'A'); // stretch past the full-variant window
    let result = setup_filename(&fs, &NoKeys, &keyless_dir, &record, true);
    assert!(matches!(result, Err(CryptError::NotFound)));
}

#[test]
fn overlong_keyless_name_is_not_found() {
    let fs = TestFs::default();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();
    let keyless_dir = dir.keyless_view();

    let oversized = vec![b'A'; cloakfs_fname::NOKEY_ENCODED_MAX + 1];
    let result = setup_filename(&fs, &NoKeys, &keyless_dir, &oversized, true);
    assert!(matches!(result, Err(CryptError::NotFound)));
}

#[test]
fn overlong_plaintext_name_is_rejected() {
    let fs = TestFs::default();
    let keys = test_keys();
    let dir = TestInode::dir(1);
    set_policy(&fs, &dir, &test_policy()).unwrap();

    let name = vec![b'n'; 256];
    let result = setup_filename(&fs, &keys, &dir, &name, false);
    assert!(matches!(result, Err(CryptError::NameTooLong)));
}
