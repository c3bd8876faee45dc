//! Disk-name to presented-name conversion

use cloakfs_core::{CryptError, CryptResult, FNAME_BLOCK_SIZE};
use cloakfs_policy::EncryptionInfo;

use crate::base64;
use crate::crypt::fname_decrypt;
use crate::nokey::{NokeyName, NOKEY_NAME_MAX};

/// "." and ".." are stored plaintext even inside encrypted directories and
/// bypass the codec entirely.
pub fn is_dot_dotdot(name: &[u8]) -> bool {
    name == b"." || name == b".."
}

/// Convert an on-disk directory entry name to its presented form.
///
/// With the key resolved, the ciphertext is simply decrypted. Without it,
/// the name is still presented: as the encoded [`NokeyName`] built from the
/// supplied dirhash pair (zeroed when the filesystem provided none) and the
/// ciphertext. An on-disk name shorter than one cipher block can never have
/// been produced by the encrypt path and is reported as corrupt.
pub fn disk_to_presented(
    info: Option<&EncryptionInfo>,
    hash: u32,
    minor_hash: u32,
    disk_name: &[u8],
) -> CryptResult<Vec<u8>> {
    if is_dot_dotdot(disk_name) {
        return Ok(disk_name.to_vec());
    }
    if disk_name.len() < FNAME_BLOCK_SIZE {
        return Err(CryptError::CorruptName);
    }

    match info {
        Some(info) => fname_decrypt(info, disk_name),
        None => Ok(NokeyName::from_ciphertext(hash, minor_hash, disk_name).to_presented()),
    }
}

/// Buffer capacity sufficient for any presented form of a name whose
/// ciphertext is at most `max_encrypted_len` bytes: the decrypted name or
/// the encoded nokey record, whichever is larger.
pub fn presented_capacity(max_encrypted_len: usize) -> usize {
    max_encrypted_len.max(base64::encoded_len(NOKEY_NAME_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypt::{encrypted_size, fname_encrypt};
    use crate::nokey::NOKEY_BYTES_MAX;
    use cloakfs_core::types::{
        ContentsMode, FilenamesMode, KeyDescriptor, PolicyFlags, PolicyV1,
    };
    use cloakfs_core::{CtrNameCipher, NONCE_SIZE};
    use sha2::{Digest, Sha256};

    fn test_info() -> EncryptionInfo {
        EncryptionInfo::new(
            PolicyV1 {
                contents_mode: ContentsMode::Aes256Xts,
                filenames_mode: FilenamesMode::Aes256Cts,
                flags: PolicyFlags::PAD_32,
                master_key_descriptor: KeyDescriptor([0x64; 8]),
            },
            [0x2E; NONCE_SIZE],
            Box::new(CtrNameCipher::new([0x99; 32])),
        )
    }

    #[test]
    fn dot_names_pass_through() {
        let info = test_info();
        assert_eq!(
            disk_to_presented(Some(&info), 1, 2, b".").unwrap(),
            b".".to_vec()
        );
        assert_eq!(disk_to_presented(None, 1, 2, b"..").unwrap(), b"..".to_vec());
    }

    #[test]
    fn undersized_disk_name_is_corrupt() {
        assert!(matches!(
            disk_to_presented(None, 0, 0, &[0u8; 15]),
            Err(CryptError::CorruptName)
        ));
    }

    #[test]
    fn with_key_presents_plaintext() {
        let info = test_info();
        let name = b"notes.md";
        let size = encrypted_size(info.flags(), name.len() as u32, 255).unwrap();
        let mut ciphertext = vec![0u8; size as usize];
        fname_encrypt(&info, name, &mut ciphertext).unwrap();

        let presented = disk_to_presented(Some(&info), 0, 0, &ciphertext).unwrap();
        assert_eq!(presented, name);
    }

    #[test]
    fn keyless_short_name_decodes_to_exact_ciphertext() {
        let ciphertext = vec![0x5Au8; 48];
        let presented = disk_to_presented(None, 0x00C0FFEE, 3, &ciphertext).unwrap();

        let decoded = base64::decode(&presented).unwrap();
        let parsed = NokeyName::parse(&decoded).unwrap();
        assert!(!parsed.is_digested());
        assert_eq!(parsed.bytes, ciphertext);
        assert_eq!((parsed.hash, parsed.minor_hash), (0x00C0FFEE, 3));
    }

    #[test]
    fn keyless_long_name_is_digested() {
        let ciphertext: Vec<u8> = (0..200u8).collect();
        let presented = disk_to_presented(None, 0xABCD1234, 0, &ciphertext).unwrap();

        let decoded = base64::decode(&presented).unwrap();
        assert_eq!(decoded.len(), NOKEY_NAME_MAX);

        let parsed = NokeyName::parse(&decoded).unwrap();
        assert_eq!((parsed.hash, parsed.minor_hash), (0xABCD1234, 0));
        assert_eq!(parsed.bytes, &ciphertext[..NOKEY_BYTES_MAX]);

        let expected: [u8; 32] = Sha256::digest(&ciphertext[NOKEY_BYTES_MAX..]).into();
        assert_eq!(parsed.digest, Some(expected));
    }

    #[test]
    fn presented_name_never_exceeds_name_max() {
        for len in [16usize, 149, 150, 189, 255] {
            let ciphertext = vec![7u8; len];
            let presented = disk_to_presented(None, u32::MAX, u32::MAX, &ciphertext).unwrap();
            assert!(presented.len() <= cloakfs_core::NAME_MAX);
        }
    }

    #[test]
    fn capacity_covers_both_presentations() {
        assert_eq!(presented_capacity(100), 252);
        assert_eq!(presented_capacity(300), 300);
    }
}
