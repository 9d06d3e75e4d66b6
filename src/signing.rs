//! Keyed integrity tags for result records.

use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// Tag line prefix in a record file
pub const TAG_PREFIX: &str = "HMAC: ";
/// Tag value written in place of a real tag for records that must not be trusted
pub const INVALID_TAG: &str = "INVALID";
/// Fresh keys are this many random bytes
pub const KEY_LEN_BYTES: usize = 32;

const LINE_SEPARATOR: &str = "\n";

/// Secret used to sign and verify records
#[derive(Clone)]
pub struct SigningKey {
    bytes: Vec<u8>,
    mac: HmacSha256,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SigningKey").field(&"<redacted>").finish()
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SigningKey {}

impl SigningKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, StoreError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(StoreError::InvalidKey);
        }
        let mac = HmacSha256::new_from_slice(&bytes).map_err(|_| StoreError::InvalidKey)?;
        Ok(Self { bytes, mac })
    }

    pub fn generate() -> Result<Self, StoreError> {
        let mut secret = [0u8; KEY_LEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self::from_bytes(secret.to_vec())
    }

    /// Read a hex-encoded key file, creating it with a fresh key when absent.
    pub fn load_or_create(path: &Path) -> Result<Self, StoreError> {
        match fs::read_to_string(path) {
            Ok(encoded) => {
                let bytes = hex::decode(encoded.trim()).map_err(|source| StoreError::KeyEncoding {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_bytes(bytes)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let key = Self::generate()?;
                key.write_to(path)?;
                tracing::info!(path = %path.display(), "created signing key");
                Ok(key)
            }
            Err(err) => Err(StoreError::io("failed to read signing key", path, err)),
        }
    }

    fn write_to(&self, path: &Path) -> Result<(), StoreError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .map_err(|err| StoreError::io("failed to create key directory", parent, err))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|err| StoreError::io("failed to create temp key file in", parent, err))?;
        #[cfg(unix)]
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|err| StoreError::io("failed to restrict key file", temp.path(), err))?;
        temp.write_all(hex::encode(&self.bytes).as_bytes())
            .map_err(|err| StoreError::io("failed to write signing key", path, err))?;
        temp.persist(path)
            .map_err(|err| StoreError::io("failed to persist signing key", path, err.error))?;
        Ok(())
    }
}

fn digest<S: AsRef<str>>(lines: &[S], key: &SigningKey) -> Vec<u8> {
    let mut mac = key.mac.clone();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            mac.update(LINE_SEPARATOR.as_bytes());
        }
        mac.update(line.as_ref().as_bytes());
    }
    mac.finalize().into_bytes().to_vec()
}

/// Lowercase hex HMAC-SHA256 over `lines` joined by newlines.
pub fn sign<S: AsRef<str>>(lines: &[S], key: &SigningKey) -> String {
    hex::encode(digest(lines, key))
}

/// True iff `stored_tag` is the tag of `stored_lines` under `key`.
///
/// Only the lowercase hex spelling is accepted. Digests are compared in
/// constant time; the sentinel is never valid.
pub fn verify<S: AsRef<str>>(stored_lines: &[S], stored_tag: &str, key: &SigningKey) -> bool {
    if stored_tag == INVALID_TAG
        || !stored_tag
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return false;
    }
    let Ok(stored) = hex::decode(stored_tag) else {
        return false;
    };

    digest(stored_lines, key).ct_eq(&stored).into()
}

/// Split a record file into body lines and tag, returning the body when it verifies.
///
/// Lines end in exactly one `\n` each, the file included; `\r` never appears.
/// The tag must sit on the last line and appear only once.
pub fn verify_contents<'a>(contents: &'a str, key: &SigningKey) -> Option<Vec<&'a str>> {
    if contents.contains('\r') {
        return None;
    }
    let mut lines: Vec<&str> = contents.strip_suffix(LINE_SEPARATOR)?.split(LINE_SEPARATOR).collect();
    let tag = lines.pop()?.strip_prefix(TAG_PREFIX)?;
    if lines.iter().any(|line| line.starts_with(TAG_PREFIX)) {
        return None;
    }

    verify(&lines, tag, key).then_some(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key() -> SigningKey {
        SigningKey::from_bytes(b"change_this_to_random_secret_key".to_vec()).unwrap()
    }

    fn lines() -> Vec<String> {
        vec![
            "WPM: 60.00".to_string(),
            "Accuracy: 100.00%".to_string(),
            "Timestamp: 20240101_120000".to_string(),
        ]
    }

    #[test]
    fn sign_is_deterministic() {
        assert_eq!(sign(&lines(), &key()), sign(&lines(), &key()));
        assert_eq!(sign(&lines(), &key()).len(), 64);
    }

    #[test]
    fn sign_matches_known_vector() {
        // RFC 4231 test case 2
        let key = SigningKey::from_bytes(b"Jefe".to_vec()).unwrap();
        assert_eq!(
            sign(&["what do ya want for nothing?"], &key),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn sign_joins_with_newlines() {
        let key = key();
        assert_eq!(sign(&["a", "b"], &key), sign(&["a\nb"], &key));
        assert_ne!(sign(&["a", "b"], &key), sign(&["ab"], &key));
    }

    #[test]
    fn any_single_char_change_changes_tag() {
        let key = key();
        let original = sign(&lines(), &key);
        for line_idx in 0..lines().len() {
            let len = lines()[line_idx].len();
            for pos in 0..len {
                let mut changed = lines();
                let mut bytes = changed[line_idx].clone().into_bytes();
                bytes[pos] ^= 0x01;
                changed[line_idx] = String::from_utf8(bytes).unwrap();
                assert_ne!(sign(&changed, &key), original, "line {line_idx} pos {pos}");
            }
        }
    }

    #[test]
    fn order_and_key_change_tag() {
        let mut reordered = lines();
        reordered.swap(0, 1);
        assert_ne!(sign(&reordered, &key()), sign(&lines(), &key()));

        let other = SigningKey::from_bytes(b"another key".to_vec()).unwrap();
        assert_ne!(sign(&lines(), &other), sign(&lines(), &key()));
    }

    #[test]
    fn verify_accepts_own_tag() {
        let tag = sign(&lines(), &key());
        assert!(verify(&lines(), &tag, &key()));
    }

    #[test]
    fn verify_rejects_sentinel_and_garbage() {
        assert!(!verify(&lines(), INVALID_TAG, &key()));
        assert!(!verify(&lines(), "", &key()));
        assert!(!verify(&lines(), "deadbeef", &key()));
    }

    #[test]
    fn verify_rejects_uppercase_tag() {
        let tag = sign(&lines(), &key()).to_uppercase();
        assert!(!verify(&lines(), &tag, &key()));
    }

    #[test]
    fn verify_contents_roundtrip() {
        let key = key();
        let mut contents = lines().join("\n");
        contents.push('\n');
        contents.push_str(&format!("{TAG_PREFIX}{}\n", sign(&lines(), &key)));

        let body = verify_contents(&contents, &key).unwrap();
        assert_eq!(body, lines());
    }

    #[test]
    fn verify_contents_requires_trailing_tag() {
        let key = key();
        let tag = sign(&lines(), &key);
        let contents = format!("{TAG_PREFIX}{tag}\n{}\n", lines().join("\n"));
        assert!(verify_contents(&contents, &key).is_none());
        assert!(verify_contents(&lines().join("\n"), &key).is_none());
        assert!(verify_contents("", &key).is_none());
    }

    fn signed_contents(key: &SigningKey) -> String {
        format!("{}\n{TAG_PREFIX}{}\n", lines().join("\n"), sign(&lines(), key))
    }

    #[test]
    fn verify_contents_rejects_carriage_returns() {
        let key = key();
        let contents = signed_contents(&key);
        assert!(verify_contents(&contents, &key).is_some());
        assert!(verify_contents(&contents.replace('\n', "\r\n"), &key).is_none());
    }

    #[test]
    fn verify_contents_requires_exactly_one_final_newline() {
        let key = key();
        let contents = signed_contents(&key);
        assert!(verify_contents(contents.trim_end_matches('\n'), &key).is_none());
        assert!(verify_contents(&format!("{contents}\n"), &key).is_none());
    }

    #[test]
    fn verify_rejects_truncated_tag() {
        let tag = sign(&lines(), &key());
        assert!(!verify(&lines(), &tag[..62], &key()));
        assert!(!verify(&lines(), &format!("{tag}00"), &key()));
    }

    #[test]
    fn verify_contents_rejects_duplicate_tag_lines() {
        let key = key();
        let mut body = lines();
        body.push(format!("{TAG_PREFIX}{INVALID_TAG}"));
        let tag = sign(&body, &key);
        let contents = format!("{}\n{TAG_PREFIX}{tag}\n", body.join("\n"));
        assert!(verify_contents(&contents, &key).is_none());
    }

    #[test]
    fn empty_key_rejected() {
        assert!(matches!(
            SigningKey::from_bytes(Vec::new()),
            Err(StoreError::InvalidKey)
        ));
    }

    #[test]
    fn key_file_created_then_reloaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("signing.key");

        let created = SigningKey::load_or_create(&path).unwrap();
        let encoded = fs::read_to_string(&path).unwrap();
        assert_eq!(encoded.trim().len(), KEY_LEN_BYTES * 2);

        let reloaded = SigningKey::load_or_create(&path).unwrap();
        assert_eq!(created, reloaded);
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_private() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signing.key");
        SigningKey::load_or_create(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_key_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signing.key");
        fs::write(&path, "not hex").unwrap();

        assert!(matches!(
            SigningKey::load_or_create(&path),
            Err(StoreError::KeyEncoding { .. })
        ));
    }

    #[test]
    fn debug_does_not_leak_key() {
        assert!(!format!("{:?}", key()).contains("change_this"));
    }
}
