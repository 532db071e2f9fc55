//! Binary vault file format.
//!
//! A `.spdb` file has this layout:
//!
//! ```text
//! [SECUREPASS_DB_V1: 16 bytes][nonce: 12 bytes][ciphertext + GCM tag]
//! ```
//!
//! - **Magic** (`SECUREPASS_DB_V1`): identifies the file.  Checked before
//!   any key is derived, so foreign files are rejected cheaply.
//! - **Sealed payload**: the serialized relational store, encrypted with
//!   the envelope key by [`crate::crypto::cipher::seal`].

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::crypto::cipher::{self, NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::DerivedKey;
use crate::errors::{Result, VaultError};

/// Magic bytes at the start of every vault file.
pub const MAGIC: &[u8; 16] = b"SECUREPASS_DB_V1";

/// Return `true` if `path` starts with the vault magic.
///
/// Reads at most `MAGIC.len()` bytes and never attempts decryption.
/// Unreadable or short files are simply "not a vault".
pub fn is_vault_file(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    let mut prefix = [0u8; MAGIC.len()];
    match file.read_exact(&mut prefix) {
        Ok(()) => &prefix == MAGIC,
        Err(_) => false,
    }
}

/// Seal `plaintext` with `key` and write `magic || sealed` to `path`
/// **atomically**.
///
/// 1. Encrypt the plaintext store bytes.
/// 2. Write to a temp file in the same directory and flush it to disk.
/// 3. Rename temp file over the target path.
/// 4. Flush the parent directory so the rename itself is durable.
///
/// The rename ensures readers never see a half-written file; a crash
/// before step 3 leaves the previous vault untouched.
pub fn write_envelope(path: &Path, key: &DerivedKey, plaintext: &[u8]) -> Result<()> {
    let sealed = cipher::seal(key, plaintext)?;

    let mut buf = Vec::with_capacity(MAGIC.len() + sealed.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&sealed);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = sibling_temp_path(path);
    let written = write_synced(&tmp_path, &buf);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    sync_parent_dir(path)?;

    tracing::debug!(path = %path.display(), bytes = buf.len(), "vault envelope sealed");
    Ok(())
}

/// Read the vault at `path`, check the magic, and open the sealed payload.
///
/// - Missing file: `VaultNotFound`.
/// - Wrong magic or too short: `InvalidFormat` (no key material touched).
/// - AEAD failure: `WrongPasswordOrCorrupt`.
pub fn read_envelope(path: &Path, key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>> {
    if !path.exists() {
        return Err(VaultError::VaultNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;

    if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
        return Err(VaultError::InvalidFormat(
            "missing SECUREPASS_DB_V1 magic bytes".into(),
        ));
    }

    let sealed = &data[MAGIC.len()..];
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::InvalidFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    cipher::open(key, sealed)
}

/// `dir/.name.tmp` next to the target, so the rename stays on one filesystem.
fn sibling_temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// fsync the directory holding `path`.  A bare file name means the
/// current directory.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}
