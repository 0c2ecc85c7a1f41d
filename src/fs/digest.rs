//! File content digests.

use crate::error::{LockdownError, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Hash algorithm for [`file_digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    #[default]
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = LockdownError;

    /// Accepts the usual spellings, case-insensitively: `MD5`, `SHA-1`/`SHA1`,
    /// `SHA-256`/`SHA256`, `SHA-512`/`SHA512`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(LockdownError::UserError(format!(
                "unsupported digest algorithm '{}' (expected MD5, SHA-1, SHA-256 or SHA-512)",
                s
            ))),
        }
    }
}

/// Hash the contents of `path` and return the digest as lowercase hex.
///
/// The file is streamed, not loaded whole.
///
/// # Example
///
/// ```no_run
/// use lockdown::fs::{DigestAlgorithm, file_digest};
///
/// let sum = file_digest("cache/app.jar", DigestAlgorithm::Sha256)?;
/// println!("{sum}");
/// # Ok::<(), lockdown::error::LockdownError>(())
/// ```
pub fn file_digest<P: AsRef<Path>>(path: P, algorithm: DigestAlgorithm) -> Result<String> {
    let path = path.as_ref();
    let io_err = |source| LockdownError::Io {
        action: "failed to hash",
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let reader = BufReader::new(file);
    let digest = match algorithm {
        DigestAlgorithm::Md5 => hash_reader::<Md5, _>(reader),
        DigestAlgorithm::Sha1 => hash_reader::<Sha1, _>(reader),
        DigestAlgorithm::Sha256 => hash_reader::<Sha256, _>(reader),
        DigestAlgorithm::Sha512 => hash_reader::<Sha512, _>(reader),
    }
    .map_err(io_err)?;

    Ok(hex::encode(digest))
}

fn hash_reader<D: Digest, R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}
