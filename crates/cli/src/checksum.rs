//! Parameter file checksums
//!
//! SHA family and BLAKE2b digests are computed in-process. `crc` and `md5`
//! are delegated to the coreutils tools that define their output format.

use crate::common::FileOps;
use crate::toolchain::Toolchain;
use crate::{CliError, Result};
use blake2::Blake2b512;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{error, info};
use zkey_setup::{Checksum, ChecksumAlgorithm};

fn hash_file<D: Digest>(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = D::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of `path` as the lowercase text the matching coreutils tool prints.
pub fn file_digest(toolchain: &Toolchain<'_>, algorithm: ChecksumAlgorithm, path: &Path) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Sha1 => hash_file::<Sha1>(path),
        ChecksumAlgorithm::Sha224 => hash_file::<Sha224>(path),
        ChecksumAlgorithm::Sha256 => hash_file::<Sha256>(path),
        ChecksumAlgorithm::Sha384 => hash_file::<Sha384>(path),
        ChecksumAlgorithm::Sha512 => hash_file::<Sha512>(path),
        // b2sum prints the 512-bit variant by default.
        ChecksumAlgorithm::Blake2b => hash_file::<Blake2b512>(path),
        ChecksumAlgorithm::Crc | ChecksumAlgorithm::Md5 => {
            let tool = algorithm.coreutils_tool();
            let output = toolchain.digest(tool, path)?;
            // `<digest> [size] <file>`; the digest is always the first field.
            match output.stdout.split_whitespace().next() {
                Some(digest) if output.is_success() => Ok(digest.to_ascii_lowercase()),
                _ => Err(CliError::DigestFailure {
                    tool: tool.to_string(),
                    path: path.to_path_buf(),
                    stderr: output.stderr.trim().to_string(),
                }),
            }
        }
    }
}

/// Check `path` against `expected`. A mismatching file is deleted so later
/// no-clobber runs do not mistake it for a good download.
pub fn verify_file(toolchain: &Toolchain<'_>, expected: &Checksum, path: &Path) -> Result<()> {
    let actual = file_digest(toolchain, expected.algorithm, path)?;
    if actual.eq_ignore_ascii_case(expected.digest.trim()) {
        info!(file = %path.display(), algorithm = %expected.algorithm, "checksum passed");
        return Ok(());
    }

    error!(file = %path.display(), "checksum failed, removing file");
    FileOps::remove_file_if_exists(path)?;
    Err(CliError::ChecksumMismatch {
        path: path.to_path_buf(),
        algorithm: expected.algorithm,
        expected: expected.digest.clone(),
        actual,
    })
}
