//! The on-disk container: magic, version byte, compressed payload.
//!
//! ```text
//! offset 0..4 : magic b"ASTX"
//! offset 4    : format version
//! offset 5..  : gzip-compressed postcard serialization of the program
//! ```
//!
//! Unpacking validates magic and version before touching the compressed
//! bytes, so framing errors never surface as decompression noise.

use std::io::{Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use crate::{bytecode::CompiledProgram, error::ContainerError};

pub const MAGIC: [u8; 4] = *b"ASTX";
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = MAGIC.len() + 1;

/// Serializes a compiled program into container bytes.
pub fn pack(program: &CompiledProgram) -> Result<Vec<u8>, ContainerError> {
    let payload = postcard::to_allocvec(program)?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() / 2);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);

    let mut encoder = GzEncoder::new(out, Compression::default());
    encoder.write_all(&payload)?;
    Ok(encoder.finish()?)
}

/// Parses container bytes back into a compiled program.
pub fn unpack(bytes: &[u8]) -> Result<CompiledProgram, ContainerError> {
    if bytes.len() < HEADER_LEN {
        return Err(ContainerError::Truncated);
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(ContainerError::BadMagic);
    }
    let version = bytes[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(ContainerError::UnsupportedVersion {
            found: version,
            current: FORMAT_VERSION,
        });
    }

    let mut payload = Vec::new();
    GzDecoder::new(&bytes[HEADER_LEN..]).read_to_end(&mut payload)?;
    Ok(postcard::from_bytes(&payload)?)
}
