//! Tar entry synthesis
//!
//! Entries are written as raw header + data + padding blocks. Nothing here
//! writes the end-of-archive marker unless asked, so several of these
//! fragments can be concatenated into one archive.

use crate::error::{FryerError, FryerResult};
use tar::{EntryType, Header};

/// Tar block size in bytes
pub const BLOCK_SIZE: u64 = 512;

/// Header block for a regular file entry
pub fn file_header(name: &str, size: u64, mode: u32) -> FryerResult<Vec<u8>> {
    let mut header = Header::new_ustar();
    header
        .set_path(name)
        .map_err(|e| FryerError::io(format!("setting tar entry path {}", name), e))?;
    header.set_entry_type(EntryType::Regular);
    header.set_size(size);
    header.set_mode(mode);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_cksum();
    Ok(header.as_bytes().to_vec())
}

/// Zero bytes needed to pad `size` bytes of data to a block boundary
pub fn padding(size: u64) -> Vec<u8> {
    let rem = size % BLOCK_SIZE;
    let len = if rem == 0 { 0 } else { BLOCK_SIZE - rem };
    vec![0u8; len as usize]
}

/// Two zero blocks
pub fn end_of_archive() -> Vec<u8> {
    vec![0u8; 2 * BLOCK_SIZE as usize]
}

/// Append one complete file entry to an in-memory archive fragment
pub fn append_file(buf: &mut Vec<u8>, name: &str, mode: u32, data: &[u8]) -> FryerResult<()> {
    buf.extend_from_slice(&file_header(name, data.len() as u64, mode)?);
    buf.extend_from_slice(data);
    buf.extend_from_slice(&padding(data.len() as u64));
    Ok(())
}
