//! Store-only ZIP archive reader.
//!
//! The end of central directory record is located by scanning backward over
//! at most the last 64 KiB + 22 bytes (the largest possible archive comment
//! plus the record itself). A candidate only counts when its comment runs
//! exactly to the end of the buffer and its central directory ends where the
//! record starts. The central directory is then walked in order and
//! each entry is sliced out of the buffer via its local header. Any structural
//! problem aborts the whole read; no partial results are returned.

use super::{
    crc32, ArchiveError, CENTRAL_DIRECTORY_HEADER_LEN, CENTRAL_DIRECTORY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_LEN, END_OF_CENTRAL_DIRECTORY_SIGNATURE, LOCAL_FILE_HEADER_LEN,
    LOCAL_FILE_HEADER_SIGNATURE, METHOD_STORE,
};

const MAX_COMMENT_LEN: usize = u16::MAX as usize;

/// One named buffer extracted from an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Entries of an archive in central directory order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Content of the entry called `name`. When a name repeats, the last entry wins.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.entries
    }
}

struct DirectoryRecord {
    name: String,
    method: u16,
    crc: u32,
    size: u32,
    local_header_offset: u32,
}

/// Read a store-only archive, verifying each entry's CRC-32
pub fn read_archive(bytes: &[u8]) -> Result<Archive, ArchiveError> {
    read_archive_with(bytes, true)
}

/// Read a store-only archive, optionally skipping CRC-32 verification
pub fn read_archive_with(bytes: &[u8], verify_checksums: bool) -> Result<Archive, ArchiveError> {
    let eocd = find_end_of_central_directory(bytes)?;
    let directory_size = read_u32(bytes, eocd + 12)? as usize;
    let directory_offset = read_u32(bytes, eocd + 16)? as usize;

    let directory_end = directory_offset
        .checked_add(directory_size)
        .filter(|end| *end <= eocd)
        .ok_or(ArchiveError::InvalidArchive("central directory out of bounds"))?;

    let records = read_central_directory(bytes, directory_offset, directory_end)?;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let data = read_local_entry(bytes, &record)?;
        if verify_checksums && crc32(data) != record.crc {
            return Err(ArchiveError::ChecksumMismatch { name: record.name });
        }
        entries.push(ArchiveEntry {
            name: record.name,
            data: data.to_vec(),
        });
    }

    Ok(Archive { entries })
}

fn find_end_of_central_directory(bytes: &[u8]) -> Result<usize, ArchiveError> {
    if bytes.len() < END_OF_CENTRAL_DIRECTORY_LEN {
        return Err(ArchiveError::InvalidArchive("end of central directory not found"));
    }

    let last = bytes.len() - END_OF_CENTRAL_DIRECTORY_LEN;
    let first = bytes
        .len()
        .saturating_sub(MAX_COMMENT_LEN + END_OF_CENTRAL_DIRECTORY_LEN);
    let signature = END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes();

    (first..=last)
        .rev()
        .find(|&pos| bytes[pos..pos + 4] == signature && closes_archive(bytes, pos))
        .ok_or(ArchiveError::InvalidArchive("end of central directory not found"))
}

/// A genuine end record spans exactly to the end of the buffer through its
/// comment, and its central directory ends where the record begins.
fn closes_archive(bytes: &[u8], pos: usize) -> bool {
    let (Ok(size), Ok(offset), Ok(comment_len)) = (
        read_u32(bytes, pos + 12),
        read_u32(bytes, pos + 16),
        read_u16(bytes, pos + 20),
    ) else {
        return false;
    };

    pos + END_OF_CENTRAL_DIRECTORY_LEN + comment_len as usize == bytes.len()
        && (offset as usize).checked_add(size as usize) == Some(pos)
}

fn read_central_directory(
    bytes: &[u8],
    start: usize,
    end: usize,
) -> Result<Vec<DirectoryRecord>, ArchiveError> {
    let mut records = Vec::new();
    let mut pos = start;

    while pos < end {
        if pos + CENTRAL_DIRECTORY_HEADER_LEN > end {
            return Err(ArchiveError::InvalidArchive("truncated central directory"));
        }
        if read_u32(bytes, pos)? != CENTRAL_DIRECTORY_SIGNATURE {
            return Err(ArchiveError::InvalidArchive("bad central directory signature"));
        }

        let method = read_u16(bytes, pos + 10)?;
        let crc = read_u32(bytes, pos + 16)?;
        let size = read_u32(bytes, pos + 20)?;
        let name_len = read_u16(bytes, pos + 28)? as usize;
        let extra_len = read_u16(bytes, pos + 30)? as usize;
        let comment_len = read_u16(bytes, pos + 32)? as usize;
        let local_header_offset = read_u32(bytes, pos + 42)?;

        let name_start = pos + CENTRAL_DIRECTORY_HEADER_LEN;
        let name_bytes = slice(bytes, name_start, name_len)?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        if method != METHOD_STORE {
            return Err(ArchiveError::UnsupportedEntry { name, method });
        }

        records.push(DirectoryRecord {
            name,
            method,
            crc,
            size,
            local_header_offset,
        });
        pos = name_start + name_len + extra_len + comment_len;
    }

    Ok(records)
}

fn read_local_entry<'a>(bytes: &'a [u8], record: &DirectoryRecord) -> Result<&'a [u8], ArchiveError> {
    let header = record.local_header_offset as usize;
    if read_u32(bytes, header)? != LOCAL_FILE_HEADER_SIGNATURE {
        return Err(ArchiveError::InvalidArchive("bad local header signature"));
    }

    let method = read_u16(bytes, header + 8)?;
    if method != METHOD_STORE || record.method != METHOD_STORE {
        return Err(ArchiveError::UnsupportedEntry {
            name: record.name.clone(),
            method,
        });
    }

    // Name and extra lengths in the local header may differ from the central record
    let name_len = read_u16(bytes, header + 26)? as usize;
    let extra_len = read_u16(bytes, header + 28)? as usize;
    let data_start = header + LOCAL_FILE_HEADER_LEN + name_len + extra_len;

    slice(bytes, data_start, record.size as usize)
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], ArchiveError> {
    start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or(ArchiveError::InvalidArchive("unexpected end of archive"))
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, ArchiveError> {
    let raw = slice(bytes, offset, 2)?;
    Ok(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ArchiveError> {
    let raw = slice(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}
