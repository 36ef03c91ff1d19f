//! Store-only ZIP archive writer.
//!
//! Layout of the produced buffer:
//!
//! ```text
//! [local header 1][name 1][data 1] ... [local header N][name N][data N]
//! [central record 1][name 1] ... [central record N][name N]
//! [end of central directory]
//! ```
//!
//! Entries are never compressed, so the compressed and uncompressed sizes are
//! always the entry length. Every entry carries general purpose bit 11 so the
//! names are read back as UTF-8.

use chrono::{DateTime, Datelike, Timelike, Utc};

use super::{
    crc32, ArchiveError, CENTRAL_DIRECTORY_HEADER_LEN, CENTRAL_DIRECTORY_SIGNATURE,
    END_OF_CENTRAL_DIRECTORY_LEN, END_OF_CENTRAL_DIRECTORY_SIGNATURE, FLAG_UTF8_NAMES,
    LOCAL_FILE_HEADER_LEN, LOCAL_FILE_HEADER_SIGNATURE, METHOD_STORE, ZIP_VERSION,
};

/// MS-DOS packed modification time and date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// Pack a UTC timestamp. Years before 1980 clamp to 1980; seconds are
    /// stored at two-second resolution.
    pub fn from_utc(ts: DateTime<Utc>) -> Self {
        let year = (ts.year().clamp(1980, 2107) - 1980) as u16;
        let time = ((ts.hour() as u16) << 11) | ((ts.minute() as u16) << 5) | (ts.second() as u16 / 2);
        let date = (year << 9) | ((ts.month() as u16) << 5) | ts.day() as u16;
        Self { time, date }
    }
}

struct PendingEntry {
    name: Vec<u8>,
    data: Vec<u8>,
}

struct WrittenEntry {
    name: Vec<u8>,
    crc: u32,
    size: u32,
    offset: u32,
}

/// Collects named buffers and assembles them into one archive
pub struct ZipWriter {
    modified: DosDateTime,
    entries: Vec<PendingEntry>,
}

impl ZipWriter {
    /// Create a writer stamping every entry with the current time
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    /// Create a writer stamping every entry with `modified`
    pub fn with_timestamp(modified: DateTime<Utc>) -> Self {
        Self {
            modified: DosDateTime::from_utc(modified),
            entries: Vec::new(),
        }
    }

    /// Queue an entry; entries are written in the order they are added
    pub fn add_entry(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> &mut Self {
        self.entries.push(PendingEntry {
            name: name.into().into_bytes(),
            data: data.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assemble the archive bytes
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let entry_count =
            u16::try_from(self.entries.len()).map_err(|_| ArchiveError::TooLarge("entry count"))?;

        let payload_len: usize = self
            .entries
            .iter()
            .map(|e| LOCAL_FILE_HEADER_LEN + CENTRAL_DIRECTORY_HEADER_LEN + 2 * e.name.len() + e.data.len())
            .sum();
        let mut out = Vec::with_capacity(payload_len + END_OF_CENTRAL_DIRECTORY_LEN);
        let mut written = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            let name_len =
                u16::try_from(entry.name.len()).map_err(|_| ArchiveError::TooLarge("entry name"))?;
            let size =
                u32::try_from(entry.data.len()).map_err(|_| ArchiveError::TooLarge("entry size"))?;
            let offset =
                u32::try_from(out.len()).map_err(|_| ArchiveError::TooLarge("archive size"))?;
            let crc = crc32(&entry.data);

            put_u32(&mut out, LOCAL_FILE_HEADER_SIGNATURE);
            put_u16(&mut out, ZIP_VERSION);
            put_u16(&mut out, FLAG_UTF8_NAMES);
            put_u16(&mut out, METHOD_STORE);
            put_u16(&mut out, self.modified.time);
            put_u16(&mut out, self.modified.date);
            put_u32(&mut out, crc);
            put_u32(&mut out, size); // compressed
            put_u32(&mut out, size); // uncompressed
            put_u16(&mut out, name_len);
            put_u16(&mut out, 0); // extra field length
            out.extend_from_slice(&entry.name);
            out.extend_from_slice(&entry.data);

            written.push(WrittenEntry {
                name: entry.name,
                crc,
                size,
                offset,
            });
        }

        let directory_offset =
            u32::try_from(out.len()).map_err(|_| ArchiveError::TooLarge("archive size"))?;

        for entry in &written {
            put_u32(&mut out, CENTRAL_DIRECTORY_SIGNATURE);
            put_u16(&mut out, ZIP_VERSION); // version made by
            put_u16(&mut out, ZIP_VERSION); // version needed
            put_u16(&mut out, FLAG_UTF8_NAMES);
            put_u16(&mut out, METHOD_STORE);
            put_u16(&mut out, self.modified.time);
            put_u16(&mut out, self.modified.date);
            put_u32(&mut out, entry.crc);
            put_u32(&mut out, entry.size);
            put_u32(&mut out, entry.size);
            put_u16(&mut out, entry.name.len() as u16);
            put_u16(&mut out, 0); // extra field length
            put_u16(&mut out, 0); // comment length
            put_u16(&mut out, 0); // disk number start
            put_u16(&mut out, 0); // internal attributes
            put_u32(&mut out, 0); // external attributes
            put_u32(&mut out, entry.offset);
            out.extend_from_slice(&entry.name);
        }

        let directory_size = u32::try_from(out.len() - directory_offset as usize)
            .map_err(|_| ArchiveError::TooLarge("central directory"))?;
        u32::try_from(out.len() + END_OF_CENTRAL_DIRECTORY_LEN)
            .map_err(|_| ArchiveError::TooLarge("archive size"))?;

        put_u32(&mut out, END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        put_u16(&mut out, 0); // this disk
        put_u16(&mut out, 0); // disk with central directory
        put_u16(&mut out, entry_count); // entries on this disk
        put_u16(&mut out, entry_count); // total entries
        put_u32(&mut out, directory_size);
        put_u32(&mut out, directory_offset);
        put_u16(&mut out, 0); // comment length

        Ok(out)
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn fixed_writer() -> ZipWriter {
        ZipWriter::with_timestamp(Utc.with_ymd_and_hms(2024, 5, 17, 13, 45, 31).unwrap())
    }

    #[test]
    fn test_dos_date_time_packing() {
        let packed = DosDateTime::from_utc(Utc.with_ymd_and_hms(2024, 5, 17, 13, 45, 31).unwrap());
        assert_eq!(packed.time, (13 << 11) | (45 << 5) | 15);
        assert_eq!(packed.date, (44 << 9) | (5 << 5) | 17);

        let early = DosDateTime::from_utc(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(early.date >> 9, 0);
    }

    #[test]
    fn test_empty_archive_is_only_end_record() {
        let bytes = fixed_writer().finish().unwrap();
        assert_eq!(bytes.len(), END_OF_CENTRAL_DIRECTORY_LEN);
        assert_eq!(u32_at(&bytes, 0), END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        assert_eq!(u16_at(&bytes, 8), 0);
        assert_eq!(u32_at(&bytes, 12), 0);
        assert_eq!(u32_at(&bytes, 16), 0);
    }

    #[test]
    fn test_single_entry_layout() {
        let mut writer = fixed_writer();
        writer.add_entry("a.csv", b"hello".to_vec());
        let bytes = writer.finish().unwrap();

        // local header
        assert_eq!(u32_at(&bytes, 0), LOCAL_FILE_HEADER_SIGNATURE);
        assert_eq!(u16_at(&bytes, 4), 20);
        assert_eq!(u16_at(&bytes, 6), 0x0800);
        assert_eq!(u16_at(&bytes, 8), 0);
        assert_eq!(u32_at(&bytes, 14), crc32(b"hello"));
        assert_eq!(u32_at(&bytes, 18), 5);
        assert_eq!(u32_at(&bytes, 22), 5);
        assert_eq!(u16_at(&bytes, 26), 5);
        assert_eq!(u16_at(&bytes, 28), 0);
        assert_eq!(&bytes[30..35], b"a.csv");
        assert_eq!(&bytes[35..40], b"hello");

        // central directory starts right after the data
        let cd = 40;
        assert_eq!(u32_at(&bytes, cd), CENTRAL_DIRECTORY_SIGNATURE);
        assert_eq!(u16_at(&bytes, cd + 8), 0x0800);
        assert_eq!(u32_at(&bytes, cd + 16), crc32(b"hello"));
        assert_eq!(u32_at(&bytes, cd + 42), 0);
        assert_eq!(&bytes[cd + 46..cd + 51], b"a.csv");

        // end record
        let eocd = cd + 46 + 5;
        assert_eq!(bytes.len(), eocd + 22);
        assert_eq!(u32_at(&bytes, eocd), END_OF_CENTRAL_DIRECTORY_SIGNATURE);
        assert_eq!(u16_at(&bytes, eocd + 8), 1);
        assert_eq!(u16_at(&bytes, eocd + 10), 1);
        assert_eq!(u32_at(&bytes, eocd + 12), 51);
        assert_eq!(u32_at(&bytes, eocd + 16), 40);
        assert_eq!(u16_at(&bytes, eocd + 20), 0);
    }

    #[test]
    fn test_offsets_track_each_entry() {
        let mut writer = fixed_writer();
        writer
            .add_entry("babies.csv", b"id\n".to_vec())
            .add_entry("baby-data.csv", Vec::<u8>::new());
        assert_eq!(writer.len(), 2);
        let bytes = writer.finish().unwrap();

        let second_offset = 30 + "babies.csv".len() + 3;
        assert_eq!(u32_at(&bytes, second_offset), LOCAL_FILE_HEADER_SIGNATURE);

        let cd_offset = second_offset + 30 + "baby-data.csv".len();
        let first_cd = cd_offset;
        let second_cd = first_cd + 46 + "babies.csv".len();
        assert_eq!(u32_at(&bytes, first_cd + 42), 0);
        assert_eq!(u32_at(&bytes, second_cd + 42) as usize, second_offset);
        assert_eq!(u32_at(&bytes, second_cd + 24), 0);
    }

    #[test]
    fn test_utf8_name_is_stored_as_bytes() {
        let mut writer = fixed_writer();
        writer.add_entry("größe.csv", b"x".to_vec());
        let bytes = writer.finish().unwrap();
        let name_len = u16_at(&bytes, 26) as usize;
        assert_eq!(name_len, "größe.csv".len());
        assert_eq!(&bytes[30..30 + name_len], "größe.csv".as_bytes());
    }
}
