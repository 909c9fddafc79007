//! The fixed header at the start of every SG file.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

use crate::bitmap;

/// Size of the header region at the start of every SG file. Only the
/// first 40 bytes carry declared fields; the bitmap record table starts
/// right after the region.
pub const HEADER_SIZE: u64 = 680;

/// Versions from 0xD6 on store an alpha offset/length pair in every
/// image record.
const ALPHA_VERSION: u32 = 0xd6;

/// Declared fields of the SG header.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    /// Archive size as declared by the producer. Not necessarily the
    /// real file size, see [`accepts`](#method.accepts).
    pub sg_filesize: u32,
    /// File generation: 0xD3 for SG2, 0xD5/0xD6 for SG3.
    pub version: u32,
    pub unknown1: u32,
    pub max_image_records: i32,
    pub num_image_records: i32,
    pub num_bitmap_records: i32,
    /// Bitmap record count excluding the "system" bitmap.
    pub num_bitmap_records_without_system: i32,
    pub total_filesize: u32,
    pub filesize_555: u32,
    pub filesize_external: u32,
}

impl Header {
    /// Reads the declared fields and leaves the cursor at the end of the
    /// 680-byte header region; the trailing bytes are unused.
    pub(crate) fn read<R: Read + Seek>(r: &mut R) -> io::Result<Header> {
        let header = Header {
            sg_filesize: r.read_u32::<LittleEndian>()?,
            version: r.read_u32::<LittleEndian>()?,
            unknown1: r.read_u32::<LittleEndian>()?,
            max_image_records: r.read_i32::<LittleEndian>()?,
            num_image_records: r.read_i32::<LittleEndian>()?,
            num_bitmap_records: r.read_i32::<LittleEndian>()?,
            num_bitmap_records_without_system: r.read_i32::<LittleEndian>()?,
            total_filesize: r.read_u32::<LittleEndian>()?,
            filesize_555: r.read_u32::<LittleEndian>()?,
            filesize_external: r.read_u32::<LittleEndian>()?,
        };
        r.seek(SeekFrom::Start(HEADER_SIZE))?;
        Ok(header)
    }

    /// Whether the version / declared size pair is one this library
    /// accepts.
    ///
    /// SG2 archives declare one of two fixed sizes (the "enemy" archives
    /// are the larger one). SG3 archives declare either the fixed demo
    /// size or their actual size on disk, which the caller passes in.
    pub fn accepts(&self, disk_size: u64) -> bool {
        match self.version {
            0xd3 => self.sg_filesize == 74_480 || self.sg_filesize == 522_680,
            0xd5 | 0xd6 => {
                self.sg_filesize == 74_480 || u64::from(self.sg_filesize) == disk_size
            }
            _ => false,
        }
    }

    /// Number of bitmap record slots reserved in the file. SG2 files
    /// reserve 100, SG3 files 200; the slots are present on disk whether
    /// used or not, so this is a stride rather than a count.
    pub fn max_bitmap_records(&self) -> u32 {
        if self.version == 0xd3 {
            100
        } else {
            200
        }
    }

    /// Whether image records carry the trailing alpha offset/length pair.
    pub fn has_alpha(&self) -> bool {
        self.version >= ALPHA_VERSION
    }

    /// Absolute offset of the image record table.
    pub(crate) fn image_table_offset(&self) -> u64 {
        HEADER_SIZE + u64::from(self.max_bitmap_records()) * bitmap::RECORD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(version: u32, sg_filesize: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&sg_filesize.to_le_bytes());
        bytes.extend_from_slice(&version.to_le_bytes());
        for field in &[0u32, 300, 200, 2, 1, 0, 0, 0] {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        bytes.resize(HEADER_SIZE as usize + 8, 0xaa);
        bytes
    }

    #[test]
    fn reads_fields_and_seeks_past_region() {
        let mut cursor = Cursor::new(header_bytes(0xd6, 74_480));
        let header = Header::read(&mut cursor).unwrap();

        assert_eq!(header.sg_filesize, 74_480);
        assert_eq!(header.version, 0xd6);
        assert_eq!(header.max_image_records, 300);
        assert_eq!(header.num_image_records, 200);
        assert_eq!(header.num_bitmap_records, 2);
        assert_eq!(header.num_bitmap_records_without_system, 1);
        assert_eq!(cursor.position(), HEADER_SIZE);
    }

    #[test]
    fn accepts_sg2_fixed_sizes_only() {
        let mut cursor = Cursor::new(header_bytes(0xd3, 74_480));
        let header = Header::read(&mut cursor).unwrap();
        assert!(header.accepts(0));

        let mut cursor = Cursor::new(header_bytes(0xd3, 522_680));
        let header = Header::read(&mut cursor).unwrap();
        assert!(header.accepts(0));

        // off by one from the known layout
        let mut cursor = Cursor::new(header_bytes(0xd3, 74_481));
        let header = Header::read(&mut cursor).unwrap();
        assert!(!header.accepts(74_481));
    }

    #[test]
    fn accepts_sg3_by_disk_size() {
        let mut cursor = Cursor::new(header_bytes(0xd5, 123_456));
        let header = Header::read(&mut cursor).unwrap();
        assert!(header.accepts(123_456));
        assert!(!header.accepts(123_457));

        let mut cursor = Cursor::new(header_bytes(0xd6, 74_480));
        let header = Header::read(&mut cursor).unwrap();
        assert!(header.accepts(0));
    }

    #[test]
    fn rejects_unknown_versions() {
        let mut cursor = Cursor::new(header_bytes(0xd4, 74_480));
        let header = Header::read(&mut cursor).unwrap();
        assert!(!header.accepts(74_480));
    }

    #[test]
    fn bitmap_stride_depends_on_version() {
        let mut cursor = Cursor::new(header_bytes(0xd3, 74_480));
        let header = Header::read(&mut cursor).unwrap();
        assert_eq!(header.max_bitmap_records(), 100);
        assert!(!header.has_alpha());

        let mut cursor = Cursor::new(header_bytes(0xd6, 74_480));
        let header = Header::read(&mut cursor).unwrap();
        assert_eq!(header.max_bitmap_records(), 200);
        assert!(header.has_alpha());
        assert_eq!(header.image_table_offset(), 680 + 200 * 200);
    }
}
