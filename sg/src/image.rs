//! Image records and per-image metadata.

use std::fmt;
use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::reader::ReadRecordExt;

/// Fixed-size image directory entry.
///
/// Two wire layouts exist: 72 bytes with the trailing alpha
/// offset/length pair (header versions 0xD6 and up) and 64 bytes
/// without it. The short layout parses with the alpha fields zeroed, so
/// downstream code only ever branches on `alpha_length > 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRecord {
    /// Byte offset of the payload within the pixel store.
    pub offset: u32,
    /// Primary payload length in bytes.
    pub length: u32,
    /// Length of the uncompressed base layer (isometric images only).
    pub uncompressed_length: u32,
    /// Signed back-reference: 0 means "not a mirror", a negative value
    /// `k` makes this image a mirror of the image `k` records earlier.
    pub invert_offset: i32,
    pub width: i16,
    pub height: i16,
    /// Encoding discriminator.
    pub image_type: u16,
    /// flags[0] selects the external pixel store, flags[3] carries the
    /// isometric tile-grid size (0 = derive from the height).
    pub flags: [u8; 4],
    /// Index of the parent bitmap.
    pub bitmap_id: u8,
    pub alpha_offset: u32,
    /// Length of the alpha mask following the payload; zero when absent.
    pub alpha_length: u32,
}

impl ImageRecord {
    pub(crate) fn read<R: Read>(r: &mut R, include_alpha: bool) -> io::Result<ImageRecord> {
        let offset = r.read_u32::<LittleEndian>()?;
        let length = r.read_u32::<LittleEndian>()?;
        let uncompressed_length = r.read_u32::<LittleEndian>()?;
        r.skip_reserved(4)?;
        let invert_offset = r.read_i32::<LittleEndian>()?;
        let width = r.read_i16::<LittleEndian>()?;
        let height = r.read_i16::<LittleEndian>()?;
        r.skip_reserved(26)?;
        let image_type = r.read_u16::<LittleEndian>()?;
        let flags = r.read_array()?;
        let bitmap_id = r.read_u8()?;
        r.skip_reserved(7)?;
        let (alpha_offset, alpha_length) = if include_alpha {
            (r.read_u32::<LittleEndian>()?, r.read_u32::<LittleEndian>()?)
        } else {
            (0, 0)
        };

        Ok(ImageRecord {
            offset,
            length,
            uncompressed_length,
            invert_offset,
            width,
            height,
            image_type,
            flags,
            bitmap_id,
            alpha_offset,
            alpha_length,
        })
    }

    /// Whether the payload lives in the external pixel store.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.flags[0] != 0
    }
}

/// Metadata of one image within a catalog.
///
/// A mirrored image keeps its own record for metadata but decodes the
/// payload of its *source* record; the catalog resolves the source by
/// index at decode time.
#[derive(Debug)]
pub struct Image {
    id: usize,
    record: ImageRecord,
    mirror_of: Option<usize>,
    bitmap: Option<usize>,
    mirrored: bool,
}

impl Image {
    pub(crate) fn new(id: usize, record: ImageRecord) -> Image {
        Image {
            id,
            mirrored: record.invert_offset != 0,
            record,
            mirror_of: None,
            bitmap: None,
        }
    }

    /// Index of this image within the catalog.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The record this image was parsed from. For a mirrored image this
    /// is the mirror's own record, not the source's.
    #[inline]
    pub fn record(&self) -> &ImageRecord {
        &self.record
    }

    /// Catalog index of the image whose record supplies the payload, if
    /// this image is a backward mirror.
    #[inline]
    pub fn mirror_of(&self) -> Option<usize> {
        self.mirror_of
    }

    /// Catalog index of the parent bitmap; `None` for orphaned images.
    #[inline]
    pub fn bitmap(&self) -> Option<usize> {
        self.bitmap
    }

    /// Whether the decoded raster is flipped horizontally.
    #[inline]
    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn width(&self) -> i16 {
        self.record.width
    }

    pub fn height(&self) -> i16 {
        self.record.height
    }

    pub fn image_type(&self) -> u16 {
        self.record.image_type
    }

    pub fn is_external(&self) -> bool {
        self.record.is_external()
    }

    pub(crate) fn set_mirror_of(&mut self, source: usize) {
        self.mirror_of = Some(source);
    }

    pub(crate) fn set_bitmap(&mut self, bitmap: usize) {
        self.bitmap = Some(bitmap);
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let place = if self.record.is_external() {
            "external"
        } else {
            "internal"
        };
        write!(
            f,
            "image {}: offset {}, length {}, width {}, height {}, type {}, {}",
            self.id,
            self.record.offset,
            self.record.length,
            self.record.width,
            self.record.height,
            self.record.image_type,
            place
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record_bytes(include_alpha: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u32.to_le_bytes()); // offset
        bytes.extend_from_slice(&32u32.to_le_bytes()); // length
        bytes.extend_from_slice(&30u32.to_le_bytes()); // uncompressed length
        bytes.extend_from_slice(&[0xee; 4]); // reserved
        bytes.extend_from_slice(&(-2i32).to_le_bytes()); // invert offset
        bytes.extend_from_slice(&4i16.to_le_bytes()); // width
        bytes.extend_from_slice(&4i16.to_le_bytes()); // height
        bytes.extend_from_slice(&[0xee; 26]); // reserved
        bytes.extend_from_slice(&257u16.to_le_bytes()); // type
        bytes.extend_from_slice(&[1, 0, 0, 3]); // flags
        bytes.push(9); // bitmap id
        bytes.extend_from_slice(&[0xee; 7]); // reserved
        if include_alpha {
            bytes.extend_from_slice(&900u32.to_le_bytes()); // alpha offset
            bytes.extend_from_slice(&16u32.to_le_bytes()); // alpha length
        }
        bytes
    }

    #[test]
    fn parses_the_alpha_aware_layout() {
        let bytes = record_bytes(true);
        assert_eq!(bytes.len(), 72);

        let mut cursor = Cursor::new(bytes);
        let record = ImageRecord::read(&mut cursor, true).unwrap();
        assert_eq!(record.offset, 100);
        assert_eq!(record.length, 32);
        assert_eq!(record.uncompressed_length, 30);
        assert_eq!(record.invert_offset, -2);
        assert_eq!(record.width, 4);
        assert_eq!(record.height, 4);
        assert_eq!(record.image_type, 257);
        assert_eq!(record.flags, [1, 0, 0, 3]);
        assert_eq!(record.bitmap_id, 9);
        assert_eq!(record.alpha_offset, 900);
        assert_eq!(record.alpha_length, 16);
        assert!(record.is_external());
    }

    #[test]
    fn short_layout_zero_fills_the_alpha_fields() {
        let bytes = record_bytes(false);
        assert_eq!(bytes.len(), 64);

        let mut cursor = Cursor::new(bytes);
        let record = ImageRecord::read(&mut cursor, false).unwrap();
        assert_eq!(record.offset, 100);
        assert_eq!(record.alpha_offset, 0);
        assert_eq!(record.alpha_length, 0);
        assert_eq!(cursor.position(), 64);
    }

    #[test]
    fn any_nonzero_invert_offset_marks_a_mirror() {
        let mut record = ImageRecord::default();
        record.invert_offset = 4;
        assert!(Image::new(0, record).mirrored());

        record.invert_offset = -1;
        assert!(Image::new(0, record).mirrored());

        record.invert_offset = 0;
        assert!(!Image::new(0, record).mirrored());
    }

    #[test]
    fn describes_itself() {
        let mut record = ImageRecord::default();
        record.offset = 8;
        record.length = 4;
        record.width = 2;
        record.height = 1;
        record.image_type = 1;
        let image = Image::new(3, record);
        assert_eq!(
            format!("{}", image),
            "image 3: offset 8, length 4, width 2, height 1, type 1, internal"
        );
    }
}
