//! Bitmap records and the per-bitmap image view.
//!
//! A *bitmap* is a named group of images within one SG file. Its record
//! names the external pixel store the group's payloads may live in.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::image::ImageRecord;
use crate::reader::{field_string, ReadRecordExt};
use crate::store::PixelStore;
use crate::Error;

/// Wire size of a bitmap record.
pub(crate) const RECORD_SIZE: u64 = 200;

/// Fixed-size bitmap directory entry, 200 bytes on disk.
#[derive(Clone, Copy)]
pub struct BitmapRecord {
    pub filename: [u8; 65],
    pub comment: [u8; 51],
    pub width: u32,
    pub height: u32,
    pub num_images: u32,
    pub start_index: u32,
    pub end_index: u32,
}

impl BitmapRecord {
    pub(crate) fn read<R: Read>(r: &mut R) -> io::Result<BitmapRecord> {
        let record = BitmapRecord {
            filename: r.read_array()?,
            comment: r.read_array()?,
            width: r.read_u32::<LittleEndian>()?,
            height: r.read_u32::<LittleEndian>()?,
            num_images: r.read_u32::<LittleEndian>()?,
            start_index: r.read_u32::<LittleEndian>()?,
            end_index: r.read_u32::<LittleEndian>()?,
        };
        r.skip_reserved(64)?;
        Ok(record)
    }

    /// Filename as stored, up to the first NUL.
    pub fn filename(&self) -> String {
        field_string(&self.filename)
    }

    /// Comment as stored, up to the first NUL.
    pub fn comment(&self) -> String {
        field_string(&self.comment)
    }
}

impl fmt::Debug for BitmapRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BitmapRecord")
            .field("filename", &self.filename())
            .field("comment", &self.comment())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("num_images", &self.num_images)
            .field("start_index", &self.start_index)
            .field("end_index", &self.end_index)
            .finish()
    }
}

/// A named group of images. Owns the record, the catalog ids of the
/// images wired to it, and the group's pixel-store handle.
#[derive(Debug)]
pub struct Bitmap {
    id: usize,
    record: BitmapRecord,
    image_ids: Vec<usize>,
    store: PixelStore,
}

impl Bitmap {
    pub(crate) fn new(id: usize, record: BitmapRecord, sg_path: &Path) -> Bitmap {
        let store = PixelStore::new(sg_path.to_path_buf(), record.filename());
        Bitmap {
            id,
            record,
            image_ids: Vec::new(),
            store,
        }
    }

    /// Index of this bitmap within the catalog.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The underlying directory record.
    #[inline]
    pub fn record(&self) -> &BitmapRecord {
        &self.record
    }

    /// Lowercased name of the bitmap without the `.bmp` extension.
    pub fn name(&self) -> String {
        self.record.filename().to_lowercase().replace(".bmp", "")
    }

    /// Free-form comment stored in the record.
    pub fn comment(&self) -> String {
        self.record.comment()
    }

    /// The number of images wired to this bitmap.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.image_ids.len()
    }

    /// Maps an index within this bitmap to a catalog image id.
    pub fn image_id(&self, index: usize) -> Option<usize> {
        self.image_ids.get(index).copied()
    }

    /// Catalog ids of the images wired to this bitmap, in file order.
    pub fn image_ids(&self) -> &[usize] {
        &self.image_ids
    }

    pub(crate) fn push_image(&mut self, image_id: usize) {
        self.image_ids.push(image_id);
    }

    pub(crate) fn read_payload(&mut self, record: &ImageRecord) -> Result<Vec<u8>, Error> {
        self.store.read_payload(record)
    }

    /// Releases the open pixel-store handle, if any. Decoding after a
    /// close reopens the store on demand.
    pub fn close_store(&mut self) {
        self.store.close();
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.record.filename(), self.image_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn record_bytes(filename: &str, num_images: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; RECORD_SIZE as usize];
        bytes[..filename.len()].copy_from_slice(filename.as_bytes());
        bytes[116..120].copy_from_slice(&10u32.to_le_bytes()); // width
        bytes[120..124].copy_from_slice(&20u32.to_le_bytes()); // height
        bytes[124..128].copy_from_slice(&num_images.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_a_full_record() {
        let mut cursor = Cursor::new(record_bytes("Zeus_General.bmp", 7));
        let record = BitmapRecord::read(&mut cursor).unwrap();

        assert_eq!(record.filename(), "Zeus_General.bmp");
        assert_eq!(record.comment(), "");
        assert_eq!(record.width, 10);
        assert_eq!(record.height, 20);
        assert_eq!(record.num_images, 7);
        assert_eq!(cursor.position(), RECORD_SIZE);
    }

    #[test]
    fn short_record_is_an_error() {
        let mut cursor = Cursor::new(vec![0u8; 150]);
        assert!(BitmapRecord::read(&mut cursor).is_err());
    }

    #[test]
    fn name_is_lowercased_without_extension() {
        let mut cursor = Cursor::new(record_bytes("Zeus_General.bmp", 0));
        let record = BitmapRecord::read(&mut cursor).unwrap();
        let bitmap = Bitmap::new(0, record, &PathBuf::from("Zeus.sg3"));

        assert_eq!(bitmap.name(), "zeus_general");
        assert_eq!(format!("{}", bitmap), "Zeus_General.bmp (0)");
    }

    #[test]
    fn image_ids_map_local_indices() {
        let mut cursor = Cursor::new(record_bytes("a.bmp", 2));
        let record = BitmapRecord::read(&mut cursor).unwrap();
        let mut bitmap = Bitmap::new(0, record, &PathBuf::from("a.sg3"));

        bitmap.push_image(4);
        bitmap.push_image(9);
        assert_eq!(bitmap.image_count(), 2);
        assert_eq!(bitmap.image_id(0), Some(4));
        assert_eq!(bitmap.image_id(1), Some(9));
        assert_eq!(bitmap.image_id(2), None);
    }
}
