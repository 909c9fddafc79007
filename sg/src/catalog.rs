//! The catalog: owns the bitmaps and images of one SG file and wires
//! them together.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::bitmap::{Bitmap, BitmapRecord};
use crate::decode::{self, Raster};
use crate::header::Header;
use crate::image::{Image, ImageRecord};
use crate::Error;

/// Catalog load options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Keep bitmaps the file declares but does not use. By default a
    /// file whose images all belong to the first bitmap is compacted
    /// down to that single bitmap, matching the original tooling.
    pub keep_unused_bitmaps: bool,
}

/// A parsed SG file: the header, the bitmap directory and the global
/// image list. Records are immutable once loaded; decoding produces
/// fresh rasters owned by the caller.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    header: Header,
    bitmaps: Vec<Bitmap>,
    images: Vec<Image>,
}

impl Catalog {
    /// Opens and parses an SG index file with default [`Options`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Catalog, Error> {
        Catalog::open_with(path, Options::default())
    }

    /// Opens and parses an SG index file.
    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Result<Catalog, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let disk_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = Header::read(&mut reader).map_err(|e| record_error(e, "header"))?;
        if !header.accepts(disk_size) {
            return Err(Error::BadVersion {
                version: header.version,
                size: header.sg_filesize,
            });
        }
        debug!(
            "read header, {} bitmap records, {} image records",
            header.num_bitmap_records, header.num_image_records
        );

        let mut catalog = Catalog {
            path,
            header,
            bitmaps: Vec::new(),
            images: Vec::new(),
        };
        catalog.load_bitmaps(&mut reader)?;
        reader.seek(SeekFrom::Start(header.image_table_offset()))?;
        catalog.load_images(&mut reader)?;

        if !options.keep_unused_bitmaps {
            catalog.compact_bitmaps();
        }
        debug!("loaded {} images", catalog.images.len());
        Ok(catalog)
    }

    /// The parsed header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Base name of the index file, e.g. `C3.sg2`.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn bitmap_count(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn total_image_count(&self) -> usize {
        self.images.len()
    }

    pub fn bitmap(&self, id: usize) -> Option<&Bitmap> {
        self.bitmaps.get(id)
    }

    pub fn bitmap_mut(&mut self, id: usize) -> Option<&mut Bitmap> {
        self.bitmaps.get_mut(id)
    }

    pub fn bitmaps(&self) -> &[Bitmap] {
        &self.bitmaps
    }

    pub fn image(&self, id: usize) -> Option<&Image> {
        self.images.get(id)
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Decodes one image into an RGBA raster.
    ///
    /// The payload is read through the parent bitmap's pixel store; a
    /// mirrored image decodes its source's record and is flipped last.
    /// Decode errors do not poison the catalog.
    ///
    /// # Panics
    ///
    /// Panics if `image_id` is out of range.
    pub fn decode(&mut self, image_id: usize) -> Result<Raster, Error> {
        let image = &self.images[image_id];
        // The working record of a mirror is its source's record; the
        // mirror keeps only the flip flag.
        let work = match image.mirror_of() {
            Some(source) => *self.images[source].record(),
            None => *image.record(),
        };
        let mirrored = image.mirrored();
        let parent = image.bitmap().ok_or(Error::MissingParent)?;

        decode::check_dimensions(&work)?;
        let bitmap = self.bitmaps.get_mut(parent).ok_or(Error::MissingParent)?;
        let buffer = bitmap.read_payload(&work)?;
        decode::decode_image(&work, mirrored, &buffer)
    }

    /// Decodes image `index` of bitmap `bitmap_id`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn decode_bitmap_image(&mut self, bitmap_id: usize, index: usize) -> Result<Raster, Error> {
        let image_id = self.bitmaps[bitmap_id]
            .image_id(index)
            .expect("image index out of bounds");
        self.decode(image_id)
    }

    fn load_bitmaps<R: Read>(&mut self, r: &mut R) -> Result<(), Error> {
        let count = self.header.num_bitmap_records.max(0) as usize;
        for id in 0..count {
            let record = BitmapRecord::read(r).map_err(|e| record_error(e, "bitmap"))?;
            self.bitmaps.push(Bitmap::new(id, record, &self.path));
        }
        Ok(())
    }

    fn load_images<R: Read>(&mut self, r: &mut R) -> Result<(), Error> {
        let include_alpha = self.header.has_alpha();

        // The table opens with a sentinel record that only pads the
        // layout; it must parse but is never emitted.
        ImageRecord::read(r, include_alpha).map_err(|e| record_error(e, "image"))?;

        let count = self.header.num_image_records.max(0) as usize;
        for id in 0..count {
            let record = ImageRecord::read(r, include_alpha).map_err(|e| record_error(e, "image"))?;
            let mut image = Image::new(id, record);

            // Negative invert offsets resolve strictly backward within
            // the already emitted images.
            let invert = i64::from(record.invert_offset);
            if invert < 0 && id as i64 + invert >= 0 {
                image.set_mirror_of((id as i64 + invert) as usize);
            }

            // The parent comes from the working record, so a mirror is
            // wired to its source's bitmap.
            let bitmap_id = match image.mirror_of() {
                Some(source) => self.images[source].record().bitmap_id,
                None => record.bitmap_id,
            } as usize;
            if bitmap_id < self.bitmaps.len() {
                self.bitmaps[bitmap_id].push_image(id);
                image.set_bitmap(bitmap_id);
            } else {
                warn!("image {} has no parent bitmap: {}", id, bitmap_id);
            }
            self.images.push(image);
        }
        Ok(())
    }

    /// Files sometimes declare several bitmaps but wire every image to
    /// the first; the extra bitmaps are dropped before use.
    fn compact_bitmaps(&mut self) {
        if self.bitmaps.len() > 1 && self.images.len() == self.bitmaps[0].image_count() {
            info!(
                "catalog has {} bitmaps but only the first is in use",
                self.bitmaps.len()
            );
            self.bitmaps.truncate(1);
        }
    }
}

/// A short read inside a fixed-size record is a malformed table, not a
/// plain IO failure.
fn record_error(err: io::Error, table: &'static str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::BadRecord { table }
    } else {
        Error::Io(err)
    }
}
