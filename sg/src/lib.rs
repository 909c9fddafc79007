//! This is a library for reading SG files.
//!
//! SG files (`.sg2`, `.sg3`) are the art asset containers of the classic
//! city building games (Caesar 3, Pharaoh, Zeus...). An SG file is an
//! index: it declares named groups of images (*bitmaps*) whose pixel
//! payloads live in a separate `.555` pixel store next to the index.
//!
//! [`Catalog::open`](struct.Catalog.html) parses the index;
//! [`Catalog::decode`](struct.Catalog.html#method.decode) reads and
//! decodes a single image into an RGBA [`Raster`](struct.Raster.html).
//! Persisting the raster (e.g. as PNG) is left to the caller.

use std::fmt;
use std::io;

mod bitmap;
mod catalog;
mod decode;
mod header;
mod image;
mod isometric;
mod reader;
mod store;

pub use crate::bitmap::{Bitmap, BitmapRecord};
pub use crate::catalog::{Catalog, Options};
pub use crate::decode::{Raster, TRANSPARENT_555};
pub use crate::header::{Header, HEADER_SIZE};
pub use crate::image::{Image, ImageRecord};

/// Enumeration of all possible errors that can happen when opening a
/// catalog or decoding one of its images.
///
/// Catalog construction errors are fatal to [`Catalog::open`]; decode
/// errors are per image and leave the catalog usable.
#[derive(Debug)]
pub enum Error {
    /// Underlying filesystem failure (open, read, seek, readdir).
    Io(io::Error),
    /// The header's version / declared size pair is not one this library
    /// accepts.
    BadVersion { version: u32, size: u32 },
    /// A fixed-size record read came up short.
    BadRecord { table: &'static str },
    /// Pixel-store lookup exhausted both candidate directories.
    StoreNotFound { filename: String },
    /// Payload read shorter than requested, outside the four byte
    /// tolerance.
    TruncatedPayload { wanted: usize, got: usize },
    /// Image record type outside the enumerated encodings.
    UnknownType { image_type: u16 },
    /// Isometric tile size is neither regular nor large.
    BadTileSize { width: usize, height: usize, size: usize },
    /// Isometric base layer length does not match the diamond footprint.
    FootprintMismatch { expected: usize, actual: u32 },
    /// Width, height or payload length of the record is unusable.
    BadDimensions { width: i16, height: i16, length: u32 },
    /// Decode attempted on an image whose parent bitmap was never wired.
    MissingParent,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{}", err),
            Error::BadVersion { version, size } => {
                write!(f, "incorrect sg version {:#x} (declared size {})", version, size)
            }
            Error::BadRecord { table } => write!(f, "truncated {} record", table),
            Error::StoreNotFound { filename } => {
                write!(f, "pixel store {} not found", filename)
            }
            Error::TruncatedPayload { wanted, got } => {
                write!(f, "unable to read {} bytes from store (read {} bytes)", wanted, got)
            }
            Error::UnknownType { image_type } => {
                write!(f, "unknown image type: {}", image_type)
            }
            Error::BadTileSize { width, height, size } => write!(
                f,
                "unknown tile size (height {}, width {}, size {})",
                height, width, size
            ),
            Error::FootprintMismatch { expected, actual } => write!(
                f,
                "data length doesn't match footprint size: {} vs {}",
                expected, actual
            ),
            Error::BadDimensions { width, height, length } => write!(
                f,
                "width, height or length invalid ({}x{}, {} bytes)",
                width, height, length
            ),
            Error::MissingParent => write!(f, "image has no bitmap parent"),
        }
    }
}

impl std::error::Error for Error {}
