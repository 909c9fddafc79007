//! Isometric image decoder.
//!
//! An isometric payload has two layers: an uncompressed base of
//! diamond-shaped tiles packed into a larger diamond footprint, and a
//! run-length sprite overlay for everything that sticks out of the
//! ground plane (buildings, trees). The overlay reuses the sprite
//! decoder.

use crate::decode::{self, Raster};
use crate::image::ImageRecord;
use crate::Error;

const TILE_WIDTH: usize = 58;
const TILE_HEIGHT: usize = 30;
const TILE_BYTES: usize = 1800;
const LARGE_TILE_WIDTH: usize = 78;
const LARGE_TILE_HEIGHT: usize = 40;
const LARGE_TILE_BYTES: usize = 3200;

pub(crate) fn decode(
    record: &ImageRecord,
    buffer: &[u8],
    raster: &mut Raster,
) -> Result<(), Error> {
    let length = record.length as usize;
    let uncompressed = record.uncompressed_length as usize;
    if buffer.len() < length {
        return Err(Error::TruncatedPayload {
            wanted: length,
            got: buffer.len(),
        });
    }
    // A base layer longer than the whole payload cannot be read.
    if uncompressed > length {
        return Err(Error::TruncatedPayload {
            wanted: uncompressed,
            got: length,
        });
    }

    write_base(record, &buffer[..uncompressed], raster)?;
    decode::decode_sprite(&buffer[uncompressed..length], raster);
    Ok(())
}

/// Writes the diamond-tile base layer.
fn write_base(record: &ImageRecord, data: &[u8], raster: &mut Raster) -> Result<(), Error> {
    let width = raster.width();
    // The footprint is a rhombus half as tall as it is wide (58 -> 30,
    // 118 -> 60, ...), anchored at the bottom of the image.
    let height = (width + 2) / 2;
    let height_offset = raster.height() as isize - height as isize;

    // Tile-grid size: from the record, or derived from the footprint
    // height. 4x4 regular and 3x3 large tiles both give height 120, so
    // regular takes precedence.
    let mut size = record.flags[3] as usize;
    if size == 0 {
        if height % TILE_HEIGHT == 0 {
            size = height / TILE_HEIGHT;
        } else if height % LARGE_TILE_HEIGHT == 0 {
            size = height / LARGE_TILE_HEIGHT;
        }
    }

    let (tile_bytes, tile_width, tile_height) = if size * TILE_HEIGHT == height {
        (TILE_BYTES, TILE_WIDTH, TILE_HEIGHT)
    } else if size * LARGE_TILE_HEIGHT == height {
        (LARGE_TILE_BYTES, LARGE_TILE_WIDTH, LARGE_TILE_HEIGHT)
    } else {
        return Err(Error::BadTileSize { width, height, size });
    };

    if (width + 2) * height != record.uncompressed_length as usize {
        return Err(Error::FootprintMismatch {
            expected: (width + 2) * height,
            actual: record.uncompressed_length,
        });
    }

    // 2*size - 1 rows of tiles form the diamond: growing from one tile
    // to `size` tiles at the middle, then shrinking back.
    let mut tile = 0;
    let mut y_offset = height_offset;
    for row in 0..2 * size - 1 {
        let (x_off_tiles, x_range) = if row < size {
            (size - row - 1, row + 1)
        } else {
            (row - size + 1, 2 * size - row - 1)
        };
        let mut x_offset = (x_off_tiles * tile_height) as isize;
        for _ in 0..x_range {
            write_tile(
                &data[tile * tile_bytes..(tile + 1) * tile_bytes],
                raster,
                x_offset,
                y_offset,
                tile_width,
                tile_height,
            );
            x_offset += (tile_width + 2) as isize;
            tile += 1;
        }
        y_offset += (tile_height / 2) as isize;
    }
    Ok(())
}

/// Writes one diamond tile into its bounding box at `(x_offset,
/// y_offset)`: rows widen towards the middle of the box and narrow
/// again below it.
fn write_tile(
    tile: &[u8],
    raster: &mut Raster,
    x_offset: isize,
    y_offset: isize,
    tile_width: usize,
    tile_height: usize,
) {
    let half_height = tile_height / 2;
    let mut i = 0;
    for y in 0..tile_height {
        let start = if y < half_height {
            tile_height - 2 * (y + 1)
        } else {
            2 * y - tile_height
        };
        let end = tile_width - start;
        for x in start..end {
            let word = u16::from_le_bytes([tile[i], tile[i + 1]]);
            decode::put_555(raster, x_offset + x as isize, y_offset + y as isize, word);
            i += 2;
        }
    }
}
