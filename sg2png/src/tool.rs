use crate::Sg2PngParameters;
use image::RgbaImage;
use log::{info, warn};
use sg::{Catalog, Raster};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Sg2PngError {
    CatalogError(sg::Error),
    OutputIOError(std::io::Error),
    EncodingError(image::ImageError),
}

/// Counters reported after a completed extraction.
#[derive(Debug, Default)]
pub struct Statistics {
    pub written: usize,
    pub failed: usize,
}

pub struct Sg2Png {
    params: Sg2PngParameters,
    stats: Statistics,
}

impl Sg2Png {
    /// Runs the extraction described by the parameters and returns the
    /// counters. Individual image failures are logged and skipped; only
    /// catalog and filesystem level problems abort the run.
    pub fn extract(params: Sg2PngParameters) -> Result<Statistics, Sg2PngError> {
        let mut tool = Sg2Png {
            params,
            stats: Statistics::default(),
        };

        let mut catalog = Catalog::open(&tool.params.input).map_err(Sg2PngError::CatalogError)?;
        let work_dir = tool.create_work_dir(&catalog)?;

        info!(
            "extracting {} ({} bitmaps, {} images)",
            tool.params.input.display(),
            catalog.bitmap_count(),
            catalog.total_image_count()
        );

        // The first bitmap holds the game's system images; unless asked
        // for, skip it whenever the file has anything else to offer.
        let first = if !tool.params.system && catalog.bitmap_count() > 1 {
            1
        } else {
            0
        };

        for bitmap_id in first..catalog.bitmap_count() {
            tool.extract_bitmap(&mut catalog, bitmap_id, &work_dir)?;
        }
        Ok(tool.stats)
    }

    /// Creates `<output>/<container name>/` for the PNG files.
    fn create_work_dir(&self, catalog: &Catalog) -> Result<PathBuf, Sg2PngError> {
        let basename = catalog.basename().to_lowercase();
        let dir_name = match basename.rfind('.') {
            Some(dot) => basename[..dot].to_string(),
            None => basename,
        };
        let work_dir = self.params.output.join(dir_name);
        fs::create_dir_all(&work_dir).map_err(Sg2PngError::OutputIOError)?;
        Ok(work_dir)
    }

    fn extract_bitmap(
        &mut self,
        catalog: &mut Catalog,
        bitmap_id: usize,
        work_dir: &Path,
    ) -> Result<(), Sg2PngError> {
        let (name, count) = match catalog.bitmap(bitmap_id) {
            Some(bitmap) => (bitmap.name(), bitmap.image_count()),
            None => return Ok(()),
        };

        for index in 0..count {
            match catalog.decode_bitmap_image(bitmap_id, index) {
                Ok(raster) => {
                    self.save_png(work_dir, &name, index, raster)?;
                    self.stats.written += 1;
                }
                Err(err) => {
                    warn!("{}: image {}: {}", name, index + 1, err);
                    self.stats.failed += 1;
                }
            }
        }

        if let Some(bitmap) = catalog.bitmap_mut(bitmap_id) {
            bitmap.close_store();
        }
        Ok(())
    }

    fn save_png(
        &self,
        work_dir: &Path,
        bitmap_name: &str,
        index: usize,
        raster: Raster,
    ) -> Result<(), Sg2PngError> {
        let width = raster.width() as u32;
        let height = raster.height() as u32;
        let image = RgbaImage::from_raw(width, height, raster.into_vec())
            .expect("cannot create image buffer from decoded data");

        let filename = format!("{}_{:05}.png", bitmap_name, index + 1).to_lowercase();
        image
            .save(work_dir.join(filename))
            .map_err(Sg2PngError::EncodingError)?;
        Ok(())
    }
}
