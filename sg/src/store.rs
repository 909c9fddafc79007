//! Locating and reading `.555` pixel stores.
//!
//! An image payload is either *internal* (the store sits next to the
//! index file and shares its basename) or *external* (the store is named
//! by the bitmap record). Each bitmap keeps at most one store handle
//! open; requesting the other classification closes and reopens.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::image::ImageRecord;
use crate::Error;

/// Pixel-store state of one bitmap.
#[derive(Debug)]
pub(crate) struct PixelStore {
    sg_path: PathBuf,
    bitmap_filename: String,
    state: State,
}

#[derive(Debug)]
enum State {
    Closed,
    Open { file: File, external: bool },
}

impl PixelStore {
    pub(crate) fn new(sg_path: PathBuf, bitmap_filename: String) -> PixelStore {
        PixelStore {
            sg_path,
            bitmap_filename,
            state: State::Closed,
        }
    }

    /// Reads an image payload (pixel data plus alpha mask) from the
    /// store matching the record's classification.
    pub(crate) fn read_payload(&mut self, record: &ImageRecord) -> Result<Vec<u8>, Error> {
        let external = record.is_external();
        let file = self.open(external)?;

        // External stores are addressed with a one byte back-step; the
        // producer wrote the offsets that way and readers must match it.
        let pos = if external {
            u64::from(record.offset).checked_sub(1).ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "external payload offset before start of store",
                ))
            })?
        } else {
            u64::from(record.offset)
        };
        file.seek(SeekFrom::Start(pos))?;

        let wanted = record.length as usize + record.alpha_length as usize;
        let mut buffer = vec![0u8; wanted];
        let got = read_up_to(file, &mut buffer)?;
        if got != wanted && got + 4 != wanted {
            return Err(Error::TruncatedPayload { wanted, got });
        }
        // A read short by exactly four bytes is a known producer quirk;
        // the missing tail stays zeroed.
        Ok(buffer)
    }

    pub(crate) fn close(&mut self) {
        self.state = State::Closed;
    }

    fn open(&mut self, external: bool) -> Result<&mut File, Error> {
        let reopen = match self.state {
            State::Open { external: open_as, .. } => open_as != external,
            State::Closed => true,
        };
        if reopen {
            // Drop any handle with the other classification first.
            self.state = State::Closed;
            let path = self.locate(external)?;
            self.state = State::Open {
                file: File::open(path)?,
                external,
            };
        }
        match self.state {
            State::Open { ref mut file, .. } => Ok(file),
            State::Closed => unreachable!(),
        }
    }

    /// Resolves the on-disk path of the store for the given
    /// classification: first the index file's directory, then its `555`
    /// child directory, both matched case-insensitively.
    fn locate(&self, external: bool) -> Result<PathBuf, Error> {
        let basename = self.store_basename(external);
        let dir = match self.sg_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if let Some(path) = find_case_insensitive(&dir, &basename)? {
            return Ok(path);
        }
        if let Some(path) = find_case_insensitive(&dir.join("555"), &basename)? {
            return Ok(path);
        }
        Err(Error::StoreNotFound { filename: basename })
    }

    /// Store basename for the classification: the index file's own name
    /// for internal payloads, the bitmap record's filename for external
    /// ones, with everything after the last `.` replaced by `555`.
    fn store_basename(&self, external: bool) -> String {
        let base = if external {
            self.bitmap_filename.clone()
        } else {
            self.sg_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        match base.rfind('.') {
            Some(dot) => format!("{}555", &base[..dot + 1]),
            None => format!("{}.555", base),
        }
    }
}

/// Case-insensitive lookup of `filename` among the entries of `dir`.
/// A missing directory counts as "not found", not as an error.
fn find_case_insensitive(dir: &Path, filename: &str) -> Result<Option<PathBuf>, Error> {
    let wanted = filename.to_lowercase();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(ref err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::Io(err)),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().to_lowercase() == wanted {
            return Ok(Some(dir.join(name)));
        }
    }
    Ok(None)
}

fn read_up_to(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
