use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::errors::{Error, Result};

/// A read-only memory map over a whole file.
///
/// Empty files are not mapped and expose an empty slice.
pub struct MMapFile {
    path: PathBuf,
    map: Option<Mmap>,
}

impl MMapFile {
    /// Opens a file and memory-maps it read-only.
    ///
    /// # Arguments
    ///
    /// * `filename` - The path to the file.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let path = filename.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        let len = file.metadata().map_err(|e| Error::io(&path, e))?.len();

        let map = if len == 0 {
            None
        } else {
            // The file is opened read-only and never modified by this process.
            Some(unsafe { Mmap::map(&file) }.map_err(|e| Error::io(&path, e))?)
        };

        Ok(MMapFile { path, map })
    }

    /// Provides access to the mapped data.
    pub fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    /// Returns the size of the mapped file in bytes.
    pub fn filesize(&self) -> usize {
        self.as_slice().len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Advises the kernel that the whole file will be read soon.
    #[cfg(unix)]
    pub fn load_file(&self) -> Result<()> {
        if let Some(map) = &self.map {
            map.advise(memmap2::Advice::WillNeed)
                .map_err(|e| Error::io(&self.path, e))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn load_file(&self) -> Result<()> {
        Ok(())
    }
}
