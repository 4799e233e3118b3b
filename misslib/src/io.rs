use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter};
use std::path::{Path, PathBuf};
use log::{info, warn};
use tempfile::NamedTempFile;
use crate::document::{write_variant, Format};
use crate::variant::{Variant, VariantSet};

/// Opens a reference stream file for line by line reading
pub fn get_reader(file: File) -> Result<impl BufRead, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file on unix systems, the stream is only ever read front to back
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // An empty file can't be mapped
        let len = file.metadata().map_err(|e| format!("Couldn't read the file metadata: {e}"))?.len();
        if len == 0 {
            return Ok(Cursor::new(MappedOrOwned::Owned(Vec::new())));
        }
        // The mapping is read only, and the file is not expected to be modified while classifying
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(MappedOrOwned::Mapped(m)))
        }
    }
}

/// Backing storage for the unix reader, an empty file has nothing to map
#[cfg(unix)]
enum MappedOrOwned {
    Mapped(memmap2::Mmap),
    Owned(Vec<u8>),
}

#[cfg(unix)]
impl AsRef<[u8]> for MappedOrOwned {
    fn as_ref(&self) -> &[u8] {
        match self {
            MappedOrOwned::Mapped(m) => &m[..],
            MappedOrOwned::Owned(v) => &v[..],
        }
    }
}

/// The configuration files written for one derivation
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VariantFiles {
    pub capacity: PathBuf,
    pub associative: PathBuf,
    pub real: PathBuf,
    pub block_size: u64,
    pub num_levels: usize,
}

impl VariantFiles {
    /// The paths in attribution order
    pub fn paths(&self) -> [&Path; 3] {
        [self.capacity.as_path(), self.associative.as_path(), self.real.as_path()]
    }
}

/// The report line consumed by the calling script: the three paths, then the block size and the
/// number of levels
impl fmt::Display for VariantFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.capacity.display(),
            self.associative.display(),
            self.real.display(),
            self.block_size,
            self.num_levels
        )
    }
}

/// Writes all three variants to disk
///
/// With an output directory, the files are named after the variant (`capacity.xml` and so on).
/// Without one, each variant is written to a fresh temporary file which is kept, it's up to the
/// caller to clean them up once the simulations have run.
///
/// Either all three files end up on disk or none do. Every document is fully written to a
/// temporary file before any of them is moved into place, and files already moved are removed if
/// a later one can't be.
///
/// # Arguments
///
/// * `variants`: The derived variants
/// * `out_dir`: Where to put the files, or None for the system temporary directory
/// * `format`: The document format to write
///
/// returns: Result<VariantFiles, Error>
pub fn write_variants(variants: &VariantSet, out_dir: Option<&Path>, format: Format) -> io::Result<VariantFiles> {
    let staged_capacity = stage(&variants.capacity, out_dir, format)?;
    let staged_associative = stage(&variants.associative, out_dir, format)?;
    let staged_real = stage(&variants.real, out_dir, format)?;

    let capacity = persist(staged_capacity, &variants.capacity, out_dir, format)?;
    let associative = persist(staged_associative, &variants.associative, out_dir, format).map_err(|e| roll_back(&[capacity.as_path()], e))?;
    let real = persist(staged_real, &variants.real, out_dir, format).map_err(|e| roll_back(&[capacity.as_path(), associative.as_path()], e))?;
    Ok(VariantFiles {
        capacity,
        associative,
        real,
        block_size: variants.real.block_size,
        num_levels: variants.real.levels.len(),
    })
}

/// Writes a variant to a temporary file, which is deleted again if it's dropped
fn stage(variant: &Variant, out_dir: Option<&Path>, format: Format) -> io::Result<NamedTempFile> {
    let prefix = format!("{}-", variant.kind);
    let suffix = format!(".{}", format.extension());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(&suffix);
    let file = match out_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    write_variant(variant, format, BufWriter::new(file.as_file()))?;
    Ok(file)
}

fn persist(file: NamedTempFile, variant: &Variant, out_dir: Option<&Path>, format: Format) -> io::Result<PathBuf> {
    let path = match out_dir {
        Some(dir) => {
            let path = dir.join(format!("{}.{}", variant.kind, format.extension()));
            file.persist(&path).map_err(|e| e.error)?;
            path
        }
        None => file.keep().map_err(|e| e.error)?.1,
    };
    info!("Wrote {} configuration to {}", variant.kind, path.display());
    Ok(path)
}

fn roll_back(written: &[&Path], error: io::Error) -> io::Error {
    for path in written {
        if let Err(e) = fs::remove_file(path) {
            warn!("Couldn't remove {} after a failed write: {e}", path.display());
        }
    }
    error
}
