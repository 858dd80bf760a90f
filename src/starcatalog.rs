//! The catalog store: Cartesian star positions shared read-only by every
//! projection in a run.
//!
//! A catalog is built once, either from a Gaia-style CSV export or from a
//! cached rkyv file written by a previous run, and is never mutated
//! afterwards. Wrap it in an `Arc` to share it across search workers.

use std::path::Path;

use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::catalogs::gaia::read_gaia_csv;
use crate::error::DataError;
use crate::star::star_from_spherical;
use crate::Star;

pub use crate::catalogs::gaia::GaiaColumns;

/// Parameters controlling catalog ingestion.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Keep at most this many stars (the first valid rows of the file).
    /// Default 100000.
    pub max_stars: usize,
    /// Header names of the right ascension, declination and distance columns.
    pub columns: GaiaColumns,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_stars: 100_000,
            columns: GaiaColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct StarCatalog {
    stars: Vec<Star>,
}

impl StarCatalog {
    /// Build a catalog from owned stars, discarding any with a non-finite
    /// coordinate.
    pub fn new(mut stars: Vec<Star>) -> Self {
        stars.retain(Star::is_finite);
        Self { stars }
    }

    /// Load a Gaia-style CSV export.
    ///
    /// Rows missing right ascension, declination or distance are dropped, then
    /// the first `config.max_stars` remaining rows are converted to Cartesian
    /// coordinates. Fails with [`DataError::Empty`] if nothing survives.
    pub fn from_gaia_csv<P: AsRef<Path>>(path: P, config: &CatalogConfig) -> Result<Self, DataError> {
        let path = path.as_ref();
        info!("Loading star catalog from {}", path.display());
        let readout = read_gaia_csv(path, &config.columns, config.max_stars)?;
        if readout.records.is_empty() {
            return Err(DataError::Empty {
                path: path.to_path_buf(),
            });
        }
        info!(
            "Kept {} catalog rows ({} dropped for missing values, limit {})",
            readout.records.len(),
            readout.dropped,
            config.max_stars
        );
        let stars = readout
            .records
            .iter()
            .map(|r| star_from_spherical(r.ra_deg, r.dec_deg, r.distance))
            .collect();
        Ok(Self::new(stars))
    }

    /// Return the total number of stars in the catalog.
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    /// Return `true` when the catalog contains no stars.
    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Return all catalog stars as an immutable slice.
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Axis-aligned bounding box as `(min, max)` corners, or `None` when empty.
    pub fn extent(&self) -> Option<(Star, Star)> {
        let first = *self.stars.first()?;
        Some(self.stars.iter().fold((first, first), |(lo, hi), s| {
            (
                Star::new(lo.x.min(s.x), lo.y.min(s.y), lo.z.min(s.z)),
                Star::new(hi.x.max(s.x), hi.y.max(s.y), hi.z.max(s.z)),
            )
        }))
    }
}

// ── Serialization ───────────────────────────────────────────────────────────

impl StarCatalog {
    /// Serialize the catalog to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> Result<Vec<u8>, rkyv::rancor::Error> {
        Ok(rkyv::to_bytes::<rkyv::rancor::Error>(self)?.to_vec())
    }

    /// Save the catalog to a file using rkyv.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DataError> {
        let path = path.as_ref();
        let bytes = self.to_rkyv_bytes().map_err(|e| DataError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, &bytes).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved catalog to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Load a catalog previously written by [`StarCatalog::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Archived data must be aligned; a plain Vec<u8> from fs::read is not.
        let mut aligned: AlignedVec = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);
        let catalog = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned).map_err(|e| {
            DataError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        if catalog.is_empty() {
            return Err(DataError::Empty {
                path: path.to_path_buf(),
            });
        }
        info!("Loaded catalog: {} stars", catalog.len());
        Ok(catalog)
    }

    /// Load a catalog from either a CSV export or an rkyv cache, chosen by the
    /// file extension (`.rkyv` is a cache, anything else is CSV).
    pub fn open<P: AsRef<Path>>(path: P, config: &CatalogConfig) -> Result<Self, DataError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("rkyv") => Self::load_from_file(path),
            _ => Self::from_gaia_csv(path, config),
        }
    }
}
