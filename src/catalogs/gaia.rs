//! Reader for Gaia-style CSV exports (e.g. VizieR I/355 with a distance column).
//!
//! Only three columns matter: right ascension, declination (degrees, ICRS) and
//! distance. Columns are located by header name so the export may carry any
//! number of extra columns in any order.

use std::path::Path;

use crate::error::DataError;

/// One usable catalog row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaiaRecord {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub distance: f64,
}

/// Header names of the columns to read.
#[derive(Debug, Clone)]
pub struct GaiaColumns {
    pub ra: String,
    pub dec: String,
    pub distance: String,
}

impl Default for GaiaColumns {
    fn default() -> Self {
        Self {
            ra: "RA_ICRS".to_string(),
            dec: "DE_ICRS".to_string(),
            distance: "Dist".to_string(),
        }
    }
}

/// Rows read from a catalog file.
#[derive(Debug, Clone)]
pub struct GaiaReadout {
    /// Valid rows in file order, at most `max_rows`.
    pub records: Vec<GaiaRecord>,
    /// Rows dropped for a blank, unparseable or non-finite value before the
    /// row limit was reached.
    pub dropped: usize,
}

fn parse_cell(value: Option<&str>) -> Option<f64> {
    let v: f64 = value?.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

/// Read up to `max_rows` valid rows.
///
/// Invalid rows are skipped before counting toward the limit, so the result is
/// the first `max_rows` valid rows of the file.
pub fn read_gaia_csv<P: AsRef<Path>>(
    file: P,
    columns: &GaiaColumns,
    max_rows: usize,
) -> Result<GaiaReadout, DataError> {
    let path = file.as_ref();
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let ra_idx = column(&columns.ra)?;
    let dec_idx = column(&columns.dec)?;
    let dist_idx = column(&columns.distance)?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for result in rdr.records() {
        if records.len() >= max_rows {
            break;
        }
        let record = result.map_err(csv_err)?;
        let row = (
            parse_cell(record.get(ra_idx)),
            parse_cell(record.get(dec_idx)),
            parse_cell(record.get(dist_idx)),
        );
        match row {
            (Some(ra_deg), Some(dec_deg), Some(distance)) => records.push(GaiaRecord {
                ra_deg,
                dec_deg,
                distance,
            }),
            _ => dropped += 1,
        }
    }

    Ok(GaiaReadout { records, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn columns_found_by_name() {
        let f = write_csv("Source,Dist,DE_ICRS,RA_ICRS\n1,10.0,0.0,90.0\n");
        let out = read_gaia_csv(f.path(), &GaiaColumns::default(), 10).unwrap();
        assert_eq!(
            out.records,
            vec![GaiaRecord {
                ra_deg: 90.0,
                dec_deg: 0.0,
                distance: 10.0
            }]
        );
    }

    #[test]
    fn invalid_rows_dropped_before_limit() {
        let f = write_csv(
            "RA_ICRS,DE_ICRS,Dist\n\
             1.0,2.0,\n\
             ,2.0,3.0\n\
             1.0,2.0,3.0\n\
             nan,2.0,3.0\n\
             4.0,5.0,6.0\n\
             7.0,8.0,9.0\n",
        );
        let out = read_gaia_csv(f.path(), &GaiaColumns::default(), 2).unwrap();
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].ra_deg, 1.0);
        assert_eq!(out.records[1].ra_deg, 4.0);
        assert_eq!(out.dropped, 3);
    }

    #[test]
    fn missing_column_is_reported() {
        let f = write_csv("RA_ICRS,DE_ICRS\n1.0,2.0\n");
        let err = read_gaia_csv(f.path(), &GaiaColumns::default(), 10).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "Dist"));
    }

    #[test]
    fn unreadable_file() {
        let err = read_gaia_csv(
            "/nonexistent/starpose/catalog.csv",
            &GaiaColumns::default(),
            10,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::Csv { .. }));
    }
}
