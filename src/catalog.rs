use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::CatalogConfig;

/// A hospital or diagnostic center and its test price table.
///
/// Wire field names match the public API: `inNetwork` is camel-cased, the
/// rest are snake-cased. Test names in `tests` are stored lower-cased and
/// matched case-insensitively at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalRecord {
    pub id: String,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Average review rating on a 0-5 scale.
    pub rating: f64,
    pub reviews: u32,
    pub distance_km: f64,
    /// Human-readable result turnaround, e.g. "24 hours".
    pub turnaround: String,
    #[serde(rename = "inNetwork")]
    pub in_network: bool,
    pub accreditation: Vec<String>,
    pub specialties: Vec<String>,
    /// Test name (lower case) to list price in whole currency units.
    pub tests: HashMap<String, u32>,
}

/// A hospital annotated with its price for one requested test.
#[derive(Debug, Clone, Serialize)]
pub struct PricedHospital {
    #[serde(flatten)]
    pub hospital: HospitalRecord,
    pub price: u32,
}

/// Errors raised while loading a catalog data file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog data file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog data file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("catalog data file {path} contains no hospitals")]
    Empty { path: PathBuf },
}

/// The hospital directory for one city.
#[derive(Debug, Clone)]
pub struct Catalog {
    city: String,
    hospitals: Vec<HospitalRecord>,
}

impl Catalog {
    /// Load the catalog per configuration: from the configured JSON data
    /// file when one is set, otherwise the built-in sample directory.
    pub fn load(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        match &cfg.data_file {
            Some(path) => {
                let catalog = Self::from_file(&cfg.city, path)?;
                info!(
                    "Loaded {} hospitals for {} from {}",
                    catalog.hospitals.len(),
                    catalog.city,
                    path.display()
                );
                Ok(catalog)
            }
            None => {
                let catalog = Self::builtin(&cfg.city);
                info!(
                    "Using built-in catalog: {} hospitals for {}",
                    catalog.hospitals.len(),
                    catalog.city
                );
                Ok(catalog)
            }
        }
    }

    /// Parse a catalog from a JSON array of hospital records.
    pub fn from_file(city: &str, path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut hospitals: Vec<HospitalRecord> =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if hospitals.is_empty() {
            return Err(CatalogError::Empty {
                path: path.to_path_buf(),
            });
        }

        // Normalize test keys so lookups stay case-insensitive.
        for hospital in &mut hospitals {
            let tests = std::mem::take(&mut hospital.tests);
            hospital.tests = tests
                .into_iter()
                .map(|(name, price)| (name.to_lowercase(), price))
                .collect();
        }

        Ok(Self {
            city: city.to_string(),
            hospitals,
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn hospitals(&self) -> &[HospitalRecord] {
        &self.hospitals
    }

    /// Hospitals offering the given test, each annotated with its price.
    /// Hospitals whose price table lacks the test are excluded.
    pub fn lookup(&self, test: &str) -> Vec<PricedHospital> {
        let key = test.to_lowercase();
        self.hospitals
            .iter()
            .filter_map(|hospital| {
                hospital.tests.get(&key).map(|&price| PricedHospital {
                    hospital: hospital.clone(),
                    price,
                })
            })
            .collect()
    }

    /// Cheapest offering for a test across the directory, if anyone has it.
    pub fn cheapest_price(&self, test: &str) -> Option<u32> {
        let key = test.to_lowercase();
        self.hospitals
            .iter()
            .filter_map(|h| h.tests.get(&key).copied())
            .min()
    }

    /// Built-in sample directory: four Surat providers with realistic
    /// prices. Used when no data file is configured.
    pub fn builtin(city: &str) -> Self {
        let hospitals = vec![
            HospitalRecord {
                id: "sgh".to_string(),
                name: "Surat General Hospital".to_string(),
                location: "Majura Gate, Surat".to_string(),
                latitude: 21.1888,
                longitude: 72.8308,
                rating: 4.4,
                reviews: 1320,
                distance_km: 2.1,
                turnaround: "24 hours".to_string(),
                in_network: true,
                accreditation: vec!["NABH".to_string(), "NABL".to_string()],
                specialties: vec![
                    "Pathology".to_string(),
                    "Radiology".to_string(),
                    "Cardiology".to_string(),
                ],
                tests: price_table(&[
                    ("complete blood count (cbc)", 420),
                    ("lipid profile", 780),
                    ("thyroid panel", 900),
                    ("blood sugar (fasting)", 160),
                    ("liver function test", 950),
                ]),
            },
            HospitalRecord {
                id: "apollo".to_string(),
                name: "Apollo Clinic Surat".to_string(),
                location: "Ghod Dod Road, Surat".to_string(),
                latitude: 21.1722,
                longitude: 72.8147,
                rating: 4.6,
                reviews: 980,
                distance_km: 3.5,
                turnaround: "24–48 hours".to_string(),
                in_network: true,
                accreditation: vec!["NABH".to_string()],
                specialties: vec!["Pathology".to_string(), "Diabetes Care".to_string()],
                tests: price_table(&[
                    ("complete blood count (cbc)", 550),
                    ("lipid profile", 890),
                    ("thyroid panel", 1100),
                    ("blood sugar (fasting)", 200),
                    ("vitamin d test", 1250),
                ]),
            },
            HospitalRecord {
                id: "sunshine".to_string(),
                name: "Sunshine Diagnostic Center".to_string(),
                location: "Adajan, Surat".to_string(),
                latitude: 21.2049,
                longitude: 72.7925,
                rating: 4.2,
                reviews: 740,
                distance_km: 4.3,
                turnaround: "24 hours".to_string(),
                in_network: false,
                accreditation: vec!["NABL".to_string()],
                specialties: vec!["Pathology".to_string(), "Imaging".to_string()],
                tests: price_table(&[
                    ("complete blood count (cbc)", 380),
                    ("lipid profile", 720),
                    ("thyroid panel", 880),
                    ("blood sugar (fasting)", 150),
                    ("kidney function test", 900),
                ]),
            },
            HospitalRecord {
                id: "unique".to_string(),
                name: "Unique Hospital & Research Center".to_string(),
                location: "Varachha, Surat".to_string(),
                latitude: 21.2285,
                longitude: 72.8403,
                rating: 4.1,
                reviews: 610,
                distance_km: 5.2,
                turnaround: "24–36 hours".to_string(),
                in_network: true,
                accreditation: vec!["NABH".to_string()],
                specialties: vec!["Multi-speciality".to_string(), "Pathology".to_string()],
                tests: price_table(&[
                    ("complete blood count (cbc)", 460),
                    ("lipid profile", 810),
                    ("thyroid panel", 930),
                    ("blood sugar (fasting)", 170),
                    ("liver function test", 980),
                ]),
            },
        ];

        Self {
            city: city.to_string(),
            hospitals,
        }
    }
}

/// Where the server's hospital directory comes from.
///
/// The built-in directory is resolved once at startup. A configured data
/// file is re-read on every search, so edits to the file show up on the
/// next request and read failures surface to the caller instead of being
/// frozen behind a stale startup snapshot.
#[derive(Debug)]
pub enum PriceSource {
    Builtin(Catalog),
    File { city: String, path: PathBuf },
}

impl PriceSource {
    /// Build the source per configuration. A configured data file is read
    /// once here so an unreadable file fails startup, not the first request.
    pub fn from_config(cfg: &CatalogConfig) -> Result<Self, CatalogError> {
        match &cfg.data_file {
            Some(path) => {
                let catalog = Catalog::from_file(&cfg.city, path)?;
                info!(
                    "Serving {} hospitals for {} from {} (re-read per request)",
                    catalog.hospitals.len(),
                    cfg.city,
                    path.display()
                );
                Ok(Self::File {
                    city: cfg.city.clone(),
                    path: path.clone(),
                })
            }
            None => {
                let catalog = Catalog::builtin(&cfg.city);
                info!(
                    "Using built-in catalog: {} hospitals for {}",
                    catalog.hospitals.len(),
                    cfg.city
                );
                Ok(Self::Builtin(catalog))
            }
        }
    }

    pub fn city(&self) -> &str {
        match self {
            Self::Builtin(catalog) => catalog.city(),
            Self::File { city, .. } => city,
        }
    }

    /// The current directory: borrowed for the built-in source, freshly
    /// parsed from the data file otherwise.
    pub fn catalog(&self) -> Result<Cow<'_, Catalog>, CatalogError> {
        match self {
            Self::Builtin(catalog) => Ok(Cow::Borrowed(catalog)),
            Self::File { city, path } => Catalog::from_file(city, path).map(Cow::Owned),
        }
    }
}

fn price_table(entries: &[(&str, u32)]) -> HashMap<String, u32> {
    entries
        .iter()
        .map(|&(name, price)| (name.to_string(), price))
        .collect()
}
