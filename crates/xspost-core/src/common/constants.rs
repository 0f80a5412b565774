//! Conversion constants and sentinel literals of the fit-output format.
//!
//! The two physical constants are the fixed factors the upstream fitting
//! session bakes into every parameter store; the sentinels describe its
//! text-dump framing.

/// Emission-measure scale: normalization / this factor gives EM in cm^-3.
pub const EMISSION_MEASURE_FACTOR: f64 = 3.5557e-42;
/// Temperature scale in keV per megakelvin: kT / this factor gives MK.
pub const KEV_PER_MEGAKELVIN: f64 = 0.0861733;

/// Catalog seed key for the emission-measure factor.
pub const EMISSION_MEASURE_KEY: &str = "emfact";
/// Catalog seed key for the temperature scale.
pub const TEMPERATURE_SCALE_KEY: &str = "kev2mk";

/// Character introducing the data section of a text dump.
pub const DUMP_HEADER_SENTINEL: char = '!';
/// Literal separating the three tables inside the data section.
pub const DUMP_BLOCK_SEPARATOR: &str = "NO NO NO NO NO";
/// Token standing in for a missing value inside a data row.
pub const DUMP_MISSING_TOKEN: &str = "NO";

/// Substring marking a store key as internal/reserved.
pub const INTERNAL_KEY_MARKER: &str = "__";

/// Base-name suffix of fits that varied the gain calibration.
pub const GAIN_VARIANT_SUFFIX: &str = "gainVary";
/// Suffix of the companion store holding the gain keys.
pub const GAIN_STORE_SUFFIX: &str = "_gain";

/// File extension of a materialized header-keyword store.
pub const STORE_EXTENSION: &str = "json";
/// File extension of a text dump.
pub const DUMP_EXTENSION: &str = "txt";
