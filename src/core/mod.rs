//! Calibration engine: gain tables, band wiring and the block transform

pub mod band;
pub mod band_mapping;
pub mod calibrate;
pub mod incidence;
pub mod lut;
pub mod noise;
pub mod product;

// Re-export main types
pub use band::{CalibratedBand, CalibratedBandParams};
pub use band_mapping::{BandMapper, BandWiring, MappingRules, WiringMode};
pub use calibrate::{CalibratedBlock, CalibratedBlockDecoder};
pub use incidence::{IncidenceAngleDescriptor, IncidenceAngleTable};
pub use lut::{interpolate_values, CalibrationTable, LutDescriptor, LutLayout};
pub use noise::{NoiseCurveCandidate, NoiseDescriptor, NoiseLevelTable};
pub use product::ProductFamily;
