//! Raw pixel sources and calibration descriptor readers

pub mod lut_xml;
pub mod source;
#[cfg(feature = "gdal")]
pub mod gdal_source;

pub use lut_xml::{
    parse_incidence_angles_xml, parse_lut_xml, parse_noise_levels_xml, read_incidence_angles_file,
    read_lut_file, read_noise_levels_file,
};
pub use source::{MemoryBlockSource, RawBlockSource};
#[cfg(feature = "gdal")]
pub use gdal_source::GdalBlockSource;
