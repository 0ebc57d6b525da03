use crate::core::band_mapping::MappingRules;
use crate::core::lut::LutLayout;
use crate::types::{CalibrationKind, SampleEncoding, SarError, SarResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Product families sharing the calibration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProductFamily {
    /// RADARSAT Constellation Mission
    #[default]
    Rcm,
    Radarsat2,
}

impl ProductFamily {
    /// Prefix of calibration layer names (`RCM_CALIB:SIGMA0:<path>`)
    pub fn layer_prefix(&self) -> &'static str {
        match self {
            ProductFamily::Rcm => "RCM_CALIB",
            ProductFamily::Radarsat2 => "RADARSAT_2_CALIB",
        }
    }

    pub fn lut_layout(&self) -> LutLayout {
        match self {
            ProductFamily::Rcm => LutLayout::Sparse,
            ProductFamily::Radarsat2 => LutLayout::Dense,
        }
    }

    /// Element naming the calibration kind of a reference noise level
    pub fn noise_label_field(&self) -> &'static str {
        match self {
            ProductFamily::Rcm => "sarCalibrationType",
            ProductFamily::Radarsat2 => "incidenceAngleCorrection",
        }
    }

    /// Element holding the anchor count of a reference noise level
    pub fn noise_count_field(&self) -> &'static str {
        match self {
            ProductFamily::Rcm => "numberOfValues",
            ProductFamily::Radarsat2 => "numberOfNoiseLevelValues",
        }
    }

    pub fn mapping_rules(&self) -> MappingRules {
        match self {
            ProductFamily::Rcm => MappingRules {
                scattering_matrix: true,
                foreign_container_override: true,
            },
            ProductFamily::Radarsat2 => MappingRules {
                scattering_matrix: false,
                foreign_container_override: false,
            },
        }
    }

    /// Resolve the product's declared sample type and bit depth to an encoding
    pub fn resolve_encoding(&self, sample_type: &str, bits_per_sample: u32) -> SarResult<SampleEncoding> {
        let sample_type = sample_type.trim();
        let is_complex = sample_type.eq_ignore_ascii_case("Complex");
        let encoding = match self {
            ProductFamily::Rcm if is_complex => Some(if bits_per_sample == 32 {
                SampleEncoding::ComplexFloat32
            } else {
                SampleEncoding::ComplexInt16
            }),
            ProductFamily::Rcm if sample_type.eq_ignore_ascii_case("Magnitude Detected") => {
                match bits_per_sample {
                    32 => Some(SampleEncoding::Float32Magnitude),
                    16 => Some(SampleEncoding::UInt16Magnitude),
                    _ => None,
                }
            }
            ProductFamily::Radarsat2 if is_complex => match bits_per_sample {
                16 => Some(SampleEncoding::ComplexInt16),
                32 => Some(SampleEncoding::ComplexFloat32),
                _ => None,
            },
            ProductFamily::Radarsat2 if sample_type.to_ascii_lowercase().starts_with("mag") => {
                match bits_per_sample {
                    16 => Some(SampleEncoding::UInt16Magnitude),
                    8 => Some(SampleEncoding::ByteMagnitude),
                    _ => None,
                }
            }
            _ => None,
        };

        encoding.ok_or_else(|| {
            SarError::InvalidFormat(format!(
                "{:?} products do not define {}-bit '{}' samples",
                self, bits_per_sample, sample_type
            ))
        })
    }

    /// `<PREFIX>:<KIND>:<path>`, or the bare path when no calibration is requested
    pub fn format_layer_name(&self, kind: CalibrationKind, path: &str) -> String {
        match kind {
            CalibrationKind::None => path.to_string(),
            kind => format!("{}:{}:{}", self.layer_prefix(), kind, path),
        }
    }

    /// Split a layer name into its calibration kind and product path.
    ///
    /// Names without this family's prefix, or with an unknown kind, map to
    /// `CalibrationKind::None`.
    pub fn parse_layer_name(&self, name: &str) -> SarResult<(CalibrationKind, String)> {
        let pattern = format!(r"(?i)^{}:([^:]*):(.+)$", regex::escape(self.layer_prefix()));
        let re = Regex::new(&pattern)
            .map_err(|e| SarError::InvalidFormat(format!("Regex error: {}", e)))?;

        match re.captures(name) {
            Some(captures) => {
                let kind = captures[1].parse().unwrap_or_else(|_| {
                    log::warn!("Unknown calibration '{}' in layer {}", &captures[1], name);
                    CalibrationKind::None
                });
                Ok((kind, captures[2].to_string()))
            }
            None => Ok((CalibrationKind::None, name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rcm() {
        let rcm = ProductFamily::Rcm;
        assert_eq!(rcm.resolve_encoding("Complex", 32).unwrap(), SampleEncoding::ComplexFloat32);
        assert_eq!(rcm.resolve_encoding("Complex", 16).unwrap(), SampleEncoding::ComplexInt16);
        assert_eq!(
            rcm.resolve_encoding("Magnitude Detected", 16).unwrap(),
            SampleEncoding::UInt16Magnitude
        );
        assert!(rcm.resolve_encoding("Magnitude Detected", 8).is_err());
    }

    #[test]
    fn test_resolve_radarsat2() {
        let rs2 = ProductFamily::Radarsat2;
        assert_eq!(rs2.resolve_encoding("Complex", 16).unwrap(), SampleEncoding::ComplexInt16);
        assert_eq!(rs2.resolve_encoding("Magnitude", 8).unwrap(), SampleEncoding::ByteMagnitude);
        assert!(matches!(
            rs2.resolve_encoding("Complex", 64),
            Err(SarError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_layer_names() {
        let rcm = ProductFamily::Rcm;
        assert_eq!(
            rcm.format_layer_name(CalibrationKind::Sigma0, "/data/product.xml"),
            "RCM_CALIB:SIGMA0:/data/product.xml"
        );
        assert_eq!(rcm.format_layer_name(CalibrationKind::None, "product.xml"), "product.xml");

        let (kind, path) = rcm.parse_layer_name("rcm_calib:gamma0:/data/product.xml").unwrap();
        assert_eq!(kind, CalibrationKind::Gamma);
        assert_eq!(path, "/data/product.xml");

        let (kind, path) = ProductFamily::Radarsat2
            .parse_layer_name("RADARSAT_2_CALIB:UNCALIB:C:/rs2/product.xml")
            .unwrap();
        assert_eq!(kind, CalibrationKind::Uncalibrated);
        assert_eq!(path, "C:/rs2/product.xml");

        let (kind, path) = rcm.parse_layer_name("RCM_CALIB:FOO:product.xml").unwrap();
        assert_eq!(kind, CalibrationKind::None);
        assert_eq!(path, "product.xml");

        let (kind, _) = rcm.parse_layer_name("RADARSAT_2_CALIB:SIGMA0:product.xml").unwrap();
        assert_eq!(kind, CalibrationKind::None);
    }
}
