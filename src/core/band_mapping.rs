use crate::types::{CalibrationKind, SampleEncoding, SarError, SarResult, SourceSampleType};
use serde::{Deserialize, Serialize};

/// How the underlying bands feed one output band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WiringMode {
    /// One source band read as-is
    Straight,
    /// Two source bands carrying I and Q, combined into one complex band
    ComplexPair,
}

/// Result of classifying a source against a requested encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandWiring {
    pub mode: WiringMode,
    pub source_band_count: usize,
    pub source_sample_type: SourceSampleType,
    pub output_sample_type: SampleEncoding,
}

/// Wiring exceptions a product family allows on top of the common rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRules {
    /// Four same-typed bands (full scattering matrix) pass straight through
    pub scattering_matrix: bool,
    /// A foreign container already packs I/Q, so anything passes straight through
    pub foreign_container_override: bool,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            scattering_matrix: true,
            foreign_container_override: true,
        }
    }
}

/// Classifies a multi-band source against the encoding a band must expose
#[derive(Debug, Clone, Default)]
pub struct BandMapper {
    rules: MappingRules,
}

/// Real and complex band types that may be paired into `requested`
fn pair_types(requested: SampleEncoding) -> Option<(SourceSampleType, SourceSampleType)> {
    match requested {
        SampleEncoding::ComplexInt16 => Some((SourceSampleType::Int16, SourceSampleType::CInt16)),
        SampleEncoding::ComplexInt32 => Some((SourceSampleType::Int32, SourceSampleType::CInt32)),
        SampleEncoding::ComplexFloat32 => Some((SourceSampleType::Float32, SourceSampleType::CFloat32)),
        SampleEncoding::ComplexFloat64 => Some((SourceSampleType::Float64, SourceSampleType::CFloat64)),
        _ => None,
    }
}

impl BandMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: MappingRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> MappingRules {
        self.rules
    }

    /// Decide how `band_types` maps onto `requested`
    pub fn classify(
        &self,
        requested: SampleEncoding,
        band_types: &[SourceSampleType],
        foreign_container: bool,
    ) -> SarResult<WiringMode> {
        let Some(&first) = band_types.first() else {
            return Err(SarError::InvalidFormat(
                "raw-block source exposes no bands".to_string(),
            ));
        };
        let mismatch = |reason: &str| SarError::FormatMismatch {
            requested,
            band_count: band_types.len(),
            source_type: first,
            reason: reason.to_string(),
        };

        if foreign_container && self.rules.foreign_container_override {
            return Ok(WiringMode::Straight);
        }

        let native = requested.native_source_type();
        match band_types.len() {
            1 if first == native => return Ok(WiringMode::Straight),
            4 if self.rules.scattering_matrix && band_types.iter().all(|&t| t == native) => {
                return Ok(WiringMode::Straight)
            }
            2 if requested.is_complex() => {
                if band_types[1] != first {
                    return Err(mismatch("I and Q bands must share one sample type"));
                }
                if let Some((real, complex)) = pair_types(requested) {
                    if first == real || first == complex {
                        return Ok(WiringMode::ComplexPair);
                    }
                }
                return Err(mismatch("band pair cannot be packed into the requested complex type"));
            }
            _ => {}
        }

        Err(mismatch("unsupported band layout"))
    }

    /// Classify and describe the resulting wiring for a band of `kind`
    pub fn wire(
        &self,
        requested: SampleEncoding,
        band_types: &[SourceSampleType],
        foreign_container: bool,
        kind: CalibrationKind,
    ) -> SarResult<BandWiring> {
        let mode = self.classify(requested, band_types, foreign_container)?;
        let output_sample_type = if kind.is_calibrated() {
            SampleEncoding::Float32Magnitude
        } else if requested.is_complex() {
            SampleEncoding::ComplexFloat64
        } else {
            SampleEncoding::Float64Magnitude
        };

        Ok(BandWiring {
            mode,
            source_band_count: band_types.len(),
            source_sample_type: band_types[0],
            output_sample_type,
        })
    }
}
