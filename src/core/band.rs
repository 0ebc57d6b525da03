use crate::core::band_mapping::{BandMapper, BandWiring};
use crate::core::calibrate::{CalibratedBlock, CalibratedBlockDecoder};
use crate::core::lut::{CalibrationTable, LutDescriptor};
use crate::core::noise::{NoiseDescriptor, NoiseLevelTable};
use crate::core::product::ProductFamily;
use crate::io::source::RawBlockSource;
use crate::types::{
    BlockWindow, CalibrationKind, SampleEncoding, SarError, SarResult, SourceSampleType,
};
use serde::{Deserialize, Serialize};

/// Settings for opening one calibrated band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibratedBandParams {
    pub kind: CalibrationKind,
    pub family: ProductFamily,
    /// Encoding the product declares for its imagery
    pub encoding: SampleEncoding,
    /// Source is a container that already interleaves I/Q
    pub foreign_container: bool,
    /// Band read in straight wiring (one polarization of a scattering matrix)
    pub source_band: usize,
    pub polarization: Option<String>,
}

impl Default for CalibratedBandParams {
    fn default() -> Self {
        Self {
            kind: CalibrationKind::None,
            family: ProductFamily::Rcm,
            encoding: SampleEncoding::ComplexInt16,
            foreign_container: false,
            source_band: 0,
            polarization: None,
        }
    }
}

/// A raster band exposing calibrated backscatter over a raw-block source.
///
/// The band owns its source; it is released when the band is dropped or
/// when construction fails.
pub struct CalibratedBand {
    source: Box<dyn RawBlockSource>,
    kind: CalibrationKind,
    wiring: BandWiring,
    original_encoding: SampleEncoding,
    source_band: usize,
    polarization: Option<String>,
    table: Option<CalibrationTable>,
    noise: NoiseLevelTable,
}

impl std::fmt::Debug for CalibratedBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibratedBand")
            .field("kind", &self.kind)
            .field("wiring", &self.wiring)
            .field("original_encoding", &self.original_encoding)
            .field("source_band", &self.source_band)
            .field("polarization", &self.polarization)
            .field("lut_size", &self.lut_size())
            .finish()
    }
}

impl CalibratedBand {
    /// Wire the source, build the gain table and pick the noise curve.
    ///
    /// A calibrated `kind` needs a LUT descriptor; the noise descriptor is
    /// always optional.
    pub fn new(
        source: Box<dyn RawBlockSource>,
        params: CalibratedBandParams,
        lut: Option<&LutDescriptor>,
        noise: Option<&NoiseDescriptor>,
    ) -> SarResult<Self> {
        let band_types = source.band_types()?;
        let (raster_width, raster_height) = source.raster_size();

        let mut encoding = params.encoding;
        if band_types.first() == Some(&SourceSampleType::CFloat32)
            && encoding != SampleEncoding::ComplexFloat32
        {
            log::debug!(
                "Source band reports CFloat32, overriding declared {} encoding",
                encoding
            );
            encoding = SampleEncoding::ComplexFloat32;
        }

        let mapper = BandMapper::with_rules(params.family.mapping_rules());
        let wiring = mapper.wire(encoding, &band_types, params.foreign_container, params.kind)?;

        if params.source_band >= band_types.len() {
            return Err(SarError::InvalidFormat(format!(
                "band {} requested from a source with {} band(s)",
                params.source_band,
                band_types.len()
            )));
        }

        let table = if params.kind.is_calibrated() {
            let descriptor = lut.ok_or_else(|| SarError::Configuration {
                path: String::new(),
                kind: params.kind,
                reason: "calibrated band needs a LUT descriptor".to_string(),
            })?;
            Some(CalibrationTable::from_descriptor(
                descriptor,
                params.kind,
                params.family.lut_layout(),
                raster_width,
            )?)
        } else {
            None
        };

        let noise = match noise {
            Some(descriptor) => NoiseLevelTable::select(descriptor, params.kind)?,
            None => NoiseLevelTable::empty(String::new(), params.kind),
        };

        log::info!(
            "Opened {} band ({:?}, {:?} over {} x {}) {}x{}",
            params.kind,
            params.family,
            wiring.mode,
            wiring.source_band_count,
            wiring.source_sample_type,
            raster_width,
            raster_height
        );

        Ok(Self {
            source,
            kind: params.kind,
            wiring,
            original_encoding: encoding,
            source_band: params.source_band,
            polarization: params.polarization,
            table,
            noise,
        })
    }

    /// Decode and calibrate one block of the raster
    pub fn decode_block(&self, window: &BlockWindow) -> SarResult<CalibratedBlock> {
        CalibratedBlockDecoder::new(
            self.source.as_ref(),
            self.wiring,
            self.original_encoding,
            self.source_band,
            self.kind,
            self.table.as_ref(),
        )
        .decode(window)
    }

    /// Narrow the gain table to a column window. False when nothing changed.
    pub fn set_partial_lut(&mut self, pixel_offset: i64, pixel_width: i64) -> bool {
        self.table
            .as_mut()
            .map_or(false, |table| table.set_partial(pixel_offset, pixel_width))
    }

    /// `LUT_GAINS_<n>`, `LUT_TYPE_<n>`, `LUT_SIZE_<n>` and `LUT_OFFSET_<n>` items
    pub fn lut_metadata(&self, band_number: usize) -> Vec<(String, String)> {
        let Some(table) = self.table.as_ref() else {
            return Vec::new();
        };
        let mut items = vec![(format!("LUT_GAINS_{}", band_number), table.formatted_gains())];
        if let Some(label) = self.kind.lut_label() {
            items.push((format!("LUT_TYPE_{}", band_number), label.to_string()));
        }
        items.push((format!("LUT_SIZE_{}", band_number), table.size().to_string()));
        items.push((format!("LUT_OFFSET_{}", band_number), format!("{:.6}", table.offset())));
        items
    }

    /// Noise levels as a space-separated `%e` list
    pub fn noise_metadata(&self) -> SarResult<String> {
        self.noise.formatted()
    }

    pub fn has_lut(&self) -> bool {
        self.table.is_some()
    }

    pub fn lut_value(&self, column: usize) -> Option<f64> {
        self.table.as_ref().and_then(|t| t.value(column))
    }

    pub fn lut_size(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.size())
    }

    pub fn lut_offset(&self) -> Option<f64> {
        self.table.as_ref().map(|t| t.offset())
    }

    pub fn lut_path(&self) -> Option<&str> {
        self.table.as_ref().map(|t| t.path())
    }

    pub fn clone_lut(&self) -> Option<CalibrationTable> {
        self.table.clone()
    }

    pub fn has_noise_levels(&self) -> bool {
        self.noise.is_available()
    }

    pub fn noise_level(&self, column: usize) -> SarResult<f64> {
        self.noise.value(column)
    }

    pub fn noise_levels_size(&self) -> usize {
        self.noise.size()
    }

    pub fn clone_noise_levels(&self) -> Option<NoiseLevelTable> {
        self.noise.is_available().then(|| self.noise.clone())
    }

    /// Whether the underlying imagery is complex
    pub fn is_complex(&self) -> bool {
        self.original_encoding.is_complex()
    }

    pub fn kind(&self) -> CalibrationKind {
        self.kind
    }

    pub fn wiring(&self) -> &BandWiring {
        &self.wiring
    }

    pub fn output_encoding(&self) -> SampleEncoding {
        self.wiring.output_sample_type
    }

    pub fn original_encoding(&self) -> SampleEncoding {
        self.original_encoding
    }

    pub fn polarization(&self) -> Option<&str> {
        self.polarization.as_deref()
    }

    pub fn raster_size(&self) -> (usize, usize) {
        self.source.raster_size()
    }
}
