use crate::io::source::RawBlockSource;
use crate::types::{BlockWindow, SarError, SarResult, SourceSampleType};
use gdal::raster::GdalDataType;
use gdal::Dataset;
use std::path::Path;

/// Raw-block source over a raster opened with GDAL.
///
/// Real-typed bands only; GDAL converts to host byte order on read.
pub struct GdalBlockSource {
    dataset: Dataset,
    band_types: Vec<SourceSampleType>,
}

fn sample_type(data_type: GdalDataType) -> Option<SourceSampleType> {
    match data_type {
        GdalDataType::UInt8 => Some(SourceSampleType::Byte),
        GdalDataType::UInt16 => Some(SourceSampleType::UInt16),
        GdalDataType::Int16 => Some(SourceSampleType::Int16),
        GdalDataType::Int32 => Some(SourceSampleType::Int32),
        GdalDataType::Float32 => Some(SourceSampleType::Float32),
        GdalDataType::Float64 => Some(SourceSampleType::Float64),
        _ => None,
    }
}

macro_rules! read_bytes {
    ($band:expr, $window:expr, $t:ty) => {{
        let buffer = $band.read_as::<$t>(
            ($window.col0 as isize, $window.row0 as isize),
            ($window.width, $window.height),
            ($window.width, $window.height),
            None,
        )?;
        buffer
            .data
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect::<Vec<u8>>()
    }};
}

impl GdalBlockSource {
    pub fn open(path: impl AsRef<Path>) -> SarResult<Self> {
        let path = path.as_ref();
        let dataset = Dataset::open(path)?;

        let mut band_types = Vec::new();
        for index in 1..=dataset.raster_count() {
            let data_type = dataset.rasterband(index)?.band_type();
            let sample = sample_type(data_type).ok_or_else(|| {
                SarError::InvalidFormat(format!(
                    "{}: band {} has unsupported type {:?}",
                    path.display(),
                    index,
                    data_type
                ))
            })?;
            band_types.push(sample);
        }

        let (width, height) = dataset.raster_size();
        log::info!(
            "Opened {} with GDAL: {}x{}, {} band(s) of {:?}",
            path.display(),
            width,
            height,
            band_types.len(),
            band_types.first()
        );

        Ok(Self { dataset, band_types })
    }
}

impl RawBlockSource for GdalBlockSource {
    fn raster_size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    fn band_count(&self) -> usize {
        self.band_types.len()
    }

    fn band_type(&self, band: usize) -> SarResult<SourceSampleType> {
        self.band_types.get(band).copied().ok_or_else(|| SarError::SourceRead {
            band,
            reason: format!("dataset has {} band(s)", self.band_types.len()),
            expected: 0,
            actual: 0,
        })
    }

    fn read_window(&self, band: usize, window: &BlockWindow) -> SarResult<Vec<u8>> {
        let sample = self.band_type(band)?;
        let raster_band = self.dataset.rasterband(band as isize + 1)?;
        let bytes = match sample {
            SourceSampleType::Byte => read_bytes!(raster_band, window, u8),
            SourceSampleType::UInt16 => read_bytes!(raster_band, window, u16),
            SourceSampleType::Int16 => read_bytes!(raster_band, window, i16),
            SourceSampleType::Int32 => read_bytes!(raster_band, window, i32),
            SourceSampleType::Float32 => read_bytes!(raster_band, window, f32),
            SourceSampleType::Float64 => read_bytes!(raster_band, window, f64),
            other => {
                return Err(SarError::SourceRead {
                    band,
                    reason: format!("{} bands are not readable through GDAL here", other),
                    expected: window.pixel_count() * other.size_bytes(),
                    actual: 0,
                })
            }
        };
        Ok(bytes)
    }
}
