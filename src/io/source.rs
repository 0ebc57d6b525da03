use crate::types::{BlockWindow, ByteOrder, SarError, SarResult, SourceSampleType};
use num_complex::Complex;

/// Pull-based access to the raw pixels underneath a calibrated band.
///
/// `read_window` returns the samples of one band for a window that lies
/// inside the raster, row-major, each sample `band_type(band).size_bytes()`
/// bytes long (I before Q for complex types) in `byte_order()`.
pub trait RawBlockSource {
    /// Raster size as (width, height)
    fn raster_size(&self) -> (usize, usize);

    fn band_count(&self) -> usize;

    fn band_type(&self, band: usize) -> SarResult<SourceSampleType>;

    fn byte_order(&self) -> ByteOrder {
        ByteOrder::native()
    }

    fn read_window(&self, band: usize, window: &BlockWindow) -> SarResult<Vec<u8>>;

    fn band_types(&self) -> SarResult<Vec<SourceSampleType>> {
        (0..self.band_count()).map(|band| self.band_type(band)).collect()
    }
}

impl<S: RawBlockSource + ?Sized> RawBlockSource for Box<S> {
    fn raster_size(&self) -> (usize, usize) {
        (**self).raster_size()
    }

    fn band_count(&self) -> usize {
        (**self).band_count()
    }

    fn band_type(&self, band: usize) -> SarResult<SourceSampleType> {
        (**self).band_type(band)
    }

    fn byte_order(&self) -> ByteOrder {
        (**self).byte_order()
    }

    fn read_window(&self, band: usize, window: &BlockWindow) -> SarResult<Vec<u8>> {
        (**self).read_window(band, window)
    }
}

macro_rules! encode_as {
    ($out:expr, $value:expr, $t:ty, $order:expr) => {{
        let v = $value as $t;
        match $order {
            ByteOrder::Little => $out.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::Big => $out.extend_from_slice(&v.to_be_bytes()),
        }
    }};
}

/// Append one component to `out` in the storage type of `sample_type`
fn encode_component(out: &mut Vec<u8>, value: f64, sample_type: SourceSampleType, order: ByteOrder) {
    match sample_type {
        SourceSampleType::Byte => out.push(value as u8),
        SourceSampleType::UInt16 => encode_as!(out, value, u16, order),
        SourceSampleType::Int16 | SourceSampleType::CInt16 => encode_as!(out, value, i16, order),
        SourceSampleType::Int32 | SourceSampleType::CInt32 => encode_as!(out, value, i32, order),
        SourceSampleType::Float32 | SourceSampleType::CFloat32 => encode_as!(out, value, f32, order),
        SourceSampleType::Float64 | SourceSampleType::CFloat64 => encode_as!(out, value, f64, order),
    }
}

#[derive(Debug, Clone)]
struct MemoryBand {
    sample_type: SourceSampleType,
    /// Scalar components, I/Q interleaved for complex types
    components: Vec<f64>,
}

/// Raster held in memory, serving windows in a chosen byte order
#[derive(Debug, Clone)]
pub struct MemoryBlockSource {
    width: usize,
    height: usize,
    byte_order: ByteOrder,
    bands: Vec<MemoryBand>,
}

impl MemoryBlockSource {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            byte_order: ByteOrder::native(),
            bands: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Add a band from row-major scalar components (I/Q interleaved when complex)
    pub fn with_band(mut self, sample_type: SourceSampleType, components: Vec<f64>) -> SarResult<Self> {
        let expected = self.width * self.height * sample_type.components();
        if components.len() != expected {
            return Err(SarError::InvalidFormat(format!(
                "{} band needs {} components for a {}x{} raster, got {}",
                sample_type,
                expected,
                self.width,
                self.height,
                components.len()
            )));
        }
        self.bands.push(MemoryBand { sample_type, components });
        Ok(self)
    }

    /// Add a complex band from row-major samples
    pub fn with_complex_band(self, sample_type: SourceSampleType, samples: &[Complex<f64>]) -> SarResult<Self> {
        if !sample_type.is_complex() {
            return Err(SarError::InvalidFormat(format!(
                "{} is not a complex sample type",
                sample_type
            )));
        }
        let components = samples.iter().flat_map(|c| [c.re, c.im]).collect();
        self.with_band(sample_type, components)
    }

    fn band(&self, band: usize) -> SarResult<&MemoryBand> {
        self.bands.get(band).ok_or_else(|| SarError::SourceRead {
            band,
            reason: format!("source has only {} band(s)", self.bands.len()),
            expected: 0,
            actual: 0,
        })
    }
}

impl RawBlockSource for MemoryBlockSource {
    fn raster_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn band_type(&self, band: usize) -> SarResult<SourceSampleType> {
        Ok(self.band(band)?.sample_type)
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn read_window(&self, band: usize, window: &BlockWindow) -> SarResult<Vec<u8>> {
        let data = self.band(band)?;
        if window.col0 + window.width > self.width || window.row0 + window.height > self.height {
            return Err(SarError::SourceRead {
                band,
                reason: format!(
                    "window {:?} exceeds {}x{} raster",
                    window, self.width, self.height
                ),
                expected: window.pixel_count() * data.sample_type.size_bytes(),
                actual: 0,
            });
        }

        let per_sample = data.sample_type.components();
        let mut out = Vec::with_capacity(window.pixel_count() * data.sample_type.size_bytes());
        for row in window.row0..window.row0 + window.height {
            let start = (row * self.width + window.col0) * per_sample;
            let end = start + window.width * per_sample;
            for &value in &data.components[start..end] {
                encode_component(&mut out, value, data.sample_type, self.byte_order);
            }
        }
        Ok(out)
    }
}
