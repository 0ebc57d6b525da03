use crate::core::band_mapping::{BandWiring, WiringMode};
use crate::core::lut::CalibrationTable;
use crate::io::source::RawBlockSource;
use crate::types::{
    BlockWindow, ByteOrder, CalibrationKind, ComponentType, SampleEncoding, SarComplex,
    SarComplexImage, SarDetectedImage, SarError, SarRealImage, SarResult,
};
use ndarray::Array2;
use num_complex::Complex;
use num_traits::{AsPrimitive, Zero};

/// One decoded block, shaped (rows, columns) like the requested window
#[derive(Debug, Clone, PartialEq)]
pub enum CalibratedBlock {
    /// Calibrated backscatter in linear power units
    Backscatter(SarRealImage),
    /// Uncalibrated detected samples, widened
    Detected(SarDetectedImage),
    /// Uncalibrated I/Q samples, widened
    Complex(SarComplexImage),
}

impl CalibratedBlock {
    pub fn encoding(&self) -> SampleEncoding {
        match self {
            CalibratedBlock::Backscatter(_) => SampleEncoding::Float32Magnitude,
            CalibratedBlock::Detected(_) => SampleEncoding::Float64Magnitude,
            CalibratedBlock::Complex(_) => SampleEncoding::ComplexFloat64,
        }
    }

    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            CalibratedBlock::Backscatter(a) => a.dim(),
            CalibratedBlock::Detected(a) => a.dim(),
            CalibratedBlock::Complex(a) => a.dim(),
        }
    }

    pub fn as_backscatter(&self) -> Option<&SarRealImage> {
        match self {
            CalibratedBlock::Backscatter(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_detected(&self) -> Option<&SarDetectedImage> {
        match self {
            CalibratedBlock::Detected(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&SarComplexImage> {
        match self {
            CalibratedBlock::Complex(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_backscatter(self) -> Option<SarRealImage> {
        match self {
            CalibratedBlock::Backscatter(a) => Some(a),
            _ => None,
        }
    }
}

macro_rules! decode_as {
    ($bytes:expr, $t:ty, $order:expr) => {{
        const N: usize = std::mem::size_of::<$t>();
        $bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut buf = [0u8; N];
                buf.copy_from_slice(chunk);
                let value = match $order {
                    ByteOrder::Little => <$t>::from_le_bytes(buf),
                    ByteOrder::Big => <$t>::from_be_bytes(buf),
                };
                AsPrimitive::<f64>::as_(value)
            })
            .collect::<Vec<f64>>()
    }};
}

/// Decode raw component bytes into native-order f64 values
fn decode_components(bytes: &[u8], component: ComponentType, order: ByteOrder) -> Vec<f64> {
    match component {
        ComponentType::U8 => bytes.iter().map(|&b| b as f64).collect(),
        ComponentType::U16 => decode_as!(bytes, u16, order),
        ComponentType::I16 => decode_as!(bytes, i16, order),
        ComponentType::I32 => decode_as!(bytes, i32, order),
        ComponentType::F32 => decode_as!(bytes, f32, order),
        ComponentType::F64 => decode_as!(bytes, f64, order),
    }
}

/// Split interleaved I/Q components
fn deinterleave(values: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut i = Vec::with_capacity(values.len() / 2);
    let mut q = Vec::with_capacity(values.len() / 2);
    for pair in values.chunks_exact(2) {
        i.push(pair[0]);
        q.push(pair[1]);
    }
    (i, q)
}

/// Decoded samples of the in-raster part of a window
enum Samples {
    Complex { i: Vec<f64>, q: Vec<f64> },
    Magnitude(Vec<f64>),
}

/// Build a (rows, columns) block, zero outside the `valid` rows and columns
fn assemble<T, F>(window: &BlockWindow, valid: (usize, usize), sample: F) -> Array2<T>
where
    T: Zero + Copy + Send + Sync,
    F: Fn(usize, usize) -> T + Sync + Send,
{
    let (valid_rows, valid_cols) = valid;
    let mut out = Array2::<T>::zeros((window.height, window.width));
    if window.is_empty() {
        return out;
    }

    let width = window.width;
    let fill_row = |(r, row): (usize, &mut [T])| {
        if r < valid_rows {
            for (c, v) in row.iter_mut().take(valid_cols).enumerate() {
                *v = sample(r, c);
            }
        }
    };

    if let Some(data) = out.as_slice_mut() {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            data.par_chunks_mut(width).enumerate().for_each(fill_row);
        }
        #[cfg(not(feature = "parallel"))]
        data.chunks_mut(width).enumerate().for_each(fill_row);
    }

    out
}

/// Turns raw source blocks into calibrated (or widened) output blocks
pub struct CalibratedBlockDecoder<'a> {
    source: &'a dyn RawBlockSource,
    wiring: BandWiring,
    requested: SampleEncoding,
    source_band: usize,
    kind: CalibrationKind,
    table: Option<&'a CalibrationTable>,
}

impl<'a> CalibratedBlockDecoder<'a> {
    pub fn new(
        source: &'a dyn RawBlockSource,
        wiring: BandWiring,
        requested: SampleEncoding,
        source_band: usize,
        kind: CalibrationKind,
        table: Option<&'a CalibrationTable>,
    ) -> Self {
        Self {
            source,
            wiring,
            requested,
            source_band,
            kind,
            table,
        }
    }

    /// Decode one window. Pixels beyond the raster edge come back as zero.
    pub fn decode(&self, window: &BlockWindow) -> SarResult<CalibratedBlock> {
        let table = if self.kind.is_calibrated() {
            Some(self.table.ok_or_else(|| SarError::Configuration {
                path: String::new(),
                kind: self.kind,
                reason: "calibrated band has no LUT".to_string(),
            })?)
        } else {
            None
        };

        let (raster_width, raster_height) = self.source.raster_size();
        let clipped = window.clip(raster_width, raster_height);

        if let (Some(table), Some(clipped)) = (table, clipped.as_ref()) {
            if !table.covers(clipped.col0, clipped.width) {
                return Err(SarError::Configuration {
                    path: table.path().to_string(),
                    kind: self.kind,
                    reason: format!(
                        "columns {}..{} outside LUT window {}..{}",
                        clipped.col0,
                        clipped.col0 + clipped.width,
                        table.origin(),
                        table.origin() + table.size()
                    ),
                });
            }
        }

        let samples = match clipped.as_ref() {
            Some(clipped) => Some(self.read_samples(clipped)?),
            None => None,
        };
        let valid = clipped.map_or((0, 0), |c| (c.height, c.width));
        let stride = valid.1;

        log::trace!(
            "Decoding {:?} ({:?} in raster) as {}",
            window,
            clipped,
            self.kind
        );

        let block = match (table, samples) {
            (Some(table), samples) => {
                let col0 = window.col0;
                let gain = |c: usize| table.gain_at(col0 + c).unwrap_or(0.0);
                let image = match samples {
                    Some(Samples::Complex { i, q }) => assemble(window, valid, |r, c| {
                        let idx = r * stride + c;
                        let g = gain(c);
                        if g > 0.0 {
                            ((i[idx] * i[idx] + q[idx] * q[idx]) / (g * g)) as f32
                        } else {
                            0.0
                        }
                    }),
                    Some(Samples::Magnitude(v)) => {
                        let offset = table.offset();
                        assemble(window, valid, |r, c| {
                            let dn = v[r * stride + c];
                            let g = gain(c);
                            if g > 0.0 {
                                ((dn * dn + offset) / g) as f32
                            } else {
                                0.0
                            }
                        })
                    }
                    None => Array2::zeros((window.height, window.width)),
                };
                CalibratedBlock::Backscatter(image)
            }
            (None, Some(Samples::Complex { i, q })) => {
                CalibratedBlock::Complex(assemble(window, valid, |r, c| {
                    let idx = r * stride + c;
                    SarComplex::new(i[idx], q[idx])
                }))
            }
            (None, Some(Samples::Magnitude(v))) => {
                CalibratedBlock::Detected(assemble(window, valid, |r, c| v[r * stride + c]))
            }
            (None, None) if self.requested.is_complex() => {
                CalibratedBlock::Complex(Array2::from_elem((window.height, window.width), Complex::zero()))
            }
            (None, None) => CalibratedBlock::Detected(Array2::zeros((window.height, window.width))),
        };

        Ok(block)
    }

    fn read_band(&self, band: usize, window: &BlockWindow, sample_bytes: usize) -> SarResult<Vec<u8>> {
        let bytes = self.source.read_window(band, window)?;
        let expected = window.pixel_count() * sample_bytes;
        if bytes.len() != expected {
            return Err(SarError::SourceRead {
                band,
                reason: format!("short or oversized read for window {:?}", window),
                expected,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    fn read_samples(&self, window: &BlockWindow) -> SarResult<Samples> {
        let order = self.source.byte_order();
        match self.wiring.mode {
            WiringMode::ComplexPair => {
                let mut parts = Vec::with_capacity(2);
                for band in 0..2 {
                    let band_type = self.source.band_type(band)?;
                    let bytes = self.read_band(band, window, band_type.size_bytes())?;
                    let values = decode_components(&bytes, band_type.component(), order);
                    // complex-typed pair bands carry the component in their real part
                    parts.push(if band_type.is_complex() {
                        deinterleave(values).0
                    } else {
                        values
                    });
                }
                let q = parts.pop().unwrap_or_default();
                let i = parts.pop().unwrap_or_default();
                Ok(Samples::Complex { i, q })
            }
            WiringMode::Straight => {
                let bytes = self.read_band(self.source_band, window, self.requested.bytes_per_sample())?;
                let values = decode_components(&bytes, self.requested.component(), order);
                if self.requested.is_complex() {
                    let (i, q) = deinterleave(values);
                    Ok(Samples::Complex { i, q })
                } else {
                    Ok(Samples::Magnitude(values))
                }
            }
        }
    }
}
