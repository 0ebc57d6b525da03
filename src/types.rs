use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Complex sample widened to double precision (I + jQ)
pub type SarComplex = Complex<f64>;

/// Calibrated backscatter block (row x column)
pub type SarRealImage = Array2<f32>;

/// Uncalibrated detected block, widened to f64
pub type SarDetectedImage = Array2<f64>;

/// Uncalibrated complex block, widened to Complex<f64>
pub type SarComplexImage = Array2<SarComplex>;

/// Encoding of the samples a band exposes (or is asked to expose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleEncoding {
    ComplexInt16,
    ComplexInt32,
    ComplexFloat32,
    ComplexFloat64,
    Float32Magnitude,
    Float64Magnitude,
    UInt16Magnitude,
    ByteMagnitude,
}

impl SampleEncoding {
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            SampleEncoding::ComplexInt16
                | SampleEncoding::ComplexInt32
                | SampleEncoding::ComplexFloat32
                | SampleEncoding::ComplexFloat64
        )
    }

    /// Per-band raster type that carries this encoding without repacking
    pub fn native_source_type(&self) -> SourceSampleType {
        match self {
            SampleEncoding::ComplexInt16 => SourceSampleType::CInt16,
            SampleEncoding::ComplexInt32 => SourceSampleType::CInt32,
            SampleEncoding::ComplexFloat32 => SourceSampleType::CFloat32,
            SampleEncoding::ComplexFloat64 => SourceSampleType::CFloat64,
            SampleEncoding::Float32Magnitude => SourceSampleType::Float32,
            SampleEncoding::Float64Magnitude => SourceSampleType::Float64,
            SampleEncoding::UInt16Magnitude => SourceSampleType::UInt16,
            SampleEncoding::ByteMagnitude => SourceSampleType::Byte,
        }
    }

    pub(crate) fn component(&self) -> ComponentType {
        self.native_source_type().component()
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.native_source_type().size_bytes()
    }
}

impl std::fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleEncoding::ComplexInt16 => "CInt16",
            SampleEncoding::ComplexInt32 => "CInt32",
            SampleEncoding::ComplexFloat32 => "CFloat32",
            SampleEncoding::ComplexFloat64 => "CFloat64",
            SampleEncoding::Float32Magnitude => "Float32",
            SampleEncoding::Float64Magnitude => "Float64",
            SampleEncoding::UInt16Magnitude => "UInt16",
            SampleEncoding::ByteMagnitude => "Byte",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SampleEncoding {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cint16" => Ok(SampleEncoding::ComplexInt16),
            "cint32" => Ok(SampleEncoding::ComplexInt32),
            "cfloat32" => Ok(SampleEncoding::ComplexFloat32),
            "cfloat64" => Ok(SampleEncoding::ComplexFloat64),
            "float32" => Ok(SampleEncoding::Float32Magnitude),
            "float64" => Ok(SampleEncoding::Float64Magnitude),
            "uint16" => Ok(SampleEncoding::UInt16Magnitude),
            "byte" => Ok(SampleEncoding::ByteMagnitude),
            other => Err(SarError::InvalidFormat(format!("unknown sample encoding '{}'", other))),
        }
    }
}

/// Per-band sample type reported by the underlying raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceSampleType {
    Byte,
    UInt16,
    Int16,
    Int32,
    Float32,
    Float64,
    CInt16,
    CInt32,
    CFloat32,
    CFloat64,
}

impl SourceSampleType {
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            SourceSampleType::CInt16
                | SourceSampleType::CInt32
                | SourceSampleType::CFloat32
                | SourceSampleType::CFloat64
        )
    }

    /// Number of scalar components per sample (2 for I/Q types)
    pub fn components(&self) -> usize {
        if self.is_complex() {
            2
        } else {
            1
        }
    }

    pub(crate) fn component(&self) -> ComponentType {
        match self {
            SourceSampleType::Byte => ComponentType::U8,
            SourceSampleType::UInt16 => ComponentType::U16,
            SourceSampleType::Int16 | SourceSampleType::CInt16 => ComponentType::I16,
            SourceSampleType::Int32 | SourceSampleType::CInt32 => ComponentType::I32,
            SourceSampleType::Float32 | SourceSampleType::CFloat32 => ComponentType::F32,
            SourceSampleType::Float64 | SourceSampleType::CFloat64 => ComponentType::F64,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.component().size_bytes() * self.components()
    }
}

impl std::fmt::Display for SourceSampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for SourceSampleType {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "byte" | "uint8" => Ok(SourceSampleType::Byte),
            "uint16" => Ok(SourceSampleType::UInt16),
            "int16" => Ok(SourceSampleType::Int16),
            "int32" => Ok(SourceSampleType::Int32),
            "float32" => Ok(SourceSampleType::Float32),
            "float64" => Ok(SourceSampleType::Float64),
            "cint16" => Ok(SourceSampleType::CInt16),
            "cint32" => Ok(SourceSampleType::CInt32),
            "cfloat32" => Ok(SourceSampleType::CFloat32),
            "cfloat64" => Ok(SourceSampleType::CFloat64),
            other => Err(SarError::InvalidFormat(format!("unknown sample type '{}'", other))),
        }
    }
}

/// Scalar storage type of one sample component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComponentType {
    U8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl ComponentType {
    pub(crate) fn size_bytes(&self) -> usize {
        match self {
            ComponentType::U8 => 1,
            ComponentType::U16 | ComponentType::I16 => 2,
            ComponentType::I32 | ComponentType::F32 => 4,
            ComponentType::F64 => 8,
        }
    }
}

/// Radiometric calibration requested for a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CalibrationKind {
    /// No calibration layer was requested
    #[default]
    None,
    /// Digital numbers, explicitly uncalibrated
    Uncalibrated,
    /// Radar cross section per unit ground area
    Sigma0,
    /// Radar brightness
    Beta0,
    /// Backscatter normalized to the incidence plane
    Gamma,
}

impl CalibrationKind {
    /// True when a gain table drives the transform
    pub fn is_calibrated(&self) -> bool {
        matches!(
            self,
            CalibrationKind::Sigma0 | CalibrationKind::Beta0 | CalibrationKind::Gamma
        )
    }

    /// Label published as `LUT_TYPE_<n>`
    pub fn lut_label(&self) -> Option<&'static str> {
        match self {
            CalibrationKind::Sigma0 => Some("SIGMA0"),
            CalibrationKind::Beta0 => Some("BETA0"),
            CalibrationKind::Gamma => Some("GAMMA"),
            CalibrationKind::None | CalibrationKind::Uncalibrated => None,
        }
    }
}

impl std::fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationKind::None => write!(f, "NONE"),
            CalibrationKind::Uncalibrated => write!(f, "UNCALIB"),
            CalibrationKind::Sigma0 => write!(f, "SIGMA0"),
            CalibrationKind::Beta0 => write!(f, "BETA0"),
            CalibrationKind::Gamma => write!(f, "GAMMA"),
        }
    }
}

impl std::str::FromStr for CalibrationKind {
    type Err = SarError;

    /// Parse a calibration-layer token; GAMMA0 is accepted for GAMMA
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIGMA0" => Ok(CalibrationKind::Sigma0),
            "BETA0" => Ok(CalibrationKind::Beta0),
            "GAMMA" | "GAMMA0" => Ok(CalibrationKind::Gamma),
            "UNCALIB" => Ok(CalibrationKind::Uncalibrated),
            "NONE" | "" => Ok(CalibrationKind::None),
            other => Err(SarError::InvalidFormat(format!("unknown calibration '{}'", other))),
        }
    }
}

/// Byte order of samples delivered by a raw-block source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}

/// Rectangular pixel region in absolute raster coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWindow {
    pub col0: usize,
    pub row0: usize,
    pub width: usize,
    pub height: usize,
}

impl BlockWindow {
    pub fn new(col0: usize, row0: usize, width: usize, height: usize) -> Self {
        Self { col0, row0, width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Part of this window inside a `raster_width` x `raster_height` raster
    pub fn clip(&self, raster_width: usize, raster_height: usize) -> Option<BlockWindow> {
        if self.col0 >= raster_width || self.row0 >= raster_height || self.is_empty() {
            return None;
        }
        Some(BlockWindow {
            col0: self.col0,
            row0: self.row0,
            width: self.width.min(raster_width - self.col0),
            height: self.height.min(raster_height - self.row0),
        })
    }
}

/// Error types for calibration
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("Configuration error in '{path}' ({kind}): {reason}")]
    Configuration {
        path: String,
        kind: CalibrationKind,
        reason: String,
    },

    #[error("Format mismatch: requested {requested}, source has {band_count} band(s) of {source_type}: {reason}")]
    FormatMismatch {
        requested: SampleEncoding,
        band_count: usize,
        source_type: SourceSampleType,
        reason: String,
    },

    #[error("Source read error on band {band}: {reason} (expected {expected} bytes, got {actual})")]
    SourceRead {
        band: usize,
        reason: String,
        expected: usize,
        actual: usize,
    },

    #[error("No noise level table for {kind} in '{path}'")]
    NotAvailable { path: String, kind: CalibrationKind },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for calibration operations
pub type SarResult<T> = Result<T, SarError>;
