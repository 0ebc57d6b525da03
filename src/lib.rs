//! sarcal: radiometric calibration for RCM and RADARSAT-2 products
//!
//! Turns raw SAR digital numbers into sigma-nought, beta-nought or gamma
//! backscatter, block by block, using the per-column gain tables shipped
//! with the product.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BlockWindow, ByteOrder, CalibrationKind, SampleEncoding, SarComplex, SarError, SarResult,
    SarRealImage, SourceSampleType,
};

pub use crate::core::{
    BandMapper, BandWiring, CalibratedBand, CalibratedBandParams, CalibratedBlock,
    CalibrationTable, LutDescriptor, NoiseDescriptor, NoiseLevelTable, ProductFamily, WiringMode,
};
pub use io::{MemoryBlockSource, RawBlockSource};

#[cfg(feature = "python")]
mod python {
    use crate::core::{interpolate_values as interpolate, BandMapper, CalibratedBand, CalibratedBandParams};
    use crate::core::{LutDescriptor, ProductFamily, WiringMode};
    use crate::io::MemoryBlockSource;
    use crate::types::{BlockWindow, CalibrationKind, SampleEncoding, SarError, SourceSampleType};
    use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray2};
    use pyo3::prelude::*;

    fn to_py_err(e: SarError) -> PyErr {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
    }

    fn parse_family(family: Option<&str>) -> PyResult<ProductFamily> {
        match family.map(|f| f.to_uppercase()) {
            None => Ok(ProductFamily::Rcm),
            Some(f) if f == "RCM" => Ok(ProductFamily::Rcm),
            Some(f) if f == "RS2" || f == "RADARSAT2" || f == "RADARSAT-2" => Ok(ProductFamily::Radarsat2),
            Some(f) => Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "Invalid product family: {}",
                f
            ))),
        }
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(interpolate_values, m)?)?;
        m.add_function(wrap_pyfunction!(classify_bands, m)?)?;
        m.add_function(wrap_pyfunction!(calibrate_block, m)?)?;
        Ok(())
    }

    /// Expand sparse anchors into a dense per-column curve
    #[pyfunction]
    fn interpolate_values<'py>(
        py: Python<'py>,
        anchors: Vec<f64>,
        table_size: usize,
        step_size: i64,
        pixel_first_value: i64,
    ) -> &'py PyArray1<f64> {
        interpolate(&anchors, table_size, step_size, pixel_first_value).into_pyarray(py)
    }

    /// Classify source bands against a requested encoding: "STRAIGHT" or "COMPLEX_PAIR"
    #[pyfunction]
    #[pyo3(signature = (requested, band_types, foreign_container = false, family = None))]
    fn classify_bands(
        requested: &str,
        band_types: Vec<String>,
        foreign_container: bool,
        family: Option<&str>,
    ) -> PyResult<String> {
        let requested: SampleEncoding = requested.parse().map_err(to_py_err)?;
        let band_types = band_types
            .iter()
            .map(|t| t.parse::<SourceSampleType>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_py_err)?;
        let mapper = BandMapper::with_rules(parse_family(family)?.mapping_rules());
        let mode = mapper
            .classify(requested, &band_types, foreign_container)
            .map_err(to_py_err)?;
        Ok(match mode {
            WiringMode::Straight => "STRAIGHT".to_string(),
            WiringMode::ComplexPair => "COMPLEX_PAIR".to_string(),
        })
    }

    /// Calibrate real-typed bands with a dense gain list
    #[pyfunction]
    #[pyo3(signature = (bands, band_type, encoding, kind, gains, offset = 0.0))]
    fn calibrate_block<'py>(
        py: Python<'py>,
        bands: Vec<PyReadonlyArray2<f64>>,
        band_type: &str,
        encoding: &str,
        kind: &str,
        gains: Vec<f64>,
        offset: f64,
    ) -> PyResult<&'py PyArray2<f32>> {
        let band_type: SourceSampleType = band_type.parse().map_err(to_py_err)?;
        let encoding: SampleEncoding = encoding.parse().map_err(to_py_err)?;
        let kind: CalibrationKind = kind.parse().map_err(to_py_err)?;
        if !kind.is_calibrated() || band_type.is_complex() {
            return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>(format!(
                "calibrate_block needs SIGMA0/BETA0/GAMMA over real bands, got {} over {}",
                kind, band_type
            )));
        }

        let Some(first) = bands.first() else {
            return Err(PyErr::new::<pyo3::exceptions::PyValueError, _>("No bands given"));
        };
        let (height, width) = first.as_array().dim();
        let mut source = MemoryBlockSource::new(width, height);
        for band in &bands {
            source = source
                .with_band(band_type, band.as_array().iter().copied().collect())
                .map_err(to_py_err)?;
        }

        let gain_list = gains.iter().map(|g| g.to_string()).collect::<Vec<_>>().join(" ");
        let lut = LutDescriptor::new("<python>", offset, 0, 1, gains.len() as i64, &gain_list);
        let params = CalibratedBandParams {
            kind,
            encoding,
            ..Default::default()
        };
        let band = CalibratedBand::new(Box::new(source), params, Some(&lut), None).map_err(to_py_err)?;
        let block = band
            .decode_block(&BlockWindow::new(0, 0, width, height))
            .map_err(to_py_err)?;

        match block.into_backscatter() {
            Some(image) => Ok(image.into_pyarray(py)),
            None => Err(PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(
                "calibrated band returned no backscatter",
            )),
        }
    }
}
