use approx::assert_abs_diff_eq;
use num_complex::Complex;
use sarcal::core::{CalibratedBand, CalibratedBandParams, LutDescriptor, NoiseCurveCandidate, NoiseDescriptor};
use sarcal::io::{MemoryBlockSource, RawBlockSource};
use sarcal::{BlockWindow, ByteOrder, CalibrationKind, SampleEncoding, SarError, SarResult, SourceSampleType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn flat_lut(width: usize, gain: f64, offset: f64) -> LutDescriptor {
    let gains = vec![format!("{:e}", gain); width].join(" ");
    LutDescriptor::new("calibration/lutSigma.xml", offset, 0, 1, width as i64, &gains)
}

fn params(kind: CalibrationKind, encoding: SampleEncoding) -> CalibratedBandParams {
    CalibratedBandParams {
        kind,
        encoding,
        ..Default::default()
    }
}

/// Source that counts drops and can be told to under-deliver
struct TrackedSource {
    inner: MemoryBlockSource,
    drops: Arc<AtomicUsize>,
    truncate: bool,
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl RawBlockSource for TrackedSource {
    fn raster_size(&self) -> (usize, usize) {
        self.inner.raster_size()
    }

    fn band_count(&self) -> usize {
        self.inner.band_count()
    }

    fn band_type(&self, band: usize) -> SarResult<SourceSampleType> {
        self.inner.band_type(band)
    }

    fn read_window(&self, band: usize, window: &BlockWindow) -> SarResult<Vec<u8>> {
        let mut bytes = self.inner.read_window(band, window)?;
        if self.truncate {
            bytes.truncate(bytes.len() / 2);
        }
        Ok(bytes)
    }
}

#[test]
fn test_complex_pair_calibration() {
    init_logging();
    let source = MemoryBlockSource::new(1, 1)
        .with_band(SourceSampleType::Int16, vec![3.0])
        .unwrap()
        .with_band(SourceSampleType::Int16, vec![4.0])
        .unwrap();
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::ComplexInt16),
        Some(&flat_lut(1, 5.0, 7.0)),
        None,
    )
    .unwrap();

    let block = band.decode_block(&BlockWindow::new(0, 0, 1, 1)).unwrap();
    assert_eq!(block.encoding(), SampleEncoding::Float32Magnitude);
    // offset is not applied to complex data
    assert_abs_diff_eq!(block.as_backscatter().unwrap()[[0, 0]], 1.0);
}

#[test]
fn test_packed_complex_calibration() {
    let samples = [Complex::new(3.0, 4.0), Complex::new(6.0, 8.0)];
    let source = MemoryBlockSource::new(2, 1)
        .with_complex_band(SourceSampleType::CInt16, &samples)
        .unwrap();
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Gamma, SampleEncoding::ComplexInt16),
        Some(&flat_lut(2, 5.0, 0.0)),
        None,
    )
    .unwrap();

    let image = band.decode_block(&BlockWindow::new(0, 0, 2, 1)).unwrap();
    let image = image.as_backscatter().unwrap();
    assert_abs_diff_eq!(image[[0, 0]], 1.0);
    assert_abs_diff_eq!(image[[0, 1]], 4.0);
}

#[test]
fn test_magnitude_calibration() {
    let source = MemoryBlockSource::new(1, 1)
        .with_band(SourceSampleType::Float32, vec![10.0])
        .unwrap();
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Beta0, SampleEncoding::Float32Magnitude),
        Some(&flat_lut(1, 4.0, 2.0)),
        None,
    )
    .unwrap();

    let block = band.decode_block(&BlockWindow::new(0, 0, 1, 1)).unwrap();
    assert_abs_diff_eq!(block.as_backscatter().unwrap()[[0, 0]], 25.5);
}

/// Calibrate a single pixel and return the backscatter value
fn calibrate_pixel(source: MemoryBlockSource, encoding: SampleEncoding, gain: f64, offset: f64) -> f32 {
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, encoding),
        Some(&flat_lut(1, gain, offset)),
        None,
    )
    .unwrap();
    let block = band.decode_block(&BlockWindow::new(0, 0, 1, 1)).unwrap();
    block.as_backscatter().unwrap()[[0, 0]]
}

#[test]
fn test_float64_magnitude_calibration() {
    let source = MemoryBlockSource::new(1, 1)
        .with_band(SourceSampleType::Float64, vec![3.0])
        .unwrap();
    // (9 + 1) / 2
    assert_abs_diff_eq!(calibrate_pixel(source, SampleEncoding::Float64Magnitude, 2.0, 1.0), 5.0);
}

#[test]
fn test_byte_magnitude_calibration() {
    let source = MemoryBlockSource::new(1, 1)
        .with_band(SourceSampleType::Byte, vec![200.0])
        .unwrap();
    assert_abs_diff_eq!(calibrate_pixel(source, SampleEncoding::ByteMagnitude, 100.0, 0.0), 400.0);
}

#[test]
fn test_int32_pair_calibration() {
    let source = MemoryBlockSource::new(1, 1)
        .with_band(SourceSampleType::Int32, vec![100_000.0])
        .unwrap()
        .with_band(SourceSampleType::Int32, vec![-100_000.0])
        .unwrap();
    // (1e10 + 1e10) / 1e10
    assert_abs_diff_eq!(calibrate_pixel(source, SampleEncoding::ComplexInt32, 1e5, 0.0), 2.0);
}

#[test]
fn test_float32_pair_calibration() {
    let source = MemoryBlockSource::new(1, 1)
        .with_band(SourceSampleType::Float32, vec![0.5])
        .unwrap()
        .with_band(SourceSampleType::Float32, vec![0.5])
        .unwrap();
    assert_abs_diff_eq!(calibrate_pixel(source, SampleEncoding::ComplexFloat32, 0.5, 9.0), 2.0);
}

#[test]
fn test_complex_float64_pair_uses_real_parts() {
    let source = MemoryBlockSource::new(1, 1)
        .with_complex_band(SourceSampleType::CFloat64, &[Complex::new(3.0, 99.0)])
        .unwrap()
        .with_complex_band(SourceSampleType::CFloat64, &[Complex::new(4.0, -99.0)])
        .unwrap();
    assert_abs_diff_eq!(calibrate_pixel(source, SampleEncoding::ComplexFloat64, 5.0, 0.0), 1.0);
}

#[test]
fn test_uncalibrated_is_identity() {
    let values = vec![0.0, 1.0, 65535.0, 1234.0];
    let source = MemoryBlockSource::new(2, 2)
        .with_band(SourceSampleType::UInt16, values.clone())
        .unwrap();
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Uncalibrated, SampleEncoding::UInt16Magnitude),
        None,
        None,
    )
    .unwrap();
    let block = band.decode_block(&BlockWindow::new(0, 0, 2, 2)).unwrap();
    let detected = block.as_detected().unwrap();
    assert_eq!(detected.iter().copied().collect::<Vec<_>>(), values);

    let samples = [Complex::new(-3.0, 4.0), Complex::new(32767.0, -32768.0)];
    let source = MemoryBlockSource::new(2, 1)
        .with_complex_band(SourceSampleType::CInt16, &samples)
        .unwrap();
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::None, SampleEncoding::ComplexInt16),
        None,
        None,
    )
    .unwrap();
    let block = band.decode_block(&BlockWindow::new(0, 0, 2, 1)).unwrap();
    assert_eq!(block.encoding(), SampleEncoding::ComplexFloat64);
    let complex = block.as_complex().unwrap();
    assert_eq!(complex[[0, 0]], samples[0]);
    assert_eq!(complex[[0, 1]], samples[1]);
}

#[test]
fn test_absolute_column_addressing() {
    let source = MemoryBlockSource::new(4, 1)
        .with_band(SourceSampleType::UInt16, vec![2.0; 4])
        .unwrap();
    let lut = LutDescriptor::new("lut.xml", 0.0, 0, 1, 4, "1 2 4 8");
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::UInt16Magnitude),
        Some(&lut),
        None,
    )
    .unwrap();

    let block = band.decode_block(&BlockWindow::new(2, 0, 2, 1)).unwrap();
    let image = block.as_backscatter().unwrap();
    assert_abs_diff_eq!(image[[0, 0]], 1.0);
    assert_abs_diff_eq!(image[[0, 1]], 0.5);
}

#[test]
fn test_out_of_bounds_block_is_zero_filled() {
    let values: Vec<f64> = (1..=9).map(|v| v as f64).collect();
    let source = MemoryBlockSource::new(3, 3)
        .with_band(SourceSampleType::Float32, values)
        .unwrap();
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::Float32Magnitude),
        Some(&flat_lut(3, 2.0, 0.0)),
        None,
    )
    .unwrap();

    let inside = band.decode_block(&BlockWindow::new(1, 1, 2, 2)).unwrap();
    let inside = inside.as_backscatter().unwrap();
    let padded = band.decode_block(&BlockWindow::new(1, 1, 4, 4)).unwrap();
    let padded = padded.as_backscatter().unwrap();

    assert_eq!(padded.dim(), (4, 4));
    for r in 0..4 {
        for c in 0..4 {
            if r < 2 && c < 2 {
                assert_eq!(padded[[r, c]], inside[[r, c]]);
            } else {
                assert_eq!(padded[[r, c]], 0.0);
            }
        }
    }
    // 5^2 / 2
    assert_abs_diff_eq!(inside[[0, 0]], 12.5);
}

#[test]
fn test_partial_window_rebases_columns() {
    init_logging();
    let source = MemoryBlockSource::new(4, 1)
        .with_band(SourceSampleType::UInt16, vec![2.0; 4])
        .unwrap();
    let lut = LutDescriptor::new("lut.xml", 0.0, 0, 1, 4, "1 2 4 8");
    let mut band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::UInt16Magnitude),
        Some(&lut),
        None,
    )
    .unwrap();

    assert!(band.set_partial_lut(1, 2));
    assert_eq!(band.lut_size(), 2);
    assert_eq!(band.lut_value(0), Some(2.0));

    let block = band.decode_block(&BlockWindow::new(1, 0, 2, 1)).unwrap();
    let image = block.as_backscatter().unwrap();
    assert_abs_diff_eq!(image[[0, 0]], 2.0);
    assert_abs_diff_eq!(image[[0, 1]], 1.0);

    assert!(matches!(
        band.decode_block(&BlockWindow::new(0, 0, 4, 1)),
        Err(SarError::Configuration { .. })
    ));

    let metadata = band.lut_metadata(1);
    assert!(metadata.contains(&("LUT_SIZE_1".to_string(), "2".to_string())));
    assert!(metadata.contains(&("LUT_GAINS_1".to_string(), "2.000000e+00 4.000000e+00".to_string())));
}

#[test]
fn test_partial_window_from_zero_keeps_prefix() {
    let source = MemoryBlockSource::new(4, 1)
        .with_band(SourceSampleType::Byte, vec![1.0; 4])
        .unwrap();
    let lut = LutDescriptor::new("lut.xml", 0.0, 0, 2, 4, "10 20 30 40");
    let mut band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::ByteMagnitude),
        Some(&lut),
        None,
    )
    .unwrap();
    let full = band.clone_lut().unwrap();
    assert_eq!(full.size(), 8);

    assert!(band.set_partial_lut(0, 5));
    let narrowed = band.clone_lut().unwrap();
    assert_eq!(narrowed.columns(), &full.columns()[..5]);

    assert!(!band.set_partial_lut(10, 2));
    assert_eq!(band.lut_size(), 5);
}

#[test]
fn test_short_read_fails_whole_call() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = TrackedSource {
        inner: MemoryBlockSource::new(2, 2)
            .with_band(SourceSampleType::Float32, vec![1.0; 4])
            .unwrap(),
        drops: drops.clone(),
        truncate: true,
    };
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::Float32Magnitude),
        Some(&flat_lut(2, 1.0, 0.0)),
        None,
    )
    .unwrap();

    match band.decode_block(&BlockWindow::new(0, 0, 2, 2)) {
        Err(SarError::SourceRead { expected, actual, .. }) => {
            assert_eq!(expected, 16);
            assert_eq!(actual, 8);
        }
        other => panic!("expected SourceRead, got {:?}", other),
    }

    drop(band);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_source_released_on_construction_failure() {
    let drops = Arc::new(AtomicUsize::new(0));
    let source = TrackedSource {
        inner: MemoryBlockSource::new(2, 1)
            .with_band(SourceSampleType::Byte, vec![1.0, 2.0])
            .unwrap()
            .with_band(SourceSampleType::Byte, vec![1.0, 2.0])
            .unwrap(),
        drops: drops.clone(),
        truncate: false,
    };

    let err = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::ComplexFloat32),
        Some(&flat_lut(2, 1.0, 0.0)),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, SarError::FormatMismatch { .. }));
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_big_endian_source() {
    let build = |order: ByteOrder| {
        let source = MemoryBlockSource::new(2, 1)
            .with_byte_order(order)
            .with_band(SourceSampleType::Int16, vec![-300.0, 1000.0])
            .unwrap()
            .with_band(SourceSampleType::Int16, vec![400.0, -2000.0])
            .unwrap();
        CalibratedBand::new(
            Box::new(source),
            params(CalibrationKind::Sigma0, SampleEncoding::ComplexInt16),
            Some(&flat_lut(2, 100.0, 0.0)),
            None,
        )
        .unwrap()
    };

    let window = BlockWindow::new(0, 0, 2, 1);
    let big = build(ByteOrder::Big).decode_block(&window).unwrap();
    let little = build(ByteOrder::Little).decode_block(&window).unwrap();
    assert_eq!(big, little);
    assert_abs_diff_eq!(big.as_backscatter().unwrap()[[0, 0]], 25.0);
    assert_abs_diff_eq!(big.as_backscatter().unwrap()[[0, 1]], 500.0);
}

#[test]
fn test_scattering_matrix_reads_selected_band() {
    let channels: Vec<Vec<Complex<f64>>> = (1..=4)
        .map(|k| vec![Complex::new(k as f64, 0.0); 2])
        .collect();
    let mut source = MemoryBlockSource::new(2, 1);
    for channel in &channels {
        source = source.with_complex_band(SourceSampleType::CFloat32, channel).unwrap();
    }

    let band = CalibratedBand::new(
        Box::new(source),
        CalibratedBandParams {
            kind: CalibrationKind::Sigma0,
            encoding: SampleEncoding::ComplexFloat32,
            source_band: 2,
            polarization: Some("HV".to_string()),
            ..Default::default()
        },
        Some(&flat_lut(2, 1.0, 0.0)),
        None,
    )
    .unwrap();

    assert_eq!(band.polarization(), Some("HV"));
    let block = band.decode_block(&BlockWindow::new(0, 0, 2, 1)).unwrap();
    assert_abs_diff_eq!(block.as_backscatter().unwrap()[[0, 1]], 9.0);
}

#[test]
fn test_noise_levels_exposed_not_applied() {
    let source = MemoryBlockSource::new(4, 1)
        .with_band(SourceSampleType::Float32, vec![2.0; 4])
        .unwrap();
    let noise = NoiseDescriptor {
        path: "calibration/noiseLevels_HH.xml".to_string(),
        candidates: vec![
            NoiseCurveCandidate::new("Beta Nought", 0, 2, 2, "-20 -22"),
            NoiseCurveCandidate::new("Sigma Nought", 0, 2, 2, "-30 -32"),
        ],
    };
    let band = CalibratedBand::new(
        Box::new(source),
        params(CalibrationKind::Sigma0, SampleEncoding::Float32Magnitude),
        Some(&flat_lut(4, 2.0, 0.0)),
        Some(&noise),
    )
    .unwrap();

    assert!(band.has_noise_levels());
    assert_eq!(band.noise_levels_size(), 4);
    assert_abs_diff_eq!(band.noise_level(1).unwrap(), -31.0);
    assert_eq!(band.clone_noise_levels().unwrap().kind(), CalibrationKind::Sigma0);

    let block = band.decode_block(&BlockWindow::new(0, 0, 4, 1)).unwrap();
    assert!(block.as_backscatter().unwrap().iter().all(|&v| v == 2.0));
}
