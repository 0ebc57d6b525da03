use crate::core::lut::{build_sparse_curve, format_table};
use crate::types::{CalibrationKind, SarError, SarResult};
use serde::{Deserialize, Serialize};

/// One labelled noise curve from a noise-level descriptor.
///
/// Fields missing from the descriptor stay `None`; only complete
/// candidates are eligible for selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseCurveCandidate {
    pub label: Option<String>,
    pub pixel_first_value: Option<i64>,
    pub step_size: Option<i64>,
    pub number_of_values: Option<i64>,
    pub values: Option<Vec<String>>,
}

impl NoiseCurveCandidate {
    pub fn new(label: &str, pixel_first_value: i64, step_size: i64, number_of_values: i64, values: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            pixel_first_value: Some(pixel_first_value),
            step_size: Some(step_size),
            number_of_values: Some(number_of_values),
            values: Some(values.split_whitespace().map(str::to_string).collect()),
        }
    }
}

/// All candidate noise curves for one band
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseDescriptor {
    pub path: String,
    pub candidates: Vec<NoiseCurveCandidate>,
}

/// Descriptor label naming the noise curve for a calibration kind
pub fn noise_label(kind: CalibrationKind) -> Option<&'static str> {
    match kind {
        CalibrationKind::Sigma0 => Some("Sigma Nought"),
        CalibrationKind::Beta0 => Some("Beta Nought"),
        CalibrationKind::Gamma => Some("Gamma"),
        CalibrationKind::None | CalibrationKind::Uncalibrated => None,
    }
}

/// Noise-equivalent level per column, matched to the band's calibration kind.
///
/// Auxiliary data for downstream consumers; the calibration transform
/// never reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseLevelTable {
    path: String,
    kind: CalibrationKind,
    values: Vec<f64>,
}

impl NoiseLevelTable {
    pub fn empty(path: impl Into<String>, kind: CalibrationKind) -> Self {
        Self {
            path: path.into(),
            kind,
            values: Vec::new(),
        }
    }

    /// Pick the first complete candidate whose label matches `kind`
    pub fn select(descriptor: &NoiseDescriptor, kind: CalibrationKind) -> SarResult<Self> {
        let Some(wanted) = noise_label(kind) else {
            return Ok(Self::empty(descriptor.path.clone(), kind));
        };

        for (i, candidate) in descriptor.candidates.iter().enumerate() {
            let (Some(label), Some(first), Some(step), Some(count), Some(values)) = (
                candidate.label.as_deref(),
                candidate.pixel_first_value,
                candidate.step_size,
                candidate.number_of_values,
                candidate.values.as_ref(),
            ) else {
                log::debug!("Skipping incomplete noise candidate {} in {}", i, descriptor.path);
                continue;
            };

            if !label.trim().eq_ignore_ascii_case(wanted) {
                continue;
            }

            let values = match build_sparse_curve(values, first, step, count, &descriptor.path, kind) {
                Ok(values) => values,
                Err(e) => {
                    log::warn!("Ignoring '{}' noise levels: {}", label, e);
                    return Ok(Self::empty(descriptor.path.clone(), kind));
                }
            };
            log::debug!(
                "Selected '{}' noise levels ({} columns) from {}",
                label,
                values.len(),
                descriptor.path
            );
            return Ok(Self {
                path: descriptor.path.clone(),
                kind,
                values,
            });
        }

        log::warn!("No '{}' noise level curve in {}", wanted, descriptor.path);
        Ok(Self::empty(descriptor.path.clone(), kind))
    }

    pub fn is_available(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> CalibrationKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    fn not_available(&self) -> SarError {
        SarError::NotAvailable {
            path: self.path.clone(),
            kind: self.kind,
        }
    }

    /// Noise level at a table column
    pub fn value(&self, column: usize) -> SarResult<f64> {
        if !self.is_available() {
            return Err(self.not_available());
        }
        self.values.get(column).copied().ok_or_else(|| SarError::Configuration {
            path: self.path.clone(),
            kind: self.kind,
            reason: format!(
                "noise column {} outside table of {} columns",
                column,
                self.values.len()
            ),
        })
    }

    pub fn values(&self) -> SarResult<&[f64]> {
        if !self.is_available() {
            return Err(self.not_available());
        }
        Ok(&self.values)
    }

    pub fn formatted(&self) -> SarResult<String> {
        Ok(format_table(self.values()?))
    }
}
