use crate::types::{CalibrationKind, SarError, SarResult};
use serde::{Deserialize, Serialize};

/// Calibration LUT as read from a product descriptor
///
/// Gain `i` applies to range column `i * step_size + pixel_first_lut_value`.
/// A negative `step_size` describes a descending product, in which case the
/// first gain sits at the far-range end of the swath.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LutDescriptor {
    pub path: String,
    pub offset: f64,
    pub pixel_first_lut_value: i64,
    pub step_size: i64,
    pub number_of_values: i64,
    pub gains: Vec<String>,
}

impl LutDescriptor {
    /// Build a descriptor from a whitespace-separated gain list
    pub fn new(
        path: impl Into<String>,
        offset: f64,
        pixel_first_lut_value: i64,
        step_size: i64,
        number_of_values: i64,
        gains: &str,
    ) -> Self {
        Self {
            path: path.into(),
            offset,
            pixel_first_lut_value,
            step_size,
            number_of_values,
            gains: gains.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// How a product family lays out its gain list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LutLayout {
    /// Anchored every `step_size` columns, interpolated to one value per column
    Sparse,
    /// Already one gain per column
    Dense,
}

/// Expand sparse anchors into one value per column.
///
/// Linear between consecutive anchors, held at the nearest anchor value
/// outside the anchored range.
pub fn interpolate_values(
    anchors: &[f64],
    table_size: usize,
    step_size: i64,
    pixel_first_value: i64,
) -> Vec<f64> {
    if anchors.is_empty() {
        return vec![0.0; table_size];
    }

    let mut points: Vec<(f64, f64)> = anchors
        .iter()
        .enumerate()
        .map(|(i, &value)| (i as f64 * step_size as f64 + pixel_first_value as f64, value))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let last = points.len() - 1;
    (0..table_size)
        .map(|column| {
            let x = column as f64;
            let after_idx = points.partition_point(|p| p.0 <= x);
            if after_idx == 0 {
                return points[0].1;
            }
            if after_idx > last {
                return points[last].1;
            }
            let (before_pos, before_val) = points[after_idx - 1];
            let (after_pos, after_val) = points[after_idx];
            if after_pos == before_pos {
                before_val
            } else {
                let weight = (x - before_pos) / (after_pos - before_pos);
                before_val + (after_val - before_val) * weight
            }
        })
        .collect()
}

/// Parse whitespace-tokenized decimal values (`6.123004711900930e+04` style)
pub(crate) fn parse_values<S: AsRef<str>>(
    tokens: &[S],
    path: &str,
    kind: CalibrationKind,
) -> SarResult<Vec<f64>> {
    tokens
        .iter()
        .map(|token| {
            let token = token.as_ref();
            token.trim().parse::<f64>().map_err(|e| SarError::Configuration {
                path: path.to_string(),
                kind,
                reason: format!("invalid value '{}': {}", token, e),
            })
        })
        .collect()
}

/// Upper bound on interpolated table length, far beyond any swath width
pub const MAX_TABLE_COLUMNS: usize = 1 << 24;

/// Validate the anchor geometry and interpolate a dense curve.
///
/// Shared by gain, noise-level and incidence-angle tables.
pub(crate) fn build_sparse_curve<S: AsRef<str>>(
    tokens: &[S],
    pixel_first_value: i64,
    step_size: i64,
    number_of_values: i64,
    path: &str,
    kind: CalibrationKind,
) -> SarResult<Vec<f64>> {
    let config_error = |reason: String| SarError::Configuration {
        path: path.to_string(),
        kind,
        reason,
    };

    if number_of_values <= 0 {
        return Err(config_error(format!(
            "numberOfValues must be positive, got {}",
            number_of_values
        )));
    }
    if step_size <= 0 && pixel_first_value <= 0 {
        return Err(config_error(format!(
            "descending LUT (stepSize {}) needs a positive pixelFirstLutValue, got {}",
            step_size, pixel_first_value
        )));
    }

    let values = parse_values(tokens, path, kind)?;
    let count = number_of_values as usize;
    if values.len() < count {
        return Err(config_error(format!(
            "numberOfValues is {} but only {} values are listed",
            count,
            values.len()
        )));
    }

    let last_anchor = step_size
        .checked_mul(number_of_values - 1)
        .and_then(|span| span.checked_add(pixel_first_value));
    if last_anchor.is_none() {
        return Err(config_error(format!(
            "anchor positions overflow (first {}, step {}, {} values)",
            pixel_first_value, step_size, number_of_values
        )));
    }
    let table_size = usize::try_from(step_size.unsigned_abs())
        .ok()
        .and_then(|step| step.checked_mul(count))
        .filter(|&size| size <= MAX_TABLE_COLUMNS)
        .ok_or_else(|| {
            config_error(format!(
                "|stepSize| x numberOfValues ({} x {}) exceeds {} columns",
                step_size.unsigned_abs(),
                count,
                MAX_TABLE_COLUMNS
            ))
        })?;
    log::debug!(
        "Interpolating {} anchors (step {}, first {}) into {} columns from {}",
        count,
        step_size,
        pixel_first_value,
        table_size,
        path
    );
    Ok(interpolate_values(
        &values[..count],
        table_size,
        step_size,
        pixel_first_value,
    ))
}

/// Format a value the way C's `%e` does (`2.390641e+02`)
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// Space-separated `%e` rendering of a table
pub fn format_table(values: &[f64]) -> String {
    values
        .iter()
        .map(|&v| format_scientific(v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dense per-column gain table for one band
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    kind: CalibrationKind,
    path: String,
    offset: f64,
    /// Absolute raster column of `columns[0]`
    origin: usize,
    columns: Vec<f64>,
}

impl CalibrationTable {
    /// Build the table from a descriptor, checking it covers `raster_width` columns
    pub fn from_descriptor(
        descriptor: &LutDescriptor,
        kind: CalibrationKind,
        layout: LutLayout,
        raster_width: usize,
    ) -> SarResult<Self> {
        let columns = match layout {
            LutLayout::Sparse => build_sparse_curve(
                &descriptor.gains,
                descriptor.pixel_first_lut_value,
                descriptor.step_size,
                descriptor.number_of_values,
                &descriptor.path,
                kind,
            )?,
            LutLayout::Dense => parse_values(&descriptor.gains, &descriptor.path, kind)?,
        };

        if columns.len() < raster_width {
            return Err(SarError::Configuration {
                path: descriptor.path.clone(),
                kind,
                reason: format!(
                    "LUT covers {} columns, raster is {} columns wide",
                    columns.len(),
                    raster_width
                ),
            });
        }

        log::debug!(
            "Built {} LUT with {} columns, offset {} from {}",
            kind,
            columns.len(),
            descriptor.offset,
            descriptor.path
        );

        Ok(Self {
            kind,
            path: descriptor.path.clone(),
            offset: descriptor.offset,
            origin: 0,
            columns,
        })
    }

    pub fn kind(&self) -> CalibrationKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.columns.len()
    }

    /// Absolute raster column of the first table entry
    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn columns(&self) -> &[f64] {
        &self.columns
    }

    /// Table entry by table index
    pub fn value(&self, index: usize) -> Option<f64> {
        self.columns.get(index).copied()
    }

    /// Gain for an absolute raster column, re-based on the current window
    pub fn gain_at(&self, column: usize) -> Option<f64> {
        column
            .checked_sub(self.origin)
            .and_then(|index| self.columns.get(index).copied())
    }

    /// Whether every column of `[col0, col0 + width)` has a gain
    pub fn covers(&self, col0: usize, width: usize) -> bool {
        col0 >= self.origin && col0 + width <= self.origin + self.columns.len()
    }

    /// Narrow the table to `[pixel_offset, pixel_offset + pixel_width)`.
    ///
    /// The offset is clamped to zero and the width so that the window ends
    /// at most at `size - 1`. Returns false, leaving the table untouched,
    /// when nothing remains.
    pub fn set_partial(&mut self, pixel_offset: i64, pixel_width: i64) -> bool {
        let size = self.columns.len() as i64;
        let pixel_offset = pixel_offset.max(0);
        if pixel_offset >= size {
            return false;
        }

        let mut pixel_width = pixel_width;
        if pixel_width > size - 1 - pixel_offset {
            pixel_width = size - 1 - pixel_offset;
        }
        if pixel_width <= 0 {
            return false;
        }

        let start = pixel_offset as usize;
        let end = start + pixel_width as usize;
        self.columns = self.columns[start..end].to_vec();
        self.origin += start;
        log::debug!(
            "LUT {} narrowed to {} columns starting at raster column {}",
            self.path,
            self.columns.len(),
            self.origin
        );
        true
    }

    /// Gains as a space-separated `%e` list
    pub fn formatted_gains(&self) -> String {
        format_table(&self.columns)
    }
}
