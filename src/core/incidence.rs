use crate::core::lut::build_sparse_curve;
use crate::types::{CalibrationKind, SarResult};
use serde::{Deserialize, Serialize};

/// Sparse incidence-angle curve (degrees) anchored like a calibration LUT
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidenceAngleDescriptor {
    pub path: String,
    pub pixel_first_value: i64,
    pub step_size: i64,
    pub number_of_values: i64,
    pub angles: Vec<String>,
}

/// Incidence angle for every range column of the product
#[derive(Debug, Clone, PartialEq)]
pub struct IncidenceAngleTable {
    path: String,
    values: Vec<f64>,
}

impl IncidenceAngleTable {
    pub fn from_descriptor(descriptor: &IncidenceAngleDescriptor) -> SarResult<Self> {
        let values = build_sparse_curve(
            &descriptor.angles,
            descriptor.pixel_first_value,
            descriptor.step_size,
            descriptor.number_of_values,
            &descriptor.path,
            CalibrationKind::None,
        )?;
        Ok(Self {
            path: descriptor.path.clone(),
            values,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn angle(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
