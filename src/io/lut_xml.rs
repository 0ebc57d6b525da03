use crate::core::incidence::IncidenceAngleDescriptor;
use crate::core::lut::LutDescriptor;
use crate::core::noise::{NoiseCurveCandidate, NoiseDescriptor};
use crate::core::product::ProductFamily;
use crate::types::{SarError, SarResult};
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use std::path::Path;

/// `<lut>` calibration file. Missing numbers default to zero and are
/// rejected later by table validation.
#[derive(Debug, Deserialize)]
struct LutXml {
    #[serde(rename = "offset", default)]
    offset: f64,
    #[serde(rename = "pixelFirstLutValue", default)]
    pixel_first_lut_value: i64,
    #[serde(rename = "stepSize", default)]
    step_size: i64,
    #[serde(rename = "numberOfValues", default)]
    number_of_values: i64,
    #[serde(rename = "gains", default)]
    gains: String,
}

#[derive(Debug, Deserialize)]
struct IncidenceAnglesXml {
    #[serde(rename = "pixelFirstAnglesValue", default)]
    pixel_first_angles_value: i64,
    #[serde(rename = "stepSize", default)]
    step_size: i64,
    #[serde(rename = "numberOfValues", default)]
    number_of_values: i64,
    #[serde(rename = "angles", default)]
    angles: Vec<String>,
}

fn read_file(path: &Path) -> SarResult<String> {
    log::debug!("Reading calibration descriptor {}", path.display());
    Ok(std::fs::read_to_string(path)?)
}

/// Parse a LUT descriptor; `path` is recorded for error context
pub fn parse_lut_xml(xml_content: &str, path: &str) -> SarResult<LutDescriptor> {
    let lut: LutXml = from_str(xml_content)
        .map_err(|e| SarError::XmlParsing(format!("Failed to parse LUT {}: {}", path, e)))?;

    let descriptor = LutDescriptor::new(
        path,
        lut.offset,
        lut.pixel_first_lut_value,
        lut.step_size,
        lut.number_of_values,
        &lut.gains,
    );
    log::debug!(
        "Parsed LUT {}: {} gains, step {}, first {}, offset {}",
        path,
        descriptor.gains.len(),
        descriptor.step_size,
        descriptor.pixel_first_lut_value,
        descriptor.offset
    );
    Ok(descriptor)
}

pub fn read_lut_file(path: impl AsRef<Path>) -> SarResult<LutDescriptor> {
    let path = path.as_ref();
    parse_lut_xml(&read_file(path)?, &path.to_string_lossy())
}

/// Parse an incidence-angle descriptor; repeated `<angles>` lists are concatenated
pub fn parse_incidence_angles_xml(xml_content: &str, path: &str) -> SarResult<IncidenceAngleDescriptor> {
    let parsed: IncidenceAnglesXml = from_str(xml_content).map_err(|e| {
        SarError::XmlParsing(format!("Failed to parse incidence angles {}: {}", path, e))
    })?;

    Ok(IncidenceAngleDescriptor {
        path: path.to_string(),
        pixel_first_value: parsed.pixel_first_angles_value,
        step_size: parsed.step_size,
        number_of_values: parsed.number_of_values,
        angles: parsed
            .angles
            .iter()
            .flat_map(|list| list.split_whitespace())
            .map(str::to_string)
            .collect(),
    })
}

pub fn read_incidence_angles_file(path: impl AsRef<Path>) -> SarResult<IncidenceAngleDescriptor> {
    let path = path.as_ref();
    parse_incidence_angles_xml(&read_file(path)?, &path.to_string_lossy())
}

fn xml_error(path: &str, e: impl std::fmt::Display) -> SarError {
    SarError::XmlParsing(format!("Failed to parse noise levels {}: {}", path, e))
}

/// Label carried as an attribute (`<referenceNoiseLevel incidenceAngleCorrection="...">`)
fn label_attribute(start: &BytesStart, field: &str, path: &str) -> SarResult<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(path, e))?;
        if attr.key.local_name().as_ref() == field.as_bytes() {
            let value = attr.unescape_value().map_err(|e| xml_error(path, e))?;
            return Ok(Some(value.trim().to_string()));
        }
    }
    Ok(None)
}

/// Collect every `referenceNoiseLevel` entry, using the family's field names.
///
/// Fields that are absent or unparsable stay unset so the candidate is
/// treated as incomplete.
pub fn parse_noise_levels_xml(
    xml_content: &str,
    path: &str,
    family: ProductFamily,
) -> SarResult<NoiseDescriptor> {
    let label_field = family.noise_label_field();
    let count_field = family.noise_count_field();

    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut candidates = Vec::new();
    let mut current: Option<NoiseCurveCandidate> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "referenceNoiseLevel" {
                    current = Some(NoiseCurveCandidate {
                        label: label_attribute(&e, label_field, path)?,
                        ..Default::default()
                    });
                    field = None;
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                let (Some(candidate), Some(name)) = (current.as_mut(), field.as_deref()) else {
                    continue;
                };
                let text = t.unescape().map_err(|e| xml_error(path, e))?;
                let text = text.trim();
                match name {
                    n if n == label_field => candidate.label = Some(text.to_string()),
                    n if n == count_field => candidate.number_of_values = text.parse().ok(),
                    "pixelFirstNoiseValue" => candidate.pixel_first_value = text.parse().ok(),
                    "stepSize" => candidate.step_size = text.parse().ok(),
                    "noiseLevelValues" => {
                        candidate.values = Some(text.split_whitespace().map(str::to_string).collect())
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"referenceNoiseLevel" {
                    if let Some(candidate) = current.take() {
                        candidates.push(candidate);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }

    log::debug!("Found {} reference noise levels in {}", candidates.len(), path);
    Ok(NoiseDescriptor {
        path: path.to_string(),
        candidates,
    })
}

pub fn read_noise_levels_file(path: impl AsRef<Path>, family: ProductFamily) -> SarResult<NoiseDescriptor> {
    let path = path.as_ref();
    parse_noise_levels_xml(&read_file(path)?, &path.to_string_lossy(), family)
}
