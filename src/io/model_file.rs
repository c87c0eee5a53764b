//! Read/write orbit model JSON files.
//!
//! A model file is the portable representation of a calibrated orbit:
//! the event dates, radii, orbit length and harmonic coefficients. Reloading it
//! skips the NAIF table entirely.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::OrbitModel;
use crate::error::AppError;

const TOOL: &str = "titan-ls";

/// On-disk envelope of an orbit model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub model: OrbitModel,
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, model: &OrbitModel) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create model JSON '{}': {e}", path.display())))?;

    let envelope = ModelFile {
        tool: TOOL.to_string(),
        model: model.clone(),
    };
    serde_json::to_writer_pretty(file, &envelope)
        .map_err(|e| AppError::io(format!("Failed to write model JSON: {e}")))?;

    Ok(())
}

/// Read a model JSON file and check it can drive the solver.
pub fn read_model_json(path: &Path) -> Result<OrbitModel, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let envelope: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::io(format!("Invalid model JSON: {e}")))?;

    let model = envelope.model;
    model.reference_vernal()?;
    model.orbit_length()?;
    if !model.harmonic.is_within_bounds() {
        return Err(AppError::input(format!(
            "Model harmonic coefficients are out of bounds: {:?}",
            model.harmonic
        )));
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn model_survives_a_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("titan.json");
        let model = OrbitModel::default();

        write_model_json(&path, &model).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"1980-02-22\""));

        let back = read_model_json(&path).unwrap();
        assert_eq!(back.vernal_equinoxes, model.vernal_equinoxes);
        assert_eq!(back.aphelia, model.aphelia);
        assert_eq!(back.orbit_days, model.orbit_days);
        assert!((back.harmonic.c - model.harmonic.c).abs() < 1e-12);
        assert!((back.radii.perihelion - model.radii.perihelion).abs() < 1e-12);
    }

    #[test]
    fn rejects_model_without_orbit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        let model = OrbitModel {
            orbit_days: 0,
            ..OrbitModel::default()
        };
        write_model_json(&path, &model).unwrap();
        assert_eq!(read_model_json(&path).unwrap_err().kind(), ErrorKind::Input);
    }

    #[test]
    fn garbage_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(read_model_json(&path).unwrap_err().kind(), ErrorKind::Io);
    }
}
