//! Wavefront OBJ loading via `tobj`.

use std::{path::Path, sync::Arc};

use crate::gfx::scene::MeshData;

use super::AssetError;

/// Every drawable part of one OBJ file.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub path: String,
    pub parts: Vec<Arc<MeshData>>,
}

/// Whether a part's normals vary (curved) or stay constant (flat).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceReport {
    pub part: String,
    pub curved: bool,
}

impl ModelData {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|part| part.triangle_count()).sum()
    }

    pub fn analyze_surfaces(&self) -> Vec<SurfaceReport> {
        self.parts
            .iter()
            .map(|part| SurfaceReport {
                part: if part.name.is_empty() {
                    "unnamed".to_string()
                } else {
                    part.name.clone()
                },
                curved: part.has_curved_surfaces(),
            })
            .collect()
    }

    /// Logs the triangle count and per-part surface analysis.
    pub fn log_diagnostics(&self) {
        log::info!(
            "Model {} has {} surfaces (triangles)",
            self.path,
            self.triangle_count()
        );
        for report in self.analyze_surfaces() {
            log::debug!(
                "Model part in {}: {}",
                report.part,
                if report.curved {
                    "Has curved surfaces"
                } else {
                    "Only flat surfaces"
                }
            );
        }
    }
}

/// Parses `root/path`, one mesh part per OBJ object or group.
///
/// Materials referenced by the OBJ are ignored; presets supply them instead.
pub fn load_model(root: &Path, path: &str) -> Result<ModelData, AssetError> {
    let full_path = root.join(path);
    let (models, _materials) = tobj::load_obj(
        &full_path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_string(),
        source,
    })?;

    let parts: Vec<Arc<MeshData>> = models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = model.mesh;
            Arc::new(MeshData::from_flat(
                model.name,
                &mesh.positions,
                &mesh.normals,
                &mesh.texcoords,
                mesh.indices,
            ))
        })
        .collect();

    if parts.is_empty() {
        return Err(AssetError::EmptyModel {
            path: path.to_string(),
        });
    }

    Ok(ModelData {
        path: path.to_string(),
        parts,
    })
}
