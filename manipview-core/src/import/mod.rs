//! Mesh asset importers.
//!
//! Every importer yields a [`Model`] whose sub-meshes are non-empty, whole
//! triangle lists with in-range indices. Anything less is an [`ImportError`]:
//! partial geometry is never handed on.

pub mod obj;
pub mod stl;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::geometry::Model;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported asset format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("failed to parse OBJ: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("failed to parse STL: {0}")]
    Stl(String),
    #[error("asset contains no meshes")]
    NoMeshes,
    #[error("mesh `{name}` has no vertices")]
    EmptyMesh { name: String },
    #[error("mesh `{name}` has {count} indices, which is not a whole number of triangles")]
    PartialTriangle { name: String, count: usize },
    #[error("mesh `{name}` references vertex {index} but has only {vertex_count}")]
    IndexOutOfRange {
        name: String,
        index: u32,
        vertex_count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Obj,
    Stl,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }
}

/// Load a mesh asset, picking the importer from the file extension
pub fn load_model(path: &Path) -> Result<Model, ImportError> {
    let format =
        Format::from_path(path).ok_or_else(|| ImportError::UnsupportedFormat(path.to_path_buf()))?;
    let data = fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");

    let model = parse(&data, format, stem)?;
    info!(
        path = %path.display(),
        meshes = model.len(),
        vertices = model.vertex_count(),
        triangles = model.triangle_count(),
        "asset loaded"
    );
    Ok(model)
}

/// Parse in-memory asset bytes. `name` labels sub-meshes the format leaves unnamed.
pub fn parse(data: &[u8], format: Format, name: &str) -> Result<Model, ImportError> {
    let model = match format {
        Format::Obj => obj::parse_obj(data)?,
        Format::Stl => stl::parse_stl(data, name).map_err(ImportError::Stl)?,
    };
    validate(&model)?;
    for (index, mesh) in model.meshes.iter().enumerate() {
        debug!(
            index,
            name = %mesh.name,
            vertices = mesh.vertices.len(),
            triangles = mesh.triangle_count(),
            "sub-mesh"
        );
    }
    Ok(model)
}

fn validate(model: &Model) -> Result<(), ImportError> {
    if model.is_empty() {
        return Err(ImportError::NoMeshes);
    }
    for mesh in &model.meshes {
        if mesh.vertices.is_empty() {
            return Err(ImportError::EmptyMesh {
                name: mesh.name.clone(),
            });
        }
        if mesh.indices.len() % 3 != 0 {
            return Err(ImportError::PartialTriangle {
                name: mesh.name.clone(),
                count: mesh.indices.len(),
            });
        }
        if let Some(&index) = mesh
            .indices
            .iter()
            .find(|&&i| i as usize >= mesh.vertices.len())
        {
            return Err(ImportError::IndexOutOfRange {
                name: mesh.name.clone(),
                index,
                vertex_count: mesh.vertices.len(),
            });
        }
    }
    Ok(())
}

/// Name for a sub-mesh the asset left unnamed
pub(crate) fn fallback_name(index: usize) -> String {
    format!("mesh.{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SubMesh;
    use nalgebra::Point3;
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("arm.OBJ")), Some(Format::Obj));
        assert_eq!(Format::from_path(Path::new("dir/arm.stl")), Some(Format::Stl));
        assert_eq!(Format::from_path(Path::new("arm.fbx")), None);
        assert_eq!(Format::from_path(Path::new("arm")), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_model(Path::new("/nonexistent/manipulator.obj")).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_model(Path::new("manipulator.blend")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_rejects_bad_meshes() {
        assert!(matches!(validate(&Model::default()), Err(ImportError::NoMeshes)));

        let empty = Model::new(vec![SubMesh::new("void")]);
        assert!(matches!(validate(&empty), Err(ImportError::EmptyMesh { .. })));

        let mut partial = SubMesh::cuboid("box", Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        partial.indices.pop();
        assert!(matches!(
            validate(&Model::new(vec![partial])),
            Err(ImportError::PartialTriangle { count: 35, .. })
        ));

        let mut dangling = SubMesh::cuboid("box", Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        dangling.indices[0] = 99;
        assert!(matches!(
            validate(&Model::new(vec![dangling])),
            Err(ImportError::IndexOutOfRange { index: 99, .. })
        ));
    }

    #[test]
    fn test_load_obj_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "o Part").unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0").unwrap();
        writeln!(file, "f 1 2 3").unwrap();
        let model = load_model(file.path()).unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(model.meshes[0].name, "Part");
    }
}
