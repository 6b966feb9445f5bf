/// Wavefront OBJ import via `tobj`; one sub-mesh per object/group, materials ignored
use nalgebra::{Point3, Vector3};

use super::{fallback_name, ImportError};
use crate::geometry::{generate_normals, Model, SubMesh, Vertex};

pub fn parse_obj(data: &[u8]) -> Result<Model, ImportError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj_buf(&mut &data[..], &options, |_| {
        Ok((Vec::new(), Default::default()))
    })?;

    let meshes = models
        .into_iter()
        .enumerate()
        .map(|(index, model)| convert(index, model))
        .collect();
    Ok(Model::new(meshes))
}

fn convert(index: usize, model: tobj::Model) -> SubMesh {
    let mesh = model.mesh;
    let name = if model.name.trim().is_empty() {
        fallback_name(index)
    } else {
        model.name
    };

    let has_normals = mesh.normals.len() == mesh.positions.len();
    let vertices = mesh
        .positions
        .chunks_exact(3)
        .enumerate()
        .map(|(i, p)| {
            let normal = if has_normals {
                Vector3::new(
                    mesh.normals[3 * i],
                    mesh.normals[3 * i + 1],
                    mesh.normals[3 * i + 2],
                )
            } else {
                Vector3::zeros()
            };
            Vertex::at(Point3::new(p[0], p[1], p[2]), normal)
        })
        .collect();

    let mut sub_mesh = SubMesh {
        name,
        vertices,
        indices: mesh.indices,
    };
    if !has_normals {
        generate_normals(&mut sub_mesh);
    }
    sub_mesh
}
