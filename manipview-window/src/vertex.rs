use manipview_core::{SubMesh, Vertex};
use nalgebra::{Matrix4, Point3};

/// nalgebra builds projections for a -1..1 depth range, wgpu clips to 0..1
#[rustfmt::skip]
pub fn opengl_to_wgpu() -> Matrix4<f32> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    pub fn from_mesh(mesh: &SubMesh) -> Vec<Self> {
        mesh.vertices.iter().map(Self::from).collect()
    }
}

impl From<&Vertex> for MeshVertex {
    fn from(vertex: &Vertex) -> Self {
        Self {
            position: vertex.position.coords.into(),
            normal: vertex.normal.into(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable, PartialEq)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
}

impl CameraUniform {
    pub fn new(view: &Matrix4<f32>, projection: &Matrix4<f32>, eye: &Point3<f32>) -> Self {
        Self {
            view_proj: (opengl_to_wgpu() * projection * view).into(),
            view_pos: eye.to_homogeneous().into(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable, PartialEq)]
pub struct SegmentUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl SegmentUniform {
    pub fn new(world: &Matrix4<f32>) -> Self {
        // Inverse transpose; a singular world matrix keeps itself
        let normal = world
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or(*world);
        Self {
            model: (*world).into(),
            normal: normal.into(),
        }
    }
}
