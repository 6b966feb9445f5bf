/// Geometry primitives for the manipulator meshes
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }

    pub fn at(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// One named, independently drawable piece of an imported asset.
///
/// Names are not unique: several sub-meshes may share one name, in which
/// case their bounds are merged (see [`crate::bounds::BoundsMap`]).
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Triangle list, three indices per face.
    pub indices: Vec<u32>,
}

impl SubMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn with_capacity(name: impl Into<String>, vertices: usize, indices: usize) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Append a triangle with its own three vertices
    pub fn push_triangle(&mut self, v0: Vertex, v1: Vertex, v2: Vertex) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[v0, v1, v2]);
        self.indices.extend_from_slice(&[start, start + 1, start + 2]);
    }

    /// Append a planar quad (two triangles, counter-clockwise winding)
    fn push_quad(&mut self, corners: [Point3<f32>; 4], normal: Vector3<f32>) {
        let start = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|&p| Vertex::at(p, normal)));
        self.indices.extend_from_slice(&[
            start,
            start + 1,
            start + 2,
            start,
            start + 2,
            start + 3,
        ]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as vertex triples.
    ///
    /// Indices must be in range; the importers guarantee this.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Calculate the unit face normal of a triangle (zero for degenerate faces)
    pub fn face_normal(triangle: [&Vertex; 3]) -> Vector3<f32> {
        let edge1 = triangle[1].position - triangle[0].position;
        let edge2 = triangle[2].position - triangle[0].position;
        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Create a closed axis-aligned box with outward-facing normals
    pub fn cuboid(name: impl Into<String>, min: Point3<f32>, max: Point3<f32>) -> Self {
        let mut mesh = Self::with_capacity(name, 24, 36);
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);
        let p = Point3::new;

        // Front (+Z)
        mesh.push_quad(
            [p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)],
            Vector3::z(),
        );
        // Back (-Z)
        mesh.push_quad(
            [p(x1, y0, z0), p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0)],
            -Vector3::z(),
        );
        // Top (+Y)
        mesh.push_quad(
            [p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0), p(x0, y1, z0)],
            Vector3::y(),
        );
        // Bottom (-Y)
        mesh.push_quad(
            [p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1), p(x0, y0, z1)],
            -Vector3::y(),
        );
        // Right (+X)
        mesh.push_quad(
            [p(x1, y0, z1), p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1)],
            Vector3::x(),
        );
        // Left (-X)
        mesh.push_quad(
            [p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)],
            -Vector3::x(),
        );

        mesh
    }
}

/// Replace vertex normals with area-weighted averages of adjacent face normals.
///
/// Vertices touched only by degenerate faces get +Z.
pub fn generate_normals(mesh: &mut SubMesh) {
    let mut accum = vec![Vector3::<f32>::zeros(); mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            mesh.vertices[a].position,
            mesh.vertices[b].position,
            mesh.vertices[c].position,
        );
        // Unnormalized cross product weights by twice the face area
        let weighted = (pb - pa).cross(&(pc - pa));
        accum[a] += weighted;
        accum[b] += weighted;
        accum[c] += weighted;
    }
    for (vertex, sum) in mesh.vertices.iter_mut().zip(accum) {
        vertex.normal = sum.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z);
    }
}

/// An imported asset: sub-meshes in import order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub meshes: Vec<SubMesh>,
}

impl Model {
    pub fn new(meshes: Vec<SubMesh>) -> Self {
        Self { meshes }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(SubMesh::triangle_count).sum()
    }

    /// A six-piece arm built from boxes.
    ///
    /// Piece order and names match [`crate::rig::RigConfig::default`]: the
    /// shoulder housing is `Cube.002` and the elbow knuckle is `Cube.003`.
    pub fn demo_manipulator() -> Self {
        let p = Point3::new;
        Self::new(vec![
            SubMesh::cuboid("Cylinder", p(-0.8, 0.0, -0.8), p(0.8, 0.25, 0.8)),
            SubMesh::cuboid("Cube.001", p(-0.12, 1.0, -0.12), p(0.12, 2.2, 0.12)),
            SubMesh::cuboid("Cube.002", p(-0.25, 0.85, -0.25), p(0.25, 1.15, 0.25)),
            SubMesh::cuboid("Cube", p(-0.1, 2.3, -0.1), p(0.1, 2.7, 0.1)),
            SubMesh::cuboid("Cylinder.001", p(-0.15, 0.25, -0.15), p(0.15, 0.85, 0.15)),
            SubMesh::cuboid("Cube.003", p(-0.15, 2.1, -0.15), p(0.15, 2.3, 0.15)),
        ])
    }
}
