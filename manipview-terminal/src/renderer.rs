/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use manipview_core::SubMesh;
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 0.5;

const LIGHT_POSITION: [f32; 3] = [2.0, 3.0, 2.0];
const AMBIENT: f32 = 0.1;
const DIFFUSE: f32 = 0.8;

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

/// A vertex after projection: screen column, screen row, NDC depth
type ScreenPoint = (f32, f32, f32);

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Width over height in world units, accounting for cell shape
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32 * CELL_ASPECT
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at a cell, mostly for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Draw a sub-mesh placed by `world`, seen through `view_projection`
    pub fn render_mesh(
        &mut self,
        mesh: &SubMesh,
        world: &Matrix4<f32>,
        view_projection: &Matrix4<f32>,
    ) {
        let mvp = view_projection * world;
        let light = Point3::from(Vector3::from(LIGHT_POSITION));

        for triangle in mesh.triangles() {
            let mut screen_coords = [(0.0, 0.0, 0.0); 3];
            let mut visible = true;
            for (slot, vertex) in screen_coords.iter_mut().zip(triangle) {
                match self.project(&mvp, &vertex.position) {
                    Some(point) => *slot = point,
                    None => {
                        visible = false;
                        break;
                    }
                }
            }
            if !visible {
                continue; // Triangle is clipped
            }

            // Shade by the world-space face normal against the point light
            let normal = world
                .transform_vector(&SubMesh::face_normal(triangle))
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let [a, b, c] = triangle;
            let centroid = world.transform_point(&Point3::from(
                (a.position.coords + b.position.coords + c.position.coords) / 3.0,
            ));
            let light_dir = (light - centroid).normalize();
            let brightness = (AMBIENT + DIFFUSE * normal.dot(&light_dir).max(0.0)).min(1.0);

            // Map brightness to character
            let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
            let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
            self.rasterize_triangle(&screen_coords, LUMINOSITY_RAMP[char_index]);
        }
    }

    /// Project to screen space; `None` behind the camera or outside the depth range
    fn project(&self, mvp: &Matrix4<f32>, point: &Point3<f32>) -> Option<ScreenPoint> {
        let clip = mvp * point.to_homogeneous();
        // Prevent division by near-zero depth values
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        Some((screen_x, screen_y, ndc.z))
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates; either winding is accepted
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let c = self.char_buffer[y * self.width + x];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use manipview_core::FlyCamera;

    fn view_projection(renderer: &AsciiRenderer) -> Matrix4<f32> {
        let camera = FlyCamera::default();
        camera.projection_matrix(renderer.aspect()) * camera.view_matrix()
    }

    fn drawn_cells(renderer: &AsciiRenderer) -> usize {
        (0..renderer.height())
            .flat_map(|y| (0..renderer.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.cell(x, y) != Some(' '))
            .count()
    }

    #[test]
    fn test_box_in_view_is_drawn() {
        let mut renderer = AsciiRenderer::new(80, 40);
        let mesh = SubMesh::cuboid(
            "box",
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        renderer.render_mesh(&mesh, &Matrix4::identity(), &view_projection(&renderer));
        assert!(drawn_cells(&renderer) > 0);
        // The box is centered on screen
        assert_ne!(renderer.cell(40, 20), Some(' '));

        renderer.clear();
        assert_eq!(drawn_cells(&renderer), 0);
    }

    #[test]
    fn test_zero_sized_buffer_renders_nothing() {
        let mesh = SubMesh::cuboid(
            "box",
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        for (width, height) in [(0, 40), (80, 0), (0, 0)] {
            let mut renderer = AsciiRenderer::new(width, height);
            assert_eq!(renderer.aspect(), 1.0);
            renderer.render_mesh(&mesh, &Matrix4::identity(), &view_projection(&renderer));
            assert_eq!(drawn_cells(&renderer), 0);
            renderer.draw(&mut Vec::new()).unwrap();
        }
    }

    #[test]
    fn test_box_behind_camera_is_skipped() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let mesh = SubMesh::cuboid(
            "box",
            Point3::new(-1.0, -1.0, 9.0),
            Point3::new(1.0, 1.0, 11.0),
        );
        renderer.render_mesh(&mesh, &Matrix4::identity(), &view_projection(&renderer));
        assert_eq!(drawn_cells(&renderer), 0);
    }

    #[test]
    fn test_world_matrix_moves_geometry() {
        let mut renderer = AsciiRenderer::new(80, 40);
        let mesh = SubMesh::cuboid(
            "box",
            Point3::new(-0.2, -0.2, -0.2),
            Point3::new(0.2, 0.2, 0.2),
        );
        let shifted = Matrix4::new_translation(&Vector3::new(1.5, 0.0, 0.0));
        renderer.render_mesh(&mesh, &shifted, &view_projection(&renderer));
        assert_eq!(renderer.cell(40, 20), Some(' '));
        assert!(drawn_cells(&renderer) > 0);
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.5, 0.5)).is_none());
        let (w0, w1, w2) = barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0);
    }
}
