use glam::Vec3;

use crate::render::vertex::Vertex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Corners in counter-clockwise order as seen from the side the normal points to
    pub fn add_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let start_index = self.vertices.len() as u32;
        let normal = normal.to_array();

        self.vertices
            .extend(corners.iter().map(|c| Vertex::new(c.to_array(), normal)));

        // Two triangles
        self.indices.extend_from_slice(&[
            start_index,
            start_index + 1,
            start_index + 2,
            start_index,
            start_index + 2,
            start_index + 3,
        ]);
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    pub fn translate(&mut self, offset: Vec3) {
        for vertex in &mut self.vertices {
            vertex.position = (Vec3::from(vertex.position) + offset).to_array();
        }
    }
}

/// Torus around the z axis.
///
/// `radius` is the distance from the centre to the middle of the tube;
/// ring `j` walks around the tube cross-section, column `i` around the
/// main circle.
pub fn build_torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Mesh {
    let tau = std::f32::consts::TAU;
    let mut mesh = Mesh::new();

    for j in 0..=radial_segments {
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * tau;
            let v = j as f32 / radial_segments as f32 * tau;

            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let centre = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - centre).normalize_or_zero();

            mesh.vertices.push(Vertex::new(position.to_array(), normal.to_array()));
        }
    }

    let row = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;

            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    mesh
}

/// Faces of an axis-aligned box that should be emitted
#[derive(Debug, Clone, Copy)]
pub struct BoxFaces {
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
    pub top: bool,
    pub front: bool,
    pub back: bool,
}

impl BoxFaces {
    pub const ALL: BoxFaces = BoxFaces {
        left: true,
        right: true,
        bottom: true,
        top: true,
        front: true,
        back: true,
    };
}

/// Append the selected faces of the box spanning `min..max`
pub fn add_box(mesh: &mut Mesh, min: Vec3, max: Vec3, faces: BoxFaces) {
    let (x0, y0, z0) = (min.x, min.y, min.z);
    let (x1, y1, z1) = (max.x, max.y, max.z);

    if faces.front {
        mesh.add_quad(
            [
                Vec3::new(x0, y0, z1),
                Vec3::new(x1, y0, z1),
                Vec3::new(x1, y1, z1),
                Vec3::new(x0, y1, z1),
            ],
            Vec3::Z,
        );
    }
    if faces.back {
        mesh.add_quad(
            [
                Vec3::new(x1, y0, z0),
                Vec3::new(x0, y0, z0),
                Vec3::new(x0, y1, z0),
                Vec3::new(x1, y1, z0),
            ],
            Vec3::NEG_Z,
        );
    }
    if faces.right {
        mesh.add_quad(
            [
                Vec3::new(x1, y0, z1),
                Vec3::new(x1, y0, z0),
                Vec3::new(x1, y1, z0),
                Vec3::new(x1, y1, z1),
            ],
            Vec3::X,
        );
    }
    if faces.left {
        mesh.add_quad(
            [
                Vec3::new(x0, y0, z0),
                Vec3::new(x0, y0, z1),
                Vec3::new(x0, y1, z1),
                Vec3::new(x0, y1, z0),
            ],
            Vec3::NEG_X,
        );
    }
    if faces.top {
        mesh.add_quad(
            [
                Vec3::new(x0, y1, z1),
                Vec3::new(x1, y1, z1),
                Vec3::new(x1, y1, z0),
                Vec3::new(x0, y1, z0),
            ],
            Vec3::Y,
        );
    }
    if faces.bottom {
        mesh.add_quad(
            [
                Vec3::new(x0, y0, z0),
                Vec3::new(x1, y0, z0),
                Vec3::new(x1, y0, z1),
                Vec3::new(x0, y0, z1),
            ],
            Vec3::NEG_Y,
        );
    }
}
