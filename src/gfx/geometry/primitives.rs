//! Primitive shape generators. All shapes are Y-up.

use std::f32::consts::PI;

use super::GeometryData;

/// Generate a UV sphere with specified radius and resolution
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
pub fn generate_sphere(radius: f32, longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices
                .push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            data.normals.push(normal);
            data.tex_coords
                .push([long as f32 / long_segs as f32, lat as f32 / lat_segs as f32]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.extend_from_slice(&[first, first + 1, second]);
            data.indices.extend_from_slice(&[second, first + 1, second + 1]);
        }
    }

    data
}

/// Generate a plane in the XY plane facing +Z
///
/// Rotate it -90° about X to lay it flat as a ground surface.
///
/// # Arguments
/// * `width` - Width of the plane (X direction)
/// * `height` - Height of the plane (Y direction)
/// * `width_segments` - Number of subdivisions along width
/// * `height_segments` - Number of subdivisions along height
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
            // Image rows run top-down.
            data.tex_coords.push([u, 1.0 - v]);
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, i + 1, next_row]);
            data.indices.extend_from_slice(&[next_row, i + 1, next_row + 1]);
        }
    }

    data
}

/// Generate grid lines on the XZ plane, centred at the origin
///
/// Indices are line-list pairs, `divisions + 1` lines along each axis.
pub fn generate_grid_lines(size: f32, divisions: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        for (a, b) in [([-half, 0.0, k], [half, 0.0, k]), ([k, 0.0, -half], [k, 0.0, half])] {
            let base = data.vertices.len() as u32;
            data.vertices.push(a);
            data.vertices.push(b);
            data.normals.extend_from_slice(&[[0.0, 1.0, 0.0]; 2]);
            data.tex_coords.extend_from_slice(&[[0.0, 0.0]; 2]);
            data.indices.extend_from_slice(&[base, base + 1]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(data: &GeometryData, tri: &[u32]) -> [f32; 3] {
        let p = |i: u32| data.vertices[i as usize];
        let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
        let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ]
    }

    #[test]
    fn test_plane_winding_faces_normal() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertex_count(), 9);
        assert_eq!(plane.triangle_count(), 8);
        for tri in plane.indices.chunks_exact(3) {
            assert!(face_normal(&plane, tri)[2] > 0.0);
        }
    }

    #[test]
    fn test_sphere_radius_and_outward_winding() {
        let sphere = generate_sphere(0.2, 16, 16);
        for v in &sphere.vertices {
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((len - 0.2).abs() < 1e-5);
        }
        // Equatorial band, away from the degenerate poles.
        let row = (8 * 16) * 2 * 3;
        let tri = &sphere.indices[row..row + 3];
        let n = face_normal(&sphere, tri);
        let centroid = tri
            .iter()
            .map(|&i| sphere.vertices[i as usize])
            .fold([0.0; 3], |acc, p| [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]);
        let dot = n[0] * centroid[0] + n[1] * centroid[1] + n[2] * centroid[2];
        assert!(dot > 0.0);
    }

    #[test]
    fn test_grid_line_count() {
        let grid = generate_grid_lines(20.0, 20);
        assert_eq!(grid.indices.len(), 21 * 2 * 2);
        assert!(grid.vertices.iter().all(|v| v[1] == 0.0));
    }
}
