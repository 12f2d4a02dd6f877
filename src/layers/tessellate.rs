//! CPU tessellation of line and polygon features into 2d meshes, via lyon.

use bevy::asset::RenderAssetUsages;
use bevy::math::Vec2;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, StrokeOptions, StrokeTessellator,
    StrokeVertex, VertexBuffers,
};

/// Flat triangle-list output of one tessellation pass.
pub struct MeshBuffers {
    pub positions: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn build_path(points: &[Vec2], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut builder = Path::builder();
    builder.begin(point(first.x, first.y));
    for p in rest {
        builder.line_to(point(p.x, p.y));
    }
    builder.end(closed);
    Some(builder.build())
}

/// Fills the interior of a ring. Returns `None` for degenerate input, if the
/// tessellator rejects the path (self-intersections it cannot resolve), or
/// if the output holds no triangles (zero-area rings).
pub fn fill_polygon(points: &[Vec2]) -> Option<MeshBuffers> {
    if points.len() < 3 {
        return None;
    }
    let path = build_path(points, true)?;
    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position().to_array()),
        )
        .ok()?;
    let buffers = MeshBuffers {
        positions: buffers.vertices,
        indices: buffers.indices,
    };
    (!buffers.is_empty()).then_some(buffers)
}

/// Strokes a polyline with a constant width, optionally closing it.
pub fn stroke_polyline(points: &[Vec2], width: f32, closed: bool) -> Option<MeshBuffers> {
    let path = build_path(points, closed)?;
    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    StrokeTessellator::new()
        .tessellate_path(
            &path,
            &StrokeOptions::default().with_line_width(width),
            &mut BuffersBuilder::new(&mut buffers, |v: StrokeVertex| v.position().to_array()),
        )
        .ok()?;
    let buffers = MeshBuffers {
        positions: buffers.vertices,
        indices: buffers.indices,
    };
    (!buffers.is_empty()).then_some(buffers)
}

/// Converts tessellation output into a renderable `Mesh2d` mesh.
pub fn buffers_to_mesh(buffers: MeshBuffers) -> Mesh {
    let vertex_count = buffers.positions.len();
    let positions: Vec<[f32; 3]> = buffers
        .positions
        .into_iter()
        .map(|p| [p[0], p[1], 0.0])
        .collect();
    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 0.0, 1.0]; vertex_count])
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, vec![[0.0, 0.0]; vertex_count])
    .with_inserted_indices(Indices::U32(buffers.indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_a_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let buffers = fill_polygon(&square).unwrap();
        assert!(!buffers.is_empty());
        assert_eq!(buffers.indices.len() % 3, 0);
        // Two triangles cover a convex quad.
        assert!(buffers.indices.len() >= 6);
    }

    #[test]
    fn strokes_a_segment() {
        let buffers =
            stroke_polyline(&[Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)], 4.0, false).unwrap();
        assert!(!buffers.is_empty());
        assert_eq!(buffers.indices.len() % 3, 0);
        // Every stroke vertex sits within half the width of the centerline.
        for p in &buffers.positions {
            assert!(p[1].abs() <= 2.0 + f32::EPSILON);
        }
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(fill_polygon(&[Vec2::ZERO, Vec2::ONE]).is_none());
        assert!(stroke_polyline(&[Vec2::ZERO], 2.0, false).is_none());
        assert!(stroke_polyline(&[], 2.0, true).is_none());
    }

    #[test]
    fn zero_area_ring_fills_to_nothing() {
        // Three collinear vertices form a valid path but enclose nothing;
        // no mesh entity should be spawned for it.
        let collinear = [
            Vec2::new(0.0, 0.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(10.0, 10.0),
        ];
        assert!(fill_polygon(&collinear).is_none());
    }
}
