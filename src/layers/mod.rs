//! The mutable vector layer: every shape the user has drawn, the appended
//! coordinate records for point features, and a vertex index for the modify
//! interaction. Rendering lives in `renderer`.

mod renderer;
mod tessellate;

pub use renderer::*;
pub use tessellate::*;

use bevy::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use uuid::Uuid;

use crate::types::{Coord, DrawnFeature, FeatureGeometry};

pub struct VectorLayerPlugin;

impl Plugin for VectorLayerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VectorLayer::default())
            .add_systems(Update, respawn_features);
    }
}

/// One editable vertex of one feature, indexed in geographic degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexHandle {
    pub position: [f64; 2],
    pub feature: Uuid,
    pub index: usize,
}

impl RTreeObject for VertexHandle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for VertexHandle {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Resource, Default)]
pub struct VectorLayer {
    pub features: Vec<DrawnFeature>,
    /// Geographic coordinates of point features, in draw order. Append-only
    /// between clears.
    pub coordinate_records: Vec<Coord>,
    vertex_tree: RTree<VertexHandle>,
    pub respawn: bool,
}

impl VectorLayer {
    /// Appends a finished feature. Point features also append their
    /// geographic coordinate to the records.
    pub fn add_feature(&mut self, feature: DrawnFeature) {
        if let FeatureGeometry::Point(coord) = feature.geometry {
            self.coordinate_records.push(coord);
        }
        self.features.push(feature);
        self.rebuild_vertex_index();
        self.respawn = true;
    }

    /// Empties the feature collection and the coordinate records together.
    pub fn clear(&mut self) {
        self.features.clear();
        self.coordinate_records.clear();
        self.vertex_tree = RTree::new();
        self.respawn = true;
    }

    pub fn feature_mut(&mut self, id: Uuid) -> Option<&mut DrawnFeature> {
        self.features.iter_mut().find(|f| f.id == id)
    }

    /// Moves one vertex of one feature. The vertex index is left stale until
    /// [`Self::rebuild_vertex_index`]; callers rebuild when the drag ends.
    pub fn set_vertex(&mut self, id: Uuid, index: usize, coord: Coord) {
        if let Some(feature) = self.feature_mut(id) {
            feature.geometry.set_vertex(index, coord);
            self.respawn = true;
        }
    }

    pub fn rebuild_vertex_index(&mut self) {
        let handles = self
            .features
            .iter()
            .flat_map(|feature| {
                feature
                    .geometry
                    .vertices()
                    .into_iter()
                    .enumerate()
                    .map(|(index, v)| VertexHandle {
                        position: [v.long as f64, v.lat as f64],
                        feature: feature.id,
                        index,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        self.vertex_tree = RTree::bulk_load(handles);
    }

    /// The closest editable vertex to a geographic coordinate, if any
    /// feature exists. Tolerance checks are the caller's business.
    pub fn nearest_vertex(&self, to: Coord) -> Option<&VertexHandle> {
        self.vertex_tree
            .nearest_neighbor(&[to.long as f64, to.lat as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::world_to_lat_long;

    fn point(lat: f32, long: f32) -> DrawnFeature {
        DrawnFeature::new(FeatureGeometry::Point(Coord::new(lat, long)))
    }

    #[test]
    fn point_features_append_records() {
        let mut layer = VectorLayer::default();
        layer.add_feature(point(10.0, 20.0));
        layer.add_feature(point(-5.0, 7.5));
        layer.add_feature(DrawnFeature::new(FeatureGeometry::Line(vec![
            Coord::new(0.0, 0.0),
            Coord::new(1.0, 1.0),
        ])));
        assert_eq!(layer.coordinate_records.len(), 2);
        assert_eq!(layer.features.len(), 3);
        assert_eq!(layer.coordinate_records[1], Coord::new(-5.0, 7.5));
    }

    #[test]
    fn clear_empties_features_and_records() {
        let mut layer = VectorLayer::default();
        layer.add_feature(point(1.0, 1.0));
        layer.add_feature(DrawnFeature::new(FeatureGeometry::Circle {
            center: Coord::new(0.0, 0.0),
            edge: Coord::new(0.0, 0.5),
        }));
        layer.clear();
        assert!(layer.features.is_empty());
        assert!(layer.coordinate_records.is_empty());
        assert!(layer.nearest_vertex(Coord::new(0.0, 0.0)).is_none());
        assert!(layer.respawn);
    }

    #[test]
    fn records_stay_inside_geographic_bounds() {
        // Even wildly off-screen gestures inverse-project into valid
        // latitude/longitude ranges before they are recorded.
        let mut layer = VectorLayer::default();
        let reference = Coord::new(0.011, 0.011);
        for offset in [-1e7, -12_345.0, 0.0, 54_321.0, 1e7] {
            let coord = world_to_lat_long(offset, offset, reference, 4, 256.0);
            layer.add_feature(point(coord.lat, coord.long));
        }
        for record in &layer.coordinate_records {
            assert!((-90.0..=90.0).contains(&record.lat));
            assert!((-180.0..=180.0).contains(&record.long));
        }
    }

    #[test]
    fn nearest_vertex_finds_dragged_handle() {
        let mut layer = VectorLayer::default();
        let line = DrawnFeature::new(FeatureGeometry::Line(vec![
            Coord::new(0.0, 0.0),
            Coord::new(10.0, 10.0),
        ]));
        let id = line.id;
        layer.add_feature(line);
        layer.add_feature(point(-40.0, -40.0));

        let handle = layer.nearest_vertex(Coord::new(9.0, 9.5)).unwrap();
        assert_eq!(handle.feature, id);
        assert_eq!(handle.index, 1);

        layer.set_vertex(id, 1, Coord::new(-39.0, -39.0));
        layer.rebuild_vertex_index();
        let handle = layer.nearest_vertex(Coord::new(-39.0, -39.0)).unwrap();
        assert_eq!(handle.feature, id);
    }
}
