use uuid::Uuid;

use super::Coord;

/// The geometry of one drawn shape. Circles are a true primitive (center
/// plus a rim handle), never a polygon approximation.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(Coord),
    Line(Vec<Coord>),
    Polygon(Vec<Coord>),
    Circle { center: Coord, edge: Coord },
}

impl FeatureGeometry {
    /// Editable vertices, in a stable order. For circles: 0 is the center,
    /// 1 the rim handle.
    pub fn vertices(&self) -> Vec<Coord> {
        match self {
            FeatureGeometry::Point(c) => vec![*c],
            FeatureGeometry::Line(points) | FeatureGeometry::Polygon(points) => points.clone(),
            FeatureGeometry::Circle { center, edge } => vec![*center, *edge],
        }
    }

    /// Moves the vertex at `index`. Dragging a circle's center translates
    /// the rim with it so the radius is preserved.
    pub fn set_vertex(&mut self, index: usize, coord: Coord) {
        match self {
            FeatureGeometry::Point(c) => *c = coord,
            FeatureGeometry::Line(points) | FeatureGeometry::Polygon(points) => {
                if let Some(p) = points.get_mut(index) {
                    *p = coord;
                }
            }
            FeatureGeometry::Circle { center, edge } => {
                if index == 0 {
                    edge.lat += coord.lat - center.lat;
                    edge.long += coord.long - center.long;
                    *center = coord;
                } else {
                    *edge = coord;
                }
            }
        }
    }

    /// Where the measurement label sits: the vertex average, or the circle
    /// center.
    pub fn label_anchor(&self) -> Coord {
        match self {
            FeatureGeometry::Point(c) => *c,
            FeatureGeometry::Circle { center, .. } => *center,
            FeatureGeometry::Line(points) | FeatureGeometry::Polygon(points) => {
                let n = points.len().max(1) as f32;
                let (lat, long) = points
                    .iter()
                    .fold((0.0, 0.0), |acc, c| (acc.0 + c.lat, acc.1 + c.long));
                Coord::new(lat / n, long / n)
            }
        }
    }
}

/// One shape in the vector layer, with its formatted measurement.
#[derive(Debug, Clone)]
pub struct DrawnFeature {
    pub id: Uuid,
    pub geometry: FeatureGeometry,
    pub label: Option<String>,
}

impl DrawnFeature {
    pub fn new(geometry: FeatureGeometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            label: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_center_drag_preserves_radius() {
        let mut geometry = FeatureGeometry::Circle {
            center: Coord::new(10.0, 10.0),
            edge: Coord::new(10.0, 10.5),
        };
        geometry.set_vertex(0, Coord::new(11.0, 12.0));
        let FeatureGeometry::Circle { center, edge } = geometry else {
            unreachable!();
        };
        assert_eq!(center, Coord::new(11.0, 12.0));
        assert_eq!(edge, Coord::new(11.0, 12.5));
    }

    #[test]
    fn line_vertex_moves() {
        let mut geometry =
            FeatureGeometry::Line(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)]);
        geometry.set_vertex(1, Coord::new(2.0, 2.0));
        assert_eq!(geometry.vertices()[1], Coord::new(2.0, 2.0));
    }

    #[test]
    fn out_of_range_vertex_is_ignored() {
        let mut geometry = FeatureGeometry::Line(vec![Coord::new(0.0, 0.0)]);
        let before = geometry.clone();
        geometry.set_vertex(7, Coord::new(9.0, 9.0));
        assert_eq!(geometry, before);
    }
}
