//! Geometry helpers shared by the overlay resolver and the territory resolver.
//!
//! Geometries travel through the API and the database as GeoJSON
//! (`serde_json::Value`). Spatial predicates and clipping run on `geo` types.

use geo::{
    BooleanOps, Geometry, GeometryCollection, HasDimensions, Intersects, MultiLineString, MultiPoint,
    MultiPolygon,
};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// GeoJSON conversion
// ---------------------------------------------------------------------------

/// Parse a GeoJSON geometry object into a `geo` geometry.
pub fn geometry_from_geojson(value: &serde_json::Value) -> Result<Geometry<f64>, CoreError> {
    let geometry = geojson::Geometry::from_json_value(value.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid GeoJSON geometry: {e}")))?;
    Geometry::<f64>::try_from(geometry)
        .map_err(|e| CoreError::Validation(format!("Unsupported GeoJSON geometry: {e}")))
}

/// Serialize a `geo` geometry back into a GeoJSON geometry object.
pub fn geometry_to_geojson(geometry: &Geometry<f64>) -> serde_json::Value {
    let geometry = geojson::Geometry::new(geojson::Value::from(geometry));
    serde_json::Value::Object(geojson::JsonObject::from(&geometry))
}

/// Extract the polygonal part of a geometry.
///
/// Returns `None` for geometries with no area (points, lines) and for
/// collections that contain no polygons.
pub fn as_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .iter()
                .filter_map(as_multi_polygon)
                .flat_map(|mp| mp.0)
                .collect();
            if polygons.is_empty() {
                None
            } else {
                Some(MultiPolygon::new(polygons))
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Territory shape
// ---------------------------------------------------------------------------

/// A project territory: the polygonal area every inherited object is
/// checked against.
#[derive(Debug, Clone)]
pub struct TerritoryShape {
    geometry: Geometry<f64>,
    polygons: MultiPolygon<f64>,
}

impl TerritoryShape {
    /// Build from a `geo` geometry. Non-polygonal geometries are rejected.
    pub fn new(geometry: Geometry<f64>) -> Result<Self, CoreError> {
        let polygons = as_multi_polygon(&geometry).ok_or_else(|| {
            CoreError::Validation("Territory geometry must be a Polygon or MultiPolygon".into())
        })?;
        Ok(Self {
            geometry: Geometry::MultiPolygon(polygons.clone()),
            polygons,
        })
    }

    /// Build from a GeoJSON geometry object.
    pub fn from_geojson(value: &serde_json::Value) -> Result<Self, CoreError> {
        Self::new(geometry_from_geojson(value)?)
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    /// True when `geometry` shares at least one point with the territory.
    pub fn intersects(&self, geometry: &Geometry<f64>) -> bool {
        geometry.intersects(&self.geometry)
    }

    /// Clip `geometry` to the territory.
    ///
    /// Returns `None` when the two do not intersect. Polygons are intersected,
    /// lines are clipped, points outside the territory are dropped. A geometry
    /// that only touches the boundary clips to nothing and is returned whole.
    pub fn clip(&self, geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
        if !self.intersects(geometry) {
            return None;
        }
        let clipped = self.clip_intersecting(geometry);
        if clipped.is_empty() {
            Some(geometry.clone())
        } else {
            Some(clipped)
        }
    }

    fn clip_intersecting(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        match geometry {
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => match as_multi_polygon(geometry) {
                Some(mp) => Geometry::MultiPolygon(mp.intersection(&self.polygons)),
                None => geometry.clone(),
            },
            Geometry::Line(line) => {
                let lines = MultiLineString::new(vec![(*line).into()]);
                Geometry::MultiLineString(self.polygons.clip(&lines, false))
            }
            Geometry::LineString(ls) => {
                let lines = MultiLineString::new(vec![ls.clone()]);
                Geometry::MultiLineString(self.polygons.clip(&lines, false))
            }
            Geometry::MultiLineString(mls) => {
                Geometry::MultiLineString(self.polygons.clip(mls, false))
            }
            Geometry::MultiPoint(mp) => {
                let inside: Vec<_> = mp
                    .iter()
                    .filter(|p| Geometry::Point(**p).intersects(&self.geometry))
                    .copied()
                    .collect();
                Geometry::MultiPoint(MultiPoint::new(inside))
            }
            Geometry::GeometryCollection(gc) => {
                let parts: Vec<_> = gc.iter().filter_map(|g| self.clip(g)).collect();
                Geometry::GeometryCollection(GeometryCollection::new_from(parts))
            }
            Geometry::Point(_) => geometry.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Unions
// ---------------------------------------------------------------------------

/// Union the polygonal parts of `geometries` into a single multipolygon.
///
/// Non-polygonal inputs are ignored. Returns `None` when nothing polygonal
/// was supplied.
pub fn union_polygons<'a, I>(geometries: I) -> Option<MultiPolygon<f64>>
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    geometries
        .into_iter()
        .filter_map(as_multi_polygon)
        .reduce(|acc, next| acc.union(&next))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
