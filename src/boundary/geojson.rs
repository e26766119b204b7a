use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::warn;
use serde_json::{Map, Value};

use super::{BoundaryDataset, BoundaryFeature, BoundaryLayer, DataLoadError};

/// Parse a `GeoJSON` `FeatureCollection` into a dataset. Features without a polygonal geometry
/// are skipped with a warning, the collection itself must be well formed.
pub fn parse_feature_collection(
  layer: BoundaryLayer,
  data: &[u8],
) -> Result<BoundaryDataset, DataLoadError> {
  let value: Value = serde_json::from_slice(data).map_err(|source| DataLoadError::Json {
    layer: layer.to_string(),
    source,
  })?;

  let not_a_collection = |reason: &str| DataLoadError::NotAFeatureCollection {
    layer: layer.to_string(),
    reason: reason.to_string(),
  };

  let Value::Object(obj) = &value else {
    return Err(not_a_collection("GeoJSON must be an object"));
  };
  match obj.get("type").and_then(Value::as_str) {
    Some("FeatureCollection") => {}
    Some(other) => return Err(not_a_collection(&format!("unexpected type {other}"))),
    None => return Err(not_a_collection("missing 'type' field")),
  }
  let features = obj
    .get("features")
    .and_then(Value::as_array)
    .ok_or_else(|| not_a_collection("missing 'features' array"))?;

  let features = features
    .iter()
    .enumerate()
    .filter_map(|(idx, feature)| match parse_feature(feature) {
      Ok(feature) => Some(feature),
      Err(e) => {
        warn!("Skipping {layer} feature {idx}: {e}");
        None
      }
    })
    .collect();

  Ok(BoundaryDataset::new(layer, features))
}

fn parse_feature(feature: &Value) -> Result<BoundaryFeature, String> {
  let obj = feature.as_object().ok_or("Feature must be an object")?;
  let properties = match obj.get("properties") {
    Some(Value::Object(properties)) => properties.clone(),
    _ => Map::new(),
  };
  let geometry = obj
    .get("geometry")
    .filter(|g| !g.is_null())
    .ok_or("Feature has no geometry")?;
  let geometry = parse_geometry(geometry)?;
  Ok(BoundaryFeature::new(geometry, properties))
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>, String> {
  let obj = geometry.as_object().ok_or("Geometry must be an object")?;
  let geom_type = obj
    .get("type")
    .and_then(Value::as_str)
    .ok_or("Geometry has no type")?;
  let coordinates = obj.get("coordinates").ok_or("Geometry has no coordinates")?;

  match geom_type {
    "Polygon" => Ok(MultiPolygon(vec![parse_polygon(coordinates)?])),
    "MultiPolygon" => coordinates
      .as_array()
      .ok_or("MultiPolygon coordinates must be an array")?
      .iter()
      .map(parse_polygon)
      .collect::<Result<Vec<_>, _>>()
      .map(MultiPolygon),
    other => Err(format!("unsupported geometry type {other}")),
  }
}

/// The first ring is the exterior, all further rings are holes.
fn parse_polygon(rings: &Value) -> Result<Polygon<f64>, String> {
  let mut rings = rings
    .as_array()
    .ok_or("Polygon rings must be an array")?
    .iter()
    .map(parse_ring);
  let exterior = rings.next().ok_or("Polygon has no exterior ring")??;
  let interiors = rings.collect::<Result<Vec<_>, _>>()?;
  Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>, String> {
  let coords = ring
    .as_array()
    .ok_or("Ring must be an array")?
    .iter()
    .map(parse_position)
    .collect::<Option<Vec<_>>>()
    .ok_or("Ring contains an invalid position")?;
  if coords.len() < 3 {
    return Err(format!("Ring has only {} positions", coords.len()));
  }
  Ok(LineString::new(coords))
}

/// `GeoJSON` positions are `[lon, lat, ...]`.
fn parse_position(position: &Value) -> Option<Coord<f64>> {
  let array = position.as_array()?;
  let x = array.first()?.as_f64()?;
  let y = array.get(1)?.as_f64()?;
  Some(Coord { x, y })
}
