//! Fetches and decodes the country outlines drawn on the globe. The
//! source is a TopoJSON topology (the world-atlas 110m countries
//! file); only the subset of the format that file uses is understood.
//!
//! Boundaries are decoration. Every failure mode, from the network to
//! a malformed document, degrades to "no boundaries" with a warning
//! rather than an error.

use heliodon_api::{Error, Result};
use serde_json::{Map, Value};
use tracing::{info, warn};

pub const DEFAULT_URL: &str =
    "https://cdn.jsdelivr.net/npm/world-atlas@3/countries-110m.json";

/// One country's outline. `rings` holds closed rings of (longitude,
/// latitude) pairs in degrees, exterior and interior rings mixed, one
/// entry per ring across all the country's polygons.

#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub rings: Vec<Vec<(f64, f64)>>,
    pub properties: Map<String, Value>,
}

// The quantization transform of the topology, when present. Quantized
// arcs hold integer deltas which scale/translate back to degrees.

struct Transform {
    scale: (f64, f64),
    translate: (f64, f64),
}

fn get_pair(v: &Value) -> Option<(f64, f64)> {
    let arr = v.as_array()?;

    match (arr.first()?.as_f64(), arr.get(1)?.as_f64()) {
        (Some(x), Some(y)) => Some((x, y)),
        _ => None,
    }
}

fn get_transform(doc: &Value) -> Result<Option<Transform>> {
    match doc.get("transform") {
        None => Ok(None),
        Some(t) => {
            let scale = t
                .get("scale")
                .and_then(get_pair)
                .ok_or_else(|| bad("transform has no scale"))?;
            let translate = t
                .get("translate")
                .and_then(get_pair)
                .ok_or_else(|| bad("transform has no translate"))?;

            Ok(Some(Transform { scale, translate }))
        }
    }
}

fn bad(detail: &str) -> Error {
    Error::ParseError(format!("bad topology -- {}", detail))
}

// Decodes the shared arc table. Quantized arcs are cumulative sums of
// integer deltas; unquantized arcs are absolute positions.

fn decode_arcs(
    doc: &Value,
    transform: &Option<Transform>,
) -> Result<Vec<Vec<(f64, f64)>>> {
    let raw = doc
        .get("arcs")
        .and_then(Value::as_array)
        .ok_or_else(|| bad("no arcs"))?;
    let mut arcs = Vec::with_capacity(raw.len());

    for arc in raw {
        let arc =
            arc.as_array().ok_or_else(|| bad("arc isn't an array"))?;
        let mut points = Vec::with_capacity(arc.len());
        let mut acc = (0.0, 0.0);

        for p in arc {
            let (x, y) =
                get_pair(p).ok_or_else(|| bad("bad arc point"))?;

            match transform {
                Some(t) => {
                    acc.0 += x;
                    acc.1 += y;
                    points.push((
                        acc.0 * t.scale.0 + t.translate.0,
                        acc.1 * t.scale.1 + t.translate.1,
                    ));
                }
                None => points.push((x, y)),
            }
        }
        arcs.push(points);
    }
    Ok(arcs)
}

// Stitches arc indices into one ring. A negative index `i` means arc
// `!i` traversed backwards. Adjacent arcs share their join point, so
// every arc after the first drops its leading point.

fn assemble_ring(
    indices: &[i64],
    arcs: &[Vec<(f64, f64)>],
) -> Result<Vec<(f64, f64)>> {
    let mut ring: Vec<(f64, f64)> = vec![];

    for &ii in indices {
        let (idx, reversed) = if ii >= 0 {
            (ii as usize, false)
        } else {
            (!ii as usize, true)
        };
        let arc =
            arcs.get(idx).ok_or_else(|| bad("arc index out of range"))?;
        let skip = usize::from(!ring.is_empty());

        if reversed {
            ring.extend(arc.iter().rev().skip(skip));
        } else {
            ring.extend(arc.iter().skip(skip));
        }
    }
    Ok(ring)
}

fn ring_indices(v: &Value) -> Result<Vec<i64>> {
    v.as_array()
        .map(|arr| arr.iter().filter_map(Value::as_i64).collect())
        .ok_or_else(|| bad("ring isn't an array"))
}

fn decode_geometry(
    geom: &Value,
    arcs: &[Vec<(f64, f64)>],
) -> Result<Country> {
    let id = match geom.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let properties = geom
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let name = properties
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let geom_arcs =
        geom.get("arcs").and_then(Value::as_array).ok_or_else(|| {
            bad("geometry has no arcs")
        })?;
    let mut rings = vec![];

    match geom.get("type").and_then(Value::as_str) {
        Some("Polygon") => {
            for ring in geom_arcs {
                rings.push(assemble_ring(&ring_indices(ring)?, arcs)?);
            }
        }
        Some("MultiPolygon") => {
            for polygon in geom_arcs {
                let polygon = polygon
                    .as_array()
                    .ok_or_else(|| bad("bad polygon"))?;

                for ring in polygon {
                    rings.push(assemble_ring(
                        &ring_indices(ring)?,
                        arcs,
                    )?);
                }
            }
        }
        other => {
            return Err(bad(&format!(
                "unsupported geometry type {:?}",
                other
            )))
        }
    }

    Ok(Country {
        id,
        name,
        rings,
        properties,
    })
}

/// Decodes a TopoJSON topology into the countries it contains.

pub fn decode(doc: &Value) -> Result<Vec<Country>> {
    let transform = get_transform(doc)?;
    let arcs = decode_arcs(doc, &transform)?;
    let geometries = doc
        .pointer("/objects/countries/geometries")
        .and_then(Value::as_array)
        .ok_or_else(|| bad("no countries object"))?;

    geometries
        .iter()
        .map(|geom| decode_geometry(geom, &arcs))
        .collect()
}

async fn try_fetch(
    con: &reqwest::Client,
    url: &str,
) -> Result<Vec<Country>> {
    let doc = con
        .get(url)
        .send()
        .await
        .map_err(|e| Error::OperationError(e.to_string()))?
        .json::<Value>()
        .await
        .map_err(|e| Error::ParseError(e.to_string()))?;

    decode(&doc)
}

/// Fetches the country boundaries. Never fails; a globe without
/// outlines is better than no globe.

pub async fn fetch(con: &reqwest::Client, url: &str) -> Vec<Country> {
    match try_fetch(con, url).await {
        Ok(countries) => {
            info!("loaded {} country boundaries", countries.len());
            countries
        }
        Err(e) => {
            warn!("couldn't load country boundaries -- {}", &e);
            vec![]
        }
    }
}
