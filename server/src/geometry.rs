use tricker_shared::config::{ConfigError, GameConfig};
use tricker_shared::protocol::ObjectKind;

/// Anything drawn on the field: the background, a ring or a player body.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryObject {
    pub kind: ObjectKind,
    pub pos: [f64; 2],
    pub dim: [f64; 2],
    pub radius: f64,
    /// Set while a player body overlaps a ring. Display only.
    pub inside: bool,
}

impl GeometryObject {
    pub fn background(field: [f64; 2]) -> Self {
        Self {
            kind: ObjectKind::Background,
            pos: [0.0, 0.0],
            dim: field,
            radius: 0.0,
            inside: false,
        }
    }

    pub fn ring(pos: [f64; 2], radius: f64) -> Self {
        Self {
            kind: ObjectKind::Ring,
            pos,
            dim: [0.0, 0.0],
            radius,
            inside: false,
        }
    }

    pub fn player_body() -> Self {
        Self {
            kind: ObjectKind::Player,
            pos: [0.0, 0.0],
            dim: [10.0, 10.0],
            radius: 0.0,
            inside: false,
        }
    }

    /// True if the center of `other` lies within this object's radius.
    pub fn is_inside(&self, other: &GeometryObject) -> bool {
        distance(self.pos, other.pos) <= self.radius
    }
}

pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

/// Ring placement for a field. Three rings use the classic triangle; any
/// other count is spread evenly on a circle around the field center.
pub fn ring_layout(config: &GameConfig) -> Vec<GeometryObject> {
    let [w, h] = config.field;
    let r = config.ring_radius;

    if config.num_of_rings == 3 {
        return vec![
            GeometryObject::ring([w / 2.0, h / 4.0 - 20.0], r),
            GeometryObject::ring([w / 4.0, h * 3.0 / 4.0 - 50.0], r),
            GeometryObject::ring([w * 3.0 / 4.0, h * 3.0 / 4.0 - 50.0], r),
        ];
    }

    let n = config.num_of_rings;
    let center = [w / 2.0, h / 2.0];
    let orbit = w.min(h) / 2.0 - r * 1.5;
    (0..n)
        .map(|i| {
            // Start at the top and go clockwise
            let angle = -std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * i as f64 / n as f64;
            GeometryObject::ring(
                [
                    center[0] + orbit * angle.cos(),
                    center[1] + orbit * angle.sin(),
                ],
                r,
            )
        })
        .collect()
}

/// Rings must be disjoint and on the field, otherwise scoring locations
/// become ambiguous.
pub fn validate_layout(config: &GameConfig) -> Result<(), ConfigError> {
    let rings = ring_layout(config);
    let [w, h] = config.field;

    for (i, ring) in rings.iter().enumerate() {
        let [x, y] = ring.pos;
        if x - ring.radius < 0.0 || y - ring.radius < 0.0 || x + ring.radius > w || y + ring.radius > h
        {
            return Err(ConfigError::RingOutsideField(i));
        }
        for (j, other) in rings.iter().enumerate().skip(i + 1) {
            if distance(ring.pos, other.pos) <= ring.radius + other.radius {
                return Err(ConfigError::OverlappingRings(i, j));
            }
        }
    }
    Ok(())
}
