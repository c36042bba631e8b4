use glam::Vec2;

/// Sprite pivot in normalized sprite space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor(pub Vec2);

impl Anchor {
    pub const CENTER: Anchor = Anchor(Vec2::new(0.5, 0.5));
    /// Pivot at the bottom edge, so scaling grows the sprite upwards.
    pub const BOTTOM: Anchor = Anchor(Vec2::new(0.5, 0.0));
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
    /// Unit quad facing the camera.
    Sprite { anchor: Anchor },
    /// Pre-tessellated triangle list (every 3 points form a triangle).
    Shape { triangles: Vec<Vec2> },
}

impl Geometry {
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Geometry::Sphere {
            radius,
            width_segments,
            height_segments,
        }
    }

    pub fn plane(width: f32, height: f32) -> Self {
        Geometry::Plane { width, height }
    }

    pub fn sprite(anchor: Anchor) -> Self {
        Geometry::Sprite { anchor }
    }

    /// Unscaled extent in local units.
    pub fn size(&self) -> Vec2 {
        match self {
            Geometry::Sphere { radius, .. } => Vec2::splat(radius * 2.0),
            Geometry::Plane { width, height } => Vec2::new(*width, *height),
            Geometry::Sprite { .. } => Vec2::ONE,
            Geometry::Shape { triangles } => bounds(triangles)
                .map(|(min, max)| max - min)
                .unwrap_or(Vec2::ZERO),
        }
    }
}

/// Axis-aligned bounds of a point set.
pub fn bounds(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
    )
}
