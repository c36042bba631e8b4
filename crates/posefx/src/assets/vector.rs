//! Vector art delivered by the host as JSON: a list of filled paths, each with
//! a `#rrggbb` fill and one or more closed sub-paths. Sub-paths of the same
//! path are filled even-odd, so inner rings cut holes.
//!
//! ```json
//! { "paths": [ { "fill": "#f4a6c8", "subpaths": [[[0, 0], [40, 0], [20, 60]]] } ] }
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::assets::error::AssetError;
use crate::components::material::Color;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPath {
    pub fill: String,
    pub subpaths: Vec<Vec<[f32; 2]>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorAsset {
    pub paths: Vec<VectorPath>,
}

/// One filled path, tessellated into a triangle list.
#[derive(Debug, Clone, PartialEq)]
pub struct TessellatedShape {
    pub color: Color,
    pub triangles: Vec<Vec2>,
}

impl VectorAsset {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Tessellate every path. Fails if a fill is malformed or nothing drawable remains.
    pub fn tessellate(&self) -> Result<Vec<TessellatedShape>, AssetError> {
        let mut shapes = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let color =
                Color::from_hex(&path.fill).ok_or_else(|| AssetError::InvalidColor(path.fill.clone()))?;
            let triangles = tessellate_path(path)?;
            if !triangles.is_empty() {
                shapes.push(TessellatedShape { color, triangles });
            }
        }
        if shapes.is_empty() {
            return Err(AssetError::Empty);
        }
        Ok(shapes)
    }
}

#[cfg(feature = "vectors")]
fn tessellate_path(path: &VectorPath) -> Result<Vec<Vec2>, AssetError> {
    use lyon::math::point;
    use lyon::path::{FillRule, Path};
    use lyon::tessellation::{
        BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
        VertexBuffers,
    };

    struct FillVertexCtor;

    impl FillVertexConstructor<Vec2> for FillVertexCtor {
        fn new_vertex(&mut self, vertex: FillVertex) -> Vec2 {
            Vec2::new(vertex.position().x, vertex.position().y)
        }
    }

    let mut builder = Path::builder();
    let mut outlines = 0;
    for sub in path.subpaths.iter().filter(|s| s.len() >= 3) {
        builder.begin(point(sub[0][0], sub[0][1]));
        for p in &sub[1..] {
            builder.line_to(point(p[0], p[1]));
        }
        builder.close();
        outlines += 1;
    }
    if outlines == 0 {
        return Ok(Vec::new());
    }
    let lyon_path = builder.build();

    let mut geometry: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &lyon_path,
            &FillOptions::tolerance(0.5).with_fill_rule(FillRule::EvenOdd),
            &mut BuffersBuilder::new(&mut geometry, FillVertexCtor),
        )
        .map_err(|e| AssetError::Tessellation(format!("{e:?}")))?;

    Ok(geometry
        .indices
        .iter()
        .map(|idx| geometry.vertices[*idx as usize])
        .collect())
}

#[cfg(not(feature = "vectors"))]
fn tessellate_path(_path: &VectorPath) -> Result<Vec<Vec2>, AssetError> {
    Err(AssetError::Tessellation(
        "built without the `vectors` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_AND_SQUARE: &str = r##"{ "paths": [
        { "fill": "#ff0000", "subpaths": [[[0, 0], [100, 0], [50, 100]]] },
        { "fill": "#0000ff", "subpaths": [[[200, 0], [300, 0], [300, 100], [200, 100]]] }
    ] }"##;

    #[cfg(feature = "vectors")]
    #[test]
    fn tessellate_triangle_and_square() {
        let asset = VectorAsset::from_json(TRIANGLE_AND_SQUARE).unwrap();
        let shapes = asset.tessellate().unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].triangles.len(), 3);
        assert_eq!(shapes[1].triangles.len(), 6);
        assert_eq!(shapes[0].color, Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn bad_fill_is_rejected() {
        let json = r##"{ "paths": [ { "fill": "pink", "subpaths": [[[0, 0], [1, 0], [0, 1]]] } ] }"##;
        let asset = VectorAsset::from_json(json).unwrap();
        assert!(matches!(asset.tessellate(), Err(AssetError::InvalidColor(_))));
    }

    #[cfg(feature = "vectors")]
    #[test]
    fn degenerate_asset_is_empty() {
        let json = r##"{ "paths": [ { "fill": "#ffffff", "subpaths": [[[0, 0], [1, 1]]] } ] }"##;
        let asset = VectorAsset::from_json(json).unwrap();
        assert!(matches!(asset.tessellate(), Err(AssetError::Empty)));
        assert!(matches!(VectorAsset::default().tessellate(), Err(AssetError::Empty)));
    }
}
