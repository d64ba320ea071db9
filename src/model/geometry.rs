//! Part geometry: color-tagged primitives and nested placements

use nalgebra::Point3;

use super::core::{ColorCode, Placement};

/// A color-tagged primitive with `N` points
#[derive(Debug, Clone, PartialEq)]
pub struct Element<const N: usize> {
    /// Color code the primitive is drawn with
    pub color: ColorCode,
    /// Points in the owning part's local frame
    pub points: [Point3<f64>; N],
}

impl<const N: usize> Element<N> {
    /// Create a new element
    pub fn new(color: ColorCode, points: [Point3<f64>; N]) -> Self {
        Self { color, points }
    }

    /// Return a copy with every point mapped through `f`
    pub fn map_points(&self, f: impl Fn(&Point3<f64>) -> Point3<f64>) -> Self {
        Self {
            color: self.color,
            points: self.points.map(|p| f(&p)),
        }
    }
}

/// A line segment (command code 2)
pub type Segment = Element<2>;

/// A triangle (command code 3)
pub type Triangle = Element<3>;

/// A quadrilateral (command code 4)
pub type Quad = Element<4>;

/// An optional line (command code 5)
///
/// `points[0..2]` are the line end points, `points[2..4]` the control points
/// that decide whether the line is drawn.
pub type OptionalLine = Element<4>;

/// An axis-aligned bounding box as (min corner, max corner)
pub type BoundingBox = (Point3<f64>, Point3<f64>);

/// Geometry of a part, possibly composed of nested parts
#[derive(Debug, Clone, PartialEq)]
pub struct PartGeometry {
    /// Part name as referenced by placements
    pub name: String,
    /// Line segments
    pub segments: Vec<Segment>,
    /// Triangles
    pub triangles: Vec<Triangle>,
    /// Quadrilaterals
    pub quads: Vec<Quad>,
    /// Optional lines
    pub optional_lines: Vec<OptionalLine>,
    /// Placements of other parts inside this one
    pub nested: Vec<Placement>,
    /// Whether a definition of this part (embedded or loaded) has been parsed
    pub defined: bool,
    populated: bool,
}

impl PartGeometry {
    /// Create an empty, undefined, unpopulated part
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
            triangles: Vec::new(),
            quads: Vec::new(),
            optional_lines: Vec::new(),
            nested: Vec::new(),
            defined: false,
            populated: false,
        }
    }

    /// Whether nested geometry has been folded into this part
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub(crate) fn mark_populated(&mut self) {
        self.populated = true;
    }

    /// Total number of stored elements across all four collections
    pub fn element_count(&self) -> usize {
        self.segments.len() + self.triangles.len() + self.quads.len() + self.optional_lines.len()
    }

    /// True when the part holds no elements and no nested placements
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0 && self.nested.is_empty()
    }

    /// Append copies of `child`'s elements mapped through `f`
    pub fn extend_mapped(
        &mut self,
        child: &PartGeometry,
        f: impl Fn(&Point3<f64>) -> Point3<f64>,
    ) {
        self.segments
            .extend(child.segments.iter().map(|e| e.map_points(&f)));
        self.triangles
            .extend(child.triangles.iter().map(|e| e.map_points(&f)));
        self.quads.extend(child.quads.iter().map(|e| e.map_points(&f)));
        self.optional_lines
            .extend(child.optional_lines.iter().map(|e| e.map_points(&f)));
    }

    /// Move every element of `other` into this part
    pub(crate) fn absorb(&mut self, other: PartGeometry) {
        self.segments.extend(other.segments);
        self.triangles.extend(other.triangles);
        self.quads.extend(other.quads);
        self.optional_lines.extend(other.optional_lines);
    }

    /// Map every stored element point in place
    pub fn map_points(&mut self, f: impl Fn(&Point3<f64>) -> Point3<f64>) {
        for e in &mut self.segments {
            *e = e.map_points(&f);
        }
        for e in &mut self.triangles {
            *e = e.map_points(&f);
        }
        for e in &mut self.quads {
            *e = e.map_points(&f);
        }
        for e in &mut self.optional_lines {
            *e = e.map_points(&f);
        }
    }

    /// Bounding box over every element point, `None` for a part with no elements
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut points = self
            .segments
            .iter()
            .flat_map(|e| e.points.iter())
            .chain(self.triangles.iter().flat_map(|e| e.points.iter()))
            .chain(self.quads.iter().flat_map(|e| e.points.iter()))
            .chain(self.optional_lines.iter().flat_map(|e| e.points[..2].iter()));

        let first = *points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        });
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            4,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_new_part_is_empty() {
        let part = PartGeometry::new("3001.dat");
        assert!(part.is_empty());
        assert!(!part.is_populated());
        assert!(!part.defined);
        assert!(part.bounding_box().is_none());
    }

    #[test]
    fn test_element_map_points_keeps_color() {
        let moved = unit_triangle().map_points(|p| p + nalgebra::Vector3::new(0.0, 0.0, 5.0));
        assert_eq!(moved.color, 4);
        assert_eq!(moved.points[2], Point3::new(0.0, 1.0, 5.0));
    }

    #[test]
    fn test_bounding_box() {
        let mut part = PartGeometry::new("brick.dat");
        part.triangles.push(unit_triangle());
        part.segments.push(Segment::new(
            24,
            [Point3::new(-2.0, 0.0, 0.0), Point3::new(0.0, 0.0, 3.0)],
        ));
        let (min, max) = part.bounding_box().unwrap();
        assert_eq!(min, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn test_bounding_box_ignores_control_points() {
        let mut part = PartGeometry::new("cyl.dat");
        part.optional_lines.push(OptionalLine::new(
            24,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(100.0, 0.0, 0.0),
                Point3::new(-100.0, 0.0, 0.0),
            ],
        ));
        let (min, max) = part.bounding_box().unwrap();
        assert_eq!(min.x, 0.0);
        assert_eq!(max.x, 1.0);
    }

    #[test]
    fn test_extend_mapped_counts() {
        let mut child = PartGeometry::new("child.dat");
        child.triangles.push(unit_triangle());
        child.quads.push(Quad::new(
            1,
            [Point3::origin(), Point3::origin(), Point3::origin(), Point3::origin()],
        ));
        let mut parent = PartGeometry::new("parent.dat");
        parent.extend_mapped(&child, |p| *p);
        parent.extend_mapped(&child, |p| *p);
        assert_eq!(parent.triangles.len(), 2);
        assert_eq!(parent.quads.len(), 2);
        assert_eq!(parent.element_count(), 4);
    }
}
