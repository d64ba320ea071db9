//! Affine maps and whole-store coordinate rebasing
//!
//! [`Affine`] uses the column-vector convention `x' = L·x + t`. Placements
//! store their linear part transposed (see [`Placement`]), and expose it in
//! this convention through [`Placement::local`].
//!
//! [`transform_coordinates`] rebases a [`ModelStore`] into another frame:
//! every placement transform `P` becomes `A ∘ P ∘ A⁻¹` and every stored
//! element point `x` becomes `A·x`, where `A` is the given affine map
//! followed by a uniform scale. Because both rules are conjugation and
//! application of the same map, rebasing by `A1` then `A2` equals rebasing
//! once by `A2 ∘ A1`.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::{Error, Result};
use crate::model::{ModelStore, Placement};

/// Determinants below this magnitude are treated as singular
const SINGULAR_EPSILON: f64 = 1e-12;

/// An affine map `x' = linear · x + translation`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Linear part (rotation, scale, shear)
    pub linear: Matrix3<f64>,
    /// Translation part
    pub translation: Vector3<f64>,
}

impl Affine {
    /// Create an affine map from its parts
    pub fn new(linear: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            linear,
            translation,
        }
    }

    /// The identity map
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// A pure translation
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(Matrix3::identity(), Vector3::new(x, y, z))
    }

    /// A uniform scale about the origin
    pub fn uniform_scale(scale: f64) -> Self {
        Self::new(Matrix3::identity() * scale, Vector3::zeros())
    }

    /// Map a point
    pub fn apply_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.linear * point.coords + self.translation)
    }

    /// Map a direction (translation ignored)
    pub fn apply_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.linear * vector
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Affine) -> Affine {
        Affine::new(
            self.linear * other.linear,
            self.linear * other.translation + self.translation,
        )
    }

    /// `other ∘ self`: apply `self` first, then `other`
    pub fn then(&self, other: &Affine) -> Affine {
        other.compose(self)
    }

    /// Follow this map with a uniform scale
    pub fn scaled(&self, scale: f64) -> Affine {
        Affine::new(self.linear * scale, self.translation * scale)
    }

    /// Inverse map, failing when the linear part is singular
    pub fn inverse(&self) -> Result<Affine> {
        let det = self.linear.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return Err(Error::SingularTransform(format!(
                "linear part has determinant {}",
                det
            )));
        }
        let inv = self.linear.try_inverse().ok_or_else(|| {
            Error::SingularTransform("linear part could not be inverted".to_string())
        })?;
        Ok(Affine::new(inv, -(inv * self.translation)))
    }

    /// `self ∘ other ∘ self⁻¹`, given the precomputed inverse
    pub fn conjugate(&self, other: &Affine, inverse: &Affine) -> Affine {
        self.compose(other).compose(inverse)
    }

    /// Component-wise comparison within `epsilon`
    pub fn approx_eq(&self, other: &Affine, epsilon: f64) -> bool {
        (self.linear - other.linear).amax() <= epsilon
            && (self.translation - other.translation).amax() <= epsilon
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

fn rebase_placement(placement: &mut Placement, map: &Affine, inverse: &Affine) {
    let local = map.conjugate(&placement.local(), inverse);
    placement.set_local(&local);
}

/// Rebase every placement and stored element of `store` under `affine`
/// followed by a uniform `scale`
///
/// Geometry already folded into parents by
/// [`populate_geometry`](crate::compose::populate_geometry) is transformed as
/// stored and is not re-derived, so composition must have happened in one
/// consistent frame before this call.
pub fn transform_coordinates(store: &mut ModelStore, affine: &Affine, scale: f64) -> Result<()> {
    let map = affine.scaled(scale);
    let inverse = map.inverse()?;

    let mut placements = 0usize;
    for plan in store.models.values_mut() {
        for step in &mut plan.steps {
            for placement in &mut step.placements {
                rebase_placement(placement, &map, &inverse);
                placements += 1;
            }
        }
    }

    let mut elements = 0usize;
    for part in store.parts.values_mut().chain(store.nested_parts.values_mut()) {
        for placement in &mut part.nested {
            rebase_placement(placement, &map, &inverse);
            placements += 1;
        }
        part.map_points(|p| map.apply_point(p));
        elements += part.element_count();
    }

    tracing::debug!(placements, elements, scale, "Rebased model store coordinates");
    Ok(())
}
