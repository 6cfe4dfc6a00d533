use crate::error::Result;
use crate::geometry::Dodecahedron;
use crate::math::SkyCoord;
use crate::projection::WcsFactory;

use super::{BorderPolicy, Tessellator, TractShape};

/// Twelve tracts, one per face of a [`Dodecahedron`].
#[derive(Debug, Clone)]
pub struct DodecaTessellator {
    dodecahedron: Dodecahedron,
}

impl DodecaTessellator {
    /// Creates the tessellation; see [`Dodecahedron::new`] for the flag.
    #[must_use]
    pub fn new(with_tracts_on_poles: bool) -> Self {
        Self {
            dodecahedron: Dodecahedron::new(with_tracts_on_poles),
        }
    }

    #[must_use]
    pub fn dodecahedron(&self) -> &Dodecahedron {
        &self.dodecahedron
    }
}

impl Tessellator for DodecaTessellator {
    fn num_tracts(&self) -> usize {
        self.dodecahedron.num_faces()
    }

    fn tract_shape(&self, id: usize, _factory: &dyn WcsFactory) -> Result<TractShape> {
        let face = self.dodecahedron.face(id)?;
        let center = SkyCoord::from_vector(face.center(), Some(0.0))?;
        // a vertex on the pole takes the longitude of its face
        let vertices = face
            .vertices()
            .iter()
            .map(|v| SkyCoord::from_vector(v, Some(center.longitude())))
            .collect::<Result<Vec<_>>>()?;
        TractShape::great_circle_polygon(center, vertices)
    }

    fn find_tract_id(&self, coord: &SkyCoord) -> Option<usize> {
        self.dodecahedron.face_containing(&coord.to_vector())
    }

    fn border_policy(&self) -> BorderPolicy {
        BorderPolicy::Extend
    }
}
