use crate::error::{LookupError, Result};
use crate::math::{Matrix3, Vector3};

/// Dot products within this distance of the best match count as a tie.
pub const FACE_TIE_TOLERANCE: f64 = 1e-12;

const NUM_FACES: usize = 12;
const NUM_VERTICES: usize = 20;
const VERTICES_PER_FACE: usize = 5;

/// One face of the dodecahedron, projected onto the unit sphere.
#[derive(Debug, Clone)]
pub struct Face {
    id: usize,
    center: Vector3,
    vertices: [Vector3; VERTICES_PER_FACE],
}

impl Face {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Unit vector at the face center.
    #[must_use]
    pub fn center(&self) -> &Vector3 {
        &self.center
    }

    /// Face corners, counter-clockwise seen from outside the sphere.
    #[must_use]
    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }
}

/// A regular dodecahedron inscribed in the unit sphere.
///
/// Face centers are the sign permutations of `(0, 1, phi)`, `(1, phi, 0)` and
/// `(phi, 0, 1)`, numbered in that order; vertices are the sign permutations
/// of `(1, 1, 1)`, `(0, phi, 1/phi)`, `(1/phi, 0, phi)` and `(phi, 1/phi, 0)`.
/// The solid is then rotated about the x axis so that either face 0 or the
/// vertex `(0, phi, 1/phi)` lands on the north pole. Face numbering is part of
/// the persisted tract numbering and must not change.
#[derive(Debug, Clone)]
pub struct Dodecahedron {
    faces_on_poles: bool,
    faces: Vec<Face>,
}

impl Dodecahedron {
    /// Builds the dodecahedron.
    ///
    /// # Arguments
    ///
    /// * `faces_on_poles` - If `true`, a face is centered on each pole;
    ///   otherwise a vertex sits on each pole.
    #[must_use]
    pub fn new(faces_on_poles: bool) -> Self {
        let phi = 0.5 * (1.0 + 5f64.sqrt());

        let unrot_faces = sign_permutations(&[
            Vector3::new(0.0, 1.0, phi),
            Vector3::new(1.0, phi, 0.0),
            Vector3::new(phi, 0.0, 1.0),
        ]);
        let unrot_vertices = sign_permutations(&[
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, phi, 1.0 / phi),
            Vector3::new(1.0 / phi, 0.0, phi),
            Vector3::new(phi, 1.0 / phi, 0.0),
        ]);
        debug_assert_eq!(unrot_faces.len(), NUM_FACES);
        debug_assert_eq!(unrot_vertices.len(), NUM_VERTICES);

        // the chosen pole vector has x == 0, so a rotation about x lifts it onto +z
        let angle = if faces_on_poles {
            1f64.atan2(phi)
        } else {
            phi.atan2(1.0 / phi)
        };
        let rotation = rotation_about_x(angle);

        let vertices: Vec<Vector3> = unrot_vertices.iter().map(|v| rotation * v).collect();
        let faces = unrot_faces
            .iter()
            .enumerate()
            .map(|(id, unrot)| {
                let center = rotation * unrot;
                let ring = face_ring(&center, &vertices);
                Face {
                    id,
                    center,
                    vertices: ring,
                }
            })
            .collect();

        Self {
            faces_on_poles,
            faces,
        }
    }

    /// Returns `true` if faces (rather than vertices) are centered on the poles.
    #[must_use]
    pub fn faces_on_poles(&self) -> bool {
        self.faces_on_poles
    }

    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Returns the face with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::FaceIndex`] if `id` is out of range.
    pub fn face(&self, id: usize) -> Result<&Face> {
        self.faces.get(id).ok_or_else(|| {
            LookupError::FaceIndex {
                index: id,
                count: self.faces.len(),
            }
            .into()
        })
    }

    /// Unit vector at the center of face `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::FaceIndex`] if `id` is out of range.
    pub fn face_center(&self, id: usize) -> Result<Vector3> {
        Ok(self.face(id)?.center)
    }

    /// Ordered corners of face `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::FaceIndex`] if `id` is out of range.
    pub fn face_vertices(&self, id: usize) -> Result<&[Vector3]> {
        Ok(self.face(id)?.vertices())
    }

    /// Returns the id of the face whose center is nearest to `vec`.
    ///
    /// Near-ties (for example at a shared vertex) resolve to the lowest id.
    /// `vec` need not be normalized. Returns `None` only for non-finite input.
    #[must_use]
    pub fn face_containing(&self, vec: &Vector3) -> Option<usize> {
        let dots: Vec<f64> = self.faces.iter().map(|f| f.center.dot(vec)).collect();
        let best = dots
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if !best.is_finite() {
            return None;
        }
        let threshold = best - FACE_TIE_TOLERANCE * vec.norm();
        dots.iter().position(|&d| d >= threshold)
    }
}

/// Every sign combination of the non-zero components, normalized.
fn sign_permutations(bases: &[Vector3]) -> Vec<Vector3> {
    let mut out = Vec::new();
    for base in bases {
        let choices = |c: f64| if c == 0.0 { vec![0.0] } else { vec![c, -c] };
        for &x in &choices(base.x) {
            for &y in &choices(base.y) {
                for &z in &choices(base.z) {
                    out.push(Vector3::new(x, y, z).normalize());
                }
            }
        }
    }
    out
}

fn rotation_about_x(angle: f64) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
}

/// The five vertices nearest `center`, sorted by position angle about it.
fn face_ring(center: &Vector3, vertices: &[Vector3]) -> [Vector3; VERTICES_PER_FACE] {
    let mut nearest: Vec<&Vector3> = vertices.iter().collect();
    nearest.sort_by(|a, b| b.dot(center).total_cmp(&a.dot(center)));
    nearest.truncate(VERTICES_PER_FACE);

    // any direction not parallel to the center works as a reference
    let reference = if center.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = center.cross(&reference).normalize();
    let w = center.cross(&u);
    let position_angle = |v: &Vector3| v.dot(&w).atan2(v.dot(&u));
    nearest.sort_by(|a, b| position_angle(a).total_cmp(&position_angle(b)));

    let mut ring = [Vector3::zeros(); VERTICES_PER_FACE];
    for (slot, v) in ring.iter_mut().zip(nearest) {
        *slot = *v;
    }
    ring
}
