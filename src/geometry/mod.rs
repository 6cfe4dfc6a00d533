pub mod dodecahedron;
pub mod pixel_box;

pub use dodecahedron::{Dodecahedron, Face, FACE_TIE_TOLERANCE};
pub use pixel_box::{Bounds2, PixelBox};
