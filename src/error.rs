use thiserror::Error;

/// Top-level error type for sky map construction and lookup.
#[derive(Debug, Error, PartialEq)]
pub enum SkyMapError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Errors related to points and vectors on the unit sphere.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("vector is at a pole and no default longitude was supplied")]
    PoleAmbiguity,

    #[error("zero-length vector")]
    ZeroVector,

    #[error("invalid sky coordinate: longitude {lon}, latitude {lat} (radians)")]
    InvalidCoordinate { lon: f64, lat: f64 },
}

/// Errors raised while validating a sky map configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositiveDimension { name: &'static str, value: i64 },

    #[error("patch border must be non-negative, got {0}")]
    NegativeBorder(i64),

    #[error("{name} = {value} rad is out of range")]
    InvalidAngle { name: &'static str, value: f64 },

    #[error("unknown projection code {0:?}")]
    UnknownProjection(String),

    #[error("number of rings must be positive, got {0}")]
    InvalidRingCount(i64),

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Persisted configuration written by an incompatible schema version.
#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("version {major}.{minor} is not supported (newest readable is {max_major}.x)")]
    Unsupported {
        major: u32,
        minor: u32,
        max_major: u32,
    },
}

/// Errors from pixel/sky transforms.
#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("{code} projection is undefined at {theta} rad from its center")]
    OutOfDomain { code: &'static str, theta: f64 },

    #[error("{code} projection cannot invert radius {radius}")]
    RadiusOutOfDomain { code: &'static str, radius: f64 },
}

/// Errors raised while resolving tracts, faces or patches.
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("internal error: no tract covers the coordinate ({lon}, {lat})")]
    NoCoveringTract { lon: f64, lat: f64 },

    #[error("tract index {index} out of range (0..{count})")]
    TractIndex { index: usize, count: usize },

    #[error("face index {index} out of range (0..{count})")]
    FaceIndex { index: usize, count: usize },

    #[error("patch index ({x}, {y}) out of range ({nx} x {ny})")]
    PatchIndex {
        x: usize,
        y: usize,
        nx: usize,
        ny: usize,
    },

    #[error("coordinate is outside tract {0}")]
    OutsideTract(usize),
}

/// Convenience type alias for results using [`SkyMapError`].
pub type Result<T> = std::result::Result<T, SkyMapError>;
