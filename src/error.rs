use std::fmt;

/// Reasons a render call produced nothing.
///
/// None of these are fatal. Front-ends turn them into a zeroed
/// [`RenderResult`](crate::synth::control::RenderResult) so the audio
/// thread simply outputs silence for the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    /// `Workspace::prepare` has not been called (or capacity changed since).
    WorkspaceNotPrepared,
    /// No mesh bound and no substitute interpolator installed.
    MissingMesh,
    /// The output buffer has no room for a single sample.
    EmptyOutput,
    /// A request field is out of range or not finite.
    InvalidRequest,
    /// Axis bounds are empty, inverted or not finite.
    InvalidBounds,
    /// Nothing survived interpolation and validation.
    NoIntercepts,
    /// Curve building needs at least two intercepts.
    TooFewIntercepts,
    /// A workspace buffer is too small for this mesh.
    CapacityExceeded,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::WorkspaceNotPrepared => write!(f, "workspace is not prepared"),
            RenderError::MissingMesh => write!(f, "no mesh bound to the rasterizer"),
            RenderError::EmptyOutput => write!(f, "output buffer is empty"),
            RenderError::InvalidRequest => write!(f, "render request is invalid"),
            RenderError::InvalidBounds => write!(f, "axis bounds are invalid"),
            RenderError::NoIntercepts => write!(f, "no intercepts at this morph position"),
            RenderError::TooFewIntercepts => write!(f, "at least two intercepts are required"),
            RenderError::CapacityExceeded => write!(f, "workspace capacity exceeded"),
        }
    }
}

impl std::error::Error for RenderError {}
