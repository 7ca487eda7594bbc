use std::sync::Arc;

use crate::{
    error::RenderError,
    graph::{InterpolationMode, Interpolator},
    mesh::MeshSource,
};

/// Where a front-end gets its intercepts from: a bound mesh, or a
/// substitute interpolator that ignores the mesh (tests, generated shapes).
#[derive(Default)]
pub(crate) struct MeshBinding {
    mesh: Option<Arc<dyn MeshSource>>,
    substitute: Option<Box<dyn Interpolator>>,
}

impl MeshBinding {
    /// Bind `mesh`. Returns true when a different mesh than before is bound.
    pub(crate) fn set_mesh(&mut self, mesh: Option<Arc<dyn MeshSource>>) -> bool {
        let changed = match (&self.mesh, &mesh) {
            (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
            (None, None) => false,
            _ => true,
        };
        self.mesh = mesh;
        changed
    }

    pub(crate) fn set_substitute(&mut self, interpolator: Option<Box<dyn Interpolator>>) {
        self.substitute = interpolator;
    }

    pub(crate) fn mesh(&self) -> Option<&dyn MeshSource> {
        self.mesh.as_deref()
    }

    pub(crate) fn has_source(&self) -> bool {
        self.mesh.is_some() || self.substitute.is_some()
    }

    /// The interpolator to run: the substitute if installed, else `mode`'s stage.
    pub(crate) fn interpolator(
        &self,
        mode: InterpolationMode,
    ) -> Result<&dyn Interpolator, RenderError> {
        if let Some(substitute) = self.substitute.as_deref() {
            return Ok(substitute);
        }
        if self.mesh.is_none() {
            return Err(RenderError::MissingMesh);
        }
        Ok(mode.stage())
    }
}
