use crate::{
    dsp::{curvelet, CurvePiece, Intercept},
    mesh::CubeId,
};

/*
Workspace
=========

All memory a render call touches lives here, sized once by `prepare()`.
The render path only ever takes slices of these buffers; nothing grows,
shrinks or reallocates while audio is running.

    intercepts   max_intercepts     written by the interpolator/positioner
    padded       max_curves         intercepts plus synthetic padding
    curves       max_curves         one CurvePiece per padded point
    wave         4 × max_wave_points one backing Vec split into
                                     x | y | slope | diff_x
    regions      max_deform_regions breakpoint span per curve pair

`prepare()` allocates and is NOT realtime safe. Call it at setup or when
the capacity changes, from a non-audio thread. `reset()` only clears the
logical counts.
*/

/// Buffer sizes for a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySpec {
    pub max_intercepts: usize,
    pub max_curves: usize,
    pub max_wave_points: usize,
    pub max_deform_regions: usize,
}

impl CapacitySpec {
    /// Largest number of synthetic points any padding policy adds.
    pub const MAX_PADDING: usize = 6;

    /// Capacity that fits `max_intercepts` real intercepts at full resolution.
    pub fn for_intercepts(max_intercepts: usize) -> Self {
        let max_curves = max_intercepts + Self::MAX_PADDING;
        Self {
            max_intercepts,
            max_curves,
            max_wave_points: max_curves * (curvelet::RESOLUTION / 2) + 1,
            max_deform_regions: max_curves,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.max_intercepts >= 2 && self.max_curves >= 2 && self.max_wave_points >= 2
    }
}

impl Default for CapacitySpec {
    fn default() -> Self {
        Self::for_intercepts(128)
    }
}

/// Span of wave breakpoints produced between two neighbouring curve pieces.
///
/// Tagged with the cube that owns the left piece's centre intercept, so
/// editors can map a stretch of the waveform back to mesh geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeformRegion {
    pub start: usize,
    pub end: usize,
    pub cube: Option<CubeId>,
}

/// Read-only view of a flattened waveform.
#[derive(Debug, Clone, Copy)]
pub struct WaveView<'a> {
    pub x: &'a [f32],
    pub y: &'a [f32],
    pub slope: &'a [f32],
    pub diff_x: &'a [f32],
}

impl WaveView<'_> {
    pub const fn empty() -> Self {
        WaveView {
            x: &[],
            y: &[],
            slope: &[],
            diff_x: &[],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Mutable slices for the wave builder to fill.
pub struct WaveBuffersMut<'a> {
    pub x: &'a mut [f32],
    pub y: &'a mut [f32],
    pub slope: &'a mut [f32],
    pub diff_x: &'a mut [f32],
}

pub struct Workspace {
    capacity: CapacitySpec,
    prepared: bool,

    pub(crate) intercepts: Vec<Intercept>,
    pub(crate) padded: Vec<Intercept>,
    pub(crate) curves: Vec<CurvePiece>,
    pub(crate) wave: Vec<f32>,
    pub(crate) regions: Vec<DeformRegion>,

    pub(crate) num_intercepts: usize,
    pub(crate) num_curves: usize,
    pub(crate) num_wave_points: usize,
    pub(crate) num_regions: usize,
    pub(crate) zero_index: usize,
    pub(crate) one_index: usize,
}

impl Workspace {
    /// Create an unprepared workspace. Does not allocate.
    pub fn new(capacity: CapacitySpec) -> Self {
        Self {
            capacity,
            prepared: false,
            intercepts: Vec::new(),
            padded: Vec::new(),
            curves: Vec::new(),
            wave: Vec::new(),
            regions: Vec::new(),
            num_intercepts: 0,
            num_curves: 0,
            num_wave_points: 0,
            num_regions: 0,
            zero_index: 0,
            one_index: 0,
        }
    }

    /// Allocate every buffer for the current capacity. Not realtime safe.
    pub fn prepare(&mut self) -> bool {
        if self.prepared {
            return true;
        }
        if !self.capacity.is_valid() {
            log::warn!("refusing to prepare workspace with {:?}", self.capacity);
            return false;
        }

        curvelet::warm_up();

        let spec = self.capacity;
        self.intercepts = vec![Intercept::default(); spec.max_intercepts];
        self.padded = vec![Intercept::default(); spec.max_curves];
        self.curves = vec![CurvePiece::default(); spec.max_curves];
        self.wave = vec![0.0; spec.max_wave_points * 4];
        self.regions = vec![DeformRegion::default(); spec.max_deform_regions];
        self.prepared = true;
        self.reset();

        log::debug!(
            "prepared workspace: {} intercepts, {} curves, {} wave points ({} KiB)",
            spec.max_intercepts,
            spec.max_curves,
            spec.max_wave_points,
            self.allocated_bytes() / 1024
        );
        true
    }

    /// Change the capacity. The workspace must be prepared again afterwards.
    pub fn set_capacity(&mut self, capacity: CapacitySpec) {
        if capacity != self.capacity {
            self.capacity = capacity;
            self.prepared = false;
        }
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn capacity(&self) -> CapacitySpec {
        self.capacity
    }

    /// Forget the last render's contents. Keeps every allocation.
    pub fn reset(&mut self) {
        self.num_intercepts = 0;
        self.num_curves = 0;
        self.num_wave_points = 0;
        self.num_regions = 0;
        self.zero_index = 0;
        self.one_index = 0;
    }

    /// Bytes currently reserved by the buffers.
    pub fn allocated_bytes(&self) -> usize {
        use std::mem::size_of;
        self.intercepts.capacity() * size_of::<Intercept>()
            + self.padded.capacity() * size_of::<Intercept>()
            + self.curves.capacity() * size_of::<CurvePiece>()
            + self.wave.capacity() * size_of::<f32>()
            + self.regions.capacity() * size_of::<DeformRegion>()
    }

    pub fn intercepts(&self) -> &[Intercept] {
        &self.intercepts[..self.num_intercepts]
    }

    /// Intercepts plus padding, one per curve piece.
    pub fn padded(&self) -> &[Intercept] {
        &self.padded[..self.num_curves]
    }

    pub fn curves(&self) -> &[CurvePiece] {
        &self.curves[..self.num_curves]
    }

    pub fn regions(&self) -> &[DeformRegion] {
        &self.regions[..self.num_regions]
    }

    pub fn wave(&self) -> WaveView<'_> {
        let n = self.num_wave_points;
        if n == 0 {
            return WaveView::empty();
        }
        let max = self.capacity.max_wave_points;
        WaveView {
            x: &self.wave[..n],
            y: &self.wave[max..max + n],
            slope: &self.wave[2 * max..2 * max + n],
            diff_x: &self.wave[3 * max..3 * max + n],
        }
    }

    pub fn num_wave_points(&self) -> usize {
        self.num_wave_points
    }

    pub fn zero_index(&self) -> usize {
        self.zero_index
    }

    pub fn one_index(&self) -> usize {
        self.one_index
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(CapacitySpec::default())
    }
}

/// Split the wave backing store into its four arrays.
pub(crate) fn split_wave(wave: &mut [f32], max_wave_points: usize) -> WaveBuffersMut<'_> {
    let (x, rest) = wave.split_at_mut(max_wave_points);
    let (y, rest) = rest.split_at_mut(max_wave_points);
    let (slope, diff_x) = rest.split_at_mut(max_wave_points);
    WaveBuffersMut { x, y, slope, diff_x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_workspace_is_unprepared_and_empty() {
        let ws = Workspace::new(CapacitySpec::for_intercepts(8));
        assert!(!ws.is_prepared());
        assert_eq!(ws.allocated_bytes(), 0);
        assert!(ws.wave().is_empty());
    }

    #[test]
    fn reset_twice_is_idempotent() {
        let mut ws = Workspace::new(CapacitySpec::for_intercepts(8));
        assert!(ws.prepare());
        let bytes = ws.allocated_bytes();

        ws.num_intercepts = 3;
        ws.num_wave_points = 10;
        ws.reset();
        let first = (ws.intercepts().len(), ws.curves().len(), ws.wave().len());
        ws.reset();
        let second = (ws.intercepts().len(), ws.curves().len(), ws.wave().len());

        assert_eq!(first, (0, 0, 0));
        assert_eq!(first, second);
        assert_eq!(ws.allocated_bytes(), bytes);
        assert!(ws.is_prepared());
    }

    #[test]
    fn capacity_change_requires_prepare() {
        let mut ws = Workspace::default();
        ws.prepare();
        ws.set_capacity(CapacitySpec::default());
        assert!(ws.is_prepared());
        ws.set_capacity(CapacitySpec::for_intercepts(4));
        assert!(!ws.is_prepared());
        assert!(ws.prepare());
        assert_eq!(ws.capacity().max_curves, 10);
    }

    #[test]
    fn invalid_capacity_is_rejected() {
        let mut ws = Workspace::new(CapacitySpec::for_intercepts(1));
        assert!(!ws.prepare());
        assert!(!ws.is_prepared());
    }

    #[test]
    fn split_wave_hands_out_disjoint_arrays() {
        let mut backing = vec![0.0; 12];
        let parts = split_wave(&mut backing, 3);
        parts.y[0] = 1.0;
        parts.diff_x[2] = 2.0;
        assert_eq!(backing[3], 1.0);
        assert_eq!(backing[11], 2.0);
    }
}
