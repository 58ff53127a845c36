//! Gate exclusion masks and the masked view renderers consume.

use volume::FieldData;

/// Boolean `[ray, gate]` array; `true` marks a gate that must not be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateMask {
    rays: usize,
    gates: usize,
    excluded: Vec<bool>,
}

impl GateMask {
    /// A mask that excludes nothing.
    pub fn none(rays: usize, gates: usize) -> Self {
        Self {
            rays,
            gates,
            excluded: vec![false; rays * gates],
        }
    }

    /// A mask that excludes everything.
    pub fn all(rays: usize, gates: usize) -> Self {
        Self {
            rays,
            gates,
            excluded: vec![true; rays * gates],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rays, self.gates)
    }

    #[inline]
    pub fn is_excluded(&self, ray: usize, gate: usize) -> bool {
        if ray >= self.rays || gate >= self.gates {
            return true;
        }
        self.excluded[ray * self.gates + gate]
    }

    pub fn exclude(&mut self, ray: usize, gate: usize) {
        if ray < self.rays && gate < self.gates {
            self.excluded[ray * self.gates + gate] = true;
        }
    }

    pub fn exclude_ray(&mut self, ray: usize) {
        if ray < self.rays {
            let start = ray * self.gates;
            self.excluded[start..start + self.gates].fill(true);
        }
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.iter().filter(|&&e| e).count()
    }

    pub fn included_count(&self) -> usize {
        self.excluded.len() - self.excluded_count()
    }

    /// True when no gate survives (including the zero-gate case).
    pub fn all_excluded(&self) -> bool {
        self.excluded.iter().all(|&e| e)
    }

    /// Logical OR of two masks of the same shape.
    pub fn union(&self, other: &GateMask) -> GateMask {
        debug_assert_eq!(self.shape(), other.shape());
        GateMask {
            rays: self.rays,
            gates: self.gates,
            excluded: self
                .excluded
                .iter()
                .zip(&other.excluded)
                .map(|(a, b)| *a || *b)
                .collect(),
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.excluded
    }
}

/// A field seen through a mask. The field itself is never modified.
#[derive(Debug, Clone, Copy)]
pub struct MaskedField<'a> {
    data: &'a FieldData,
    mask: &'a GateMask,
}

impl<'a> MaskedField<'a> {
    /// Pair a field with its mask. Shapes must agree.
    pub fn new(data: &'a FieldData, mask: &'a GateMask) -> Option<Self> {
        if data.shape() != mask.shape() {
            return None;
        }
        Some(Self { data, mask })
    }

    /// Value at a gate, or `None` if the gate is masked or out of range.
    #[inline]
    pub fn value(&self, ray: usize, gate: usize) -> Option<f32> {
        if self.mask.is_excluded(ray, gate) {
            return None;
        }
        self.data.get(ray, gate)
    }

    pub fn data(&self) -> &FieldData {
        self.data
    }

    pub fn mask(&self) -> &GateMask {
        self.mask
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.all_excluded()
    }
}
