//! Gate quality filter.
//!
//! Rules are independent and combine by OR: a gate excluded by any enabled
//! rule is excluded. Filtering never fails; an all-excluded mask is a normal
//! outcome that downstream stages turn into a blank overlay.

use tracing::debug;

use radar_common::FilterSettings;
use volume::{FieldData, Sweep};

use crate::mask::GateMask;

/// A single exclusion rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterRule {
    /// Value is NaN or infinite (sensor fill)
    Invalid,
    /// Value is strictly below the floor
    BelowThreshold(f32),
    /// Ray was collected during an elevation change
    Transition,
}

impl FilterRule {
    #[inline]
    fn excludes(&self, value: f32, transition_ray: bool) -> bool {
        match *self {
            FilterRule::Invalid => !value.is_finite(),
            FilterRule::BelowThreshold(floor) => value < floor,
            FilterRule::Transition => transition_ray,
        }
    }
}

/// An ordered set of enabled rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateFilter {
    rules: Vec<FilterRule>,
}

impl GateFilter {
    /// A filter with no rules; it excludes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_invalid(mut self) -> Self {
        self.push(FilterRule::Invalid);
        self
    }

    pub fn exclude_below(mut self, floor: f32) -> Self {
        self.push(FilterRule::BelowThreshold(floor));
        self
    }

    pub fn exclude_transition(mut self) -> Self {
        self.push(FilterRule::Transition);
        self
    }

    /// Rules enabled by a product's filter settings.
    pub fn for_product(settings: &FilterSettings) -> Self {
        let mut filter = Self::new();
        if settings.transition {
            filter = filter.exclude_transition();
        }
        if settings.invalid {
            filter = filter.exclude_invalid();
        }
        if let Some(floor) = settings.below {
            filter = filter.exclude_below(floor);
        }
        filter
    }

    fn push(&mut self, rule: FilterRule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Build the exclusion mask for `field`, which must belong to `sweep`
    /// (or be derived from one of its fields).
    pub fn apply(&self, sweep: &Sweep, field: &FieldData) -> GateMask {
        let (rays, gates) = field.shape();
        let mut mask = GateMask::none(rays, gates);

        for ray in 0..rays {
            let transition_ray = sweep.is_transition(ray);
            if transition_ray && self.rules.contains(&FilterRule::Transition) {
                mask.exclude_ray(ray);
                continue;
            }
            for (gate, &value) in field.ray(ray).iter().enumerate() {
                if self
                    .rules
                    .iter()
                    .any(|rule| rule.excludes(value, transition_ray))
                {
                    mask.exclude(ray, gate);
                }
            }
        }

        debug!(
            rays,
            gates,
            excluded = mask.excluded_count(),
            rules = self.rules.len(),
            "Gate filter applied"
        );
        mask
    }
}
