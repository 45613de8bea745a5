//! Velocity-adaptive deadzone radii

/// Minimum gap kept between the outer and inner radius.
pub const RADIUS_EPSILON: f64 = 0.0001;

/// Configured radius shape. Never mutated by the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusParams {
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub velocity_divisor: f64,
    pub radial_power: f64,
    pub min_radius_multiplier: f64,
    pub accel_power: f64,
}

/// Radii in effect for a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveRadii {
    pub inner: f64,
    pub outer: f64,
    /// Clamped radial factor both radii were scaled by
    pub factor: f64,
    /// Velocity after the acceleration weighting
    pub effective_velocity: f64,
}

impl EffectiveRadii {
    /// Width of the soft band between the radii.
    pub fn span(&self) -> f64 {
        self.outer - self.inner
    }

    /// The velocity has reached the full configured radius.
    pub fn saturated(&self) -> bool {
        self.factor >= 1.0
    }
}

impl RadiusParams {
    /// `velocity * accel_multiplier ^ accel_power`
    pub fn effective_velocity(&self, velocity: f64, accel_multiplier: f64) -> f64 {
        velocity * accel_multiplier.powf(self.accel_power)
    }

    /// Unclamped-above radial factor before the minimum floor is applied.
    pub fn raw_factor(&self, effective_velocity: f64) -> f64 {
        (effective_velocity / self.velocity_divisor)
            .powf(self.radial_power)
            .min(1.0)
    }

    /// Effective radii for the given motion. `force_full` pins the factor to 1.
    pub fn effective(
        &self,
        velocity: f64,
        accel_multiplier: f64,
        force_full: bool,
    ) -> EffectiveRadii {
        let effective_velocity = self.effective_velocity(velocity, accel_multiplier);
        let factor = if force_full {
            1.0
        } else {
            let raw = self.raw_factor(effective_velocity);
            if raw.is_finite() {
                raw.max(self.min_radius_multiplier).min(1.0)
            } else {
                self.min_radius_multiplier
            }
        };

        EffectiveRadii {
            inner: factor * self.inner_radius,
            outer: factor * self.outer_radius.max(self.inner_radius + RADIUS_EPSILON),
            factor,
            effective_velocity,
        }
    }
}
