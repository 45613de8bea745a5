//! Finite-difference motion estimation
//!
//! Velocity, acceleration, jerk and snap are successive first differences
//! of the speed magnitude. The index factor is the magnitude of a second
//! difference of the position vector itself, so it reacts to direction
//! reversals even when the speed stays flat.

use nalgebra::Vector2;

use crate::curve::smoothstep;

/// Deltas at or above this are stalls and stay out of the interval average.
pub const STALL_THRESHOLD_MS: f64 = 150.0;

/// Decay of the report-interval moving average.
pub const INTERVAL_DECAY: f64 = 0.1;

/// Fixed-capacity history where index 0 is the newest entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWindow<T: Copy, const N: usize> {
    items: [T; N],
    head: usize,
}

impl<T: Copy, const N: usize> FixedWindow<T, N> {
    /// Window with every slot set to `value`.
    pub fn filled(value: T) -> Self {
        Self {
            items: [value; N],
            head: 0,
        }
    }

    /// Push a new entry, dropping the oldest.
    pub fn push(&mut self, value: T) {
        self.head = (self.head + N - 1) % N;
        self.items[self.head] = value;
    }

    /// Entry `age` pushes ago (0 is the newest). `None` past the capacity.
    pub fn get(&self, age: usize) -> Option<T> {
        if age >= N {
            return None;
        }
        Some(self.items[(self.head + age) % N])
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..N).map(move |age| self.items[(self.head + age) % N])
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: Copy, const N: usize> std::ops::Index<usize> for FixedWindow<T, N> {
    type Output = T;

    fn index(&self, age: usize) -> &T {
        assert!(age < N, "window age {age} out of range for capacity {N}");
        &self.items[(self.head + age) % N]
    }
}

/// Exponentially smoothed inter-report time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportInterval {
    average_ms: Option<f64>,
}

impl ReportInterval {
    pub fn new() -> Self {
        Self { average_ms: None }
    }

    /// Fold a new inter-report delta into the average.
    ///
    /// The first usable delta seeds the average; stalls and non-positive
    /// deltas are ignored.
    pub fn update(&mut self, delta_ms: f64) {
        if !delta_ms.is_finite() || delta_ms <= 0.0 || delta_ms >= STALL_THRESHOLD_MS {
            return;
        }
        self.average_ms = Some(match self.average_ms {
            Some(avg) => avg + (delta_ms - avg) * INTERVAL_DECAY,
            None => delta_ms,
        });
    }

    /// Current average, `None` until a usable delta was seen.
    pub fn average_ms(&self) -> Option<f64> {
        self.average_ms
    }
}

impl Default for ReportInterval {
    fn default() -> Self {
        Self::new()
    }
}

/// Smooth 0..2 factor: ~0 on sharp deceleration, 1 when neutral, ~2 on
/// sharp acceleration. The ramps span `velocity_divisor / 6` either side.
pub fn accel_multiplier(acceleration: f64, velocity_divisor: f64) -> f64 {
    let band = velocity_divisor / 6.0;
    smoothstep(acceleration, -band, 0.0) + smoothstep(acceleration, 0.0, band)
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Motion derivatives of the raw stream, updated once per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub last_positions: FixedWindow<Vector2<f64>, 4>,
    pub velocity: f64,
    pub last_velocities: FixedWindow<f64, 10>,
    pub acceleration: f64,
    pub last_acceleration: f64,
    pub jerk: f64,
    pub last_jerk: f64,
    pub snap: f64,
    pub index_factor: f64,
    pub last_index_factor: f64,
    pub accel_multiplier: f64,
}

impl KinematicState {
    /// State at rest at `position`.
    pub fn at_rest(position: Vector2<f64>) -> Self {
        Self {
            last_positions: FixedWindow::filled(position),
            velocity: 0.0,
            last_velocities: FixedWindow::filled(0.0),
            acceleration: 0.0,
            last_acceleration: 0.0,
            jerk: 0.0,
            last_jerk: 0.0,
            snap: 0.0,
            index_factor: 0.0,
            last_index_factor: 0.0,
            accel_multiplier: 1.0,
        }
    }

    /// Drop all history and sit at rest at `position`.
    pub fn reset(&mut self, position: Vector2<f64>) {
        *self = Self::at_rest(position);
    }

    /// Advance by one raw position.
    ///
    /// `interval_ms` is the averaged report interval; without one the
    /// rates come out as zero.
    pub fn update(
        &mut self,
        position: Vector2<f64>,
        interval_ms: Option<f64>,
        velocity_divisor: f64,
    ) {
        self.last_positions.push(position);

        let diff = self.last_positions[0] - self.last_positions[1];
        let diff_1 = self.last_positions[1] - self.last_positions[2];
        let diff_2 = self.last_positions[2] - self.last_positions[3];

        let interval = interval_ms.unwrap_or(0.0);
        let previous_velocity = self.velocity;

        self.velocity = finite_or_zero(diff.norm() / interval);

        self.last_acceleration = self.acceleration;
        self.acceleration = finite_or_zero(self.velocity - previous_velocity);

        self.last_jerk = self.jerk;
        self.jerk = finite_or_zero(self.acceleration - self.last_acceleration);
        self.snap = finite_or_zero(self.jerk - self.last_jerk);

        self.last_index_factor = self.index_factor;
        self.index_factor = finite_or_zero((diff * 2.0 - diff_1 - diff_2).norm() / interval);

        self.accel_multiplier = accel_multiplier(self.acceleration, velocity_divisor);
        self.last_velocities.push(self.velocity);
    }

    /// Mean of the velocity history before this tick.
    pub fn mean_previous_velocity(&self) -> f64 {
        let window = &self.last_velocities;
        window.iter().skip(1).sum::<f64>() / (window.capacity() - 1) as f64
    }

    /// Rise of the index factor since the previous tick; zero when it fell.
    pub fn index_jump(&self) -> f64 {
        (self.index_factor - self.last_index_factor).max(0.0)
    }
}
