//! Rigid-Body Sleeping
//!
//! Low-energy rigid bodies are put to sleep after a sustained quiet period,
//! skipping force integration while staying hashed and collidable. The
//! state machine is deliberately one-directional on contact: a sleeping
//! body that gets hit is pushed out of penetration but not woken — only an
//! explicit impulse wakes it.

use crate::body::{BodyKind, CollisionBody};

/// Thresholds and timing for the sleep state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SleepConfig {
    /// Linear speed below which a body counts as still (units per second).
    pub linear_threshold: f64,
    /// Angular speed below which a body counts as still (radians per second).
    pub angular_threshold: f64,
    /// Seconds of sustained stillness before falling asleep.
    pub time_before_sleep: f64,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            linear_threshold: 2.0,
            angular_threshold: 8.0_f64.to_radians(),
            time_before_sleep: 0.5,
        }
    }
}

/// Advance one body's sleep state by `delta` seconds.
///
/// Only rigid bodies participate. The linear check compares squared
/// magnitudes; exceeding either threshold resets the stillness timer.
/// Sleeping bodies are left untouched — waking is the impulse API's job.
pub(crate) fn update_sleep(body: &mut CollisionBody, config: &SleepConfig, delta: f64) {
    if body.kind != BodyKind::Rigid || body.sleeping || !body.can_sleep {
        return;
    }

    let linear_still =
        body.linear_velocity.length_squared() < config.linear_threshold * config.linear_threshold;
    let angular_still = body.angular_velocity.abs() < config.angular_threshold;

    if linear_still && angular_still {
        body.still_time += delta;
        if body.still_time >= config.time_before_sleep {
            body.sleeping = true;
        }
    } else {
        body.still_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;

    fn quiet_body() -> CollisionBody {
        let mut body = CollisionBody::new_rigid(Vec2::ZERO, 1.0);
        body.linear_velocity = Vec2::new(0.1, 0.0);
        body
    }

    #[test]
    fn test_falls_asleep_after_threshold() {
        let config = SleepConfig::default();
        let mut body = quiet_body();
        let dt = 1.0 / 60.0;

        let mut elapsed = 0.0;
        while elapsed + dt < config.time_before_sleep {
            update_sleep(&mut body, &config, dt);
            elapsed += dt;
            assert!(!body.sleeping, "still under the time threshold");
        }
        update_sleep(&mut body, &config, dt);
        assert!(body.sleeping, "quiet past time_before_sleep sleeps");
    }

    #[test]
    fn test_fast_body_resets_timer() {
        let config = SleepConfig::default();
        let mut body = quiet_body();
        update_sleep(&mut body, &config, 0.4);
        assert!(body.still_time > 0.0);

        body.linear_velocity = Vec2::new(50.0, 0.0);
        update_sleep(&mut body, &config, 1.0 / 60.0);
        assert_eq!(body.still_time, 0.0);
        assert!(!body.sleeping);
    }

    #[test]
    fn test_spin_resets_timer() {
        let config = SleepConfig::default();
        let mut body = quiet_body();
        body.angular_velocity = 2.0;
        update_sleep(&mut body, &config, 0.4);
        assert_eq!(body.still_time, 0.0);
    }

    #[test]
    fn test_can_sleep_false_never_sleeps() {
        let config = SleepConfig::default();
        let mut body = quiet_body();
        body.can_sleep = false;
        for _ in 0..120 {
            update_sleep(&mut body, &config, 1.0 / 60.0);
        }
        assert!(!body.sleeping);
        assert_eq!(body.still_time, 0.0);
    }

    #[test]
    fn test_non_rigid_ignored() {
        let config = SleepConfig::default();
        let mut body = CollisionBody::new_static(Vec2::ZERO);
        for _ in 0..120 {
            update_sleep(&mut body, &config, 1.0 / 60.0);
        }
        assert!(!body.sleeping);
    }

    #[test]
    fn test_impulse_restarts_hysteresis() {
        let config = SleepConfig::default();
        let mut body = quiet_body();
        for _ in 0..60 {
            update_sleep(&mut body, &config, 1.0 / 60.0);
        }
        assert!(body.sleeping);

        body.apply_central_impulse(Vec2::new(0.5, 0.0));
        assert!(!body.sleeping, "impulse wakes immediately");
        assert_eq!(body.still_time, 0.0);
    }
}
