use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::transform::{Transform, TransformTransition};
use crate::core::types::Timestamp;
use crate::error::{ChartError, ChartResult};

/// Tuning of one chart's zoom behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// Allowed scale factor range `[zoom_level_min, zoom_level_max]`.
    pub scale_extent: (f64, f64),
    /// Multiplier applied to wheel deltas before the exponential step.
    pub wheel_step_multiplier: f64,
    /// Animate wheel zoom and programmatic limit changes.
    pub with_transition: bool,
    /// Tween duration for discrete wheel steps.
    pub wheel_transition_ms: i64,
    /// Tween duration for programmatic limit changes.
    pub limit_transition_ms: i64,
    /// Debounce before a finished zoom gesture requests a refetch of the
    /// visible interval. `Some(0)` requests immediately, `None` disables
    /// auto-refetch entirely (the zoom stays client-side).
    pub reload_debounce_ms: Option<i64>,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            scale_extent: (1.0, 10.0),
            wheel_step_multiplier: 3.0,
            with_transition: true,
            wheel_transition_ms: 150,
            limit_transition_ms: 500,
            reload_debounce_ms: Some(1_000),
        }
    }
}

impl ZoomConfig {
    fn validate(self) -> ChartResult<Self> {
        let (min_k, max_k) = self.scale_extent;
        // An unbounded upper zoom level is expressed as +infinity.
        if !min_k.is_finite() || min_k <= 0.0 || max_k.is_nan() || min_k > max_k {
            return Err(ChartError::Config(format!(
                "zoom scale extent must satisfy 0 < min <= max, got [{min_k}, {max_k}]"
            )));
        }
        if !self.wheel_step_multiplier.is_finite() || self.wheel_step_multiplier <= 0.0 {
            return Err(ChartError::Config(
                "wheel step multiplier must be finite and > 0".to_owned(),
            ));
        }
        if self.wheel_transition_ms <= 0 || self.limit_transition_ms <= 0 {
            return Err(ChartError::Config(
                "transition durations must be > 0 ms".to_owned(),
            ));
        }
        if let Some(delay) = self.reload_debounce_ms {
            if delay < 0 {
                return Err(ChartError::Config(format!(
                    "reload debounce must be >= 0 ms, got {delay}"
                )));
            }
        }
        Ok(self)
    }
}

/// Outcome of advancing the zoom clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoomTick {
    /// A transition tween moved the transform this tick.
    pub transform_changed: bool,
    /// The refetch debounce expired; the chart should request the currently
    /// visible interval from the interval authority.
    pub refetch_due: bool,
}

/// Owns one chart's pan/zoom transform, animated transitions, and the
/// zoom-end refetch debounce.
///
/// All mutation paths clamp the scale into the configured extent and
/// constrain the translate against the translate extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomController {
    config: ZoomConfig,
    extent: (f64, f64),
    translate_extent: ((f64, f64), (f64, f64)),
    transform: Transform,
    y_multiplier: f64,
    transition: Option<TransformTransition>,
    refetch_deadline: Option<Timestamp>,
}

impl ZoomController {
    pub fn new(
        config: ZoomConfig,
        extent: (f64, f64),
        translate_extent: ((f64, f64), (f64, f64)),
    ) -> ChartResult<Self> {
        let config = config.validate()?;
        if !extent.0.is_finite() || !extent.1.is_finite() || extent.0 <= 0.0 || extent.1 <= 0.0 {
            return Err(ChartError::Config(format!(
                "zoom extent must be positive, got ({}, {})",
                extent.0, extent.1
            )));
        }
        Ok(Self {
            config,
            extent,
            translate_extent,
            transform: Transform::identity(),
            y_multiplier: 1.0,
            transition: None,
            refetch_deadline: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> ZoomConfig {
        self.config
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    #[must_use]
    pub fn y_multiplier(&self) -> f64 {
        self.y_multiplier
    }

    /// Transform the controller is settling toward: the transition target
    /// while a tween is running, the current transform otherwise.
    #[must_use]
    pub fn target_transform(&self) -> Transform {
        self.transition
            .as_ref()
            .map_or(self.transform, |transition| transition.target().0)
    }

    #[must_use]
    pub fn has_pending_refetch(&self) -> bool {
        self.refetch_deadline.is_some()
    }

    /// Updates the plot size on resize; the transform is re-constrained.
    pub fn set_extent(&mut self, extent: (f64, f64)) -> ChartResult<()> {
        if !extent.0.is_finite() || !extent.1.is_finite() || extent.0 <= 0.0 || extent.1 <= 0.0 {
            return Err(ChartError::InvalidParameter(format!(
                "zoom extent must be positive, got ({}, {})",
                extent.0, extent.1
            )));
        }
        self.extent = extent;
        self.transform = self.clamp_constrain(self.transform);
        Ok(())
    }

    pub fn set_translate_extent(&mut self, translate_extent: ((f64, f64), (f64, f64))) {
        self.translate_extent = translate_extent;
        self.transform = self.clamp_constrain(self.transform);
    }

    /// Applies a wheel step anchored at the pointer position.
    ///
    /// In transition mode the step animates over the wheel tween duration;
    /// otherwise the transform jumps. Either way the refetch debounce is
    /// rescheduled, since a wheel step is a complete zoom gesture.
    pub fn wheel(&mut self, delta_y: f64, pointer: (f64, f64), now: Timestamp) -> bool {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return false;
        }

        let base = self.target_transform();
        let step = -delta_y * self.config.wheel_step_multiplier * 0.002;
        let target_k = (base.k * 2f64.powf(step))
            .clamp(self.config.scale_extent.0, self.config.scale_extent.1);
        let anchor = base.invert(pointer);
        let target = self.clamp_constrain(Transform {
            k: target_k,
            x: pointer.0 - target_k * anchor.0,
            y: pointer.1 - target_k * anchor.1,
        });

        if self.config.with_transition {
            self.transition = TransformTransition::new(
                self.transform,
                target,
                self.y_multiplier,
                self.y_multiplier,
                now,
                self.config.wheel_transition_ms,
            )
            .ok();
        } else {
            self.transform = target;
        }

        self.note_gesture_end(now)
    }

    /// Pans by a screen-space delta during an active zoom drag.
    pub fn drag_by(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.transition = None;
        self.transform = self.clamp_constrain(Transform {
            k: self.transform.k,
            x: self.transform.x + dx,
            y: self.transform.y + dy,
        });
    }

    /// Starts a drag gesture: cancels the pending refetch debounce and any
    /// running transition (last gesture wins).
    pub fn begin_gesture(&mut self) {
        self.refetch_deadline = None;
        if let Some(transition) = self.transition.take() {
            let (transform, multiplier) = transition.target();
            self.transform = transform;
            self.y_multiplier = multiplier;
        }
    }

    /// Ends a drag gesture.
    ///
    /// Returns `true` when the refetch should fire immediately (zero
    /// debounce); otherwise the deadline is armed and later reported by
    /// [`ZoomController::advance`].
    pub fn end_gesture(&mut self, now: Timestamp) -> bool {
        self.note_gesture_end(now)
    }

    fn note_gesture_end(&mut self, now: Timestamp) -> bool {
        let Some(delay) = self.config.reload_debounce_ms else {
            return false;
        };
        if self.target_transform().is_identity() {
            self.refetch_deadline = None;
            return false;
        }
        if delay == 0 {
            self.refetch_deadline = None;
            return true;
        }
        debug!(delay_ms = delay, "scheduling zoom refetch debounce");
        self.refetch_deadline = Some(now + delay);
        false
    }

    /// Advances transitions and the refetch debounce to `now`.
    ///
    /// The debounce fires at most once per schedule.
    pub fn advance(&mut self, now: Timestamp) -> ZoomTick {
        let mut tick = ZoomTick::default();

        if let Some(transition) = &self.transition {
            let (transform, multiplier, finished) = transition.sample(now);
            if transform != self.transform || multiplier != self.y_multiplier {
                self.transform = transform;
                self.y_multiplier = multiplier;
                tick.transform_changed = true;
            }
            if finished {
                self.transition = None;
            }
        }

        if let Some(deadline) = self.refetch_deadline {
            if now >= deadline {
                self.refetch_deadline = None;
                tick.refetch_due = true;
            }
        }

        tick
    }

    /// Replaces the transform (and Y multiplier), optionally animated.
    ///
    /// The scale is clamped into the configured extent regardless of the
    /// path that produced the transform.
    pub fn set_transform(
        &mut self,
        transform: Transform,
        y_multiplier: f64,
        animate: bool,
        now: Timestamp,
    ) -> ChartResult<()> {
        if !y_multiplier.is_finite() || y_multiplier <= 0.0 {
            return Err(ChartError::InvalidParameter(format!(
                "y scale multiplier must be finite and > 0, got {y_multiplier}"
            )));
        }
        let target = self.clamp_constrain(transform);

        if animate && self.config.with_transition {
            self.transition = Some(TransformTransition::new(
                self.transform,
                target,
                self.y_multiplier,
                y_multiplier,
                now,
                self.config.limit_transition_ms,
            )?);
        } else {
            self.transition = None;
            self.transform = target;
            self.y_multiplier = y_multiplier;
        }
        Ok(())
    }

    /// Resets to the identity transform and clears pending work.
    pub fn reset(&mut self) {
        self.transition = None;
        self.refetch_deadline = None;
        self.transform = Transform::identity();
        self.y_multiplier = 1.0;
    }

    fn clamp_constrain(&self, transform: Transform) -> Transform {
        transform
            .with_scale_clamped(self.config.scale_extent.0, self.config.scale_extent.1)
            .constrained(self.extent, self.translate_extent)
    }
}
