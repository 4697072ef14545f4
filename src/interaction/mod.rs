pub mod brush;
pub mod selection;
pub mod zoom;

use serde::{Deserialize, Serialize};

pub use brush::{
    BrushSelection2D, BrushSelectionX, ViewLimits, brush_to_limits, brush_to_time_interval,
    limits_to_transform,
};
pub use selection::{SelectedPoint, Selection, nearest_index, select_nearest};
pub use zoom::{ZoomConfig, ZoomController, ZoomTick};

/// Pointer gesture phase of one chart.
///
/// Zoom and brush drags are mutually exclusive: brush is armed only while
/// the Control modifier is held, and zoom drags are refused while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionPhase {
    Idle,
    PointerHover,
    DragZoom,
    DragBrush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Control,
    Shift,
}

/// Pointer/keyboard interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    phase: InteractionPhase,
    control_held: bool,
    shift_held: bool,
    pointer: Option<(f64, f64)>,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            phase: InteractionPhase::Idle,
            control_held: false,
            shift_held: false,
            pointer: None,
        }
    }
}

impl InteractionState {
    #[must_use]
    pub fn phase(self) -> InteractionPhase {
        self.phase
    }

    #[must_use]
    pub fn pointer(self) -> Option<(f64, f64)> {
        self.pointer
    }

    /// Brush mode is armed while Control is held.
    #[must_use]
    pub fn brush_armed(self) -> bool {
        self.control_held
    }

    #[must_use]
    pub fn shift_held(self) -> bool {
        self.shift_held
    }

    pub fn on_key_down(&mut self, modifier: Modifier) {
        match modifier {
            // Arming brush mid-zoom-drag would tear the gesture apart.
            Modifier::Control => {
                if self.phase != InteractionPhase::DragZoom {
                    self.control_held = true;
                }
            }
            Modifier::Shift => self.shift_held = true,
        }
    }

    pub fn on_key_up(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Control => {
                if self.phase != InteractionPhase::DragBrush {
                    self.control_held = false;
                }
            }
            Modifier::Shift => self.shift_held = false,
        }
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.pointer = Some((x, y));
        if self.phase == InteractionPhase::Idle {
            self.phase = InteractionPhase::PointerHover;
        }
    }

    /// Leaving the chart area cancels hover and clears the pointer.
    pub fn on_pointer_leave(&mut self) {
        self.pointer = None;
        if self.phase == InteractionPhase::PointerHover {
            self.phase = InteractionPhase::Idle;
        }
    }

    /// Attempts to start a zoom drag; refused while brush is armed.
    pub fn begin_zoom_drag(&mut self) -> bool {
        if self.control_held || self.phase == InteractionPhase::DragBrush {
            return false;
        }
        self.phase = InteractionPhase::DragZoom;
        true
    }

    pub fn end_zoom_drag(&mut self) {
        if self.phase == InteractionPhase::DragZoom {
            self.phase = self.hover_or_idle();
        }
    }

    /// Attempts to start a brush drag; allowed only while armed.
    pub fn begin_brush_drag(&mut self) -> bool {
        if !self.control_held || self.phase == InteractionPhase::DragZoom {
            return false;
        }
        self.phase = InteractionPhase::DragBrush;
        true
    }

    pub fn end_brush_drag(&mut self) {
        if self.phase == InteractionPhase::DragBrush {
            self.phase = self.hover_or_idle();
        }
    }

    fn hover_or_idle(self) -> InteractionPhase {
        if self.pointer.is_some() {
            InteractionPhase::PointerHover
        } else {
            InteractionPhase::Idle
        }
    }
}
