//! Mouse and keyboard handling for the map.
//!
//! [`Input`] folds raw window events into the per-frame intent of the user:
//! how far the map was dragged, how much it was zoomed, and which
//! [`Command`]s were triggered. The app drains it once per frame.
//!
//! # Bindings
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left drag | pan |
//! | Wheel | zoom |
//! | Space | pause / play |
//! | P | toggle particles |
//! | S | toggle speed layer |
//! | V | toggle wind arrows |
//! | Left / Right | previous / next forecast step |
//! | R | scatter particles |
//! | Escape | quit |

use std::collections::HashSet;

use glam::DVec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Zoom change per wheel line.
const ZOOM_PER_LINE: f64 = 0.3;
/// Zoom change per wheel pixel (touchpads).
const ZOOM_PER_PIXEL: f64 = 0.01;

/// A discrete user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    TogglePause,
    ToggleParticles,
    ToggleSpeeds,
    ToggleVectors,
    NextTau,
    PrevTau,
    ResetParticles,
    Quit,
}

impl Command {
    fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Space => Some(Command::TogglePause),
            KeyCode::KeyP => Some(Command::ToggleParticles),
            KeyCode::KeyS => Some(Command::ToggleSpeeds),
            KeyCode::KeyV => Some(Command::ToggleVectors),
            KeyCode::ArrowRight => Some(Command::NextTau),
            KeyCode::ArrowLeft => Some(Command::PrevTau),
            KeyCode::KeyR => Some(Command::ResetParticles),
            KeyCode::Escape => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Accumulated input since the last frame.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    commands: Vec<Command>,

    dragging: bool,
    cursor: Option<DVec2>,
    drag_delta: DVec2,

    zoom_delta: f64,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Queries ==========

    /// Cursor position in physical pixels, if the cursor is over the window.
    pub fn cursor(&self) -> Option<DVec2> {
        self.cursor
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    // ========== Per-frame Draining ==========

    /// Commands triggered since the last call.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Drag distance in pixels since the last call.
    pub fn take_drag(&mut self) -> DVec2 {
        std::mem::take(&mut self.drag_delta)
    }

    /// Zoom change since the last call. Positive zooms in.
    pub fn take_zoom(&mut self) -> f64 {
        std::mem::take(&mut self.zoom_delta)
    }

    // ========== Event Handling ==========

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            // Held keys auto-repeat; only the first press counts
                            if self.keys_held.insert(key) {
                                if let Some(command) = Command::from_key(key) {
                                    self.commands.push(command);
                                }
                            }
                        }
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if *button == MouseButton::Left {
                    self.dragging = *state == ElementState::Pressed;
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let pos = DVec2::new(position.x, position.y);
                if self.dragging {
                    if let Some(last) = self.cursor {
                        self.drag_delta += pos - last;
                    }
                }
                self.cursor = Some(pos);
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.dragging = false;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64 * ZOOM_PER_LINE,
                    MouseScrollDelta::PixelDelta(pos) => pos.y * ZOOM_PER_PIXEL,
                };
            }

            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.dragging = false;
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    fn device() -> DeviceId {
        // SAFETY: only used to build synthetic events
        unsafe { DeviceId::dummy() }
    }

    fn moved(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(x, y),
        }
    }

    fn left(state: ElementState) -> WindowEvent {
        WindowEvent::MouseInput {
            device_id: device(),
            state,
            button: MouseButton::Left,
        }
    }

    #[test]
    fn test_drag_accumulates() {
        let mut input = Input::new();
        input.handle_event(&moved(10.0, 10.0));
        input.handle_event(&left(ElementState::Pressed));
        input.handle_event(&moved(15.0, 12.0));
        input.handle_event(&moved(20.0, 20.0));
        assert_eq!(input.take_drag(), DVec2::new(10.0, 10.0));
        assert_eq!(input.take_drag(), DVec2::ZERO);

        input.handle_event(&left(ElementState::Released));
        input.handle_event(&moved(40.0, 40.0));
        assert_eq!(input.take_drag(), DVec2::ZERO);
        assert_eq!(input.cursor(), Some(DVec2::new(40.0, 40.0)));
    }

    #[test]
    fn test_hover_does_not_pan() {
        let mut input = Input::new();
        input.handle_event(&moved(10.0, 10.0));
        input.handle_event(&moved(30.0, 10.0));
        assert_eq!(input.take_drag(), DVec2::ZERO);
    }

    #[test]
    fn test_wheel_zoom() {
        let mut input = Input::new();
        input.handle_event(&WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
            phase: TouchPhase::Moved,
        });
        assert!((input.take_zoom() - 0.6).abs() < 1e-9);
        assert_eq!(input.take_zoom(), 0.0);
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(Command::from_key(KeyCode::Space), Some(Command::TogglePause));
        assert_eq!(Command::from_key(KeyCode::ArrowRight), Some(Command::NextTau));
        assert_eq!(Command::from_key(KeyCode::KeyS), Some(Command::ToggleSpeeds));
        assert_eq!(Command::from_key(KeyCode::KeyV), Some(Command::ToggleVectors));
        assert_eq!(Command::from_key(KeyCode::KeyQ), None);
    }
}
