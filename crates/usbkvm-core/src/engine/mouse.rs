//! Mouse state engine.
//!
//! Buttons are tracked as a bitmask.  The absolute position only changes
//! through SETPOS and RESET; relative moves and wheel events are passed
//! through as one-off reports.

use crate::protocol::command::MouseCommand;
use crate::protocol::messages::{MouseButton, ScrollDirection};
use crate::report::{Motion, MouseReport};

/// Position the pointer returns to on reset: the middle of both axes.
pub const MOUSE_CENTER: (u16, u16) = (16384, 16384);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseState {
    buttons: u8,
    x: u16,
    y: u16,
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            buttons: 0,
            x: MOUSE_CENTER.0,
            y: MOUSE_CENTER.1,
        }
    }
}

impl MouseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons & button.mask() != 0
    }

    pub fn apply<F: FnMut(MouseReport)>(&mut self, command: MouseCommand, emit: &mut F) {
        match command {
            MouseCommand::Click(button) => {
                emit(MouseReport::buttons_only(self.buttons | button.mask()));
                emit(MouseReport::buttons_only(self.buttons));
            }
            MouseCommand::Press(button) => self.set_button(button, true, emit),
            MouseCommand::Release(button) => self.set_button(button, false, emit),
            MouseCommand::SetPosition { x, y } => {
                self.x = x;
                self.y = y;
                emit(self.absolute_report());
            }
            MouseCommand::Reset => self.reset(emit),
        }
    }

    /// Releases all buttons, recenters, and emits the recenter report.
    pub fn reset<F: FnMut(MouseReport)>(&mut self, emit: &mut F) {
        *self = Self::default();
        emit(self.absolute_report());
    }

    /// Emits a relative move.  Zero deltas are still reported.
    pub fn move_relative<F: FnMut(MouseReport)>(&self, dx: i8, dy: i8, emit: &mut F) {
        emit(MouseReport {
            buttons: self.buttons,
            motion: Motion::Relative { dx, dy },
        });
    }

    /// Emits one wheel step of `tilt` (0–127) in `direction`.
    pub fn scroll<F>(&self, direction: ScrollDirection, tilt: u8, emit: &mut F)
    where
        F: FnMut(MouseReport),
    {
        let tilt = tilt.min(i8::MAX as u8) as i8;
        let wheel = match direction {
            ScrollDirection::Up => tilt,
            ScrollDirection::Down => -tilt,
        };
        emit(MouseReport {
            buttons: self.buttons,
            motion: Motion::Wheel(wheel),
        });
    }

    fn set_button<F>(&mut self, button: MouseButton, pressed: bool, emit: &mut F)
    where
        F: FnMut(MouseReport),
    {
        let buttons = if pressed {
            self.buttons | button.mask()
        } else {
            self.buttons & !button.mask()
        };
        if buttons == self.buttons {
            return;
        }
        self.buttons = buttons;
        emit(MouseReport::buttons_only(buttons));
    }

    fn absolute_report(&self) -> MouseReport {
        MouseReport {
            buttons: self.buttons,
            motion: Motion::Absolute {
                x: self.x,
                y: self.y,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(state: &mut MouseState, command: MouseCommand) -> Vec<MouseReport> {
        let mut reports = Vec::new();
        state.apply(command, &mut |r| reports.push(r));
        reports
    }

    #[test]
    fn test_click_leaves_no_button_held() {
        // Arrange
        let mut state = MouseState::new();

        // Act
        let reports = apply(&mut state, MouseCommand::Click(MouseButton::Middle));

        // Assert
        assert_eq!(
            reports,
            vec![MouseReport::buttons_only(0x04), MouseReport::buttons_only(0x00)]
        );
        assert_eq!(state.buttons(), 0);
    }

    #[test]
    fn test_click_keeps_other_held_buttons() {
        // Arrange
        let mut state = MouseState::new();
        apply(&mut state, MouseCommand::Press(MouseButton::Left));

        // Act
        let reports = apply(&mut state, MouseCommand::Click(MouseButton::Right));

        // Assert
        assert_eq!(reports[0].buttons, 0x03);
        assert_eq!(reports[1].buttons, 0x01);
    }

    #[test]
    fn test_release_of_unpressed_button_is_silent() {
        // Arrange
        let mut state = MouseState::new();

        // Act
        let reports = apply(&mut state, MouseCommand::Release(MouseButton::Left));

        // Assert
        assert!(reports.is_empty());
        assert_eq!(state.buttons(), 0);
    }

    #[test]
    fn test_set_position_updates_state_and_reports_absolute() {
        // Arrange
        let mut state = MouseState::new();

        // Act
        let reports = apply(&mut state, MouseCommand::SetPosition { x: 0, y: 32767 });

        // Assert
        assert_eq!(state.position(), (0, 32767));
        assert_eq!(reports[0].motion, Motion::Absolute { x: 0, y: 32767 });
    }

    #[test]
    fn test_reset_recenters_and_releases() {
        // Arrange
        let mut state = MouseState::new();
        apply(&mut state, MouseCommand::Press(MouseButton::Right));
        apply(&mut state, MouseCommand::SetPosition { x: 10, y: 20 });

        // Act
        let reports = apply(&mut state, MouseCommand::Reset);

        // Assert
        assert_eq!(state, MouseState::new());
        assert_eq!(
            reports,
            vec![MouseReport {
                buttons: 0,
                motion: Motion::Absolute { x: 16384, y: 16384 }
            }]
        );
    }

    #[test]
    fn test_relative_move_does_not_change_position() {
        // Arrange
        let state = MouseState::new();
        let mut reports = Vec::new();

        // Act
        state.move_relative(0, 0, &mut |r| reports.push(r));

        // Assert
        assert_eq!(reports[0].motion, Motion::Relative { dx: 0, dy: 0 });
        assert_eq!(state.position(), MOUSE_CENTER);
    }

    #[test]
    fn test_scroll_direction_sets_wheel_sign() {
        // Arrange
        let state = MouseState::new();
        let mut reports = Vec::new();

        // Act
        state.scroll(ScrollDirection::Up, 127, &mut |r| reports.push(r));
        state.scroll(ScrollDirection::Down, 3, &mut |r| reports.push(r));

        // Assert
        assert_eq!(reports[0].motion, Motion::Wheel(127));
        assert_eq!(reports[1].motion, Motion::Wheel(-3));
    }
}
