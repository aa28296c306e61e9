//! Keyboard state engine.
//!
//! Tracks the modifier byte and up to six held keys, and turns every state
//! change into a full keyboard report.  HID keyboard reports are snapshots,
//! not deltas, so each emitted report lists everything currently held.

use crate::keymap::{AsciiKey, HidKeyCode, KeyId, Modifier, SpecialKey};
use crate::protocol::command::{CommandError, KeyboardCommand};
use crate::report::{KeyboardReport, KEY_ROLLOVER};

/// Held modifiers and keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    modifier_mask: u8,
    held: [Option<KeyId>; KEY_ROLLOVER],
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modifier bits set through MODIFIER_PRESS, excluding implied Shift.
    pub fn modifier_mask(&self) -> u8 {
        self.modifier_mask
    }

    pub fn held_keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.held.iter().flatten().copied()
    }

    pub fn is_held(&self, key: KeyId) -> bool {
        self.held.contains(&Some(key))
    }

    pub fn is_released(&self) -> bool {
        self.modifier_mask == 0 && self.held.iter().all(Option::is_none)
    }

    /// The report describing the current state.
    pub fn report(&self) -> KeyboardReport {
        KeyboardReport::from_keys(self.report_modifiers(), self.held_keys().map(KeyId::key))
    }

    fn report_modifiers(&self) -> u8 {
        self.held_keys()
            .fold(self.modifier_mask, |mask, key| mask | key.implied_modifiers())
    }

    /// Applies `command`, passing each resulting report to `emit` in order.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidValue`] if a press, write or chord would
    /// exceed the six key rollover.  State is left unchanged and nothing is emitted.
    pub fn apply<F>(&mut self, command: KeyboardCommand, emit: &mut F) -> Result<(), CommandError>
    where
        F: FnMut(KeyboardReport),
    {
        match command {
            KeyboardCommand::Write(ascii) => self.write(ascii, emit)?,
            KeyboardCommand::Press(key) => self.press(key, emit)?,
            KeyboardCommand::Release(key) => self.release(key, emit),
            KeyboardCommand::ModifierPress(modifier) => self.set_modifier(modifier, true, emit),
            KeyboardCommand::ModifierRelease(modifier) => self.set_modifier(modifier, false, emit),
            KeyboardCommand::Special(special) => self.chord(special, emit)?,
            KeyboardCommand::Reset => self.reset(emit),
        }
        Ok(())
    }

    /// Releases everything and emits an all-released report.
    pub fn reset<F: FnMut(KeyboardReport)>(&mut self, emit: &mut F) {
        self.modifier_mask = 0;
        self.held = [None; KEY_ROLLOVER];
        emit(KeyboardReport::empty());
    }

    fn write<F: FnMut(KeyboardReport)>(
        &mut self,
        ascii: AsciiKey,
        emit: &mut F,
    ) -> Result<(), CommandError> {
        let key = KeyId::Ascii(ascii);
        if self.is_held(key) {
            // Lift the held key first so the host still sees a keystroke.
            emit(self.report_without(key));
            emit(self.report());
            return Ok(());
        }
        let pressed = self.report_with(key.implied_modifiers(), ascii.key());
        if !pressed.contains(ascii.key()) {
            return Err(rollover_full(ascii.code()));
        }
        emit(pressed);
        emit(self.report());
        Ok(())
    }

    /// Current state plus one more key and extra modifier bits.
    fn report_with(&self, modifiers: u8, key: HidKeyCode) -> KeyboardReport {
        KeyboardReport::from_keys(
            self.report_modifiers() | modifiers,
            self.held_keys().map(KeyId::key).chain(std::iter::once(key)),
        )
    }

    /// Current state with `key` lifted, including any Shift it implies.
    fn report_without(&self, key: KeyId) -> KeyboardReport {
        let others = || self.held_keys().filter(move |held| *held != key);
        let modifiers = others().fold(self.modifier_mask, |mask, held| {
            mask | held.implied_modifiers()
        });
        KeyboardReport::from_keys(modifiers, others().map(KeyId::key))
    }

    fn press<F>(&mut self, key: KeyId, emit: &mut F) -> Result<(), CommandError>
    where
        F: FnMut(KeyboardReport),
    {
        if self.is_held(key) {
            return Ok(());
        }
        let Some(slot) = self.held.iter_mut().find(|slot| slot.is_none()) else {
            return Err(rollover_full(key.key().usage()));
        };
        *slot = Some(key);
        emit(self.report());
        Ok(())
    }

    fn release<F: FnMut(KeyboardReport)>(&mut self, key: KeyId, emit: &mut F) {
        let Some(slot) = self.held.iter_mut().find(|slot| **slot == Some(key)) else {
            return;
        };
        *slot = None;
        emit(self.report());
    }

    fn set_modifier<F>(&mut self, modifier: Modifier, pressed: bool, emit: &mut F)
    where
        F: FnMut(KeyboardReport),
    {
        let mask = if pressed {
            self.modifier_mask | modifier.bit()
        } else {
            self.modifier_mask & !modifier.bit()
        };
        if mask == self.modifier_mask {
            return;
        }
        self.modifier_mask = mask;
        emit(self.report());
    }

    /// Taps the chord on top of whatever is held, then restores the current
    /// state.
    fn chord<F>(&self, special: SpecialKey, emit: &mut F) -> Result<(), CommandError>
    where
        F: FnMut(KeyboardReport),
    {
        let (modifiers, key) = special.chord();
        let pressed = self.report_with(modifiers, key);
        if !pressed.contains(key) {
            return Err(rollover_full(key.usage()));
        }
        emit(pressed);
        emit(self.report());
        Ok(())
    }
}

fn rollover_full(value: u8) -> CommandError {
    CommandError::InvalidValue {
        value,
        reason: "six keys already held",
    }
}
