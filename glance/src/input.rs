//! Mouse and keyboard injection
//!
//! Thin wrappers over `rdev::simulate`. Every event is followed by a short pause so the
//! target application has a chance to process it before the next one arrives.

use crate::InputError;
use rdev::{simulate, Button, EventType};
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument};

pub use rdev::Key;

/// Pause after each simulated event.
const EVENT_PAUSE: Duration = Duration::from_millis(20);

/// Gap between the two clicks of a double-click.
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(80);

fn send(event: &EventType) -> Result<(), InputError> {
    simulate(event).map_err(|_| InputError::Simulate(format!("{event:?}")))?;
    thread::sleep(EVENT_PAUSE);
    Ok(())
}

pub fn move_to(x: i32, y: i32) -> Result<(), InputError> {
    send(&EventType::MouseMove {
        x: x as f64,
        y: y as f64,
    })
}

#[instrument]
pub fn click(x: i32, y: i32) -> Result<(), InputError> {
    move_to(x, y)?;
    send(&EventType::ButtonPress(Button::Left))?;
    send(&EventType::ButtonRelease(Button::Left))
}

#[instrument]
pub fn double_click(x: i32, y: i32) -> Result<(), InputError> {
    click(x, y)?;
    thread::sleep(DOUBLE_CLICK_GAP);
    send(&EventType::ButtonPress(Button::Left))?;
    send(&EventType::ButtonRelease(Button::Left))
}

pub fn press(key: Key) -> Result<(), InputError> {
    debug!("press {:?}", key);
    send(&EventType::KeyPress(key))?;
    send(&EventType::KeyRelease(key))
}

/// Hold `keys` down in order, then release them in reverse.
pub fn hotkey(keys: &[Key]) -> Result<(), InputError> {
    debug!("hotkey {:?}", keys);
    for key in keys {
        send(&EventType::KeyPress(*key))?;
    }
    for key in keys.iter().rev() {
        send(&EventType::KeyRelease(*key))?;
    }
    Ok(())
}

/// Paste `text` into the focused window through the clipboard.
///
/// The previous clipboard text, if any, is restored afterwards.
#[instrument(skip(text), fields(len = text.len()))]
pub fn type_text(text: &str) -> Result<(), InputError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| InputError::Clipboard(e.to_string()))?;
    let original = clipboard.get_text().ok();

    clipboard
        .set_text(text.to_string())
        .map_err(|e| InputError::Clipboard(e.to_string()))?;
    hotkey(&[Key::ControlLeft, Key::KeyV])?;
    thread::sleep(Duration::from_millis(100));

    if let Some(original) = original {
        clipboard
            .set_text(original)
            .map_err(|e| InputError::Clipboard(e.to_string()))?;
    }
    Ok(())
}

/// Minimize all windows (Win+D).
pub fn show_desktop() -> Result<(), InputError> {
    hotkey(&[Key::MetaLeft, Key::KeyD])?;
    thread::sleep(Duration::from_millis(500));
    Ok(())
}
