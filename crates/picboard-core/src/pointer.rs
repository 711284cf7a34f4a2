//! Pointer input normalization.
//!
//! Turns raw device events into [`PointerEvent`]s, tracks which buttons are
//! held, keeps move and click history, and dispatches to one listener per
//! event type.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::transform::HandleSlot;
use crate::vector::Vector2;

/// Mouse button, numbered like DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other(i16),
}

impl PointerButton {
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => PointerButton::Left,
            1 => PointerButton::Middle,
            2 => PointerButton::Right,
            other => PointerButton::Other(other),
        }
    }
}

/// One event as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPointerEvent {
    pub x: f64,
    pub y: f64,
    /// Milliseconds, host clock.
    pub timestamp: f64,
    /// Button that changed state (meaningless for moves).
    pub button: PointerButton,
    /// DOM `MouseEvent.buttons` bitmask of buttons currently held.
    pub buttons: u16,
}

impl RawPointerEvent {
    pub fn new(x: f64, y: f64, timestamp: f64, button: PointerButton, buttons: u16) -> Self {
        Self {
            x,
            y,
            timestamp,
            button,
            buttons,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventType {
    Down,
    Up,
    Move,
    Click,
    ContextMenu,
}

/// Normalized pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventType,
    pub position: Vector2,
    pub timestamp: f64,
    pub button: PointerButton,
    /// Buttons held after this event was applied.
    pub pressed: Vec<PointerButton>,
}

/// A completed down→up pair for one button.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRecord {
    pub button: PointerButton,
    pub start: Vector2,
    pub start_time: f64,
    pub end: Vector2,
    pub end_time: f64,
}

/// Something pointer input can hover or grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Image(EntityId),
    Handle(HandleSlot),
}

/// Cursor style shown over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
        }
    }
}

type Listener = Box<dyn FnMut(&PointerEvent)>;

/// Pointer state machine and event history.
pub struct PointerInput {
    position: Option<Vector2>,
    pressed: Vec<PointerButton>,
    pending_down: HashMap<PointerButton, PointerEvent>,
    move_history: VecDeque<PointerEvent>,
    click_history: VecDeque<ClickRecord>,
    max_history: Option<usize>,
    listeners: HashMap<PointerEventType, Listener>,
    /// Last hit-tested target under the pointer.
    pub hover: Option<EntityRef>,
    /// Target that received the last down event.
    pub active: Option<EntityRef>,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PointerInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerInput")
            .field("position", &self.position)
            .field("pressed", &self.pressed)
            .field("moves", &self.move_history.len())
            .field("clicks", &self.click_history.len())
            .field("hover", &self.hover)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl PointerInput {
    /// Unbounded history.
    pub fn new() -> Self {
        Self {
            position: None,
            pressed: Vec::new(),
            pending_down: HashMap::new(),
            move_history: VecDeque::new(),
            click_history: VecDeque::new(),
            max_history: None,
            listeners: HashMap::new(),
            hover: None,
            active: None,
        }
    }

    /// Keeps at most `limit` move and click records, dropping the oldest.
    pub fn with_history_limit(limit: Option<usize>) -> Self {
        Self {
            max_history: limit,
            ..Self::new()
        }
    }

    /// Registers the listener for `kind`, replacing any previous one.
    pub fn on(
        &mut self,
        kind: PointerEventType,
        listener: impl FnMut(&PointerEvent) + 'static,
    ) -> &mut Self {
        self.listeners.insert(kind, Box::new(listener));
        self
    }

    pub fn position(&self) -> Option<Vector2> {
        self.position
    }

    pub fn is_down(&self, button: PointerButton) -> bool {
        self.pressed.contains(&button)
    }

    pub fn pressed(&self) -> &[PointerButton] {
        &self.pressed
    }

    pub fn handle_down(&mut self, raw: RawPointerEvent) -> PointerEvent {
        if !self.is_down(raw.button) {
            self.pressed.push(raw.button);
        }
        let event = self.event(PointerEventType::Down, raw);
        self.pending_down.insert(raw.button, event.clone());
        self.trigger(&event);
        event
    }

    pub fn handle_up(&mut self, raw: RawPointerEvent) -> PointerEvent {
        self.pressed.retain(|b| *b != raw.button);
        let event = self.event(PointerEventType::Up, raw);

        if let Some(down) = self.pending_down.remove(&raw.button) {
            self.click_history.push_back(ClickRecord {
                button: raw.button,
                start: down.position,
                start_time: down.timestamp,
                end: event.position,
                end_time: event.timestamp,
            });
            trim(&mut self.click_history, self.max_history);
        }

        self.trigger(&event);
        event
    }

    pub fn handle_move(&mut self, raw: RawPointerEvent) -> PointerEvent {
        self.position = Some(Vector2::new(raw.x, raw.y));
        // Buttons released outside the tracked surface never sent an up.
        if raw.buttons == 0 {
            self.pressed.clear();
        }
        let event = self.event(PointerEventType::Move, raw);
        self.move_history.push_back(event.clone());
        trim(&mut self.move_history, self.max_history);
        self.trigger(&event);
        event
    }

    pub fn handle_click(&mut self, raw: RawPointerEvent) -> PointerEvent {
        let event = self.event(PointerEventType::Click, raw);
        self.trigger(&event);
        event
    }

    pub fn handle_context_menu(&mut self, raw: RawPointerEvent) -> PointerEvent {
        let event = self.event(PointerEventType::ContextMenu, raw);
        self.trigger(&event);
        event
    }

    pub fn move_history(&self) -> &VecDeque<PointerEvent> {
        &self.move_history
    }

    /// `n > 0`: n-th move from the start (1-indexed). `n < 0`: n-th from the
    /// end. `0` or out of range: `None`.
    pub fn move_at(&self, n: isize) -> Option<&PointerEvent> {
        nth(&self.move_history, n)
    }

    pub fn click_history(&self) -> &VecDeque<ClickRecord> {
        &self.click_history
    }

    /// Like [`move_at`](Self::move_at), optionally counting only clicks of `button`.
    pub fn click_at(&self, n: isize, button: Option<PointerButton>) -> Option<&ClickRecord> {
        let Some(button) = button else {
            return nth(&self.click_history, n);
        };
        let index = n.unsigned_abs().checked_sub(1)?;
        let mut matching = self.click_history.iter().filter(|c| c.button == button);
        if n > 0 {
            matching.nth(index)
        } else {
            matching.rev().nth(index)
        }
    }

    pub fn last_click(&self, button: PointerButton) -> Option<&ClickRecord> {
        self.click_at(-1, Some(button))
    }

    /// Pointer over an interactive target, default otherwise.
    pub fn cursor(&self) -> Cursor {
        if self.hover.is_some() {
            Cursor::Pointer
        } else {
            Cursor::Default
        }
    }

    fn event(&self, kind: PointerEventType, raw: RawPointerEvent) -> PointerEvent {
        PointerEvent {
            kind,
            position: Vector2::new(raw.x, raw.y),
            timestamp: raw.timestamp,
            button: raw.button,
            pressed: self.pressed.clone(),
        }
    }

    fn trigger(&mut self, event: &PointerEvent) {
        if let Some(listener) = self.listeners.get_mut(&event.kind) {
            listener(event);
        }
    }
}

fn nth<T>(items: &VecDeque<T>, n: isize) -> Option<&T> {
    let offset = n.unsigned_abs();
    match n.signum() {
        1 => items.get(offset - 1),
        -1 => items.len().checked_sub(offset).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn trim<T>(items: &mut VecDeque<T>, limit: Option<usize>) {
    if let Some(limit) = limit {
        while items.len() > limit {
            items.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn raw(x: f64, y: f64, button: PointerButton, buttons: u16) -> RawPointerEvent {
        RawPointerEvent::new(x, y, x + y, button, buttons)
    }

    fn mv(x: f64, y: f64) -> RawPointerEvent {
        raw(x, y, PointerButton::Left, 0)
    }

    #[test]
    fn test_button_set_has_no_duplicates() {
        let mut input = PointerInput::new();
        input.handle_down(raw(0.0, 0.0, PointerButton::Left, 1));
        input.handle_down(raw(0.0, 0.0, PointerButton::Left, 1));

        assert!(input.is_down(PointerButton::Left));
        assert_eq!(input.pressed(), &[PointerButton::Left]);

        input.handle_up(raw(0.0, 0.0, PointerButton::Left, 0));
        assert!(!input.is_down(PointerButton::Left));
    }

    #[test]
    fn test_move_without_buttons_clears_pressed() {
        let mut input = PointerInput::new();
        input.handle_down(raw(0.0, 0.0, PointerButton::Middle, 4));
        input.handle_move(raw(1.0, 1.0, PointerButton::Left, 4));
        assert!(input.is_down(PointerButton::Middle));

        input.handle_move(mv(2.0, 2.0));
        assert!(input.pressed().is_empty());
    }

    #[test]
    fn test_move_history_indexing() {
        let mut input = PointerInput::new();
        assert!(input.move_at(1).is_none());
        assert!(input.move_at(-1).is_none());

        for i in 0..5_u32 {
            input.handle_move(mv(f64::from(i), 0.0));
        }

        assert_eq!(input.move_at(1).unwrap().position.x, 0.0);
        assert_eq!(input.move_at(-1).unwrap().position.x, 4.0);
        assert_eq!(input.move_at(-2).unwrap().position.x, 3.0);
        assert_eq!(input.move_at(5).unwrap().position.x, 4.0);
        assert!(input.move_at(6).is_none());
        assert!(input.move_at(-6).is_none());
        assert!(input.move_at(0).is_none());
        assert_eq!(input.move_history().len(), 5);
        assert_eq!(input.position(), Some(Vector2::new(4.0, 0.0)));
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let mut input = PointerInput::with_history_limit(Some(3));
        for i in 0..10_u32 {
            input.handle_move(mv(f64::from(i), 0.0));
        }
        assert_eq!(input.move_history().len(), 3);
        assert_eq!(input.move_at(1).unwrap().position.x, 7.0);
        assert_eq!(input.move_at(-1).unwrap().position.x, 9.0);
    }

    #[test]
    fn test_click_history_pairs_down_and_up() {
        let mut input = PointerInput::new();
        input.handle_down(raw(1.0, 2.0, PointerButton::Left, 1));
        input.handle_up(raw(3.0, 4.0, PointerButton::Left, 0));
        input.handle_down(raw(5.0, 6.0, PointerButton::Right, 2));
        input.handle_up(raw(7.0, 8.0, PointerButton::Right, 0));
        input.handle_down(raw(9.0, 9.0, PointerButton::Left, 1));
        input.handle_up(raw(10.0, 10.0, PointerButton::Left, 0));
        // Up without a down is not a click
        input.handle_up(raw(0.0, 0.0, PointerButton::Middle, 0));

        assert_eq!(input.click_history().len(), 3);

        let first = input.click_at(1, None).unwrap();
        assert_eq!(first.start, Vector2::new(1.0, 2.0));
        assert_eq!(first.end, Vector2::new(3.0, 4.0));

        assert_eq!(input.click_at(-1, None).unwrap().start.x, 9.0);
        assert_eq!(input.click_at(2, Some(PointerButton::Left)).unwrap().start.x, 9.0);
        assert_eq!(input.click_at(-2, Some(PointerButton::Left)).unwrap().start.x, 1.0);
        assert!(input.click_at(2, Some(PointerButton::Right)).is_none());
        assert_eq!(input.last_click(PointerButton::Right).unwrap().end.x, 7.0);
        assert!(input.last_click(PointerButton::Middle).is_none());
    }

    #[test]
    fn test_listener_registration_replaces_previous() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut input = PointerInput::new();

        let first = log.clone();
        input.on(PointerEventType::Move, move |_| first.borrow_mut().push("first"));
        let second = log.clone();
        input.on(PointerEventType::Move, move |_| second.borrow_mut().push("second"));

        input.handle_move(mv(0.0, 0.0));
        input.handle_click(raw(0.0, 0.0, PointerButton::Left, 0));

        assert_eq!(log.borrow().as_slice(), &["second"]);
    }

    #[test]
    fn test_cursor_follows_hover() {
        let mut input = PointerInput::new();
        assert_eq!(input.cursor(), Cursor::Default);
        input.hover = Some(EntityRef::Handle(HandleSlot::TopLeft));
        assert_eq!(input.cursor().as_css(), "pointer");
    }
}
