//! DOM mouse events to sandbox pointer events.

use picboard_core::{PointerButton, RawPointerEvent};
use web_sys::{Element, MouseEvent};

/// Converts client coordinates to coordinates relative to `rect_left/top`.
pub fn to_canvas_space(client_x: i32, client_y: i32, rect_left: f64, rect_top: f64) -> (f64, f64) {
    (f64::from(client_x) - rect_left, f64::from(client_y) - rect_top)
}

/// Builds a raw event positioned relative to `canvas`, so listeners on the
/// document report canvas coordinates too.
pub fn raw_event(canvas: &Element, e: &MouseEvent) -> RawPointerEvent {
    let rect = canvas.get_bounding_client_rect();
    let (x, y) = to_canvas_space(e.client_x(), e.client_y(), rect.left(), rect.top());
    RawPointerEvent::new(x, y, e.time_stamp(), PointerButton::from_dom(e.button()), e.buttons())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn test_to_canvas_space() {
        assert_eq!(to_canvas_space(120, 80, 20.0, 30.5), (100.0, 49.5));
        assert_eq!(to_canvas_space(0, 0, 10.0, 10.0), (-10.0, -10.0));
    }

    #[wasm_bindgen_test]
    fn test_dom_button_numbers() {
        assert_eq!(PointerButton::from_dom(0), PointerButton::Left);
        assert_eq!(PointerButton::from_dom(1), PointerButton::Middle);
        assert_eq!(PointerButton::from_dom(2), PointerButton::Right);
        assert_eq!(PointerButton::from_dom(4), PointerButton::Other(4));
    }
}
