//! Full-window canvas component hosting the sandbox.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions};
use picboard_core::{
    Cursor, EntityKind, ImageCollection, ImageLoader, ImageSpec, RawPointerEvent, Sandbox,
    SandboxCommand, SandboxConfig,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlCanvasElement, KeyboardEvent, MouseEvent, Window};
use yew::prelude::*;

use crate::input;
use crate::loader::HtmlImageLoader;
use crate::renderer::{Context2dSurface, SharedRegistry};

#[derive(Properties, PartialEq)]
pub struct SandboxCanvasProps {
    pub config: SandboxConfig,
}

#[function_component(SandboxCanvas)]
pub fn sandbox_canvas(props: &SandboxCanvasProps) -> Html {
    let canvas_ref = use_node_ref();

    // Start the sandbox once the canvas is mounted; restart on config change
    {
        let canvas_ref = canvas_ref.clone();
        use_effect_with(props.config.clone(), move |config| {
            let host = canvas_ref.cast::<HtmlCanvasElement>().and_then(|canvas| {
                match SandboxHost::start(canvas, config.clone()) {
                    Ok(host) => Some(host),
                    Err(e) => {
                        tracing::error!("Failed to start sandbox: {:?}", e);
                        None
                    }
                }
            });
            move || drop(host)
        });
    }

    html! {
        <canvas ref={canvas_ref} class="picboard-canvas" />
    }
}

/// Handles shared by every DOM callback.
#[derive(Clone)]
struct HostState {
    sandbox: Rc<RefCell<Sandbox>>,
    loader: Rc<HtmlImageLoader>,
    registry: SharedRegistry,
    canvas: HtmlCanvasElement,
    cursor: Rc<Cell<Cursor>>,
}

impl HostState {
    /// Listener that feeds mouse events on `target` into the sandbox.
    fn listen(
        &self,
        target: &web_sys::EventTarget,
        event_type: &'static str,
        prevent_default: bool,
        dispatch: fn(&mut Sandbox, RawPointerEvent) -> Option<SandboxCommand>,
    ) -> EventListener {
        let state = self.clone();
        let options = if prevent_default {
            EventListenerOptions::enable_prevent_default()
        } else {
            EventListenerOptions::default()
        };

        EventListener::new_with_options(target, event_type, options, move |event: &Event| {
            let Some(e) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            if prevent_default {
                e.prevent_default();
            }
            let raw = input::raw_event(&state.canvas, e);
            let command = dispatch(&mut state.sandbox.borrow_mut(), raw);
            state.sync_cursor();
            if let Some(command) = command {
                state.run(command);
            }
        })
    }

    fn sync_cursor(&self) {
        let cursor = self.sandbox.borrow().cursor();
        if self.cursor.replace(cursor) == cursor {
            return;
        }
        if let Err(e) = self.canvas.style().set_property("cursor", cursor.as_css()) {
            tracing::error!("Failed to set cursor: {:?}", e);
        }
    }

    fn run(&self, command: SandboxCommand) {
        match command {
            SandboxCommand::CreateImage(spec) => {
                let state = self.clone();
                spawn_local(async move { state.create_image(spec).await });
            }
        }
    }

    /// Deletes the selected images and frees their decoded elements.
    fn delete_selected(&self) {
        let removed = self.sandbox.borrow_mut().delete_selected();
        if removed.is_empty() {
            return;
        }
        let mut registry = self.registry.borrow_mut();
        for image in &removed {
            if let EntityKind::Image(data) = &image.kind {
                registry.unregister(data.drawable);
            }
        }
        drop(registry);
        self.sync_cursor();
    }

    /// No sandbox borrow is held while the image loads.
    async fn create_image(self, spec: ImageSpec) {
        let pending = ImageCollection::prepare(spec);
        let loaded = self.loader.load(pending.uri()).await;
        let result = self.sandbox.borrow_mut().complete_image(pending, loaded);
        if let Err(e) = result {
            tracing::error!("Failed to create image: {}", e);
        }
    }
}

/// DOM listeners and the animation-frame loop for one mounted canvas.
/// Dropping it detaches everything.
struct SandboxHost {
    _listeners: Vec<EventListener>,
    running: Rc<Cell<bool>>,
    frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
    frame_id: Rc<Cell<Option<i32>>>,
}

impl SandboxHost {
    fn start(canvas: HtmlCanvasElement, config: SandboxConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;

        let registry = SharedRegistry::default();
        let surface = Context2dSurface::new(canvas.clone(), registry.clone())?;
        fit_to_window(&window, &surface);
        let surface = Rc::new(RefCell::new(surface));

        let state = HostState {
            sandbox: Rc::new(RefCell::new(Sandbox::new(config))),
            loader: Rc::new(HtmlImageLoader::new(registry.clone())),
            registry,
            canvas: canvas.clone(),
            cursor: Rc::new(Cell::new(Cursor::Default)),
        };

        // Moves and releases are tracked on the document so drags continue
        // outside the canvas.
        let resized = Rc::new(Cell::new(false));
        let listeners = vec![
            state.listen(&canvas, "mousedown", true, |sandbox, raw| sandbox.pointer_down(raw)),
            state.listen(&document, "mousemove", false, |sandbox, raw| {
                sandbox.pointer_move(raw);
                None
            }),
            state.listen(&document, "mouseup", false, |sandbox, raw| {
                sandbox.pointer_up(raw);
                None
            }),
            state.listen(&canvas, "click", false, |sandbox, raw| {
                sandbox.pointer_click(raw);
                None
            }),
            state.listen(&canvas, "contextmenu", true, |sandbox, raw| {
                sandbox.pointer_context_menu(raw);
                None
            }),
            {
                let state = state.clone();
                EventListener::new(&document, "keydown", move |event: &Event| {
                    let Some(e) = event.dyn_ref::<KeyboardEvent>() else {
                        return;
                    };
                    if matches!(e.key().as_str(), "Delete" | "Backspace") {
                        state.delete_selected();
                    }
                })
            },
            {
                let resized = resized.clone();
                EventListener::new(&window, "resize", move |_| resized.set(true))
            },
        ];

        let running = Rc::new(Cell::new(true));
        let frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let frame_id = Rc::new(Cell::new(None));

        {
            let running = running.clone();
            let frame_clone = frame.clone();
            let frame_id = frame_id.clone();
            let sandbox = state.sandbox.clone();

            *frame.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
                if !running.get() {
                    return;
                }
                let Some(window) = web_sys::window() else {
                    return;
                };

                let mut surface = surface.borrow_mut();
                if resized.replace(false) {
                    fit_to_window(&window, &surface);
                }
                sandbox.borrow().draw_frame(&mut *surface);

                if let Some(ref cb) = *frame_clone.borrow() {
                    frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
                }
            }));
        }

        if let Some(ref cb) = *frame.borrow() {
            frame_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
        }

        tracing::info!("Sandbox started");
        Ok(Self {
            _listeners: listeners,
            running,
            frame,
            frame_id,
        })
    }
}

impl Drop for SandboxHost {
    fn drop(&mut self) {
        self.running.set(false);
        if let (Some(id), Some(window)) = (self.frame_id.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(id);
        }
        // The frame closure holds a handle to itself
        self.frame.borrow_mut().take();
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fit_to_window(window: &Window, surface: &Context2dSurface) {
    let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0) as u32;
    let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0) as u32;
    surface.resize(w, h);
}
