//! Image loading through `HtmlImageElement`.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use picboard_core::{ImageLoader, LoadFailure, LoadedImage};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::HtmlImageElement;

use crate::renderer::SharedRegistry;

/// Loads images by URI and registers them for drawing.
pub struct HtmlImageLoader {
    registry: SharedRegistry,
}

impl HtmlImageLoader {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }
}

type Sender = Rc<RefCell<Option<oneshot::Sender<Result<(), String>>>>>;

fn settle(sender: &Sender, outcome: Result<(), String>) {
    if let Some(tx) = sender.borrow_mut().take() {
        // Receiver gone means nobody is waiting for this image anymore
        let _ = tx.send(outcome);
    }
}

impl ImageLoader for HtmlImageLoader {
    fn load(&self, uri: &str) -> impl Future<Output = Result<LoadedImage, LoadFailure>> {
        let registry = self.registry.clone();
        let uri = uri.to_string();

        async move {
            let element = match HtmlImageElement::new() {
                Ok(element) => element,
                Err(e) => return Err(LoadFailure::Host(format!("{e:?}"))),
            };

            let (tx, rx) = oneshot::channel();
            let sender: Sender = Rc::new(RefCell::new(Some(tx)));

            let onload = {
                let sender = sender.clone();
                Closure::<dyn FnMut()>::new(move || settle(&sender, Ok(())))
            };
            let onerror = {
                let sender = sender.clone();
                let uri = uri.clone();
                Closure::<dyn FnMut()>::new(move || {
                    settle(&sender, Err(format!("could not load {uri}")));
                })
            };

            element.set_onload(Some(onload.as_ref().unchecked_ref()));
            element.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            element.set_src(&uri);

            let outcome = rx.await;
            element.set_onload(None);
            element.set_onerror(None);
            drop((onload, onerror));

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(message)) => return Err(LoadFailure::Resource(message)),
                Err(_) => return Err(LoadFailure::Host("load callback dropped".to_string())),
            }

            let (width, height) = (element.natural_width(), element.natural_height());
            if width == 0 || height == 0 {
                return Err(LoadFailure::Empty { width, height });
            }

            let drawable = registry.borrow_mut().register(element);
            tracing::debug!("Loaded {} ({}x{}) as {:?}", uri, width, height, drawable);
            Ok(LoadedImage {
                pixel_width: width,
                pixel_height: height,
                drawable,
            })
        }
    }
}
