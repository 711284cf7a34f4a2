//! Main application component.

use yew::prelude::*;

use crate::canvas::SandboxCanvas;
use crate::storage;

#[function_component(App)]
pub fn app() -> Html {
    let config = use_memo((), |()| storage::load_config());

    html! {
        <SandboxCanvas config={(*config).clone()} />
    }
}
