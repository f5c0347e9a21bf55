/// Toolbar popup: a single way into the dashboard

use crate::bridge;
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    let error = use_state(|| None::<String>);

    let on_open = {
        let error = error.clone();
        Callback::from(move |_: MouseEvent| {
            let error = error.clone();
            spawn_local(async move {
                if let Err(e) = bridge::openOptionsPage().await {
                    log::warn!("Failed to open dashboard: {:?}", e);
                    error.set(Some("Could not open the dashboard".to_string()));
                }
            });
        })
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"AI Response Logger"}</h1>

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={err} inline={true}>
                </Alert>
            }

            <Button onclick={on_open} variant={ButtonVariant::Primary} block={true}>
                {"Open dashboard"}
            </Button>

            <p class="footer-popup">
                {concat!("AI Response Logger v", env!("CARGO_PKG_VERSION"))}
            </p>
        </div>
    }
}
