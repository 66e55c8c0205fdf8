use yew::prelude::*;

use super::ScreenProps;

/// Renders the newest toast; tap to dismiss
#[function_component(ToastHost)]
pub fn toast_host(props: &ScreenProps) -> Html {
    let update = use_force_update();
    {
        let toasts = props.ctx.toasts.clone();
        use_effect_with((), move |_| {
            toasts.set_listener(Some(Callback::from(move |_| update.force_update())));
            move || toasts.set_listener(None)
        });
    }

    let Some((message, is_error)) = props.ctx.toasts.visible() else {
        return html! {};
    };
    let dismiss = {
        let toasts = props.ctx.toasts.clone();
        Callback::from(move |_: MouseEvent| toasts.dismiss())
    };
    html! {
        <div class={classes!("toast", is_error.then_some("error"))} onclick={dismiss}>
            { message }
        </div>
    }
}
