use shared::ScreenKey;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct TabBarProps {
    pub active: ScreenKey,
    pub on_select: Callback<ScreenKey>,
}

#[function_component(TabBar)]
pub fn tab_bar(props: &TabBarProps) -> Html {
    html! {
        <nav class="tab-bar">
            { for ScreenKey::ALL.iter().map(|key| {
                let key = *key;
                let on_select = props.on_select.clone();
                let class = classes!("tab", (key == props.active).then_some("active"));
                html! {
                    <button {class} onclick={Callback::from(move |_: MouseEvent| on_select.emit(key))}>
                        { key.label() }
                    </button>
                }
            }) }
        </nav>
    }
}
