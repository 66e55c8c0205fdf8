use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct BottomSheetProps {
    pub open: bool,
    pub title: AttrValue,
    pub on_close: Callback<()>,
    #[prop_or_default]
    pub children: Html,
}

#[function_component(BottomSheet)]
pub fn bottom_sheet(props: &BottomSheetProps) -> Html {
    if !props.open {
        return html! {};
    }
    let on_backdrop = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };
    let stop = Callback::from(|e: MouseEvent| e.stop_propagation());

    html! {
        <div class="sheet-backdrop" onclick={on_backdrop.clone()}>
            <div class="sheet" onclick={stop}>
                <div class="sheet-header">
                    <h2>{ props.title.clone() }</h2>
                    <button class="sheet-close" onclick={on_backdrop}>{ "✕" }</button>
                </div>
                <div class="sheet-body">{ props.children.clone() }</div>
            </div>
        </div>
    }
}
