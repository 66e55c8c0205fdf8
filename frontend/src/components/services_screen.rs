use manik_client::domain::service_summary;
use yew::prelude::*;

use super::bottom_sheet::BottomSheet;
use super::{input_value, ScreenProps};
use crate::hooks::use_subscription;

#[function_component(ServicesScreen)]
pub fn services_screen(props: &ScreenProps) -> Html {
    let ctx = props.ctx.clone();
    {
        let ctx = ctx.clone();
        use_subscription(move |rerender| {
            let sheet_id = {
                let rerender = rerender.clone();
                ctx.services_screen.subscribe(move |_| rerender.emit(()))
            };
            let list_id = ctx.services.subscribe(move |_| rerender.emit(()));
            move || {
                ctx.services_screen.unsubscribe(sheet_id);
                ctx.services.unsubscribe(list_id);
            }
        });
    }

    let screen = ctx.services_screen.clone();
    let sheet = screen.sheet();

    let open_create = {
        let screen = screen.clone();
        Callback::from(move |_: MouseEvent| screen.open_create())
    };
    let close = {
        let screen = screen.clone();
        Callback::from(move |_: ()| screen.close())
    };
    let on_save = {
        let screen = screen.clone();
        let toasts = ctx.toasts.clone();
        Callback::from(move |_: MouseEvent| {
            if let Err(e) = screen.save() {
                toasts.failure(&e);
            }
        })
    };
    let on_title = {
        let screen = screen.clone();
        Callback::from(move |e: InputEvent| {
            let value = input_value(&e);
            screen.edit_draft(|d| d.title = value);
        })
    };
    let on_duration = {
        let screen = screen.clone();
        Callback::from(move |e: InputEvent| {
            let value = input_value(&e);
            screen.edit_draft(|d| d.duration_minutes = value);
        })
    };
    let on_price = {
        let screen = screen.clone();
        Callback::from(move |e: InputEvent| {
            let value = input_value(&e);
            screen.edit_draft(|d| d.price = value);
        })
    };

    let services = screen.services();
    html! {
        <div class="screen services-screen">
            <header class="screen-header">
                <div>
                    <div class="hint">{ "Услуги" }</div>
                    <h1>{ "Ваши услуги" }</h1>
                </div>
                <button onclick={open_create}>{ "Добавить" }</button>
            </header>

            if services.is_empty() {
                <div class="card hint">{ "Добавьте первую услугу." }</div>
            }
            { for services.iter().map(|service| {
                let edit = {
                    let screen = screen.clone();
                    let id = service.id.clone();
                    Callback::from(move |_: MouseEvent| {
                        screen.open_edit(&id);
                    })
                };
                let remove = {
                    let screen = screen.clone();
                    let toasts = ctx.toasts.clone();
                    let id = service.id.clone();
                    Callback::from(move |_: MouseEvent| {
                        if let Err(e) = screen.remove(&id) {
                            toasts.failure(&e);
                        }
                    })
                };
                html! {
                    <div class="card service-card" key={service.id.clone()}>
                        <div>
                            <div class="title">{ service.title.clone() }</div>
                            <div class="hint">{ service_summary(service) }</div>
                        </div>
                        <div class="actions">
                            <button onclick={edit}>{ "Изменить" }</button>
                            <button class="link" onclick={remove}>{ "Удалить" }</button>
                        </div>
                    </div>
                }
            }) }

            <BottomSheet open={sheet.open} title={screen.sheet_title()} on_close={close}>
                <label>
                    <span class="hint">{ "Название" }</span>
                    <input
                        value={sheet.draft.title.clone()}
                        placeholder="Маникюр + покрытие"
                        oninput={on_title}
                    />
                </label>
                <div class="row">
                    <label>
                        <span class="hint">{ "Длительность, мин" }</span>
                        <input
                            type="number"
                            value={sheet.draft.duration_minutes.clone()}
                            oninput={on_duration}
                        />
                    </label>
                    <label>
                        <span class="hint">{ "Цена, ₽" }</span>
                        <input type="number" value={sheet.draft.price.clone()} oninput={on_price} />
                    </label>
                </div>
                <button class="primary" onclick={on_save}>{ screen.save_label() }</button>
            </BottomSheet>
        </div>
    }
}
