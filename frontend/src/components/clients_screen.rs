use manik_client::domain::{ClientGroup, RangePreset};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::bottom_sheet::BottomSheet;
use super::{input_value, ScreenProps};
use crate::hooks::{use_shared_stores, use_subscription};

#[function_component(ClientsScreen)]
pub fn clients_screen(props: &ScreenProps) -> Html {
    let ctx = props.ctx.clone();
    use_shared_stores(&ctx);
    {
        let clients = ctx.clients.clone();
        use_subscription(move |rerender| {
            let id = clients.subscribe(move |_| rerender.emit(()));
            move || {
                clients.unsubscribe(id);
            }
        });
    }

    let revision = ctx.cache.revision();
    {
        let ctx = ctx.clone();
        use_effect_with(revision, move |_| {
            spawn_local(async move {
                if let Err(e) = ctx.clients.refresh().await {
                    ctx.toasts.failure(&e);
                }
            });
            || ()
        });
    }

    let custom_start = use_state(String::new);
    let custom_end = use_state(String::new);
    let delete_link = use_state(String::new);

    let load = |preset: RangePreset| {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            let preset = preset.clone();
            spawn_local(async move {
                if let Err(e) = ctx.clients.load(preset).await {
                    ctx.toasts.failure(&e);
                }
            });
        })
    };
    let custom = RangePreset::Custom {
        start: (*custom_start).clone(),
        end: (*custom_end).clone(),
    };

    let on_search = {
        let clients = ctx.clients.clone();
        Callback::from(move |e: InputEvent| clients.set_search(&input_value(&e)))
    };

    let on_delete = {
        let ctx = ctx.clone();
        let delete_link = delete_link.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let delete_link = delete_link.clone();
            let link = (*delete_link).clone();
            spawn_local(async move {
                match ctx.clients.delete_by_link(&link).await {
                    Ok(()) => {
                        ctx.toasts.info("Клиент удален");
                        delete_link.set(String::new());
                    }
                    Err(e) => ctx.toasts.failure(&e),
                }
            });
        })
    };

    let state = ctx.clients.state();
    let visible = ctx.clients.visible();
    let history = ctx.clients.history();
    let history_open = history.is_some();
    let close_history = {
        let clients = ctx.clients.clone();
        Callback::from(move |_: ()| clients.close_history())
    };

    let render_group = |group: &ClientGroup| {
        let clients = ctx.clients.clone();
        let key = group.key.clone();
        html! {
            <div class="card client-card" key={group.key.clone()}>
                <div>
                    <div class="title">{ group.name.clone() }</div>
                    <div class="hint">{ group.link.clone() }</div>
                    <div class="hint">{ format!("Посещений: {}", group.visit_count()) }</div>
                </div>
                <button class="link" onclick={Callback::from(move |_: MouseEvent| {
                    clients.open_history(&key)
                })}>
                    { "Открыть" }
                </button>
            </div>
        }
    };

    let bind = |handle: &UseStateHandle<String>| {
        let handle = handle.clone();
        Callback::from(move |e: InputEvent| handle.set(input_value(&e)))
    };

    html! {
        <div class="screen clients-screen">
            <header class="screen-header">
                <div>
                    <div class="hint">{ "Клиенты" }</div>
                    <h1>{ "Клиентская база" }</h1>
                </div>
            </header>

            <input
                class="search"
                placeholder="Поиск по имени или @username"
                value={state.search.clone()}
                oninput={on_search}
            />

            <div class="presets">
                <button onclick={load(RangePreset::History)}>{ "За год" }</button>
                <button onclick={load(RangePreset::Today)}>{ "Сегодня" }</button>
                <button onclick={load(RangePreset::Week)}>{ "Неделя" }</button>
                <button onclick={load(RangePreset::AllUpcoming)}>{ "Все будущие" }</button>
            </div>
            <div class="range">
                <input type="date" value={(*custom_start).clone()} oninput={bind(&custom_start)} />
                <input type="date" value={(*custom_end).clone()} oninput={bind(&custom_end)} />
                <button onclick={load(custom)}>{ "Показать" }</button>
            </div>

            if state.loading {
                <div class="card hint">{ "Загрузка клиентов..." }</div>
            } else if visible.is_empty() {
                <div class="card hint">{ "Клиенты не найдены." }</div>
            } else {
                { for visible.iter().map(render_group) }
            }

            <form class="card delete-form" onsubmit={on_delete}>
                <h2>{ "Удалить клиента" }</h2>
                <input
                    placeholder="@username"
                    value={(*delete_link).clone()}
                    oninput={bind(&delete_link)}
                />
                <button type="submit" class="danger">{ "Удалить" }</button>
            </form>

            <BottomSheet open={history_open} title="История записей" on_close={close_history}>
                if let Some(group) = history {
                    <div class="title">{ group.name.clone() }</div>
                    <div class="hint">{ group.link.clone() }</div>
                    <div class="visits">
                        { for group.visits.iter().map(|visit| html! {
                            <div class="list-item" key={visit.booking_id}>
                                <span>{ visit.day_label() }</span>
                                <span class="time">{ visit.time.clone() }</span>
                            </div>
                        }) }
                    </div>
                } else {
                    <div class="hint">{ "Нет данных." }</div>
                }
            </BottomSheet>
        </div>
    }
}
