use manik_client::domain::BookingForm;
use shared::PrepaymentChoice;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::bottom_sheet::BottomSheet;
use super::{input_value, select_value, ScreenProps};
use crate::context::AppContext;
use crate::hooks::{use_shared_stores, use_subscription};
use crate::services::telegram::NativeButton;

fn submit(ctx: AppContext) {
    spawn_local(async move {
        match ctx.booking_sheet.submit().await {
            Ok(()) => ctx.toasts.info("Запись сохранена"),
            Err(e) => ctx.toasts.failure(&e),
        }
    });
}

fn prepayment_mode(choice: &PrepaymentChoice) -> &'static str {
    match choice {
        PrepaymentChoice::None => "none",
        PrepaymentChoice::Paid => "paid",
        PrepaymentChoice::Amount(_) => "amount",
    }
}

/// Create/edit/delete sheet, shown while the app store says it is open
#[function_component(BookingSheet)]
pub fn booking_sheet(props: &ScreenProps) -> Html {
    let ctx = props.ctx.clone();
    use_shared_stores(&ctx);
    {
        let sheet = ctx.booking_sheet.clone();
        use_subscription(move |rerender| {
            let id = sheet.subscribe(move |_| rerender.emit(()));
            move || {
                sheet.unsubscribe(id);
            }
        });
    }

    let app = ctx.app.state();
    let open = app.booking_open;

    {
        let ctx = ctx.clone();
        use_effect_with((open, app.editing_booking_id), move |(open, _)| {
            if *open {
                spawn_local(async move {
                    if let Err(e) = ctx.booking_sheet.open(&ctx.today).await {
                        ctx.toasts.failure(&e);
                    }
                });
            }
            || ()
        });
    }

    let state = ctx.booking_sheet.state();
    let button_text = ctx.booking_sheet.main_button_text();

    // Telegram buttons live only while the sheet is open
    let native = use_state(|| false);
    {
        let ctx = ctx.clone();
        let native = native.clone();
        use_effect_with((open, button_text, state.submitting), move |(open, text, busy)| {
            let mut buttons = Vec::new();
            if *open {
                let main_ctx = ctx.clone();
                if let Some(button) = NativeButton::main(text, move || submit(main_ctx.clone())) {
                    button.set_progress(*busy);
                    buttons.push(button);
                }
                let app = ctx.app.clone();
                if let Some(button) = NativeButton::back(move || app.close_booking()) {
                    buttons.push(button);
                }
            }
            native.set(!buttons.is_empty());
            move || drop(buttons)
        });
    }
    let on_close = {
        let app = ctx.app.clone();
        Callback::from(move |_: ()| app.close_booking())
    };

    if !open {
        return html! {};
    }

    let form = state.form.clone();
    let text_field = |apply: fn(&mut BookingForm, String)| {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |e: InputEvent| {
            let value = input_value(&e);
            sheet.edit_form(|form| apply(form, value));
        })
    };

    let on_service = {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |e: Event| sheet.select_service(&select_value(&e)))
    };
    let on_link = {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |e: InputEvent| sheet.set_link(&input_value(&e)))
    };
    let on_prepayment_mode = {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |e: Event| match select_value(&e).as_str() {
            "paid" => sheet.set_prepayment(PrepaymentChoice::Paid),
            "amount" => sheet.set_prepayment_text(&sheet.state().prepayment_text),
            _ => sheet.set_prepayment(PrepaymentChoice::None),
        })
    };
    let on_amount = {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |e: InputEvent| sheet.set_prepayment_text(&input_value(&e)))
    };
    let on_submit = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| submit(ctx.clone()))
    };
    let on_request_delete = {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |_: MouseEvent| {
            sheet.request_delete();
        })
    };
    let on_cancel_delete = {
        let sheet = ctx.booking_sheet.clone();
        Callback::from(move |_: MouseEvent| sheet.cancel_delete())
    };
    let on_confirm_delete = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.booking_sheet.delete().await {
                    Ok(()) => ctx.toasts.info("Запись удалена"),
                    Err(e) => ctx.toasts.failure(&e),
                }
            });
        })
    };

    let services = ctx.booking_sheet.services();
    let mode = prepayment_mode(&form.prepayment);

    html! {
        <BottomSheet open={true} title={ctx.booking_sheet.title()} {on_close}>
            if state.loading {
                <div class="hint">{ "Загрузка..." }</div>
            }
            <label>
                <span class="hint">{ "Услуга" }</span>
                <select onchange={on_service}>
                    { for services.iter().map(|service| html! {
                        <option value={service.id.clone()} selected={service.id == form.service_id}>
                            { service.title.clone() }
                        </option>
                    }) }
                </select>
            </label>
            <div class="row">
                <label>
                    <span class="hint">{ "Дата" }</span>
                    <input
                        type="date"
                        value={form.date.clone()}
                        oninput={text_field(|form, value| form.date = value)}
                    />
                </label>
                <label>
                    <span class="hint">{ "Время" }</span>
                    <input
                        placeholder="10:00"
                        value={form.time.clone()}
                        oninput={text_field(|form, value| form.time = value)}
                    />
                </label>
            </div>
            <label>
                <span class="hint">{ "Ссылка" }</span>
                <input placeholder="@username" value={form.link.clone()} oninput={on_link} />
            </label>
            <label>
                <span class="hint">{ "Имя" }</span>
                <input
                    value={form.name.clone()}
                    oninput={text_field(|form, value| form.name = value)}
                />
            </label>
            <label>
                <span class="hint">{ "Комментарий" }</span>
                <input
                    value={form.comment.clone()}
                    oninput={text_field(|form, value| form.comment = value)}
                />
            </label>
            <div class="row">
                <label>
                    <span class="hint">{ "Предоплата" }</span>
                    <select onchange={on_prepayment_mode}>
                        <option value="none" selected={mode == "none"}>{ "Нет" }</option>
                        <option value="paid" selected={mode == "paid"}>{ "Оплачено" }</option>
                        <option value="amount" selected={mode == "amount"}>{ "Сумма" }</option>
                    </select>
                </label>
                if mode == "amount" {
                    <label>
                        <span class="hint">{ "Сумма" }</span>
                        <input
                            class={classes!(state.prepayment_invalid.then_some("invalid"))}
                            inputmode="decimal"
                            value={state.prepayment_text.clone()}
                            oninput={on_amount}
                        />
                    </label>
                }
            </div>

            if !*native {
                <button class="primary" disabled={state.submitting} onclick={on_submit}>
                    { button_text }
                </button>
            }

            if state.editing.is_some() {
                if state.confirm_delete {
                    <div class="confirm">
                        <span>{ "Удалить запись?" }</span>
                        <button class="danger" onclick={on_confirm_delete}>{ "Удалить" }</button>
                        <button onclick={on_cancel_delete}>{ "Отмена" }</button>
                    </div>
                } else {
                    <button class="link danger" onclick={on_request_delete}>
                        { "Удалить запись" }
                    </button>
                }
            }
        </BottomSheet>
    }
}
