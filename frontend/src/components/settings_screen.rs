use shared::{SlotStep, TimeFormat, WEEKDAY_LABELS};
use yew::prelude::*;

use super::{input_value, select_value, ScreenProps};
use crate::hooks::use_shared_stores;

#[function_component(SettingsScreen)]
pub fn settings_screen(props: &ScreenProps) -> Html {
    let ctx = props.ctx.clone();
    use_shared_stores(&ctx);

    let settings = ctx.settings.get();
    let start = use_state(|| settings.workday_start.clone());
    let end = use_state(|| settings.workday_end.clone());

    let bind = |handle: &UseStateHandle<String>| {
        let handle = handle.clone();
        Callback::from(move |e: InputEvent| handle.set(input_value(&e)))
    };

    let on_save_workday = {
        let ctx = ctx.clone();
        let start = start.clone();
        let end = end.clone();
        Callback::from(move |_: MouseEvent| match ctx.settings.set_workday(&start, &end) {
            Ok(()) => {
                let saved = ctx.settings.get();
                start.set(saved.workday_start);
                end.set(saved.workday_end);
                ctx.toasts.info("Рабочий день сохранён");
            }
            Err(e) => ctx.toasts.failure(&e),
        })
    };

    let on_step = {
        let ctx = ctx.clone();
        Callback::from(move |e: Event| {
            match select_value(&e).parse::<u32>().map(SlotStep::try_from) {
                Ok(Ok(step)) => {
                    if let Err(e) = ctx.settings.set_slot_step(step) {
                        ctx.toasts.failure(&e);
                    }
                }
                _ => ctx.toasts.error("Некорректный шаг сетки"),
            }
        })
    };

    let on_format = |format: TimeFormat| {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            if let Err(e) = ctx.settings.set_time_format(format) {
                ctx.toasts.failure(&e);
            }
        })
    };

    let on_weekend = |weekday: u8| {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            if let Err(e) = ctx.settings.toggle_weekend(weekday) {
                ctx.toasts.failure(&e);
            }
        })
    };

    let on_reset = {
        let ctx = ctx.clone();
        let start = start.clone();
        let end = end.clone();
        Callback::from(move |_: MouseEvent| {
            if let Err(e) = ctx.settings.reset() {
                ctx.toasts.failure(&e);
            }
            let defaults = ctx.settings.get();
            start.set(defaults.workday_start);
            end.set(defaults.workday_end);
        })
    };

    html! {
        <div class="screen settings-screen">
            <header class="screen-header">
                <div>
                    <div class="hint">{ "Настройки" }</div>
                    <h1>{ "Рабочий день" }</h1>
                </div>
            </header>

            <section class="card">
                <div class="row">
                    <label>
                        <span class="hint">{ "Начало" }</span>
                        <input value={(*start).clone()} oninput={bind(&start)} />
                    </label>
                    <label>
                        <span class="hint">{ "Конец" }</span>
                        <input value={(*end).clone()} oninput={bind(&end)} />
                    </label>
                </div>
                <button class="primary" onclick={on_save_workday}>{ "Сохранить" }</button>
            </section>

            <section class="card">
                <h2>{ "Шаг сетки" }</h2>
                <select onchange={on_step}>
                    { for SlotStep::ALL.iter().map(|step| html! {
                        <option
                            value={step.minutes().to_string()}
                            selected={*step == settings.slot_step}
                        >
                            { format!("{} мин", step.minutes()) }
                        </option>
                    }) }
                </select>
            </section>

            <section class="card">
                <h2>{ "Формат времени" }</h2>
                <div class="segmented">
                    <button
                        class={classes!((settings.time_format == TimeFormat::H24).then_some("active"))}
                        onclick={on_format(TimeFormat::H24)}
                    >
                        { "24ч" }
                    </button>
                    <button
                        class={classes!((settings.time_format == TimeFormat::H12).then_some("active"))}
                        onclick={on_format(TimeFormat::H12)}
                    >
                        { "12ч" }
                    </button>
                </div>
            </section>

            <section class="card">
                <h2>{ "Выходные" }</h2>
                <div class="weekdays">
                    { for WEEKDAY_LABELS.iter().enumerate().map(|(weekday, label)| {
                        let weekday = weekday as u8;
                        let class = classes!("chip", settings.is_weekend(weekday).then_some("active"));
                        html! { <button {class} onclick={on_weekend(weekday)}>{ *label }</button> }
                    }) }
                </div>
            </section>

            <button class="link" onclick={on_reset}>{ "Сбросить настройки" }</button>
        </div>
    }
}
