use manik_client::domain::{Announcement, ScheduleError, SlotSegment};
use shared::{days_in_month, iso_for, iso_weekday, parse_iso_date, WEEKDAY_LABELS};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{input_value, ScreenProps};
use crate::hooks::{use_shared_stores, use_subscription};
use crate::services::logging::Logger;
use crate::services::telegram;

const SAVED: &str = "Слоты сохранены";
const RESET: &str = "Слоты сброшены к дефолту";
const CHECK_FORMAT: &str = "Проверьте формат времени слотов.";

#[function_component(ScheduleScreen)]
pub fn schedule_screen(props: &ScreenProps) -> Html {
    let ctx = props.ctx.clone();
    use_shared_stores(&ctx);
    {
        let schedule = ctx.schedule.clone();
        use_subscription(move |rerender| {
            let id = schedule.subscribe(move |_| rerender.emit(()));
            move || {
                schedule.unsubscribe(id);
            }
        });
    }

    {
        let ctx = ctx.clone();
        use_effect_with((), move |_| {
            spawn_local(async move { ctx.schedule.load_slots().await });
            || ()
        });
    }

    let state = ctx.schedule.state();
    let cursor = state.cursor;
    let revision = ctx.cache.revision();
    {
        let ctx = ctx.clone();
        use_effect_with((cursor, revision), move |_| {
            spawn_local(async move {
                if let Err(e) = ctx.schedule.load_month().await {
                    ctx.toasts.failure(&e);
                }
            });
            || ()
        });
    }

    let shift = |delta: i32| {
        let schedule = ctx.schedule.clone();
        Callback::from(move |_: MouseEvent| schedule.shift_month(delta))
    };

    let on_day = |day: u32| {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            spawn_local(async move {
                if let Err(e) = ctx.schedule.toggle_day(day).await {
                    ctx.toasts.failure(&e);
                }
                if let Err(e) = ctx.schedule.focus_day(day).await {
                    Logger::warn_with_component("schedule", &e.to_string());
                }
            });
        })
    };

    let on_save = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.schedule.save_slots().await {
                    Ok(report) if report.rejected.is_empty() => ctx.toasts.info(SAVED),
                    Ok(_) => ctx.toasts.error(CHECK_FORMAT),
                    Err(e) => ctx.toasts.failure(&e),
                }
            });
        })
    };

    let on_reset = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.schedule.reset_slots().await {
                    Ok(()) => ctx.toasts.info(RESET),
                    Err(e) => ctx.toasts.failure(&e),
                }
            });
        })
    };

    let on_generate = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            spawn_local(async move {
                match ctx.schedule.generate().await {
                    Ok(announcement) if announcement.is_empty() => {
                        ctx.toasts.error("Дни не выбраны.")
                    }
                    Ok(_) => {}
                    Err(ScheduleError::InvalidSlots(_)) => ctx.toasts.error(CHECK_FORMAT),
                    Err(e) => ctx.toasts.failure(&e),
                }
            });
        })
    };

    // Leading blanks keep day 1 in its weekday column
    let offset = parse_iso_date(&iso_for(cursor.year, cursor.month, 1))
        .map(iso_weekday)
        .unwrap_or(0);
    let days = days_in_month(cursor.year, cursor.month);

    let slot_fields = (0..7usize).map(|weekday| {
        let schedule = ctx.schedule.clone();
        let invalid = state
            .validity
            .get(weekday)
            .is_some_and(|validity| !validity.is_valid());
        let oninput = Callback::from(move |e: InputEvent| {
            schedule.set_slot_field(weekday, &input_value(&e));
        });
        html! {
            <label class={classes!("slot-field", invalid.then_some("invalid"))}>
                <span>{ WEEKDAY_LABELS[weekday] }</span>
                <input value={state.template.field(weekday).to_string()} {oninput} />
            </label>
        }
    });

    html! {
        <div class="screen schedule-screen">
            <header class="screen-header">
                <div>
                    <div class="hint">{ "Расписание" }</div>
                    <h1>{ "Рабочие дни" }</h1>
                </div>
            </header>

            <div class="month-nav">
                <button onclick={shift(-1)}>{ "‹" }</button>
                <span>{ ctx.schedule.month_label() }</span>
                <button onclick={shift(1)}>{ "›" }</button>
            </div>

            <div class="month-grid">
                { for WEEKDAY_LABELS.iter().map(|label| html! { <div class="weekday">{ *label }</div> }) }
                { for (0..offset).map(|_| html! { <div class="day empty"></div> }) }
                { for (1..=days).map(|day| {
                    let class = classes!(
                        "day",
                        state.selected_days.contains(&day).then_some("selected"),
                        state.marked_days.contains(&day).then_some("marked"),
                        state.pending.contains(&day).then_some("pending"),
                    );
                    html! { <button {class} onclick={on_day(day)}>{ day }</button> }
                }) }
            </div>

            <section class="card">
                <h2>{ ctx.schedule.focused_title() }</h2>
                if state.focused_date.is_some() && state.focused_bookings.is_empty() {
                    <div class="hint">{ "Нет записей." }</div>
                }
                { for state.focused_bookings.iter().map(|booking| html! {
                    <div class="list-item">
                        <span class="time">{ booking.time.clone() }</span>
                        <span>{ format!("{} {}", booking.name, booking.link) }</span>
                    </div>
                }) }
            </section>

            <section class="card">
                <h2>{ "Слоты по дням недели" }</h2>
                { for slot_fields }
                <div class="actions">
                    <button class="primary" onclick={on_save}>{ "Сохранить слоты" }</button>
                    <button onclick={on_reset}>{ "Сбросить" }</button>
                </div>
            </section>

            <button class="primary" onclick={on_generate}>{ "Сформировать расписание" }</button>
            if let Some(announcement) = state.announcement.as_ref().filter(|a| !a.is_empty()) {
                <AnnouncementCard ctx={ctx.clone()} announcement={announcement.clone()} />
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct AnnouncementProps {
    ctx: crate::context::AppContext,
    announcement: Announcement,
}

#[function_component(AnnouncementCard)]
fn announcement_card(props: &AnnouncementProps) -> Html {
    let on_copy = {
        let text = props.announcement.plain_text();
        let toasts = props.ctx.toasts.clone();
        Callback::from(move |_: MouseEvent| {
            let text = text.clone();
            let toasts = toasts.clone();
            spawn_local(async move {
                match telegram::copy_to_clipboard(&text).await {
                    Ok(()) => toasts.info("Скопировано"),
                    Err(e) => {
                        Logger::warn_with_component("schedule", &format!("Copy failed: {}", e));
                        toasts.error("Не удалось скопировать");
                    }
                }
            });
        })
    };

    html! {
        <section class="card announcement">
            if let Some(header) = &props.announcement.header {
                <h2>{ header.clone() }</h2>
            }
            { for props.announcement.lines.iter().map(|line| html! {
                <div class="announcement-line">
                    { for line.segments.iter().map(|segment| match segment {
                        SlotSegment::Plain(text) => html! { <span>{ text.clone() }</span> },
                        SlotSegment::Struck(text) => html! { <s>{ text.clone() }</s> },
                    }) }
                </div>
            }) }
            <button onclick={on_copy}>{ "Скопировать" }</button>
        </section>
    }
}
