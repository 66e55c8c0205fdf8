use manik_client::domain::{DayCell, TimelineRow};
use shared::{format_prepayment, WEEKDAY_LABELS};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::ScreenProps;
use crate::hooks::{use_shared_stores, use_subscription};

#[function_component(CalendarScreen)]
pub fn calendar_screen(props: &ScreenProps) -> Html {
    let ctx = props.ctx.clone();
    use_shared_stores(&ctx);
    {
        let calendar = ctx.calendar.clone();
        use_subscription(move |rerender| {
            let id = calendar.subscribe(move |_| rerender.emit(()));
            move || {
                calendar.unsubscribe(id);
            }
        });
    }

    // Reload whenever the selection moves or a mutation invalidated the cache
    let selected = ctx.calendar.selected_date();
    let revision = ctx.cache.revision();
    {
        let ctx = ctx.clone();
        use_effect_with((selected.clone(), revision), move |_| {
            spawn_local(async move {
                if let Err(e) = ctx.calendar.refresh().await {
                    ctx.toasts.failure(&e);
                }
            });
            || ()
        });
    }

    let state = ctx.calendar.state();
    let nav = |delta: i32| {
        let calendar = ctx.calendar.clone();
        Callback::from(move |_: MouseEvent| calendar.shift_month(delta))
    };
    let shift_day = |delta: i64| {
        let calendar = ctx.calendar.clone();
        Callback::from(move |_: MouseEvent| calendar.shift_day(delta))
    };
    let go_today = {
        let calendar = ctx.calendar.clone();
        Callback::from(move |_: MouseEvent| calendar.go_today())
    };
    let new_booking = {
        let app = ctx.app.clone();
        Callback::from(move |_: MouseEvent| app.open_booking(None, None))
    };

    let render_cell = |cell: &Option<DayCell>| match cell {
        None => html! { <div class="day empty"></div> },
        Some(cell) => {
            let calendar = ctx.calendar.clone();
            let iso = cell.iso.clone();
            let class = classes!(
                "day",
                cell.selected.then_some("selected"),
                cell.today.then_some("today"),
                cell.weekend.then_some("weekend"),
                cell.marked.then_some("marked"),
            );
            html! {
                <button {class} onclick={Callback::from(move |_: MouseEvent| calendar.select_day(&iso))}>
                    { cell.day }
                </button>
            }
        }
    };

    let render_row = |row: &TimelineRow| {
        let calendar = ctx.calendar.clone();
        let clicked = row.clone();
        let onclick = Callback::from(move |_: MouseEvent| calendar.open_row(&clicked));
        match &row.booking {
            Some(booking) => html! {
                <div class="timeline-row booked" {onclick}>
                    <span class="time">{ row.label.clone() }</span>
                    <span class="who">{ format!("{} {}", booking.name, booking.link) }</span>
                    <span class="prepayment">
                        { booking.prepayment_display.clone().unwrap_or_else(|| format_prepayment(booking.prepayment)) }
                    </span>
                </div>
            },
            None => html! {
                <div class="timeline-row free" {onclick}>
                    <span class="time">{ row.label.clone() }</span>
                    <span class="who hint">{ "Свободно" }</span>
                </div>
            },
        }
    };

    html! {
        <div class="screen calendar-screen">
            <header class="screen-header">
                <div>
                    <div class="hint">{ "Календарь" }</div>
                    <h1>{ ctx.calendar.title() }</h1>
                </div>
                if ctx.calendar.has_bookings_today() {
                    <span class="badge">{ "Сегодня есть записи" }</span>
                }
            </header>

            <div class="month-nav">
                <button onclick={nav(-1)}>{ "‹" }</button>
                <span>{ ctx.calendar.month_label() }</span>
                <button onclick={nav(1)}>{ "›" }</button>
                <button class="link" onclick={go_today}>{ "Сегодня" }</button>
            </div>

            <div class="month-grid">
                { for WEEKDAY_LABELS.iter().map(|label| html! { <div class="weekday">{ *label }</div> }) }
                { for ctx.calendar.grid().iter().map(render_cell) }
            </div>

            <div class="day-nav">
                <button onclick={shift_day(-1)}>{ "‹ Вчера" }</button>
                <button onclick={shift_day(1)}>{ "Завтра ›" }</button>
            </div>

            if state.loading {
                <div class="card hint">{ "Загрузка записей..." }</div>
            }
            <div class="timeline">
                { for ctx.calendar.timeline().iter().map(render_row) }
            </div>

            <button class="primary" onclick={new_booking}>{ "Новая запись" }</button>
        </div>
    }
}
