use manik_client::domain::{LedgerPanel, ADDED_MESSAGE, REMOVED_MESSAGE};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{input_value, ScreenProps};
use crate::context::{AppContext, Toasts};
use crate::hooks::use_subscription;

/// Salary and expenses, one panel each
#[function_component(LedgerScreen)]
pub fn ledger_screen(props: &ScreenProps) -> Html {
    html! {
        <div class="screen ledger-screen">
            <header class="screen-header">
                <div>
                    <div class="hint">{ "Финансы" }</div>
                    <h1>{ "Зарплата и траты" }</h1>
                </div>
            </header>
            <LedgerCard ctx={props.ctx.clone()} expenses={false} />
            <LedgerCard ctx={props.ctx.clone()} expenses={true} />
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct LedgerCardProps {
    ctx: AppContext,
    expenses: bool,
}

fn panel(props: &LedgerCardProps) -> LedgerPanel {
    if props.expenses {
        props.ctx.expenses.clone()
    } else {
        props.ctx.salary.clone()
    }
}

#[derive(Clone, Copy)]
enum Action {
    Refresh,
    Add,
    RemoveLast,
}

fn run(panel: LedgerPanel, toasts: Toasts, action: Action) {
    spawn_local(async move {
        let result = match action {
            Action::Refresh => panel.refresh().await.map(|_| None),
            Action::Add => panel.add().await.map(|_| Some(ADDED_MESSAGE)),
            Action::RemoveLast => panel.remove_last().await.map(|_| Some(REMOVED_MESSAGE)),
        };
        match result {
            Ok(Some(message)) => toasts.info(message),
            Ok(None) => {}
            Err(e) => toasts.failure(&e),
        }
    });
}

#[function_component(LedgerCard)]
fn ledger_card(props: &LedgerCardProps) -> Html {
    let panel = panel(props);
    {
        let panel = panel.clone();
        use_subscription(move |rerender| {
            let id = panel.subscribe(move |_| rerender.emit(()));
            move || {
                panel.unsubscribe(id);
            }
        });
    }

    let state = panel.state();
    {
        let panel = panel.clone();
        let toasts = props.ctx.toasts.clone();
        use_effect_with(state.month.clone(), move |_| {
            run(panel, toasts, Action::Refresh);
            || ()
        });
    }

    let on_month = {
        let panel = panel.clone();
        Callback::from(move |e: InputEvent| panel.set_month(&input_value(&e)))
    };
    let on_amount = {
        let panel = panel.clone();
        Callback::from(move |e: InputEvent| panel.set_amount(&input_value(&e)))
    };
    let action = |action: Action| {
        let panel = panel.clone();
        let toasts = props.ctx.toasts.clone();
        Callback::from(move |_: MouseEvent| run(panel.clone(), toasts.clone(), action))
    };

    html! {
        <section class="card ledger-card">
            <h2>{ panel.kind().title() }</h2>
            <div class="row">
                <input type="month" value={state.month.clone()} oninput={on_month} />
                <input
                    type="number"
                    placeholder="Сумма"
                    value={state.amount.clone()}
                    oninput={on_amount}
                />
            </div>
            <div class="actions">
                <button class="primary" disabled={state.busy} onclick={action(Action::Add)}>
                    { "Добавить" }
                </button>
                <button disabled={state.busy} onclick={action(Action::RemoveLast)}>
                    { "Удалить последнюю" }
                </button>
            </div>
            <div class="total">
                { panel.total_label().unwrap_or_else(|| "Загрузка...".to_string()) }
            </div>
        </section>
    }
}
