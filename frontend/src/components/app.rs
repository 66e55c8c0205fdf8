use manik_client::domain::AccessState;
use manik_client::ClientConfig;
use shared::ScreenKey;
use yew::prelude::*;

use super::access_screen::AccessScreen;
use super::booking_sheet::BookingSheet;
use super::calendar_screen::CalendarScreen;
use super::clients_screen::ClientsScreen;
use super::ledger_screen::LedgerScreen;
use super::schedule_screen::ScheduleScreen;
use super::services_screen::ServicesScreen;
use super::settings_screen::SettingsScreen;
use super::tab_bar::TabBar;
use super::toast::ToastHost;
use crate::context::AppContext;
use crate::hooks::{use_access_gate, use_shared_stores};
use crate::services::telegram;

#[function_component(App)]
pub fn app() -> Html {
    let ctx = (*use_memo((), |_| {
        let config = ClientConfig {
            debug: telegram::debug_requested(),
            ..ClientConfig::default()
        };
        AppContext::new(config)
    }))
    .clone();

    use_effect_with((), |_| {
        telegram::ready_and_expand();
        telegram::apply_theme();
        || ()
    });

    let access = use_access_gate(&ctx);
    use_shared_stores(&ctx);

    if !matches!(access, AccessState::Granted { .. }) {
        return html! {
            <div class="app">
                <AccessScreen state={access} debug={ctx.config.debug} />
            </div>
        };
    }

    let active = ctx.app.active_screen();
    let screen = match active {
        ScreenKey::Calendar => html! { <CalendarScreen ctx={ctx.clone()} /> },
        ScreenKey::Schedule => html! { <ScheduleScreen ctx={ctx.clone()} /> },
        ScreenKey::Clients => html! { <ClientsScreen ctx={ctx.clone()} /> },
        ScreenKey::Services => html! { <ServicesScreen ctx={ctx.clone()} /> },
        ScreenKey::Settings => html! { <SettingsScreen ctx={ctx.clone()} /> },
        ScreenKey::Ledger => html! { <LedgerScreen ctx={ctx.clone()} /> },
    };
    let on_select = {
        let app = ctx.app.clone();
        Callback::from(move |key: ScreenKey| app.set_screen(key))
    };

    html! {
        <div class="app">
            <main class="content">{ screen }</main>
            <TabBar {active} {on_select} />
            <BookingSheet ctx={ctx.clone()} />
            <ToastHost ctx={ctx.clone()} />
        </div>
    }
}
