pub mod access_screen;
pub mod app;
pub mod booking_sheet;
pub mod bottom_sheet;
pub mod calendar_screen;
pub mod clients_screen;
pub mod ledger_screen;
pub mod schedule_screen;
pub mod services_screen;
pub mod settings_screen;
pub mod tab_bar;
pub mod toast;

use yew::prelude::*;

use crate::context::AppContext;

/// Props shared by every screen
#[derive(Properties, PartialEq, Clone)]
pub struct ScreenProps {
    pub ctx: AppContext,
}

/// Value of the input element that fired `e`
pub fn input_value(e: &InputEvent) -> String {
    e.target_unchecked_into::<web_sys::HtmlInputElement>().value()
}

/// Value of the select element that fired `e`
pub fn select_value(e: &Event) -> String {
    e.target_unchecked_into::<web_sys::HtmlSelectElement>().value()
}
