mod components;
mod context;
mod hooks;
mod services;

use services::{logging, telegram};

fn main() {
    logging::init(telegram::debug_requested());
    yew::Renderer::<components::app::App>::new().render();
}
