use std::rc::Rc;

use async_trait::async_trait;
use gloo::timers::future::TimeoutFuture;
use manik_client::domain::{AccessGate, AccessState, Sleeper};
use manik_client::io::InitDataSource;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::context::AppContext;
use crate::services::logging::Logger;
use crate::services::telegram;

/// Sleeps on the browser event loop
pub struct TimerSleeper;

#[async_trait(?Send)]
impl Sleeper for TimerSleeper {
    async fn sleep(&self, ms: u32) {
        TimeoutFuture::new(ms).await;
    }
}

/// Run the access gate once per mount and expose its state
#[hook]
pub fn use_access_gate(ctx: &AppContext) -> AccessState {
    let state = use_state(|| AccessState::Waiting { attempt: 1 });

    {
        let state = state.clone();
        let ctx = ctx.clone();
        use_effect_with((), move |_| {
            let init_data: Rc<dyn InitDataSource> = Rc::new(telegram::init_data);
            let gate = AccessGate::new(
                ctx.api.clone(),
                init_data,
                Rc::new(TimerSleeper),
                &ctx.config,
            );
            {
                let state = state.clone();
                gate.subscribe(move |next| {
                    Logger::debug_with_component("access-gate", &format!("State: {:?}", next));
                    state.set(next.clone());
                });
            }
            spawn_local(async move {
                let outcome = gate.run().await;
                Logger::info_with_component(
                    "access-gate",
                    &format!("Access resolved: {:?}", outcome),
                );
            });
            || ()
        });
    }

    (*state).clone()
}
