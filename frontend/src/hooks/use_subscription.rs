use yew::prelude::*;

use crate::context::AppContext;

/// Re-render whenever a model notifies.
///
/// `register` receives the re-render callback and returns the function that
/// detaches it; detaching happens on unmount.
#[hook]
pub fn use_subscription<R, U>(register: R)
where
    R: FnOnce(Callback<()>) -> U + 'static,
    U: FnOnce() + 'static,
{
    let update = use_force_update();
    use_effect_with((), move |_| {
        let rerender = Callback::from(move |_| update.force_update());
        register(rerender)
    });
}

/// Re-render on navigation, settings and cache invalidation changes
#[hook]
pub fn use_shared_stores(ctx: &AppContext) {
    let ctx = ctx.clone();
    use_subscription(move |rerender| {
        let app_id = {
            let rerender = rerender.clone();
            ctx.app.subscribe(move |_| rerender.emit(()))
        };
        let settings_id = {
            let rerender = rerender.clone();
            ctx.settings.subscribe(move |_| rerender.emit(()))
        };
        let cache_id = ctx.cache.subscribe(move |_| rerender.emit(()));
        move || {
            ctx.app.unsubscribe(app_id);
            ctx.settings.unsubscribe(settings_id);
            ctx.cache.unsubscribe(cache_id);
        }
    });
}
