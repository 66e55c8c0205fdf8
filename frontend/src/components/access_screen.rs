use manik_client::domain::AccessState;
use yew::prelude::*;

use crate::services::telegram;

#[derive(Properties, PartialEq)]
pub struct AccessScreenProps {
    pub state: AccessState,
    pub debug: bool,
}

/// Shown until the access gate grants entry
#[function_component(AccessScreen)]
pub fn access_screen(props: &AccessScreenProps) -> Html {
    let (title, detail) = match &props.state {
        AccessState::Waiting { .. } | AccessState::Checking => ("Проверяем доступ…", None),
        AccessState::Granted { .. } => ("Доступ открыт", None),
        AccessState::Denied { reason } => ("Доступ запрещён", Some(reason.clone())),
        AccessState::NoInit => (
            "Откройте приложение из Telegram",
            Some("Данные авторизации Telegram не получены.".to_string()),
        ),
    };

    html! {
        <div class="access-screen">
            <h1>{ title }</h1>
            if let AccessState::Waiting { attempt } = &props.state {
                if props.debug {
                    <p class="hint">{ format!("Попытка {}", attempt) }</p>
                }
            }
            if props.debug {
                if let Some(detail) = detail {
                    <p class="hint">{ detail }</p>
                }
                <pre class="debug">{ telegram::init_data().unwrap_or_else(|| "initData: —".to_string()) }</pre>
            } else if matches!(props.state, AccessState::NoInit) {
                <p class="hint">{ detail.unwrap_or_default() }</p>
            }
        </div>
    }
}
