//! The SmartTalk chat suite: join screen, entering the chat, and composing
//! a message that is never sent.

use crate::config::RunConfig;
use crate::locator::Selector;
use crate::scenario::{Action, Scenario, Suite};

/// Suite name
pub const SUITE_NAME: &str = "Flujo E2E del Chat SmartTalk";

/// Join screen heading
pub const JOIN_PROMPT: &str = "Únete al Chat";

/// Fragment of the name field's placeholder
pub const NAME_PLACEHOLDER_FRAGMENT: &str = "nombre";

/// Label of the control that enters the chat
pub const ENTER_LABEL: &str = "Entrar al Chat";

/// Text shown once inside the group chat
pub const GROUP_CHAT_INDICATOR: &str = "Chat Grupal";

/// Name typed into the join form
pub const USER_NAME: &str = "John Cypress";

/// Message typed into the composer and never sent
pub const UNSENT_MESSAGE: &str = "Mensaje escrito desde Cypress (sin enviar)";

/// Scenario names in execution order
pub const SCENARIO_NAMES: [&str; 3] = [
    "Validar la pantalla de inicio del chat",
    "Ingreso al chat con nombre 'John Cypress'",
    "Escribir mensaje desde Cypress sin enviarlo",
];

/// `input[placeholder*="nombre"]`
#[must_use]
pub fn name_field() -> Selector {
    Selector::placeholder("input", NAME_PLACEHOLDER_FRAGMENT)
}

/// The message composer, whichever shape the footer uses
#[must_use]
pub fn composer() -> Selector {
    Selector::any_of([
        Selector::css("footer textarea"),
        Selector::css("footer input"),
        Selector::attribute_contains("placeholder", "Escribe"),
        Selector::attribute_contains("placeholder", "mensaje"),
    ])
}

/// Type the user name and enter the chat, waiting until the chat shows
fn join(scenario: Scenario, config: &RunConfig) -> Scenario {
    scenario
        .locate(name_field())
        .type_text(USER_NAME)
        .locate(Selector::text(ENTER_LABEL))
        .click()
        .wait_for(Selector::text(GROUP_CHAT_INDICATOR), config.settle_timeout())
}

/// Build the suite against the configured origin
#[must_use]
pub fn suite(config: &RunConfig) -> Suite {
    let [start, enter, compose] = SCENARIO_NAMES;

    let start_screen = Scenario::new(start)
        .assert_visible(Selector::text(JOIN_PROMPT))
        .assert_visible(name_field())
        .assert_visible(Selector::text(ENTER_LABEL))
        .screenshot("A1-pantalla-inicio");

    let enter_chat = join(Scenario::new(enter), config).screenshot("B1-chat-ingresado");

    let compose_unsent = join(Scenario::new(compose), config)
        .assert_visible(Selector::text(GROUP_CHAT_INDICATOR))
        .assert_visible(composer())
        .type_text(UNSENT_MESSAGE)
        .assert_text(UNSENT_MESSAGE)
        .assert_absent(Selector::text(UNSENT_MESSAGE))
        .screenshot("C1-mensaje-escrito")
        .wait_for(composer(), config.settle_timeout())
        .assert_text(UNSENT_MESSAGE)
        .assert_absent(Selector::text(UNSENT_MESSAGE))
        .screenshot("C2-captura-final-sin-enviar");

    Suite::new(SUITE_NAME, &config.origin)
        .before_each(Action::Navigate {
            url: config.origin.clone(),
        })
        .scenario(start_screen)
        .scenario(enter_chat)
        .scenario(compose_unsent)
}
