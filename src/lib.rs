//! # Outbreak Duel
//!
//! Backend for the zombie-infection card-duel mini-game of a live event
//! app.
//!
//! ## Overview
//!
//! Players join a running game, draw cards into a seven-card hand and duel
//! each other: numeric cards are compared by sum, while the three special
//! cards (ZOMBIE, SHOTGUN, VACCINE) terminate a duel with role changes,
//! eliminations and card transfers.
//!
//! ## Architecture
//!
//! The API is built using the Rocket web framework with OpenAPI
//! documentation support. Game state is managed through a thread-safe
//! `Arc<Mutex<GameState>>` to allow concurrent access from multiple HTTP
//! requests; duel creation and resolution are idempotent so racing
//! requests converge on one outcome.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod catalog;
pub mod deck;
pub mod duel;
pub mod event_log;
pub mod game;
pub mod player;
pub mod state;
pub mod status_messages;

pub use crate::state::GameState;

/// Initializes and configures the Rocket web server with all routes and
/// OpenAPI documentation.
///
/// # Example
///
/// ```no_run
/// use outbreak_duel::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    use crate::deck::endpoints::okapi_add_operation_for_draw_card_;
    use crate::deck::endpoints::okapi_add_operation_for_get_hand_;
    use crate::deck::endpoints::okapi_add_operation_for_reset_deck_;
    use crate::deck::endpoints::{draw_card, get_hand, reset_deck};
    use crate::duel::endpoints::okapi_add_operation_for_duel_status_;
    use crate::duel::endpoints::okapi_add_operation_for_force_resolve_;
    use crate::duel::endpoints::okapi_add_operation_for_start_duel_;
    use crate::duel::endpoints::okapi_add_operation_for_submit_card_;
    use crate::duel::endpoints::okapi_add_operation_for_validate_target_;
    use crate::duel::endpoints::{
        duel_status, force_resolve, start_duel, submit_card, validate_target,
    };
    use crate::event_log::list_events;
    use crate::event_log::okapi_add_operation_for_list_events_;
    use crate::game::join_game;
    use crate::game::okapi_add_operation_for_join_game_;

    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    let gs = std::sync::Arc::new(rocket::futures::lock::Mutex::new(GameState::new()));

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                join_game,
                draw_card,
                get_hand,
                reset_deck,
                validate_target,
                start_duel,
                submit_card,
                duel_status,
                force_resolve,
                list_events
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .mount(
            "/",
            rocket::routes![
                crate::deck::endpoints::set_test_seed,
                crate::deck::endpoints::set_test_hand,
                crate::game::set_test_role,
            ],
        )
        .manage(gs)
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
