use outbreak_duel::rocket_initialize;
use rocket::http::uncased::Uncased;
use rocket::http::{Header, Status};
use rocket::local::blocking::Client;
use rocket::serde::json::serde_json;

use std::borrow::Cow;

fn json_header() -> Header<'static> {
    Header {
        name: Uncased::from("Content-Type"),
        value: Cow::from("application/json"),
    }
}

fn post_json(client: &Client, uri: &str, body: &str) -> (Status, serde_json::Value) {
    let resp = client
        .post(uri)
        .header(json_header())
        .body(body)
        .dispatch();
    let status = resp.status();
    let value: serde_json::Value =
        serde_json::from_str(&resp.into_string().unwrap_or_default()).unwrap_or_default();
    (status, value)
}

fn join(client: &Client, equipe: &str) -> u64 {
    let (status, body) = post_json(
        client,
        "/games/join",
        &format!(r#"{{"equipe_id":"{equipe}","name":"{equipe}"}}"#),
    );
    assert_eq!(status, Status::Created, "join should create the player");
    body["game_id"].as_u64().expect("game_id in join response")
}

#[test]
fn test_join_creates_game_and_deals_seven_cards() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let (status, body) = post_json(&client, "/games/join", r#"{"equipe_id":"red","name":"Red"}"#);
    assert_eq!(status, Status::Created);
    assert_eq!(body["role"], "Human");
    assert_eq!(body["hand"].as_array().expect("hand array").len(), 7);
    let shotguns = body["hand"]
        .as_array()
        .expect("hand array")
        .iter()
        .filter(|c| c["card_id"] == "SHOTGUN")
        .count();
    assert_eq!(shotguns, 1, "initial hand carries exactly one shotgun");
}

#[test]
fn test_rejoin_is_idempotent() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let first = join(&client, "red");
    let (status, body) = post_json(&client, "/games/join", r#"{"equipe_id":"red","name":"Red"}"#);
    assert_eq!(status, Status::Ok);
    assert_eq!(body["game_id"].as_u64(), Some(first));
    assert_eq!(body["created"], false);
}

#[test]
fn test_join_requires_equipe_id() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let (status, body) = post_json(&client, "/games/join", r#"{"equipe_id":"","name":"x"}"#);
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["code"], "equipe_id_missing");
}

#[test]
fn test_draw_unknown_game_is_not_found() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let (status, body) = post_json(&client, "/games/999/draw", r#"{"equipe_id":"red"}"#);
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["code"], "game_not_found");
}

#[test]
fn test_draw_unknown_player_is_not_found() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    let (status, body) = post_json(
        &client,
        &format!("/games/{game_id}/draw"),
        r#"{"equipe_id":"ghost"}"#,
    );
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["code"], "player_not_in_game");
}

#[test]
fn test_draw_with_full_hand_is_quota_blocked() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    // The initial hand already holds seven cards.
    let (status, body) = post_json(
        &client,
        &format!("/games/{game_id}/draw"),
        r#"{"equipe_id":"red"}"#,
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["code"], "deck_empty_or_quota_blocked");
}

#[test]
fn test_eliminated_player_cannot_draw() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    let (status, _) = post_json(
        &client,
        "/tests/role",
        &format!(r#"{{"game_id":{game_id},"equipe_id":"red","role":"Eliminated"}}"#),
    );
    assert_eq!(status, Status::NoContent);
    let (status, body) = post_json(
        &client,
        &format!("/games/{game_id}/draw"),
        r#"{"equipe_id":"red"}"#,
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["code"], "player_eliminated");
}

#[test]
fn test_duel_status_unknown_duel_is_not_found() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let resp = client.get("/duels/424242").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn test_start_duel_with_dead_target_fails() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    join(&client, "blue");
    post_json(
        &client,
        "/tests/role",
        &format!(r#"{{"game_id":{game_id},"equipe_id":"blue","role":"Eliminated"}}"#),
    );
    let (status, body) = post_json(
        &client,
        "/duels",
        &format!(
            r#"{{"game_id":{game_id},"source_equipe_id":"red","target_equipe_id":"blue"}}"#
        ),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["code"], "player_dead");
}

#[test]
fn test_start_duel_twice_returns_same_duel() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    join(&client, "blue");
    let req =
        format!(r#"{{"game_id":{game_id},"source_equipe_id":"red","target_equipe_id":"blue"}}"#);
    let (status, first) = post_json(&client, "/duels", &req);
    assert_eq!(status, Status::Created);
    let (status, second) = post_json(&client, "/duels", &req);
    assert_eq!(status, Status::Ok);
    assert_eq!(first["duel_id"], second["duel_id"]);
}

#[test]
fn test_third_player_cannot_join_a_busy_pair() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    join(&client, "blue");
    join(&client, "green");
    post_json(
        &client,
        "/duels",
        &format!(r#"{{"game_id":{game_id},"source_equipe_id":"red","target_equipe_id":"blue"}}"#),
    );
    let (status, body) = post_json(
        &client,
        "/duels",
        &format!(
            r#"{{"game_id":{game_id},"source_equipe_id":"green","target_equipe_id":"red"}}"#
        ),
    );
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["code"], "player_already_in_pending_duel");
}

#[test]
fn test_validate_target_rejects_self() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    let (status, body) = post_json(
        &client,
        "/duels/validate-target",
        &format!(
            r#"{{"game_id":{game_id},"actor_equipe_id":"red","target_equipe_id":"red"}}"#
        ),
    );
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["code"], "self_target");
}

#[test]
fn test_validate_target_happy_path_marks_incoming() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    join(&client, "blue");
    let (_, duel) = post_json(
        &client,
        "/duels",
        &format!(r#"{{"game_id":{game_id},"source_equipe_id":"red","target_equipe_id":"blue"}}"#),
    );
    let duel_id = duel["duel_id"].as_u64().expect("duel_id");
    let (status, body) = post_json(
        &client,
        "/duels/validate-target",
        &format!(
            r#"{{"game_id":{game_id},"actor_equipe_id":"red","target_equipe_id":"blue","duel_id":{duel_id}}}"#
        ),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(body["valid"], true);
    assert_eq!(body["target"]["incoming_duel"].as_u64(), Some(duel_id));
    assert_eq!(body["target"]["locked_in_duel"], true);
}

#[test]
fn test_submit_with_stale_token_is_not_found() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    let game_id = join(&client, "red");
    join(&client, "blue");
    let (_, hand) = post_json(
        &client,
        "/tests/hand",
        &format!(
            r#"{{"game_id":{game_id},"equipe_id":"red","card_codes":["NUM_4","NUM_5"]}}"#
        ),
    );
    let token = hand[0]["token"].as_str().expect("token").to_string();
    let (_, duel) = post_json(
        &client,
        "/duels",
        &format!(r#"{{"game_id":{game_id},"source_equipe_id":"red","target_equipe_id":"blue"}}"#),
    );
    let duel_id = duel["duel_id"].as_u64().expect("duel_id");
    let submit = format!(r#"{{"equipe_id":"red","card_token":"{token}"}}"#);
    let (status, _) = post_json(&client, &format!("/duels/{duel_id}/plays"), &submit);
    assert_eq!(status, Status::Created);
    // The token was consumed by the first submission.
    let (status, body) = post_json(&client, &format!("/duels/{duel_id}/plays"), &submit);
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["code"], "card_not_found_in_hand");
}

#[test]
fn test_events_endpoint_paginates() {
    let client = Client::tracked(rocket_initialize()).expect("valid rocket instance");
    join(&client, "red");
    join(&client, "blue");
    let resp = client.get("/events?limit=1").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body: serde_json::Value =
        serde_json::from_str(&resp.into_string().unwrap_or_default()).unwrap_or_default();
    assert_eq!(body["entries"].as_array().expect("entries").len(), 1);
    assert!(body["next_seq"].as_u64().is_some());
}
