mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use cupid_types::events::GatewayEvent;

use common::TestApp;

struct Member {
    id: Uuid,
    token: String,
}

/// Sign up, verify by email code, and fill in a complete profile.
async fn onboard(app: &TestApp, email: &str, name: &str) -> Member {
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": email, "password": "correct horse", "full_name": name })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id: Uuid = body["account_id"].as_str().unwrap().parse().unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            Method::POST,
            "/verification/request",
            None,
            Some(json!({ "email": email })),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let code = app.mailer.code_for(email).unwrap();

    let (status, _) = app
        .call(
            Method::POST,
            "/verification/verify",
            None,
            Some(json!({ "account_id": id, "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .call(
            Method::PUT,
            "/profile",
            Some(&token),
            Some(json!({
                "age": 21,
                "course": "B.Tech CSE",
                "academic_year": "3rd",
                "bio": "Here for the chai",
                "interests": ["music", "football"],
                "photos": [{ "url": format!("https://img/{name}.jpg"), "is_primary": true }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["profile_complete"], true);
    assert_eq!(body["verified"], true);

    Member { id, token }
}

fn ids(list: &Value, key: &str) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v[key].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn mutual_like_then_chat() {
    let app = TestApp::new();
    let a = onboard(&app, "ab1234@uni.edu", "Asha").await;
    let b = onboard(&app, "cd5678@uni.edu", "Bilal").await;

    // Each sees the other in their feed
    let (_, feed) = app.call(Method::GET, "/candidates", Some(&a.token), None).await;
    assert_eq!(ids(&feed, "account_id"), vec![b.id.to_string()]);

    let (status, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&a.token),
            Some(json!({ "target_id": b.id, "decision": "like" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], false);

    // Swiped profiles leave the feed
    let (_, feed) = app.call(Method::GET, "/candidates", Some(&a.token), None).await;
    assert!(feed.as_array().unwrap().is_empty());

    let (_, mut b_events) = app.state.dispatcher.register(b.id).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&b.token),
            Some(json!({ "target_id": a.id, "decision": "like" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    let match_id: Uuid = body["match"]["id"].as_str().unwrap().parse().unwrap();

    match b_events.try_recv().unwrap() {
        GatewayEvent::MatchCreate {
            match_id: m,
            partner_id,
            ..
        } => {
            assert_eq!(m, match_id);
            assert_eq!(partner_id, a.id);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let (_, matches) = app.call(Method::GET, "/matches", Some(&a.token), None).await;
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["partner"]["id"], json!(b.id));
    assert_eq!(matches[0]["partner"]["name"], "Bilal");
    assert_eq!(matches[0]["partner"]["primary_photo"], "https://img/Bilal.jpg");

    let uri = format!("/matches/{match_id}/messages");
    let (status, sent) = app
        .call(Method::POST, &uri, Some(&a.token), Some(json!({ "content": " hi " })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["content"], "hi");

    assert!(matches!(
        b_events.try_recv().unwrap(),
        GatewayEvent::MessageCreate { sender_id, .. } if sender_id == a.id
    ));

    let (status, history) = app.call(Method::GET, &uri, Some(&b.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["sender_id"], json!(a.id));
    assert_eq!(history[0]["content"], "hi");
    assert_eq!(history[0]["is_read"], false);

    let (status, body) = app
        .call(Method::POST, &format!("/matches/{match_id}/read"), Some(&b.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 1);
}

#[tokio::test]
async fn errors_are_discriminated() {
    let app = TestApp::new();
    let a = onboard(&app, "ab1234@uni.edu", "Asha").await;
    let b = onboard(&app, "cd5678@uni.edu", "Bilal").await;
    let c = onboard(&app, "ef9012@uni.edu", "Chitra").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "x@gmail.com", "password": "correct horse", "full_name": "X" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["error"], "invalid_domain");

    let swipe = json!({ "target_id": b.id, "decision": "pass" });
    app.call(Method::POST, "/swipes", Some(&a.token), Some(swipe.clone()))
        .await;
    let (status, body) = app
        .call(Method::POST, "/swipes", Some(&a.token), Some(swipe))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "state");
    assert_eq!(body["error"], "duplicate_swipe");

    let (status, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&a.token),
            Some(json!({ "target_id": a.id, "decision": "like" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "self_swipe");

    // b and c match; a is an outsider
    app.call(
        Method::POST,
        "/swipes",
        Some(&b.token),
        Some(json!({ "target_id": c.id, "decision": "like" })),
    )
    .await;
    let (_, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&c.token),
            Some(json!({ "target_id": b.id, "decision": "like" })),
        )
        .await;
    let match_id = body["match"]["id"].as_str().unwrap().to_string();
    let uri = format!("/matches/{match_id}/messages");

    let (status, body) = app
        .call(Method::POST, &uri, Some(&a.token), Some(json!({ "content": "hey" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_a_participant");

    let (status, body) = app
        .call(Method::POST, &uri, Some(&b.token), Some(json!({ "content": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_content");

    let (status, body) = app
        .call(
            Method::POST,
            &uri,
            Some(&b.token),
            Some(json!({ "content": "x".repeat(501) })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "too_long");
    assert_eq!(body["detail"], "max=500");

    let (status, body) = app.call(Method::GET, "/matches", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "auth");

    let (status, _) = app
        .call(Method::GET, "/matches", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verification_code_is_single_use() {
    let app = TestApp::new();
    let (_, body) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "ab1234@uni.edu", "password": "correct horse", "full_name": "A" })),
        )
        .await;
    let id = body["account_id"].clone();

    app.call(
        Method::POST,
        "/verification/request",
        None,
        Some(json!({ "email": "ab1234@uni.edu" })),
    )
    .await;
    let code = app.mailer.code_for("ab1234@uni.edu").unwrap();
    let verify = json!({ "account_id": id, "code": code });

    let (status, _) = app
        .call(Method::POST, "/verification/verify", None, Some(verify.clone()))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .call(Method::POST, "/verification/verify", None, Some(verify))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no_pending_code");

    let (status, body) = app
        .call(
            Method::POST,
            "/verification/request",
            None,
            Some(json!({ "email": "nobody@uni.edu" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "account_not_found");
}

#[tokio::test]
async fn malformed_input_gets_error_body() {
    let app = TestApp::new();
    let a = onboard(&app, "ab1234@uni.edu", "Asha").await;
    let b = onboard(&app, "cd5678@uni.edu", "Bilal").await;

    let (status, body) = app
        .call(Method::GET, "/candidates?limit=-1", Some(&a.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["error"], "invalid_request");
    assert!(body["detail"].is_string());

    let (status, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&a.token),
            Some(json!({ "target_id": b.id, "decision": "superlike" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = app
        .call(
            Method::GET,
            "/matches/not-a-uuid/messages",
            Some(&a.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["error"], "invalid_request");

    // Nothing was recorded by the rejected swipe
    let (_, feed) = app.call(Method::GET, "/candidates", Some(&a.token), None).await;
    assert_eq!(ids(&feed, "account_id"), vec![b.id.to_string()]);
}

#[tokio::test]
async fn unverified_account_is_kept_out_of_the_feed() {
    let app = TestApp::new();
    let a = onboard(&app, "ab1234@uni.edu", "Asha").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "gh0001@uni.edu", "password": "correct horse", "full_name": "Ghost" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let ghost_id: Uuid = body["account_id"].as_str().unwrap().parse().unwrap();
    let ghost_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(Method::GET, "/candidates", Some(&ghost_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "state");
    assert_eq!(body["error"], "not_activated");

    let (status, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&ghost_token),
            Some(json!({ "target_id": a.id, "decision": "like" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_activated");

    let (status, body) = app
        .call(
            Method::POST,
            "/swipes",
            Some(&a.token),
            Some(json!({ "target_id": ghost_id, "decision": "like" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "account_not_found");
}
