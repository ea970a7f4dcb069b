mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::fixture;

#[tokio::test]
async fn vote_on_post() {
    let f = fixture();

    let res = f
        .app
        .post_json("/vote/", Some(&f.james.token), &json!({ "post_id": f.posts[3], "dir": 1 }))
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "Successfully added vote");
    assert!(f.app.db().has_voted(f.james.id, f.posts[3]).unwrap());
}

#[tokio::test]
async fn vote_twice_conflicts() {
    let f = fixture();
    let body = json!({ "post_id": f.posts[3], "dir": 1 });

    let first = f.app.post_json("/vote/", Some(&f.james.token), &body).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = f.app.post_json("/vote/", Some(&f.james.token), &body).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(
        second.detail(),
        format!("user {} has already voted on post {}", f.james.id, f.posts[3])
    );
}

#[tokio::test]
async fn retract_without_vote() {
    let f = fixture();

    let res = f
        .app
        .post_json("/vote/", Some(&f.james.token), &json!({ "post_id": f.posts[3], "dir": 0 }))
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.detail(), "Vote not found");
}

#[tokio::test]
async fn cast_retract_cast_again() {
    let f = fixture();
    let token = Some(f.ann.token.as_str());
    let cast = json!({ "post_id": f.posts[0], "dir": 1 });
    let retract = json!({ "post_id": f.posts[0], "dir": 0 });

    let steps = [
        (&cast, StatusCode::CREATED),
        (&retract, StatusCode::CREATED),
        (&retract, StatusCode::NOT_FOUND),
        (&cast, StatusCode::CREATED),
        (&cast, StatusCode::CONFLICT),
    ];

    for (i, (body, expected)) in steps.into_iter().enumerate() {
        let res = f.app.post_json("/vote/", token, body).await;
        assert_eq!(res.status, expected, "step {i}");
    }

    let listed = f
        .app
        .get(&format!("/posts/{}", f.posts[0]), token)
        .await;
    assert_eq!(listed.body["votes"], 1);
}

#[tokio::test]
async fn retract_reports_deletion() {
    let f = fixture();
    let token = Some(f.ann.token.as_str());

    f.app
        .post_json("/vote/", token, &json!({ "post_id": f.posts[1], "dir": 1 }))
        .await;
    let res = f
        .app
        .post_json("/vote/", token, &json!({ "post_id": f.posts[1], "dir": 0 }))
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "Successfully deleted vote");
    assert!(!f.app.db().has_voted(f.ann.id, f.posts[1]).unwrap());
}

#[tokio::test]
async fn vote_on_missing_post() {
    let f = fixture();

    for dir in [0, 1] {
        let res = f
            .app
            .post_json("/vote/", Some(&f.james.token), &json!({ "post_id": 80000, "dir": dir }))
            .await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "dir {dir}");
        assert_eq!(res.detail(), "post with id: 80000 doesn't exist");
    }
}

#[tokio::test]
async fn vote_requires_a_token() {
    let f = fixture();

    let res = f
        .app
        .post_json("/vote/", None, &json!({ "post_id": f.posts[3], "dir": 1 }))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.detail(), "Not authenticated");
}

#[tokio::test]
async fn malformed_vote_bodies_rejected() {
    let f = fixture();
    let token = Some(f.james.token.as_str());

    let bodies = [
        json!({ "post_id": f.posts[0], "dir": 2 }),
        json!({ "post_id": f.posts[0], "dir": -1 }),
        json!({ "post_id": "1 OR 1=1", "dir": 1 }),
        json!({ "post_id": f.posts[0] }),
    ];

    for body in &bodies {
        let res = f.app.post_json("/vote/", token, body).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "body {body}");
    }

    let xml = f
        .app
        .post_raw(
            "/vote/",
            token,
            "application/xml",
            "<vote><post_id>1</post_id><dir>1</dir></vote>",
        )
        .await;
    assert_eq!(xml.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(!f.app.db().has_voted(f.james.id, f.posts[0]).unwrap());
}

#[tokio::test]
async fn vote_route_only_accepts_post() {
    let f = fixture();

    let res = f.app.get("/vote/", Some(&f.james.token)).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);

    // method is checked before credentials
    let anonymous = f.app.get("/vote/", None).await;
    assert_eq!(anonymous.status, StatusCode::METHOD_NOT_ALLOWED);
}
