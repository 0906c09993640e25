//! Tests for engagement HTTP handlers.

use super::*;
use crate::domain::Error;
use crate::domain::ports::{FixtureFeedQuery, MockEngagementCommand};
use crate::inbound::http::test_utils::{session_cookie, sign_in, test_session_middleware};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

const ITEM_ID: &str = "00000000-0000-0000-0000-0000000000a1";
const VIEWER_ID: &str = "00000000-0000-0000-0000-0000000000c3";
const OWNER_ID: &str = "00000000-0000-0000-0000-0000000000b2";

fn test_app(
    engagement: MockEngagementCommand,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(Arc::new(FixtureFeedQuery), Arc::new(engagement));
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(
            web::scope("/api/v1")
                .service(record_view)
                .service(rate_item)
                .service(follow_user)
                .service(unfollow_user),
        )
        .service(sign_in)
}

async fn send(
    engagement: MockEngagementCommand,
    request: actix_test::TestRequest,
    signed_in: bool,
) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(engagement)).await;
    let request = if signed_in {
        request.cookie(session_cookie(&app, VIEWER_ID).await)
    } else {
        request
    };
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

fn view_request() -> actix_test::TestRequest {
    actix_test::TestRequest::post().uri(&format!("/api/v1/items/{ITEM_ID}/views"))
}

fn rating_request(body: Value) -> actix_test::TestRequest {
    actix_test::TestRequest::put()
        .uri(&format!("/api/v1/items/{ITEM_ID}/rating"))
        .set_json(body)
}

#[rstest]
#[case(view_request())]
#[case(rating_request(json!({"rating": 4})))]
#[case(actix_test::TestRequest::put().uri(&format!("/api/v1/users/{OWNER_ID}/follow")))]
#[case(actix_test::TestRequest::delete().uri(&format!("/api/v1/users/{OWNER_ID}/follow")))]
#[actix_web::test]
async fn engagement_requires_a_session(#[case] request: actix_test::TestRequest) {
    let mut engagement = MockEngagementCommand::new();
    engagement.expect_record_view().times(0);
    engagement.expect_rate_item().times(0);
    engagement.expect_follow().times(0);
    engagement.expect_unfollow().times(0);

    let (status, body) = send(engagement, request, false).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[rstest]
#[case(true, 5)]
#[case(false, 4)]
#[actix_web::test]
async fn views_report_whether_they_were_counted(#[case] recorded: bool, #[case] seen: i32) {
    let mut engagement = MockEngagementCommand::new();
    engagement
        .expect_record_view()
        .withf(|item_id, viewer_id| {
            item_id.to_string() == ITEM_ID && viewer_id.to_string() == VIEWER_ID
        })
        .times(1)
        .returning(move |item_id, _| {
            Ok(ViewOutcome {
                item_id: *item_id,
                seen,
                recorded,
            })
        });

    let (status, body) = send(engagement, view_request(), true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemId"], ITEM_ID);
    assert_eq!(body["seen"], seen);
    assert_eq!(body["recorded"], recorded);
}

#[actix_web::test]
async fn valid_ratings_are_forwarded() {
    let mut engagement = MockEngagementCommand::new();
    engagement
        .expect_rate_item()
        .withf(|_, _, rating| rating.get() == 4)
        .times(1)
        .returning(|item_id, _, rating| {
            Ok(RatingOutcome {
                item_id: *item_id,
                rating,
                recorded: true,
            })
        });

    let (status, body) = send(engagement, rating_request(json!({"rating": 4})), true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 4);
    assert_eq!(body["recorded"], true);
}

#[rstest]
#[case(json!({"rating": 0}), "invalid_rating")]
#[case(json!({"rating": 6}), "invalid_rating")]
#[case(json!({}), "missing_field")]
#[actix_web::test]
async fn invalid_ratings_are_rejected(#[case] payload: Value, #[case] code: &str) {
    let mut engagement = MockEngagementCommand::new();
    engagement.expect_rate_item().times(0);

    let (status, body) = send(engagement, rating_request(payload), true).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], code);
    assert_eq!(body["details"]["field"], "rating");
}

#[actix_web::test]
async fn self_follow_surfaces_invalid_request() {
    let mut engagement = MockEngagementCommand::new();
    engagement
        .expect_follow()
        .times(1)
        .returning(|_, _| Err(Error::invalid_request("users cannot follow themselves")));

    let request =
        actix_test::TestRequest::put().uri(&format!("/api/v1/users/{VIEWER_ID}/follow"));
    let (status, body) = send(engagement, request, true).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "users cannot follow themselves");
}

#[actix_web::test]
async fn unfollow_reports_unchanged_edges() {
    let mut engagement = MockEngagementCommand::new();
    engagement
        .expect_unfollow()
        .withf(|follower, followed| {
            follower.to_string() == VIEWER_ID && followed.to_string() == OWNER_ID
        })
        .times(1)
        .returning(|_, followed| {
            Ok(FollowOutcome {
                followed_id: *followed,
                following: false,
                changed: false,
            })
        });

    let request =
        actix_test::TestRequest::delete().uri(&format!("/api/v1/users/{OWNER_ID}/follow"));
    let (status, body) = send(engagement, request, true).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], OWNER_ID);
    assert_eq!(body["following"], false);
    assert_eq!(body["changed"], false);
}

#[actix_web::test]
async fn malformed_user_id_is_rejected() {
    let mut engagement = MockEngagementCommand::new();
    engagement.expect_follow().times(0);

    let request = actix_test::TestRequest::put().uri("/api/v1/users/someone/follow");
    let (status, body) = send(engagement, request, true).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_uuid");
}
