//! Integration tests for the phone connect API endpoint

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_string, mock_token, test_app};

    fn connect_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/connect")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// An unrecognised action is rejected before any Graph traffic.
    #[tokio::test]
    #[serial]
    async fn it_rejects_invalid_actions() {
        let app = test_app("http://localhost:1", "http://localhost:1");

        let response = app
            .oneshot(connect_request(
                r#"{"action": "4", "caller_number": "01234567890"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Invalid action selected: 4"));
    }

    /// A caller whose number matches nothing gets a polite failure, not an
    /// error.
    #[tokio::test]
    #[serial]
    async fn it_reports_unknown_callers() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/users/worker@example.com/contacts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value": []}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value": []}"#)
            .create_async()
            .await;

        let app = test_app(&server.url(), &server.url());
        let response = app
            .oneshot(connect_request(
                r#"{"action": "1", "caller_number": "01234567890"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(
            json["message"],
            "Unrecognised phone number - please phone the office."
        );
        assert_eq!(json["metrics"]["UnknownCaller"], 1);
    }

    /// Full round trip: token, caller lookup, event search and the patch
    /// that records the check-in.
    #[tokio::test]
    #[serial]
    async fn it_checks_in_an_appointment() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/users/worker@example.com/contacts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"value": [{
                    "displayName": "Billy",
                    "emailAddresses": [{"address": "billy@example.com"}]
                }]}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value": []}"#)
            .create_async()
            .await;
        // Served twice: the check-in search and the earlier-appointment
        // lookup. The second hit finds no checked-in appointment, so no
        // repair happens.
        let events_mock = server
            .mock("GET", "/users/worker@example.com/calendar/events")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_body(
                r#"{"value": [{
                    "id": "AAMk001",
                    "subject": "Home visit",
                    "bodyPreview": "Routine visit",
                    "body": {"contentType": "html", "content": "<body>Details</body>"},
                    "start": {"dateTime": "2024-01-01T10:00:00.0000000", "timeZone": "Etc/GMT"},
                    "end": {"dateTime": "2024-01-01T11:00:00.0000000", "timeZone": "Etc/GMT"},
                    "attendees": [{"emailAddress": {"address": "billy@example.com"}}],
                    "categories": []
                }]}"#,
            )
            .expect(2)
            .create_async()
            .await;
        let patch_mock = server
            .mock("PATCH", "/users/worker@example.com/calendar/events/AAMk001")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "categories": ["Checked-In"]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let app = test_app(&server.url(), &server.url());
        let response = app
            .oneshot(connect_request(
                r#"{"action": "check-in", "caller_number": "01234567890"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Your appointment has been checked in.");
        assert_eq!(json["action"], "Check in");
        assert_eq!(json["calling_number"], "01234567890");
        assert_eq!(json["metrics"]["CheckIns"], 1);
        events_mock.assert_async().await;
        patch_mock.assert_async().await;
    }

    /// An emergency call sends the alert email even when no appointment
    /// matches.
    #[tokio::test]
    #[serial]
    async fn it_sends_the_emergency_email() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server).await;
        server
            .mock("GET", "/users/worker@example.com/contacts")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"value": [{
                    "displayName": "Billy",
                    "emailAddresses": [{"address": "billy@example.com"}]
                }]}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value": []}"#)
            .create_async()
            .await;
        let mail_mock = server
            .mock("POST", "/users/worker@example.com/sendMail")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "message": {
                    "subject": "Emergency Assistance Required!",
                    "toRecipients": [{"emailAddress": {"address": "sos@example.com"}}]
                }
            })))
            .with_status(202)
            .create_async()
            .await;
        server
            .mock("GET", "/users/worker@example.com/calendar/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"value": []}"#)
            .create_async()
            .await;

        let app = test_app(&server.url(), &server.url());
        let response = app
            .oneshot(connect_request(
                r#"{"action": "3", "caller_number": "01234567890"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "No matching appointments found.");
        assert_eq!(json["metrics"]["Emergencies"], 1);
        mail_mock.assert_async().await;
    }

    /// Upstream failures surface as a 500 with phone-friendly wording.
    #[tokio::test]
    #[serial]
    async fn it_masks_upstream_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/test-tenant/oauth2/v2.0/token")
            .with_status(500)
            .with_body("login outage")
            .create_async()
            .await;

        let app = test_app(&server.url(), &server.url());
        let response = app
            .oneshot(connect_request(
                r#"{"action": "1", "caller_number": "01234567890"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_to_string(response.into_body()).await;
        assert_eq!(body, "An error occurred, please contact the office.");
        assert!(!body.contains("login outage"));
    }
}
