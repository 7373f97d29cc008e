use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::features::tickets::dtos::MAX_IMAGE_SIZE;
use crate::features::tickets::handlers;
use crate::features::tickets::services::TicketService;

/// Create routes for the tickets feature
///
/// Note: These endpoints are public; buyers check tickets before paying.
pub fn routes(service: Arc<TicketService>) -> Router {
    // Allow body size up to MAX_IMAGE_SIZE + buffer for multipart overhead
    let image_limit = DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024);

    Router::new()
        .route("/api/tickets/register", post(handlers::register_ticket))
        .route(
            "/api/tickets/register-image",
            post(handlers::register_ticket_image).layer(image_limit),
        )
        .route("/api/tickets/verify", post(handlers::verify_ticket))
        .route(
            "/api/tickets/verify-image",
            post(handlers::verify_ticket_image).layer(image_limit),
        )
        .route("/api/tickets/admit", post(handlers::admit_ticket))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::shared::test_helpers::ticket_router;

    fn server() -> TestServer {
        let (router, _store) = ticket_router();
        TestServer::new(router).unwrap()
    }

    fn alice(qr_value: &str) -> Value {
        json!({
            "name": "Alice",
            "email": "a@x.com",
            "phone": "555-0100",
            "qr_value": qr_value,
        })
    }

    #[tokio::test]
    async fn test_register_then_duplicate() {
        let server = server();

        let first = server.post("/api/tickets/register").json(&alice("ABC123")).await;
        first.assert_status(StatusCode::CREATED);
        let body: Value = first.json();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["status"], json!("registered"));
        assert_eq!(body["data"]["buyer_id"], json!(1));
        assert_eq!(body["data"]["qr_value"], json!("abc123"));

        let second = server
            .post("/api/tickets/register")
            .json(&alice("  abc123 "))
            .await;
        second.assert_status(StatusCode::CONFLICT);
        let body: Value = second.json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["data"]["status"], json!("duplicate"));
        assert!(body["data"]["registered_at"].is_string());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let server = server();
        let mut payload = alice("ABC123");
        payload["email"] = json!("not-an-email");

        let response = server.post("/api/tickets/register").json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_json() {
        let server = server();

        let response = server
            .post("/api/tickets/register")
            .json(&json!({ "name": "Alice" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_reports_clean_then_registered() {
        let server = server();

        let clean = server
            .post("/api/tickets/verify")
            .json(&json!({ "qr_value": "ABC123" }))
            .await;
        clean.assert_status(StatusCode::OK);
        let body: Value = clean.json();
        assert_eq!(body["data"]["status"], json!("clean"));

        server
            .post("/api/tickets/register")
            .json(&alice("ABC123"))
            .await
            .assert_status(StatusCode::CREATED);

        let taken = server
            .post("/api/tickets/verify")
            .json(&json!({ "qr_value": "abc123" }))
            .await;
        taken.assert_status(StatusCode::CONFLICT);
        let body: Value = taken.json();
        assert_eq!(body["data"]["status"], json!("already_registered"));
        assert!(body["data"]["registered_at"].is_string());
    }

    #[tokio::test]
    async fn test_admit_flow() {
        let server = server();

        let unknown = server
            .post("/api/tickets/admit")
            .json(&json!({ "qr_value": "ABC123" }))
            .await;
        unknown.assert_status(StatusCode::NOT_FOUND);
        let body: Value = unknown.json();
        assert_eq!(body["data"]["status"], json!("not_registered"));

        server
            .post("/api/tickets/register")
            .json(&alice("ABC123"))
            .await
            .assert_status(StatusCode::CREATED);

        let granted = server
            .post("/api/tickets/admit")
            .json(&json!({ "qr_value": "ABC123" }))
            .await;
        granted.assert_status(StatusCode::OK);
        let body: Value = granted.json();
        assert_eq!(body["data"]["status"], json!("granted"));
        assert_eq!(body["data"]["buyer"]["email"], json!("a@x.com"));

        let reused = server
            .post("/api/tickets/admit")
            .json(&json!({ "qr_value": "abc123" }))
            .await;
        reused.assert_status(StatusCode::CONFLICT);
        let body: Value = reused.json();
        assert_eq!(body["data"]["status"], json!("already_used"));
        assert!(body["data"]["checked_in_at"].is_string());
    }

    #[tokio::test]
    async fn test_register_image() {
        let server = server();
        let form = MultipartForm::new()
            .add_text("name", "Alice")
            .add_text("email", "a@x.com")
            .add_text("phone", "555-0100")
            .add_part(
                "file",
                Part::bytes("ABC123".as_bytes().to_vec())
                    .file_name("ticket.png")
                    .mime_type("image/png"),
            );

        let response = server
            .post("/api/tickets/register-image")
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["qr_value"], json!("abc123"));
    }

    #[tokio::test]
    async fn test_register_image_requires_contact_fields() {
        let server = server();
        let form = MultipartForm::new().add_text("name", "Alice").add_part(
            "file",
            Part::bytes("ABC123".as_bytes().to_vec())
                .file_name("ticket.png")
                .mime_type("image/png"),
        );

        let response = server
            .post("/api/tickets/register-image")
            .multipart(form)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_image_applies_contact_rules() {
        let (router, store) = ticket_router();
        let server = TestServer::new(router).unwrap();

        for (email, phone) in [("not-an-email", "555-0100"), ("a@x.com", "call me")] {
            let form = MultipartForm::new()
                .add_text("name", "Alice")
                .add_text("email", email)
                .add_text("phone", phone)
                .add_part(
                    "file",
                    Part::bytes("ABC123".as_bytes().to_vec())
                        .file_name("ticket.png")
                        .mime_type("image/png"),
                );

            let response = server
                .post("/api/tickets/register-image")
                .multipart(form)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert!(body["errors"].is_array());
        }

        assert_eq!(store.buyer_count(), 0);
        assert_eq!(store.ticket_count(), 0);
    }

    #[tokio::test]
    async fn test_verify_image_rejects_unreadable_and_wrong_type() {
        let server = server();

        let blank = MultipartForm::new().add_part(
            "file",
            Part::bytes(Vec::<u8>::new())
                .file_name("ticket.png")
                .mime_type("image/png"),
        );
        server
            .post("/api/tickets/verify-image")
            .multipart(blank)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let pdf = MultipartForm::new().add_part(
            "file",
            Part::bytes("ABC123".as_bytes().to_vec())
                .file_name("ticket.pdf")
                .mime_type("application/pdf"),
        );
        server
            .post("/api/tickets/verify-image")
            .multipart(pdf)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_verify_image_reports_registered_ticket() {
        let server = server();
        server
            .post("/api/tickets/register")
            .json(&alice("ABC123"))
            .await
            .assert_status(StatusCode::CREATED);

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes("abc123".as_bytes().to_vec())
                .file_name("ticket.jpg")
                .mime_type("image/jpeg"),
        );
        let response = server
            .post("/api/tickets/verify-image")
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], json!("already_registered"));
    }
}
