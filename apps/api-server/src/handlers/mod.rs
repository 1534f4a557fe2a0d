//! HTTP handlers and route configuration.

mod admin;
mod health;
mod posts;
mod views;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/posts", web::get().to(posts::list_published))
            .route(
                "/posts/{year}/{month}/{day}/{slug}",
                web::get().to(posts::post_detail),
            )
            .route("/posts/{id}/comments", web::post().to(posts::add_comment))
            // Admin routes
            .service(
                web::scope("/admin")
                    .route("/users", web::post().to(admin::create_user))
                    .route("/users/{id}", web::delete().to(admin::delete_user))
                    .route("/posts", web::get().to(admin::list_posts))
                    .route("/posts", web::post().to(admin::create_post))
                    .route("/posts/{id}", web::put().to(admin::update_post))
                    .route("/posts/{id}", web::delete().to(admin::delete_post))
                    .route("/posts/{id}/comments", web::get().to(admin::post_comments))
                    .route("/comments/{id}", web::patch().to(admin::moderate_comment))
                    .route("/comments/{id}", web::delete().to(admin::delete_comment)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use quill_infra::InMemoryStore;
    use serde_json::{Value, json};

    use super::configure_routes;
    use crate::observability::RequestIdMiddleware;
    use crate::state::AppState;

    const TOKEN: &str = "test-admin-token";

    macro_rules! test_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(RequestIdMiddleware)
                    .app_data(web::Data::new(
                        AppState::in_memory(InMemoryStore::new(), 3).with_admin_token(TOKEN),
                    ))
                    .configure(configure_routes),
            )
            .await
        };
    }

    macro_rules! create_author {
        ($app:expr, $username:expr $(,)?) => {{
            let username: &str = $username;
            let req = admin(test::TestRequest::post().uri("/api/admin/users"))
                .set_json(json!({ "username": username, "email": format!("{username}@example.com") }))
                .to_request();
            let body: Value = test::call_and_read_body_json($app, req).await;
            body["data"]["id"].as_str().unwrap().to_string()
        }};
    }

    macro_rules! create_post {
        ($app:expr, $post:expr $(,)?) => {{
            let req = admin(test::TestRequest::post().uri("/api/admin/posts"))
                .set_json($post)
                .to_request();
            test::call_service($app, req).await
        }};
    }

    fn admin(req: test::TestRequest) -> test::TestRequest {
        req.insert_header(("Authorization", format!("Bearer {TOKEN}")))
    }

    #[actix_web::test]
    async fn test_health_echoes_request_id() {
        let app = test_app!();
        let req = test::TestRequest::get()
            .uri("/api/health")
            .insert_header(("X-Request-ID", "abc-123"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["storage"], "memory");
        assert_eq!(body["request_id"], "abc-123");
    }

    #[actix_web::test]
    async fn test_admin_requires_token() {
        let app = test_app!();

        let req = test::TestRequest::get().uri("/api/admin/posts").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/admin/posts")
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_admin_closed_without_configured_token() {
        let state = AppState::in_memory(InMemoryStore::new(), 3);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = admin(test::TestRequest::get().uri("/api/admin/posts")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_publish_workflow() {
        let app = test_app!();
        let author = create_author!(&app, "django");

        let resp = create_post!(
            &app,
            json!({
                "author_id": author,
                "title": "Draft post",
                "slug": "a",
                "body": "Not yet",
                "publish": "2024-01-01T10:00:00Z"
            }),
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let draft: Value = test::read_body_json(resp).await;
        assert_eq!(draft["data"]["status"], "draft");
        let draft_id = draft["data"]["id"].as_str().unwrap().to_string();

        let resp = create_post!(
            &app,
            json!({
                "author_id": author,
                "title": "Who was Django Reinhardt?",
                "body": "A jazz guitarist.",
                "publish": "2024-01-02T10:00:00Z",
                "status": "published",
                "tags": ["jazz", "music"]
            }),
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
        let published: Value = test::read_body_json(resp).await;
        assert_eq!(
            published["data"]["url"],
            "/blog/2024/1/2/who-was-django-reinhardt/"
        );
        let published_id = published["data"]["id"].as_str().unwrap().to_string();

        // Only the published post is listed.
        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["data"]["total"], 1);
        assert_eq!(list["data"]["items"][0]["id"], published_id.as_str());

        // Drafts have no public detail page and take no comments.
        let req = test::TestRequest::get()
            .uri("/api/posts/2024/1/1/a")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{draft_id}/comments"))
            .set_json(json!({ "name": "Ann", "email": "ann@example.com", "body": "Hi" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        // Comment on the published post, then hide it.
        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{published_id}/comments"))
            .set_json(json!({ "name": "Ann", "email": "ann@example.com", "body": "Lovely" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let comment: Value = test::read_body_json(resp).await;
        let comment_id = comment["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/posts/2024/1/2/who-was-django-reinhardt")
            .to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["data"]["comments"].as_array().unwrap().len(), 1);

        let req = admin(test::TestRequest::patch().uri(&format!("/api/admin/comments/{comment_id}")))
            .set_json(json!({ "active": false }))
            .to_request();
        let moderated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(moderated["data"]["active"], false);

        let req = test::TestRequest::get()
            .uri("/api/posts/2024/1/2/who-was-django-reinhardt")
            .to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert!(detail["data"]["comments"].as_array().unwrap().is_empty());

        // Publishing the draft makes it visible.
        let req = admin(test::TestRequest::put().uri(&format!("/api/admin/posts/{draft_id}")))
            .set_json(json!({ "status": "published" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["data"]["total"], 2);
        assert_eq!(list["data"]["items"][0]["id"], published_id.as_str());
    }

    #[actix_web::test]
    async fn test_duplicate_slug_same_day_conflicts() {
        let app = test_app!();
        let author = create_author!(&app, "ann");
        let post = |publish: &str| {
            json!({
                "author_id": author,
                "title": "Same title",
                "body": "Body",
                "publish": publish
            })
        };

        let first = create_post!(&app, post("2024-03-01T08:00:00Z"));
        assert_eq!(first.status(), StatusCode::CREATED);

        let clash = create_post!(&app, post("2024-03-01T20:00:00Z"));
        assert_eq!(clash.status(), StatusCode::CONFLICT);

        let next_day = create_post!(&app, post("2024-03-02T08:00:00Z"));
        assert_eq!(next_day.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_invalid_input_rejected() {
        let app = test_app!();
        let author = create_author!(&app, "ann");

        let resp = create_post!(
            &app,
            json!({ "author_id": author, "title": "x".repeat(251), "body": "Body" }),
        );
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = create_post!(
            &app,
            json!({ "author_id": author, "title": "Ok", "body": "Body", "status": "archived" }),
        );
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = create_post!(
            &app,
            json!({ "author_id": uuid::Uuid::new_v4(), "title": "Ok", "body": "Body" }),
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_delete_author_removes_posts() {
        let app = test_app!();
        let author = create_author!(&app, "ann");
        for title in ["One", "Two"] {
            let resp = create_post!(
                &app,
                json!({ "author_id": author, "title": title, "body": "Body", "status": "published" }),
            );
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = admin(test::TestRequest::delete().uri(&format!("/api/admin/users/{author}")))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );

        let req = admin(test::TestRequest::get().uri("/api/admin/posts")).to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["data"]["total"], 0);
    }

    #[actix_web::test]
    async fn test_pagination_past_end_returns_last_page() {
        let app = test_app!();
        let author = create_author!(&app, "ann");
        for day in 1..=4 {
            let resp = create_post!(
                &app,
                json!({
                    "author_id": author,
                    "title": format!("Post {day}"),
                    "body": "Body",
                    "status": "published",
                    "publish": format!("2024-05-0{day}T12:00:00Z")
                }),
            );
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/posts?page=9").to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["data"]["page"], 2);
        assert_eq!(page["data"]["total_pages"], 2);
        assert_eq!(page["data"]["items"].as_array().unwrap().len(), 1);
        assert_eq!(page["data"]["items"][0]["title"], "Post 1");
    }

    #[actix_web::test]
    async fn test_huge_page_number_does_not_overflow() {
        let app = test_app!();
        let author = create_author!(&app, "ann");
        let resp = create_post!(
            &app,
            json!({ "author_id": author, "title": "Only", "body": "Body", "status": "published" }),
        );
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/posts?page=18446744073709551615")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["data"]["page"], 1);
        assert_eq!(page["data"]["items"][0]["title"], "Only");

        let req = admin(test::TestRequest::get().uri("/api/admin/posts?page=18446744073709551615"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: Value = test::read_body_json(resp).await;
        assert_eq!(page["data"]["total"], 1);
        assert!(page["data"]["items"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_overlong_tag_rejected() {
        let app = test_app!();
        let author = create_author!(&app, "ann");
        let resp = create_post!(
            &app,
            json!({ "author_id": author, "title": "Tagged", "body": "Body", "tags": ["t".repeat(101)] }),
        );
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_duplicate_username_conflicts() {
        let app = test_app!();
        create_author!(&app, "ann");

        let req = admin(test::TestRequest::post().uri("/api/admin/users"))
            .set_json(json!({ "username": "ann", "email": "other@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
