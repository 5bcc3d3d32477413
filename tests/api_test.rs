// Integration tests for API endpoints
// These tests can be run in CI/CD pipelines (e.g., GitHub Actions)
// Run with: cargo test --test api_test
//
// Handlers run against a SeaORM MockDatabase, so no live MySQL is needed;
// each test enqueues exactly the rows its endpoint will ask for.

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use foodgram_backend::{
    api,
    auth::{create_token, Claims},
    config::{Config, JwtConfig, MediaConfig, MysqlConfig, SeedConfig, ServerConfig},
    entities::{favorite, ingredient, recipe, subscription, tag, user},
    models::{IngredientResponse, SubscriptionResponse, TagResponse},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use serde_json::json;
use std::collections::BTreeMap;

const TEST_SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 24,
        },
        mysql: MysqlConfig {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "password".to_string(),
            database: "foodgram_test".to_string(),
        },
        media: MediaConfig {
            root: std::env::temp_dir()
                .join("foodgram-test-media")
                .to_string_lossy()
                .into_owned(),
        },
        seed: SeedConfig {
            ingredients_file: None,
            tags_file: None,
        },
    }
}

fn bearer(user_id: i64) -> String {
    let claims = Claims::new(user_id, format!("user{}@example.com", user_id), 24);
    format!("Bearer {}", create_token(&claims, TEST_SECRET).unwrap())
}

fn user_row(id: i64, username: &str) -> user::Model {
    user::Model {
        id,
        email: format!("{}@example.com", username),
        username: username.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password_hash: "x".to_string(),
        avatar: None,
        created_at: Utc::now(),
    }
}

fn recipe_row(id: i64, author_id: i64, name: &str) -> recipe::Model {
    recipe::Model {
        id,
        author_id,
        name: name.to_string(),
        image: "/media/recipe/image/test.png".to_string(),
        text: "Cook it".to_string(),
        cooking_time: 10,
        short_code: "abcDEF1234".to_string(),
        created_at: Utc::now(),
    }
}

/// Helper function to create a test app over the given (mock) connection
fn create_test_app(
    db: DatabaseConnection,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(test_config()))
        .app_data(web::Data::new(db))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/signup", web::post().to(api::auth::signup))
                        .route("/login", web::post().to(api::auth::login)),
                )
                .service(
                    web::scope("/users")
                        .route("", web::get().to(api::users::list_users))
                        .route(
                            "/subscriptions",
                            web::get().to(api::users::list_subscriptions),
                        )
                        .route("/me", web::get().to(api::users::me))
                        .route("/me/avatar", web::put().to(api::users::set_avatar))
                        .route("/me/avatar", web::delete().to(api::users::delete_avatar))
                        .route("/{user_id}", web::get().to(api::users::get_user))
                        .route("/{user_id}/subscribe", web::post().to(api::users::subscribe))
                        .route(
                            "/{user_id}/subscribe",
                            web::delete().to(api::users::unsubscribe),
                        ),
                )
                .service(
                    web::scope("/tags")
                        .route("", web::get().to(api::tags::list_tags))
                        .route("/{tag_id}", web::get().to(api::tags::get_tag)),
                )
                .service(
                    web::scope("/ingredients")
                        .route("", web::get().to(api::ingredients::list_ingredients))
                        .route(
                            "/{ingredient_id}",
                            web::get().to(api::ingredients::get_ingredient),
                        ),
                )
                .service(
                    web::scope("/recipes")
                        .route("", web::get().to(api::recipes::list_recipes))
                        .route("", web::post().to(api::recipes::create_recipe))
                        .route(
                            "/download_shopping_cart",
                            web::get().to(api::recipes::download_shopping_cart),
                        )
                        .route("/{recipe_id}", web::get().to(api::recipes::get_recipe))
                        .route("/{recipe_id}", web::patch().to(api::recipes::update_recipe))
                        .route(
                            "/{recipe_id}",
                            web::delete().to(api::recipes::delete_recipe),
                        )
                        .route(
                            "/{recipe_id}/get-link",
                            web::get().to(api::recipes::get_short_link),
                        )
                        .route(
                            "/{recipe_id}/favorite",
                            web::post().to(api::recipes::favorite),
                        )
                        .route(
                            "/{recipe_id}/favorite",
                            web::delete().to(api::recipes::unfavorite),
                        )
                        .route(
                            "/{recipe_id}/shopping_cart",
                            web::post().to(api::recipes::add_to_shopping_cart),
                        )
                        .route(
                            "/{recipe_id}/shopping_cart",
                            web::delete().to(api::recipes::remove_from_shopping_cart),
                        ),
                ),
        )
        .route("/s/{code}", web::get().to(api::links::redirect_short_link))
}

#[actix_web::test]
async fn test_list_tags() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![
            tag::Model {
                id: 1,
                name: "Breakfast".to_string(),
                slug: "breakfast".to_string(),
            },
            tag::Model {
                id: 2,
                name: "Dinner".to_string(),
                slug: "dinner".to_string(),
            },
        ]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::get().uri("/api/tags").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "List tags should return 200");

    let tags: Vec<TagResponse> = test::read_body_json(resp).await;
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].slug, "breakfast");
}

#[actix_web::test]
async fn test_get_tag_not_found() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<tag::Model>::new()])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::get().uri("/api/tags/999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_ingredient_search() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![ingredient::Model {
            id: 3,
            name: "sea salt".to_string(),
            measurement_unit: "g".to_string(),
        }]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::get()
        .uri("/api/ingredients?name=salt")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let ingredients: Vec<IngredientResponse> = test::read_body_json(resp).await;
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0].name, "sea salt");
}

#[actix_web::test]
async fn test_create_recipe_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .set_json(json!({
            "name": "Soup",
            "text": "Boil water",
            "cooking_time": 10,
            "ingredients": [{"id": 1, "amount": 2}],
            "tags": [1]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_recipe_empty_ingredients() {
    // Validation fails before any query is issued, so no mock rows are needed.
    let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .insert_header(("Authorization", bearer(1)))
        .set_json(json!({
            "name": "Soup",
            "text": "Boil water",
            "cooking_time": 10,
            "image": "data:image/png;base64,aGk=",
            "ingredients": [],
            "tags": [1]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(
        body["error"].as_str().unwrap().contains("ingredients"),
        "Error should name the ingredients field: {}",
        body
    );
}

#[actix_web::test]
async fn test_create_recipe_unknown_ingredient() {
    // The catalog lookup for id 99 comes back empty.
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<ingredient::Model>::new()])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .insert_header(("Authorization", bearer(1)))
        .set_json(json!({
            "name": "Soup",
            "text": "Boil water",
            "cooking_time": 10,
            "image": "data:image/png;base64,aGk=",
            "ingredients": [{"id": 99, "amount": 2}],
            "tags": [1]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(
        body["error"].as_str().unwrap().contains("99"),
        "Error should name the unknown ingredient id: {}",
        body
    );
}

#[actix_web::test]
async fn test_create_recipe_duplicate_ingredient() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![ingredient::Model {
            id: 1,
            name: "salt".to_string(),
            measurement_unit: "g".to_string(),
        }]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .insert_header(("Authorization", bearer(1)))
        .set_json(json!({
            "name": "Soup",
            "text": "Boil water",
            "cooking_time": 10,
            "image": "data:image/png;base64,aGk=",
            "ingredients": [{"id": 1, "amount": 2}, {"id": 1, "amount": 3}],
            "tags": [1]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("repeat"));
}

#[actix_web::test]
async fn test_create_recipe_zero_cooking_time() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![ingredient::Model {
            id: 1,
            name: "salt".to_string(),
            measurement_unit: "g".to_string(),
        }]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes")
        .insert_header(("Authorization", bearer(1)))
        .set_json(json!({
            "name": "Soup",
            "text": "Boil water",
            "cooking_time": 0,
            "image": "data:image/png;base64,aGk=",
            "ingredients": [{"id": 1, "amount": 2}],
            "tags": [1]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::BAD_REQUEST,
        "cooking_time = 0 must be rejected"
    );
}

#[actix_web::test]
async fn test_favorite_twice_conflict() {
    // Recipe exists, and a favorite row is already present.
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![recipe_row(5, 2, "Borscht")]])
        .append_query_results([vec![favorite::Model {
            id: 1,
            user_id: 1,
            recipe_id: 5,
            created_at: Utc::now(),
        }]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/5/favorite")
        .insert_header(("Authorization", bearer(1)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::BAD_REQUEST,
        "Duplicate favorite add must fail"
    );

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[actix_web::test]
async fn test_favorite_unknown_recipe() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<recipe::Model>::new()])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/recipes/999/favorite")
        .insert_header(("Authorization", bearer(1)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unfavorite_missing_pair() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::delete()
        .uri("/api/recipes/5/favorite")
        .insert_header(("Authorization", bearer(1)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::NOT_FOUND,
        "Removing a favorite that does not exist must return 404"
    );
}

#[actix_web::test]
async fn test_subscribe_to_self() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(7, "selfie")]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/users/7/subscribe")
        .insert_header(("Authorization", bearer(7)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::BAD_REQUEST,
        "Self-follow must always fail"
    );

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("yourself"));
}

#[actix_web::test]
async fn test_subscribe() {
    let mut count_row = BTreeMap::new();
    count_row.insert("num_items", Value::Int(Some(0)));

    let db = MockDatabase::new(DatabaseBackend::MySql)
        // author lookup
        .append_query_results([vec![user_row(2, "chef")]])
        // no existing edge
        .append_query_results([Vec::<subscription::Model>::new()])
        // recipes_count for the subscription view
        .append_query_results([vec![count_row]])
        // author's recipes slice
        .append_query_results([Vec::<recipe::Model>::new()])
        .append_exec_results([MockExecResult {
            last_insert_id: 1,
            rows_affected: 1,
        }])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/users/2/subscribe")
        .insert_header(("Authorization", bearer(1)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::CREATED,
        "Subscribe should return 201 CREATED"
    );

    let body: SubscriptionResponse = test::read_body_json(resp).await;
    assert_eq!(body.id, 2);
    assert!(body.is_subscribed);
    assert_eq!(body.recipes_count, 0);
}

#[actix_web::test]
async fn test_unsubscribe_missing_edge() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::delete()
        .uri("/api/users/2/subscribe")
        .insert_header(("Authorization", bearer(1)))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_short_link_redirect() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![recipe_row(42, 1, "Pelmeni")]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::get().uri("/s/abcDEF1234").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/api/recipes/42");
}

#[actix_web::test]
async fn test_get_short_link() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![recipe_row(42, 1, "Pelmeni")]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::get()
        .uri("/api/recipes/42/get-link")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body["short-link"].as_str().unwrap(),
        "http://localhost:8080/s/abcDEF1234"
    );
}

#[actix_web::test]
async fn test_download_shopping_cart_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::get()
        .uri("/api/recipes/download_shopping_cart")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_signup_duplicate_email() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![user_row(1, "taken")]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({
            "email": "taken@example.com",
            "username": "taken",
            "first_name": "Taken",
            "last_name": "User",
            "password": "password123"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.status(),
        StatusCode::CONFLICT,
        "Duplicate signup should return 409 CONFLICT"
    );
}

#[actix_web::test]
async fn test_login_wrong_password() {
    let mut existing = user_row(1, "cook");
    existing.password_hash =
        foodgram_backend::auth::hash_password("correctpassword").unwrap();

    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![existing]])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({
            "email": "cook@example.com",
            "password": "wrongpassword"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_unknown_user() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = test::init_service(create_test_app(db)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({
            "email": "nobody@example.com",
            "password": "whatever"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
