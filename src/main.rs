use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod services;

use config::Config;
use db::{create_mysql_pool, import_catalogs};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );
    let mysql_pool = create_mysql_pool(&config)
        .await
        .expect("Failed to create MySQL pool");

    log::info!("Database connection established");

    import_catalogs(&config, &mysql_pool)
        .await
        .expect("Failed to import catalog seed files");

    let openapi = api::ApiDoc::openapi();

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let pool_data = web::Data::new(mysql_pool);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(config.clone()))
            .app_data(pool_data.clone())
            .route(
                "/api/docs",
                web::get().to(|| async {
                    actix_web::HttpResponse::PermanentRedirect()
                        .append_header(("Location", "/api/docs/"))
                        .finish()
                }),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
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
                            .route(
                                "/{user_id}/subscribe",
                                web::post().to(api::users::subscribe),
                            )
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
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
