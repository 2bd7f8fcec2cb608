use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::configuration::JwtSettings;
use crate::middleware::{JwtMiddleware, RequestLogging};
use crate::routes::{
    change_password, create_post, deactivate_user, delete_post, get_post, get_user,
    get_user_with_posts, health_check, list_posts, list_users, login, logout, refresh, register,
    update_post, update_username,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let auth_service = web::Data::new(AuthService::new(connection.clone(), jwt_config.clone()));
    let connection = web::Data::new(connection);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            .app_data(connection.clone())
            .app_data(auth_service.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/users", web::get().to(list_users))
            .route("/users/{user_id}", web::get().to(get_user))
            .route("/users/{user_id}/posts", web::get().to(get_user_with_posts))
            .route("/posts", web::get().to(list_posts))
            .route("/posts/{post_id}", web::get().to(get_post))
            // Bearer-protected routes
            .service(
                web::scope("")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("/auth/logout", web::post().to(logout))
                    .route("/users/{user_id}/username", web::patch().to(update_username))
                    .route("/users/{user_id}/password", web::patch().to(change_password))
                    .route(
                        "/users/{user_id}/deactivate",
                        web::patch().to(deactivate_user),
                    )
                    .route("/posts", web::post().to(create_post))
                    .route("/posts/{post_id}", web::patch().to(update_post))
                    .route("/posts/{post_id}", web::delete().to(delete_post)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
