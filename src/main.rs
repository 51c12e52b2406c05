use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use sqlx::PgPool;

use employee_manager_backend::config::AppConfig;
use employee_manager_backend::handlers;
use employee_manager_backend::services::{FileStore, IdentityService, LogMailSender, MailSender, PgIdentityService, S3FileStore};
use employee_manager_backend::store::{EntityStore, PgStore};
use employee_manager_backend::utils::jwt::JwtKeys;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::load()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::ConnectionRefused, err))?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

    let keys = JwtKeys::new(&config.jwt_secret);
    let store: Arc<dyn EntityStore> = Arc::new(PgStore::new(pool.clone()));
    let identity: Arc<dyn IdentityService> = Arc::new(PgIdentityService::new(pool, keys.clone()));
    let file_store: Arc<dyn FileStore> = Arc::new(S3FileStore::from_env(config.aws_region.clone(), config.s3_bucket.clone()).await);
    let mail: Arc<dyn MailSender> = Arc::new(LogMailSender::new(config.mail_from.clone()));

    let bind_address = config.bind_address.clone();
    info!("Starting server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(keys.clone()))
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::from(identity.clone()))
            .app_data(web::Data::from(file_store.clone()))
            .app_data(web::Data::from(mail.clone()))
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
