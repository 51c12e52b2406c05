pub mod account;
pub mod department;
pub mod employee;
pub mod extract;
pub mod file;
pub mod role;

use actix_web::web;

/// Folder employee pictures are uploaded into.
pub const IMAGES_FOLDER: &str = "Images";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/account/register", web::post().to(account::register))
            .route("/account/login", web::post().to(account::login))
            .route("/account/forgot-password", web::post().to(account::forgot_password))
            .route("/account/reset-password", web::post().to(account::reset_password))
            .route("/files/{folder}", web::post().to(file::upload_file))
            .service(
                web::resource("/employees")
                    .route(web::get().to(employee::get_employees))
                    .route(web::post().to(employee::create_employee)),
            )
            .service(
                web::resource("/employees/{id}")
                    .route(web::get().to(employee::get_employee))
                    .route(web::put().to(employee::update_employee))
                    .route(web::delete().to(employee::delete_employee)),
            )
            .service(
                web::resource("/departments")
                    .route(web::get().to(department::get_departments))
                    .route(web::post().to(department::create_department)),
            )
            .service(
                web::resource("/departments/{id}")
                    .route(web::get().to(department::get_department))
                    .route(web::put().to(department::update_department))
                    .route(web::delete().to(department::delete_department)),
            )
            .service(
                web::resource("/roles")
                    .route(web::get().to(role::get_roles))
                    .route(web::post().to(role::create_role)),
            )
            .service(
                web::resource("/roles/{id}")
                    .route(web::get().to(role::get_role))
                    .route(web::put().to(role::update_role))
                    .route(web::delete().to(role::delete_role)),
            )
            .service(
                web::resource("/roles/{id}/users")
                    .route(web::get().to(role::get_role_users))
                    .route(web::put().to(role::set_role_users)),
            ),
    );
}
