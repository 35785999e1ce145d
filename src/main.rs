mod db;
mod errors;
mod handlers;
mod models;
mod utils;

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let pool = db::create_pool().await;

    info!("Starting server at 127.0.0.1:8080");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .service(
                web::resource("/employees")
                    .route(web::get().to(handlers::employee::list_employees))
                    .route(web::post().to(handlers::employee::create_employee)),
            )
            .service(
                web::resource("/employees/options")
                    .route(web::get().to(handlers::employee::list_employee_options)),
            )
            .service(
                web::resource("/employees/{id}")
                    .route(web::get().to(handlers::employee::get_employee))
                    .route(web::put().to(handlers::employee::update_employee)),
            )
            .service(
                web::resource("/timesheets")
                    .route(web::get().to(handlers::timesheet::list_timesheets))
                    .route(web::post().to(handlers::timesheet::create_timesheet)),
            )
            .service(
                web::resource("/timesheets/{id}")
                    .route(web::get().to(handlers::timesheet::get_timesheet))
                    .route(web::put().to(handlers::timesheet::update_timesheet)),
            )
            // Uploaded photos resolve at the same root-relative URLs the
            // employee rows store.
            .service(Files::new("/uploads", "./public/uploads"))
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}
