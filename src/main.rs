mod config;
mod db;
mod entity;
mod error;
mod repository;
mod response;
mod routes;
mod upload;

#[cfg(test)]
mod test_support;

use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use db::connect_db;
use log::{error, info};
use response::BODY_LIMIT;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("server failed to start: {}", e);
            std::process::exit(1);
        }
    };
    let db = match connect_db(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("unable to connect to the database: {}", e);
            std::process::exit(1);
        }
    };
    let server_port = config.server_port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::FormConfig::default().limit(BODY_LIMIT))
            .wrap(middleware::Logger::default())
            .configure(routes::config)
            .default_service(web::to(routes::system::not_found))
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}
