use actix_web::{middleware, web, App, HttpServer};
use blog_server::config::AppConfig;
use blog_server::models;
use blog_server::routes::{self, AppState};
use blog_server::store::Store;
use log::{error, info};
use simplelog::*;
use std::fs::File;
use std::io;

fn init_logging(config: &AppConfig) -> io::Result<()> {
    let level = config.level_filter().map_err(io::Error::other)?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &config.log_file {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    CombinedLogger::init(loggers).map_err(io::Error::other)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::load().map_err(io::Error::other)?;
    init_logging(&config)?;

    let store = Store::open(&config.database_path, models::registry()).map_err(|e| {
        error!("Failed to initialize database: {}", e);
        io::Error::other(e)
    })?;
    let data = web::Data::new(AppState::new(store));

    info!("Listening on {}", config.socket_addr());
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .bind(config.socket_addr())?
    .run()
    .await
}
