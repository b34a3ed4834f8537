mod api;
mod errors;
mod pages;
mod scanner;
mod state;

pub use state::AppState;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub type SharedLogs = Arc<Mutex<Vec<LogEntry>>>;

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Records a failed request in the operator log and passes the result on.
fn logged<T>(logs: &Mutex<Vec<LogEntry>>, source: &str, action: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        add_log(logs, "ERROR", source, &format!("{} failed: {}", action, err));
    }
    result
}

/// Routes shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .service(pages::index)
    .service(pages::create_list)
    .service(pages::scan_page)
    .service(pages::validate_page)
    .service(pages::duplicates_page)
    .service(scanner::save_scan)
    .service(scanner::save_battery_scan)
    .service(scanner::save_validation)
    .service(scanner::unvalidate_scooter)
    .service(scanner::finish_validation)
    .service(scanner::export_list)
    .service(scanner::export_duplicates)
    .service(
        web::scope("/api")
            .service(api::list_lists)
            .service(api::create_list)
            .service(api::get_list)
            .service(api::update_list)
            .service(api::delete_list)
            .service(api::delete_scan)
            .service(api::list_validations)
            .service(api::reset_validation)
            .service(api::list_warehouses)
            .service(api::list_duplicates)
            .service(api::get_logs)
            .service(api::health),
    );
}

pub fn start_server(state: Arc<AppState>, config: &AppConfig) -> std::io::Result<Server> {
    let data = web::Data::from(state);
    let permissive = config.cors_permissive;
    let address = config.bind_address();

    let server = HttpServer::new(move || {
        let cors = if permissive {
            Cors::permissive()
        } else {
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(configure)
    })
    .bind(address.clone())?
    .run();

    info!(host = %address.0, port = address.1, "HTTP server listening");
    Ok(server)
}
