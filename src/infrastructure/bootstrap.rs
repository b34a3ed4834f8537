use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::application::{
    DuplicateUseCase, ExportUseCase, ListUseCase, ScanUseCase, ValidationUseCase,
};
use crate::application::use_cases::KnownPrefixes;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::connection::init_db;
use crate::infrastructure::db::lists::ListRepository;
use crate::infrastructure::db::scans::ScanRepository;
use crate::infrastructure::db::validations::ValidationRepository;
use crate::interfaces::http::{add_log, AppState, LogEntry, SharedLogs};

/// Opens the database and wires repositories into the use cases.
pub async fn setup(config: &AppConfig) -> Result<Arc<AppState>> {
    let logs: SharedLogs = Arc::new(Mutex::new(Vec::<LogEntry>::new()));

    let pool = init_db(&config.database_url, config.max_connections)
        .await
        .map_err(|err| {
            error!(error = %err, database_url = %config.database_url, "Failed to open database");
            add_log(&logs, "ERROR", "Bootstrap", &format!("Database unavailable: {}", err));
            err
        })?;
    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!("Database ready at {}", config.database_url),
    );

    Ok(Arc::new(build_state(pool, config.known_prefixes.clone(), logs)))
}

pub fn build_state(pool: SqlitePool, known_prefixes: Vec<String>, logs: SharedLogs) -> AppState {
    let prefixes: KnownPrefixes = Arc::new(known_prefixes);

    let list_repository = Arc::new(ListRepository::new(pool.clone()));
    let scan_repository = Arc::new(ScanRepository::new(pool.clone()));
    let validation_repository = Arc::new(ValidationRepository::new(pool));

    let duplicate_use_case = Arc::new(DuplicateUseCase::new(
        scan_repository.clone(),
        prefixes.clone(),
    ));

    AppState {
        list_use_case: ListUseCase::new(
            list_repository.clone(),
            scan_repository.clone(),
            prefixes.clone(),
        ),
        scan_use_case: ScanUseCase::new(
            list_repository.clone(),
            scan_repository.clone(),
            prefixes.clone(),
        ),
        validation_use_case: ValidationUseCase::new(
            list_repository.clone(),
            scan_repository.clone(),
            validation_repository,
            prefixes.clone(),
        ),
        export_use_case: ExportUseCase::new(
            list_repository,
            scan_repository,
            duplicate_use_case.clone(),
            prefixes,
        ),
        duplicate_use_case,
        logs,
    }
}
