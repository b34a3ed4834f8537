//! JSON endpoints posted to by the scanning pages, plus file downloads.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::Result;
use crate::domain::scan_list::ValidationSummary;
use crate::infrastructure::export::{ExportFile, ExportFormat};

use super::{add_log, logged, AppState};

#[derive(Deserialize)]
pub struct ScooterRequest {
    #[serde(alias = "session_id")]
    pub list_id: i64,
    pub scooter_id: String,
}

#[derive(Deserialize)]
pub struct BatteryRequest {
    #[serde(alias = "session_id")]
    pub list_id: i64,
    pub battery_id: String,
}

#[derive(Deserialize)]
pub struct FinishRequest {
    #[serde(alias = "session_id")]
    pub list_id: i64,
}

#[derive(Serialize)]
struct FinishResponse {
    status: &'static str,
    #[serde(flatten)]
    summary: ValidationSummary,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct WarehouseQuery {
    #[serde(default)]
    pub warehouse: Option<String>,
}

#[post("/save_scan")]
async fn save_scan(
    data: web::Data<AppState>,
    req: web::Json<ScooterRequest>,
) -> Result<HttpResponse> {
    let outcome = logged(
        &data.logs,
        "Scanner",
        "Scan",
        data.scan_use_case.record_scan(req.list_id, &req.scooter_id).await,
    )?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/save_battery_scan")]
async fn save_battery_scan(
    data: web::Data<AppState>,
    req: web::Json<BatteryRequest>,
) -> Result<HttpResponse> {
    let outcome = logged(
        &data.logs,
        "Scanner",
        "Battery scan",
        data.scan_use_case.record_scan(req.list_id, &req.battery_id).await,
    )?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/save_validation")]
async fn save_validation(
    data: web::Data<AppState>,
    req: web::Json<ScooterRequest>,
) -> Result<HttpResponse> {
    let outcome = logged(
        &data.logs,
        "Validation",
        "Validation",
        data.validation_use_case.validate(req.list_id, &req.scooter_id).await,
    )?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/unvalidate_scooter")]
async fn unvalidate_scooter(
    data: web::Data<AppState>,
    req: web::Json<ScooterRequest>,
) -> Result<HttpResponse> {
    let outcome = logged(
        &data.logs,
        "Validation",
        "Unvalidate",
        data.validation_use_case
            .unvalidate(req.list_id, &req.scooter_id)
            .await,
    )?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/finish_validation")]
async fn finish_validation(
    data: web::Data<AppState>,
    req: web::Json<FinishRequest>,
) -> Result<HttpResponse> {
    let summary = logged(
        &data.logs,
        "Validation",
        "Finish validation",
        data.validation_use_case.finish_validation(req.list_id).await,
    )?;
    add_log(
        &data.logs,
        "INFO",
        "Validation",
        &format!(
            "List {} validated: {}/{}",
            summary.list_id, summary.validated, summary.total
        ),
    );
    Ok(HttpResponse::Ok().json(FinishResponse {
        status: "success",
        summary,
    }))
}

#[get("/export/{list_id}")]
async fn export_list(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse> {
    let list_id = path.into_inner();
    let format = ExportFormat::from_str(query.format.as_deref().unwrap_or_default())?;
    let file = logged(
        &data.logs,
        "Export",
        "Export",
        data.export_use_case.export_list(list_id, format).await,
    )?;
    add_log(
        &data.logs,
        "INFO",
        "Export",
        &format!("Exported list {} as {}", list_id, file.filename),
    );
    Ok(attachment(file))
}

#[get("/export_duplicates")]
async fn export_duplicates(
    data: web::Data<AppState>,
    query: web::Query<WarehouseQuery>,
) -> Result<HttpResponse> {
    let file = logged(
        &data.logs,
        "Export",
        "Duplicate export",
        data.export_use_case
            .export_duplicates(query.warehouse.as_deref())
            .await,
    )?;
    Ok(attachment(file))
}

fn attachment(file: ExportFile) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(file.format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.filename)],
        })
        .body(file.bytes)
}
