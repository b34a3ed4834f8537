use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::domain::error::Result;
use crate::domain::scan_list::ListKind;

use super::scanner::WarehouseQuery;
use super::{add_log, logged, AppState};

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    pub warehouse: String,
    #[serde(default)]
    pub kind: ListKind,
}

#[derive(Deserialize, Validate)]
pub struct UpdateListRequest {
    #[validate(length(max = 100, message = "List name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100, message = "Warehouse must be at most 100 characters"))]
    pub warehouse: Option<String>,
}

#[get("/lists")]
async fn list_lists(
    data: web::Data<AppState>,
    query: web::Query<WarehouseQuery>,
) -> Result<HttpResponse> {
    let lists = data
        .list_use_case
        .list_lists(query.warehouse.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(lists))
}

#[post("/lists")]
async fn create_list(
    data: web::Data<AppState>,
    req: web::Json<CreateListRequest>,
) -> Result<HttpResponse> {
    let list = logged(
        &data.logs,
        "Lists",
        "Create list",
        data.list_use_case
            .create_list(&req.name, &req.warehouse, req.kind)
            .await,
    )?;
    add_log(
        &data.logs,
        "INFO",
        "Lists",
        &format!("Created {} list '{}' in {}", list.kind, list.name, list.warehouse),
    );
    Ok(HttpResponse::Created().json(list))
}

#[get("/lists/{list_id}")]
async fn get_list(data: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let detail = data.list_use_case.get_detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[patch("/lists/{list_id}")]
async fn update_list(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<UpdateListRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let list = logged(
        &data.logs,
        "Lists",
        "Update list",
        data.list_use_case
            .update_list(
                path.into_inner(),
                req.name.as_deref(),
                req.warehouse.as_deref(),
            )
            .await,
    )?;
    Ok(HttpResponse::Ok().json(list))
}

#[delete("/lists/{list_id}")]
async fn delete_list(data: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let list_id = path.into_inner();
    logged(
        &data.logs,
        "Lists",
        "Delete list",
        data.list_use_case.delete_list(list_id).await,
    )?;
    add_log(&data.logs, "INFO", "Lists", &format!("Deleted list {}", list_id));
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/lists/{list_id}/scans/{scan_id}")]
async fn delete_scan(
    data: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (list_id, scan_id) = path.into_inner();
    let total = logged(
        &data.logs,
        "Scanner",
        "Delete scan",
        data.scan_use_case.delete_scan(list_id, scan_id).await,
    )?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "total": total })))
}

#[get("/lists/{list_id}/validations")]
async fn list_validations(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let validations = data
        .validation_use_case
        .list_validations(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(validations))
}

#[post("/lists/{list_id}/validation/reset")]
async fn reset_validation(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let removed = logged(
        &data.logs,
        "Validation",
        "Reset validation",
        data.validation_use_case
            .reset_validation(path.into_inner())
            .await,
    )?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "removed": removed })))
}

#[get("/warehouses")]
async fn list_warehouses(data: web::Data<AppState>) -> Result<HttpResponse> {
    let warehouses = data.list_use_case.list_warehouses().await?;
    Ok(HttpResponse::Ok().json(warehouses))
}

#[get("/duplicates")]
async fn list_duplicates(
    data: web::Data<AppState>,
    query: web::Query<WarehouseQuery>,
) -> Result<HttpResponse> {
    let groups = data
        .duplicate_use_case
        .find_duplicates(query.warehouse.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(groups))
}

#[get("/logs")]
async fn get_logs(data: web::Data<AppState>) -> HttpResponse {
    let logs = data
        .logs
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    HttpResponse::Ok().json(&*logs)
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use crate::domain::scan_list::ListKind;
    use crate::interfaces::http::configure;
    use crate::interfaces::http::test_support::test_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn list_crud_round_trip() {
        let state = test_state().await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/lists")
            .set_json(json!({"name": " Morning ", "warehouse": "North", "kind": "battery"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["name"], "Morning");
        assert_eq!(created["kind"], "battery");
        let id = created["id"].as_i64().unwrap();

        let req = test::TestRequest::patch()
            .uri(&format!("/api/lists/{}", id))
            .set_json(json!({"warehouse": "South"}))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["warehouse"], "South");

        let req = test::TestRequest::get().uri("/api/lists?warehouse=South").to_request();
        let lists: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(lists.as_array().unwrap().len(), 1);
        assert_eq!(lists[0]["scan_count"], 0);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/lists/{}", id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );

        let req = test::TestRequest::get()
            .uri(&format!("/api/lists/{}", id))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn create_list_rejects_blank_name() {
        let state = test_state().await;
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/lists")
            .set_json(json!({"name": "  ", "warehouse": "North"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn detail_scan_delete_and_reset() {
        let state = test_state().await;
        let list = state
            .list_use_case
            .create_list("A", "North", ListKind::Scooter)
            .await
            .unwrap();
        state.scan_use_case.record_scan(list.id, "AB1").await.unwrap();
        state.scan_use_case.record_scan(list.id, "CD2").await.unwrap();
        state.validation_use_case.validate(list.id, "AB1").await.unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/lists/{}", list.id))
            .to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["entries"].as_array().unwrap().len(), 2);
        assert_eq!(detail["validated_count"], 1);
        let newest = detail["entries"][0]["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/lists/{}/validations", list.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["identifier"], "AB1");

        let req = test::TestRequest::post()
            .uri(&format!("/api/lists/{}/validation/reset", list.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["removed"], 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/lists/{}/scans/{}", list.id, newest))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "success", "total": 1}));
    }

    #[actix_web::test]
    async fn warehouses_duplicates_logs_and_health() {
        let state = test_state().await;
        let a = state
            .list_use_case
            .create_list("A", "North", ListKind::Scooter)
            .await
            .unwrap();
        let b = state
            .list_use_case
            .create_list("B", "South", ListKind::Scooter)
            .await
            .unwrap();
        state.scan_use_case.record_scan(a.id, "AB1").await.unwrap();
        state.scan_use_case.record_scan(b.id, "https://tier.app/ab1").await.unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/warehouses").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!(["North", "South"]));

        let req = test::TestRequest::get().uri("/api/duplicates").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["identifier"], "AB1");
        assert_eq!(body[0]["occurrences"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/duplicates?warehouse=North")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));

        let req = test::TestRequest::get().uri("/api/logs").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_array());

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }
}
