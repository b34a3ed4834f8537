//! Server-rendered pages used on the warehouse floor.

use actix_web::{get, http::header, post, web, HttpResponse};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use url::form_urlencoded;

use crate::application::use_cases::export::format_timestamp;
use crate::domain::duplicate::DuplicateGroup;
use crate::domain::error::Result;
use crate::domain::scan_list::{ListDetail, ListKind, ListSummary};

use super::scanner::WarehouseQuery;
use super::{add_log, logged, AppState};

const STYLE: &str = "body{font-family:sans-serif;margin:1.5rem;max-width:60rem}\
table{border-collapse:collapse;width:100%}td,th{border-bottom:1px solid #ddd;padding:.3rem;text-align:left}\
.ok{color:#2a7a2a}.warn{color:#b36b00}.err{color:#b00020}input,select,button{font-size:1rem;padding:.3rem}";

#[derive(Deserialize)]
pub struct NewListForm {
    pub list_name: String,
    pub warehouse_name: String,
    #[serde(default)]
    pub list_type: String,
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title><style>{STYLE}</style></head><body>\
<nav><a href=\"/\">Lists</a> | <a href=\"/duplicates\">Duplicates</a></nav>{body}</body></html>",
        title = escape_html(title),
    ))
}

#[get("/")]
async fn index(data: web::Data<AppState>) -> Result<HttpResponse> {
    let summaries = data.list_use_case.list_lists(None).await?;
    Ok(layout("Inventory lists", &render_index(&summaries)))
}

fn render_index(summaries: &[ListSummary]) -> String {
    let mut by_warehouse: BTreeMap<&str, Vec<&ListSummary>> = BTreeMap::new();
    for summary in summaries {
        by_warehouse
            .entry(summary.list.warehouse.as_str())
            .or_default()
            .push(summary);
    }

    let mut html = String::from(
        "<h1>Inventory lists</h1>\
<form method=\"post\" action=\"/scan\">\
<input name=\"list_name\" placeholder=\"List name\" maxlength=\"100\" required> \
<input name=\"warehouse_name\" placeholder=\"Warehouse\" maxlength=\"100\" required> \
<select name=\"list_type\"><option value=\"scooter\">Scooters</option>\
<option value=\"battery\">Batteries</option></select> \
<button type=\"submit\">Start scanning</button></form>",
    );

    if by_warehouse.is_empty() {
        html.push_str("<p>No lists yet.</p>");
    }
    for (warehouse, lists) in by_warehouse {
        let _ = write!(html, "<h2>{}</h2><table><tr><th>List</th><th>Type</th><th>Scans</th><th>Validated</th><th>Created</th><th></th></tr>", escape_html(warehouse));
        for summary in lists {
            let list = &summary.list;
            let status = if list.is_validated {
                "<span class=\"ok\">done</span>"
            } else {
                ""
            };
            let _ = write!(
                html,
                "<tr><td>{name}</td><td>{kind}</td><td>{scans}</td><td>{validated} {status}</td><td>{created}</td>\
<td><a href=\"/lists/{id}/scan\">Scan</a> <a href=\"/lists/{id}/validate\">Validate</a> \
<a href=\"/export/{id}\">XLSX</a> <a href=\"/export/{id}?format=csv\">CSV</a></td></tr>",
                name = escape_html(&list.name),
                kind = list.kind,
                scans = summary.scan_count,
                validated = summary.validated_count,
                created = format_timestamp(list.created_at),
                id = list.id,
            );
        }
        html.push_str("</table>");
    }
    html
}

#[post("/scan")]
async fn create_list(
    data: web::Data<AppState>,
    form: web::Form<NewListForm>,
) -> Result<HttpResponse> {
    let kind: ListKind = form.list_type.parse()?;
    let list = logged(
        &data.logs,
        "Lists",
        "Create list",
        data.list_use_case
            .create_list(&form.list_name, &form.warehouse_name, kind)
            .await,
    )?;
    add_log(
        &data.logs,
        "INFO",
        "Lists",
        &format!("Started {} list '{}' in {}", list.kind, list.name, list.warehouse),
    );
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("/lists/{}/scan", list.id)))
        .finish())
}

#[get("/lists/{list_id}/scan")]
async fn scan_page(data: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let detail = data.list_use_case.get_detail(path.into_inner()).await?;
    Ok(layout(&detail.list.name, &render_scan(&detail)))
}

fn render_scan(detail: &ListDetail) -> String {
    let list = &detail.list;
    let (endpoint, field) = match list.kind {
        ListKind::Scooter => ("/save_scan", "scooter_id"),
        ListKind::Battery => ("/save_battery_scan", "battery_id"),
    };
    let mut html = format!(
        "<h1>{name}</h1><p>{warehouse} | {label}s scanned: <strong id=\"total\">{total}</strong></p>\
<form id=\"scan-form\"><input id=\"code\" autofocus autocomplete=\"off\" maxlength=\"200\" placeholder=\"{label}\"> \
<button type=\"submit\">Save</button></form><p id=\"message\"></p>\
<p><a href=\"/lists/{id}/validate\">Validate</a> | <a href=\"/export/{id}\">Export XLSX</a> | \
<a href=\"/export/{id}?format=csv\">Export CSV</a></p>",
        name = escape_html(&list.name),
        warehouse = escape_html(&list.warehouse),
        label = list.kind.id_label(),
        total = detail.total(),
        id = list.id,
    );
    html.push_str(&render_entries(detail));
    let _ = write!(
        html,
        "<script>\
const form=document.getElementById('scan-form'),code=document.getElementById('code'),msg=document.getElementById('message');\
form.addEventListener('submit',async(e)=>{{e.preventDefault();const value=code.value.trim();if(!value)return;\
const res=await fetch('{endpoint}',{{method:'POST',headers:{{'Content-Type':'application/json'}},\
body:JSON.stringify({{list_id:{id},{field}:value}})}});const data=await res.json();\
if(data.status==='success'){{document.getElementById('total').textContent=data.total;msg.className='ok';msg.textContent='Saved '+value;}}\
else if(data.status==='duplicate'){{msg.className='warn';msg.textContent='Already scanned '+value;}}\
else{{msg.className='err';msg.textContent=data.message||'Error';}}code.value='';code.focus();}});\
</script>",
        endpoint = endpoint,
        field = field,
        id = list.id,
    );
    html
}

#[get("/lists/{list_id}/validate")]
async fn validate_page(data: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
    let detail = data.list_use_case.get_detail(path.into_inner()).await?;
    Ok(layout(
        &format!("Validate {}", detail.list.name),
        &render_validate(&detail),
    ))
}

fn render_validate(detail: &ListDetail) -> String {
    let list = &detail.list;
    let finished = match list.validation_timestamp {
        Some(at) if list.is_validated => format!(
            "<p class=\"ok\">Validation finished {}</p>",
            format_timestamp(at)
        ),
        _ => String::new(),
    };
    let mut html = format!(
        "<h1>Validate {name}</h1><p>{warehouse} | validated <strong id=\"validated\">{validated}</strong> of {total}, \
<span id=\"remaining\">{remaining}</span> remaining</p>{finished}\
<form id=\"validate-form\"><input id=\"code\" autofocus autocomplete=\"off\" maxlength=\"200\"> \
<button type=\"submit\">Validate</button> <button type=\"button\" id=\"undo\">Undo</button></form>\
<p id=\"message\"></p><button type=\"button\" id=\"finish\">Finish validation</button>",
        name = escape_html(&list.name),
        warehouse = escape_html(&list.warehouse),
        validated = detail.validated_count,
        total = detail.total(),
        remaining = detail.remaining(),
        finished = finished,
    );
    html.push_str(&render_entries(detail));
    let _ = write!(
        html,
        "<script>\
const code=document.getElementById('code'),msg=document.getElementById('message'),total={total};\
async function post(url,body){{const res=await fetch(url,{{method:'POST',headers:{{'Content-Type':'application/json'}},body:JSON.stringify(body)}});return res.json();}}\
function show(data,value){{if(data.total_validated!==undefined){{document.getElementById('validated').textContent=data.total_validated;\
document.getElementById('remaining').textContent=total-data.total_validated;}}\
const text={{success:'OK '+value,duplicate:'Already validated '+value,not_in_list:'Not in list: '+value}};\
msg.className=data.status==='success'?'ok':data.status==='duplicate'?'warn':'err';msg.textContent=text[data.status]||data.message||'Error';}}\
document.getElementById('validate-form').addEventListener('submit',async(e)=>{{e.preventDefault();const value=code.value.trim();if(!value)return;\
show(await post('/save_validation',{{list_id:{id},scooter_id:value}}),value);code.value='';code.focus();}});\
document.getElementById('undo').addEventListener('click',async()=>{{const value=code.value.trim();if(!value)return;\
show(await post('/unvalidate_scooter',{{list_id:{id},scooter_id:value}}),value);code.value='';code.focus();}});\
document.getElementById('finish').addEventListener('click',async()=>{{const data=await post('/finish_validation',{{list_id:{id}}});\
msg.className=data.status==='success'?'ok':'err';msg.textContent=data.status==='success'?'Validated '+data.validated+' of '+data.total:(data.message||'Error');}});\
</script>",
        total = detail.total(),
        id = list.id,
    );
    html
}

fn render_entries(detail: &ListDetail) -> String {
    let mut html = format!(
        "<table><tr><th>{}</th><th>Short ID</th><th>Timestamp</th><th>Validated</th></tr>",
        detail.list.kind.id_label()
    );
    for entry in &detail.entries {
        let validated = entry
            .validated_at
            .map(|at| format!("<span class=\"ok\">{}</span>", format_timestamp(at)))
            .unwrap_or_default();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&entry.scan.identifier),
            escape_html(&entry.short_id),
            format_timestamp(entry.scan.scanned_at),
            validated
        );
    }
    html.push_str("</table>");
    html
}

#[get("/duplicates")]
async fn duplicates_page(
    data: web::Data<AppState>,
    query: web::Query<WarehouseQuery>,
) -> Result<HttpResponse> {
    let warehouse = query
        .warehouse
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty());
    let warehouses = data.list_use_case.list_warehouses().await?;
    let groups = data.duplicate_use_case.find_duplicates(warehouse).await?;
    Ok(layout(
        "Duplicates",
        &render_duplicates(&groups, &warehouses, warehouse),
    ))
}

fn render_duplicates(groups: &[DuplicateGroup], warehouses: &[String], selected: Option<&str>) -> String {
    let mut html = String::from(
        "<h1>Duplicates</h1><form method=\"get\" action=\"/duplicates\">\
<select name=\"warehouse\"><option value=\"\">All warehouses</option>",
    );
    for warehouse in warehouses {
        let chosen = if Some(warehouse.as_str()) == selected {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(warehouse),
            chosen
        );
    }
    let _ = write!(
        html,
        "</select> <button type=\"submit\">Filter</button></form>\
<p><a href=\"{}\">Export XLSX</a></p>",
        escape_html(&duplicates_export_href(selected))
    );

    if groups.is_empty() {
        html.push_str("<p>No identifier was scanned into more than one list.</p>");
        return html;
    }
    html.push_str("<table><tr><th>Identifier</th><th>Scanned as</th><th>List</th><th>Warehouse</th><th>Timestamp</th></tr>");
    for group in groups {
        for occurrence in &group.occurrences {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td><a href=\"/lists/{}/scan\">{}</a></td><td>{}</td><td>{}</td></tr>",
                escape_html(&group.identifier),
                escape_html(&occurrence.identifier),
                occurrence.list_id,
                escape_html(&occurrence.list_name),
                escape_html(&occurrence.warehouse),
                format_timestamp(occurrence.scanned_at)
            );
        }
    }
    html.push_str("</table>");
    html
}

fn duplicates_export_href(warehouse: Option<&str>) -> String {
    match warehouse {
        Some(warehouse) => format!(
            "/export_duplicates?{}",
            form_urlencoded::Serializer::new(String::new())
                .append_pair("warehouse", warehouse)
                .finish()
        ),
        None => "/export_duplicates".to_string(),
    }
}
