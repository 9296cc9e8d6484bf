//! In-memory stand-in for the athenahealth patients API.
//!
//! Serves the same paths and payload shapes as `/v1/{practiceid}/...`:
//! single resources wrapped in one-element arrays, list envelopes with
//! `next` / `previous` / `totalcount`, form-encoded writes, and business
//! errors reported inside 200 responses.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub type Record = Map<String, Value>;

/// Limit applied when a list request does not carry one.
pub const DEFAULT_LIMIT: usize = 1500;

#[derive(Debug, Default)]
pub struct Store {
    patients: BTreeMap<u64, Record>,
    next_id: u64,
    photos: HashMap<u64, String>,
    /// Patient ids changed since the changed-patients feed was last drained.
    changed: Vec<u64>,
}

impl Store {
    fn touch(&mut self, id: u64) {
        if !self.changed.contains(&id) {
            self.changed.push(id);
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

type Params = HashMap<String, String>;
type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        next_id: 1,
        ..Default::default()
    }));
    Router::new()
        .route("/v1/{practice}/customfields", get(list_custom_fields))
        .route("/v1/{practice}/patients", get(list_patients).post(create_patient))
        .route("/v1/{practice}/patients/changed", get(list_changed_patients))
        .route(
            "/v1/{practice}/patients/customfields/{field_id}/{value}",
            get(list_patients_matching_custom_field),
        )
        .route("/v1/{practice}/patients/{id}", get(get_patient).put(update_patient))
        .route(
            "/v1/{practice}/patients/{id}/photo",
            get(get_patient_photo).post(update_patient_photo),
        )
        .route(
            "/v1/{practice}/patients/{id}/customfields",
            get(get_patient_custom_fields).put(update_patient_custom_fields),
        )
        .route(
            "/v1/{practice}/patients/{id}/privacyinformationverified",
            post(verify_privacy_information),
        )
        .route(
            "/v1/{practice}/patients/{id}/medicationhistoryconsentverified",
            post(verify_medication_history_consent),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Practice custom field definitions.
pub fn custom_field_definitions() -> Value {
    json!([
        {
            "customfieldid": "1",
            "name": "Preferred clinic",
            "type": "SELECTLIST",
            "select": true,
            "searchable": true,
            "casesensitive": false,
            "disallowupdate": false,
            "ordering": "1",
            "selectlist": [
                {"optionid": "11", "optionvalue": "North"},
                {"optionid": "12", "optionvalue": "South"}
            ]
        },
        {
            "customfieldid": "2",
            "name": "Member number",
            "type": "FREETEXT",
            "length": "20",
            "select": false,
            "searchable": true,
            "casesensitive": true,
            "disallowupdate": false,
            "ordering": "2"
        },
        {
            "customfieldid": "3",
            "name": "Legacy chart id",
            "type": "FREETEXT",
            "length": "12",
            "select": false,
            "searchable": false,
            "casesensitive": false,
            "disallowupdate": true,
            "ordering": "3"
        }
    ])
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

fn not_found() -> (StatusCode, Json<Value>) {
    error(StatusCode::NOT_FOUND, "The patient is not valid.")
}

fn patient_id(raw: &str) -> Result<u64, (StatusCode, Json<Value>)> {
    raw.parse().map_err(|_| not_found())
}

fn required<'a>(form: &'a Params, key: &str) -> Result<&'a str, (StatusCode, Json<Value>)> {
    form.get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, &format!("Missing required field: {key}")))
}

fn flag(params: &Params, key: &str) -> bool {
    params.get(key).is_some_and(|v| v == "true")
}

fn text(record: &Record, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Copies form fields onto a record, converting the keys the API returns as
/// booleans or arrays.
fn apply_form(record: &mut Record, form: &Params) {
    for (key, value) in form {
        match key.as_str() {
            "consenttocall" | "consenttotext" => {
                record.insert(key.clone(), Value::Bool(value == "true"));
            }
            "hasmobileyn" => {
                record.insert("hasmobile".to_string(), Value::Bool(value == "true"));
            }
            "race" => {
                let codes: Vec<Value> = value
                    .split('\t')
                    .filter(|c| !c.is_empty())
                    .map(|c| Value::String(c.to_string()))
                    .collect();
                record.insert("race".to_string(), Value::Array(codes));
            }
            "bypasspatientmatching" => {}
            _ => {
                record.insert(key.clone(), Value::String(value.clone()));
            }
        }
    }
}

/// Shapes a stored record for output, dropping sections the caller did not ask for.
fn render(record: &Record, query: &Params) -> Value {
    let mut out = record.clone();
    if !flag(query, "showcustomfields") {
        out.remove("customfields");
    }
    if !flag(query, "showinsurance") {
        out.remove("insurances");
    }
    if !flag(query, "showportalstatus") {
        out.remove("portalstatus");
    }
    Value::Object(out)
}

/// Applies `limit` / `offset` and builds the list envelope.
fn page(practice: &str, resource: &str, items: Vec<Value>, query: &Params) -> Value {
    let limit = query
        .get("limit")
        .and_then(|v| v.parse().ok())
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_LIMIT);
    let offset = query
        .get("offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0usize);
    let total = items.len();
    let window: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();

    let mut envelope = Map::new();
    envelope.insert("patients".to_string(), Value::Array(window));
    envelope.insert("totalcount".to_string(), json!(total));
    let end = offset.saturating_add(limit);
    if end < total {
        envelope.insert(
            "next".to_string(),
            json!(format!("/v1/{practice}/{resource}?limit={limit}&offset={end}")),
        );
    }
    if offset > 0 {
        envelope.insert(
            "previous".to_string(),
            json!(format!(
                "/v1/{practice}/{resource}?limit={limit}&offset={}",
                offset.saturating_sub(limit)
            )),
        );
    }
    Value::Object(envelope)
}

async fn list_custom_fields(Path(practice): Path<String>) -> Json<Value> {
    debug!(%practice, "list custom fields");
    Json(custom_field_definitions())
}

async fn list_patients(
    State(db): State<Db>,
    Path(practice): Path<String>,
    Query(query): Query<Params>,
) -> Json<Value> {
    debug!(%practice, ?query, "list patients");
    let store = db.read().await;
    let matches = |record: &Record, key: &str| match query.get(key).filter(|v| !v.is_empty()) {
        Some(wanted) => text(record, key).eq_ignore_ascii_case(wanted),
        None => true,
    };
    let items: Vec<Value> = store
        .patients
        .values()
        .filter(|r| {
            matches(r, "firstname")
                && matches(r, "lastname")
                && matches(r, "departmentid")
                && matches(r, "status")
        })
        .map(|r| render(r, &query))
        .collect();
    Json(page(&practice, "patients", items, &query))
}

async fn create_patient(
    State(db): State<Db>,
    Path(practice): Path<String>,
    Form(form): Form<Params>,
) -> ApiResult {
    debug!(%practice, "create patient");
    let department = required(&form, "departmentid")?.to_string();
    let first = required(&form, "firstname")?.to_string();
    let last = required(&form, "lastname")?.to_string();

    let mut store = db.write().await;
    if !flag(&form, "bypasspatientmatching") {
        let dob = form.get("dob").cloned().unwrap_or_default();
        let existing = store.patients.iter().find(|(_, r)| {
            text(r, "firstname").eq_ignore_ascii_case(&first)
                && text(r, "lastname").eq_ignore_ascii_case(&last)
                && text(r, "dob") == dob
        });
        if let Some((id, _)) = existing {
            return Ok(Json(json!([{
                "errormessage": format!("This patient matches existing patient {id}.")
            }])));
        }
    }

    let id = store.next_id;
    store.next_id += 1;
    let mut record = Record::new();
    record.insert("patientid".to_string(), json!(id.to_string()));
    record.insert("status".to_string(), json!("a"));
    record.insert("primarydepartmentid".to_string(), json!(department));
    record.insert(
        "povertylevelcalculated".to_string(),
        json!(format!("{}", 100 + id)),
    );
    apply_form(&mut record, &form);
    store.patients.insert(id, record);
    store.touch(id);
    Ok(Json(json!([{ "patientid": id.to_string() }])))
}

async fn get_patient(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Query(query): Query<Params>,
) -> ApiResult {
    debug!(%practice, %id, "get patient");
    let id = patient_id(&id)?;
    let store = db.read().await;
    let record = store.patients.get(&id).ok_or_else(not_found)?;
    Ok(Json(json!([render(record, &query)])))
}

async fn update_patient(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Form(form): Form<Params>,
) -> ApiResult {
    debug!(%practice, %id, fields = form.len(), "update patient");
    let id = patient_id(&id)?;
    let mut store = db.write().await;
    let record = store.patients.get_mut(&id).ok_or_else(not_found)?;
    apply_form(record, &form);
    store.touch(id);
    Ok(Json(json!([{ "patientid": id.to_string() }])))
}

async fn get_patient_photo(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
) -> ApiResult {
    debug!(%practice, %id, "get patient photo");
    let id = patient_id(&id)?;
    let store = db.read().await;
    let image = store
        .photos
        .get(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "No photo on file."))?;
    Ok(Json(json!({ "image": image })))
}

async fn update_patient_photo(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Form(form): Form<Params>,
) -> ApiResult {
    debug!(%practice, %id, "update patient photo");
    let id = patient_id(&id)?;
    let image = required(&form, "image")?.to_string();
    let mut store = db.write().await;
    let record = store.patients.get_mut(&id).ok_or_else(not_found)?;
    record.insert("patientphoto".to_string(), Value::Bool(true));
    store.photos.insert(id, image);
    Ok(Json(json!({ "success": "true" })))
}

async fn list_changed_patients(
    State(db): State<Db>,
    Path(practice): Path<String>,
    Query(query): Query<Params>,
) -> Json<Value> {
    debug!(%practice, ?query, "list changed patients");
    let mut store = db.write().await;
    let only = query.get("patientid").filter(|v| !v.is_empty()).cloned();
    let ids: Vec<u64> = store
        .changed
        .iter()
        .copied()
        .filter(|id| only.as_deref().map_or(true, |p| p == id.to_string()))
        .collect();
    let patients: Vec<Value> = ids
        .iter()
        .filter_map(|id| store.patients.get(id))
        .map(|r| Value::Object(r.clone()))
        .collect();
    if !flag(&query, "leaveunprocessed") {
        store.changed.retain(|id| !ids.contains(id));
    }
    Json(json!({ "patients": patients }))
}

async fn verify_privacy_information(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Form(form): Form<Params>,
) -> ApiResult {
    debug!(%practice, %id, "verify privacy information");
    let id = patient_id(&id)?;
    required(&form, "departmentid")?;
    required(&form, "signaturename")?;
    required(&form, "signaturedatetime")?;
    let mut store = db.write().await;
    let record = store.patients.get_mut(&id).ok_or_else(not_found)?;
    record.insert("privacyinformationverified".to_string(), Value::Bool(true));
    Ok(Json(json!([{ "success": true }])))
}

async fn verify_medication_history_consent(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Form(form): Form<Params>,
) -> ApiResult {
    debug!(%practice, %id, "verify medication history consent");
    let id = patient_id(&id)?;
    required(&form, "departmentid")?;
    required(&form, "signaturename")?;
    required(&form, "signaturedatetime")?;
    let mut store = db.write().await;
    let record = store.patients.get_mut(&id).ok_or_else(not_found)?;
    record.insert(
        "medicationhistoryconsentverified".to_string(),
        Value::Bool(true),
    );
    Ok(Json(json!([{ "success": "true" }])))
}

async fn get_patient_custom_fields(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Query(query): Query<Params>,
) -> ApiResult {
    debug!(%practice, %id, "get patient custom fields");
    let id = patient_id(&id)?;
    required(&query, "departmentid")?;
    let store = db.read().await;
    let record = store.patients.get(&id).ok_or_else(not_found)?;
    Ok(Json(record.get("customfields").cloned().unwrap_or_else(|| json!([]))))
}

async fn update_patient_custom_fields(
    State(db): State<Db>,
    Path((practice, id)): Path<(String, String)>,
    Form(form): Form<Params>,
) -> ApiResult {
    debug!(%practice, %id, "update patient custom fields");
    let id = patient_id(&id)?;
    required(&form, "departmentid")?;
    let incoming: Vec<Record> = serde_json::from_str(required(&form, "customfields")?)
        .map_err(|e| error(StatusCode::BAD_REQUEST, &format!("Invalid customfields: {e}")))?;

    let definitions = custom_field_definitions();
    let definition = |field_id: &str| {
        definitions
            .as_array()
            .and_then(|defs| defs.iter().find(|d| d["customfieldid"] == field_id))
            .cloned()
    };

    let mut store = db.write().await;
    let record = store.patients.get_mut(&id).ok_or_else(not_found)?;
    let mut current: Vec<Record> = record
        .get("customfields")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    let (mut updated, mut disallowed) = (0u64, 0u64);
    for field in incoming {
        let field_id = text(&field, "customfieldid");
        match definition(&field_id) {
            Some(def) if def["disallowupdate"] != json!(true) => {
                current.retain(|f| text(f, "customfieldid") != field_id);
                current.push(field);
                updated += 1;
            }
            _ => disallowed += 1,
        }
    }
    record.insert("customfields".to_string(), json!(current));
    store.touch(id);
    Ok(Json(json!({
        "success": true,
        "updatedCount": updated,
        "disallowedCount": disallowed
    })))
}

async fn list_patients_matching_custom_field(
    State(db): State<Db>,
    Path((practice, field_id, value)): Path<(String, String, String)>,
    Query(query): Query<Params>,
) -> Json<Value> {
    debug!(%practice, %field_id, %value, "list patients matching custom field");
    let store = db.read().await;
    let items: Vec<Value> = store
        .patients
        .values()
        .filter(|r| {
            r.get("customfields")
                .and_then(Value::as_array)
                .is_some_and(|fields| {
                    fields.iter().any(|f| {
                        f["customfieldid"] == field_id.as_str()
                            && (f["customfieldvalue"] == value.as_str()
                                || f["optionid"] == value.as_str())
                    })
                })
        })
        .map(|r| Value::Object(r.clone()))
        .collect();
    let resource = format!("patients/customfields/{field_id}/{value}");
    Json(page(&practice, &resource, items, &query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn apply_form_converts_typed_keys() {
        let mut record = Record::new();
        apply_form(
            &mut record,
            &params(&[
                ("consenttocall", "false"),
                ("hasmobileyn", "true"),
                ("race", "2106-3\t2028-9"),
                ("city", "Boston"),
                ("bypasspatientmatching", "true"),
            ]),
        );
        assert_eq!(record["consenttocall"], json!(false));
        assert_eq!(record["hasmobile"], json!(true));
        assert_eq!(record["race"], json!(["2106-3", "2028-9"]));
        assert_eq!(record["city"], json!("Boston"));
        assert!(!record.contains_key("bypasspatientmatching"));
    }

    #[test]
    fn render_hides_sections_not_requested() {
        let mut record = Record::new();
        record.insert("customfields".to_string(), json!([]));
        record.insert("insurances".to_string(), json!([]));
        let shown = render(&record, &params(&[("showcustomfields", "true")]));
        assert!(shown.get("customfields").is_some());
        assert!(shown.get("insurances").is_none());
    }

    #[test]
    fn page_links_adjacent_windows() {
        let items: Vec<Value> = (0..5).map(|i| json!({ "patientid": i.to_string() })).collect();
        let body = page("1", "patients", items, &params(&[("limit", "2"), ("offset", "2")]));
        assert_eq!(body["totalcount"], json!(5));
        assert_eq!(body["patients"].as_array().unwrap().len(), 2);
        assert_eq!(body["next"], json!("/v1/1/patients?limit=2&offset=4"));
        assert_eq!(body["previous"], json!("/v1/1/patients?limit=2&offset=0"));
    }

    #[test]
    fn last_page_has_no_next() {
        let items: Vec<Value> = (0..3).map(|i| json!({ "patientid": i.to_string() })).collect();
        let body = page("1", "patients", items, &params(&[]));
        assert!(body.get("next").is_none());
        assert!(body.get("previous").is_none());
    }

    #[test]
    fn huge_window_stays_on_one_page() {
        let items: Vec<Value> = (0..3).map(|i| json!({ "patientid": i.to_string() })).collect();
        let limit = usize::MAX.to_string();
        let body = page("1", "patients", items, &params(&[("limit", &limit), ("offset", "1")]));
        assert_eq!(body["patients"].as_array().unwrap().len(), 2);
        assert!(body.get("next").is_none());
        assert_eq!(body["previous"], json!(format!("/v1/1/patients?limit={limit}&offset=0")));
    }
}
