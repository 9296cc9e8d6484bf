use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

/// Creates a patient on `app` and returns its id.
async fn create(app: &axum::Router, body: &str) -> String {
    let resp = app
        .clone()
        .oneshot(form_request("POST", "/v1/1/patients", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    created[0]["patientid"].as_str().unwrap().to_string()
}

// --- custom field definitions ---

#[tokio::test]
async fn custom_field_definitions_are_listed() {
    let resp = app().oneshot(get("/v1/1/customfields")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fields = body_json(resp).await;
    assert_eq!(fields.as_array().unwrap().len(), 3);
    assert_eq!(fields[0]["selectlist"][1]["optionvalue"], "South");
}

// --- list ---

#[tokio::test]
async fn list_patients_empty() {
    let resp = app().oneshot(get("/v1/1/patients")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["patients"].as_array().unwrap().is_empty());
    assert_eq!(body["totalcount"], 0);
    assert!(body.get("next").is_none());
}

#[tokio::test]
async fn list_patients_filters_and_pages() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    create(&app, "departmentid=1&firstname=Bo&lastname=Lee").await;
    create(&app, "departmentid=2&firstname=Cy&lastname=Kim").await;

    let resp = app
        .clone()
        .oneshot(get("/v1/1/patients?lastname=LEE&limit=1"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["totalcount"], 2);
    assert_eq!(body["patients"][0]["firstname"], "Ann");
    assert_eq!(body["next"], "/v1/1/patients?limit=1&offset=1");

    let resp = app.oneshot(get("/v1/1/patients?departmentid=2")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["totalcount"], 1);
}

// --- create ---

#[tokio::test]
async fn create_patient_returns_id_in_array() {
    let app = app();
    let id = create(&app, "departmentid=1&firstname=Ann&lastname=Lee&dob=01%2F31%2F1980").await;
    assert_eq!(id, "1");

    let resp = app.oneshot(get("/v1/1/patients/1")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body[0]["dob"], "01/31/1980");
    assert_eq!(body[0]["status"], "a");
    assert_eq!(body[0]["primarydepartmentid"], "1");
}

#[tokio::test]
async fn create_patient_missing_name_returns_400() {
    let resp = app()
        .oneshot(form_request("POST", "/v1/1/patients", "departmentid=1&firstname=Ann"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("lastname"));
}

#[tokio::test]
async fn duplicate_patient_reports_error_message_in_200() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    let resp = app
        .clone()
        .oneshot(form_request("POST", "/v1/1/patients", "departmentid=1&firstname=ann&lastname=lee"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body[0]["errormessage"].as_str().unwrap().contains("existing patient 1"));

    let id = create(
        &app,
        "departmentid=1&firstname=ann&lastname=lee&bypasspatientmatching=true",
    )
    .await;
    assert_eq!(id, "2");
}

// --- get / update ---

#[tokio::test]
async fn get_unknown_patient_returns_404() {
    let resp = app().oneshot(get("/v1/1/patients/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = app().oneshot(get("/v1/1/patients/abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_patient_coerces_typed_fields() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    let resp = app
        .clone()
        .oneshot(form_request(
            "PUT",
            "/v1/1/patients/1",
            "consenttotext=true&hasmobileyn=false&race=2106-3%092028-9&city=Boston",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await[0]["patientid"], "1");

    let body = body_json(app.oneshot(get("/v1/1/patients/1")).await.unwrap()).await;
    assert_eq!(body[0]["consenttotext"], true);
    assert_eq!(body[0]["hasmobile"], false);
    assert_eq!(body[0]["race"], serde_json::json!(["2106-3", "2028-9"]));
    assert_eq!(body[0]["city"], "Boston");
    assert_eq!(body[0]["firstname"], "Ann");
}

// --- custom fields ---

#[tokio::test]
async fn custom_field_update_counts_locked_fields() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    let fields = r#"[{"customfieldid":"2","customfieldvalue":"M-1"},{"customfieldid":"3","customfieldvalue":"X"}]"#;
    let body: String = url_encode(&[("departmentid", "1"), ("customfields", fields)]);
    let resp = app
        .clone()
        .oneshot(form_request("PUT", "/v1/1/patients/1/customfields", &body))
        .await
        .unwrap();
    let result = body_json(resp).await;
    assert_eq!(result["success"], true);
    assert_eq!(result["updatedCount"], 1);
    assert_eq!(result["disallowedCount"], 1);

    let resp = app
        .clone()
        .oneshot(get("/v1/1/patients/1/customfields?departmentid=1"))
        .await
        .unwrap();
    let stored = body_json(resp).await;
    assert_eq!(stored.as_array().unwrap().len(), 1);

    let resp = app
        .clone()
        .oneshot(get("/v1/1/patients/customfields/2/M-1"))
        .await
        .unwrap();
    let matched = body_json(resp).await;
    assert_eq!(matched["totalcount"], 1);

    let plain = body_json(app.oneshot(get("/v1/1/patients/1")).await.unwrap()).await;
    assert!(plain[0].get("customfields").is_none());
}

#[tokio::test]
async fn custom_field_update_rejects_bad_json() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    let resp = app
        .oneshot(form_request(
            "PUT",
            "/v1/1/patients/1/customfields",
            "departmentid=1&customfields=not-json",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- photo ---

#[tokio::test]
async fn photo_round_trips_as_base64() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;

    let resp = app.clone().oneshot(get("/v1/1/patients/1/photo")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .clone()
        .oneshot(form_request("POST", "/v1/1/patients/1/photo", "image=aGVsbG8%3D"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["success"], "true");

    let resp = app.oneshot(get("/v1/1/patients/1/photo")).await.unwrap();
    assert_eq!(body_json(resp).await["image"], "aGVsbG8=");
}

// --- verification and consent ---

#[tokio::test]
async fn privacy_verification_reports_bool_success() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    let resp = app
        .clone()
        .oneshot(form_request(
            "POST",
            "/v1/1/patients/1/privacyinformationverified",
            "departmentid=1&signaturedatetime=03%2F01%2F2024+09%3A30%3A00&signaturename=Ann+Lee",
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await[0]["success"], true);

    let resp = app
        .oneshot(form_request(
            "POST",
            "/v1/1/patients/1/privacyinformationverified",
            "departmentid=1",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn medication_consent_reports_string_success() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;
    let resp = app
        .oneshot(form_request(
            "POST",
            "/v1/1/patients/1/medicationhistoryconsentverified",
            "departmentid=1&signaturedatetime=03%2F01%2F2024+09%3A30%3A00&signaturename=Ann+Lee",
        ))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await[0]["success"], "true");
}

// --- changed feed ---

#[tokio::test]
async fn changed_feed_drains_unless_left_unprocessed() {
    let app = app();
    create(&app, "departmentid=1&firstname=Ann&lastname=Lee").await;

    let peek = app
        .clone()
        .oneshot(get("/v1/1/patients/changed?leaveunprocessed=true"))
        .await
        .unwrap();
    assert_eq!(body_json(peek).await["patients"].as_array().unwrap().len(), 1);

    let drain = app.clone().oneshot(get("/v1/1/patients/changed")).await.unwrap();
    assert_eq!(body_json(drain).await["patients"].as_array().unwrap().len(), 1);

    let after = app.oneshot(get("/v1/1/patients/changed")).await.unwrap();
    let raw = body_bytes(after).await;
    assert_eq!(&raw[..], br#"{"patients":[]}"#);
}

fn url_encode(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
