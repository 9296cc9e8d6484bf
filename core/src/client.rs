//! Stateless HTTP request builder and response parser for the patients API.
//!
//! # Design
//! `AthenaClient` holds only the practice base URL and carries no mutable
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Usage errors surface from `build_*`, before anything could
//! reach the network; response-shape errors surface from `parse_*`.
//!
//! The API wraps single resources in a one-element array. Parsers that
//! promise one resource reject any other length.

use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::encode::{FormReader, Params, ToParams};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, FORM_CONTENT_TYPE};
use crate::options::{
    CreatePatientOptions, GetPatientOptions, GetPatientPhotoOptions, ListChangedPatientOptions,
    ListPatientsMatchingCustomFieldOptions, ListPatientsOptions,
    UpdatePatientInformationVerificationDetailsOptions,
    UpdatePatientMedicationHistoryConsentOptions, UpdatePatientOptions,
};
use crate::pagination::{PaginationEnvelope, PaginationResult};
use crate::types::{
    CustomField, CustomFieldValue, ListPatientsMatchingCustomFieldResult, ListPatientsResult,
    Patient, UpdateCustomFieldsResult, UpdatePatientResult,
};

#[derive(Deserialize)]
struct PatientListResponse {
    #[serde(default, deserialize_with = "crate::nullable::null_default")]
    patients: Vec<Patient>,
    #[serde(flatten)]
    page: PaginationEnvelope,
}

#[derive(Deserialize)]
struct PatientIdResponse {
    #[serde(default, rename = "patientid", deserialize_with = "crate::nullable::null_default")]
    patient_id: String,
}

#[derive(Deserialize)]
struct PatientPhotoResponse {
    #[serde(default, deserialize_with = "crate::nullable::null_default")]
    image: String,
}

#[derive(Deserialize)]
struct VerificationResponse {
    #[serde(default, deserialize_with = "crate::nullable::null_default")]
    success: bool,
}

// The consent endpoint reports success as a string, unlike its siblings.
#[derive(Deserialize)]
struct ConsentResponse {
    #[serde(default, deserialize_with = "crate::nullable::null_default")]
    success: String,
}

#[derive(Deserialize)]
struct UpdateCustomFieldsResponse {
    #[serde(default, deserialize_with = "crate::nullable::null_default")]
    success: bool,
    #[serde(default, rename = "updatedCount", deserialize_with = "crate::nullable::null_default")]
    updated_count: u64,
    #[serde(default, rename = "disallowedCount", deserialize_with = "crate::nullable::null_default")]
    disallowed_count: u64,
}

#[derive(Deserialize)]
struct CreatePatientResponse {
    #[serde(default, rename = "errormessage", deserialize_with = "crate::nullable::null_default")]
    error_message: String,
    #[serde(default, rename = "patientid", deserialize_with = "crate::nullable::null_default")]
    patient_id: String,
}

/// Synchronous, stateless client for the athenahealth patients API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network. See `Athena` for a wrapper that also executes them.
#[derive(Debug, Clone)]
pub struct AthenaClient {
    base: Url,
}

impl AthenaClient {
    /// `base_url` is the API root (for example `https://api.platform.athenahealth.com`);
    /// requests go to `{base_url}/v1/{practice_id}/...`.
    pub fn new(base_url: &str, practice_id: &str) -> Result<Self, ApiError> {
        if practice_id.is_empty() {
            return Err(ApiError::InvalidUsage("practice id is required".to_string()));
        }
        let mut base = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUsage(format!("invalid base url {base_url:?}: {e}")))?;
        {
            let mut segments = base
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUsage(format!("base url {base_url:?} cannot carry a path")))?;
            segments.pop_if_empty().push("v1").push(practice_id);
        }
        base.set_query(None);
        Ok(Self { base })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, &config.practice_id)
    }

    /// Practice-scoped root, e.g. `https://host/v1/195900`.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Joins `segments` under the practice root. Empty and dot segments are
    /// rejected: the URL parser would drop or resolve them and the request
    /// would land on a different resource.
    fn url(&self, segments: &[&str], query: &Params) -> Result<String, ApiError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::InvalidUsage(format!(
                "path identifier {bad:?} is not allowed"
            )));
        }
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        if !query.is_empty() {
            url.set_query(Some(&query.encode()));
        }
        Ok(url.into())
    }

    fn get(&self, segments: &[&str], query: &Params) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            path: self.url(segments, query)?,
            headers: Vec::new(),
            body: None,
        })
    }

    fn form(&self, method: HttpMethod, segments: &[&str], form: &Params) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method,
            path: self.url(segments, &Params::new())?,
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(form.encode()),
        })
    }

    // -- custom fields ------------------------------------------------------

    pub fn build_list_custom_fields(&self) -> Result<HttpRequest, ApiError> {
        self.get(&["customfields"], &Params::new())
    }

    pub fn parse_list_custom_fields(&self, response: HttpResponse) -> Result<Vec<CustomField>, ApiError> {
        decode(&response)
    }

    // -- patient reads ------------------------------------------------------

    pub fn build_get_patient(
        &self,
        patient_id: &str,
        opts: Option<&GetPatientOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let query = match opts {
            Some(o) => o.to_params()?,
            None => Params::new(),
        };
        self.get(&["patients", patient_id], &query)
    }

    /// Exactly one patient is expected; the first record of an enterprise
    /// match is not silently picked.
    pub fn parse_get_patient(&self, response: HttpResponse) -> Result<Patient, ApiError> {
        exactly_one(decode(&response)?, "patient")
    }

    /// Same request as `build_get_patient`; the parser keeps every record.
    pub fn build_get_patients(
        &self,
        patient_id: &str,
        opts: Option<&GetPatientOptions>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_get_patient(patient_id, opts)
    }

    pub fn parse_get_patients(&self, response: HttpResponse) -> Result<Vec<Patient>, ApiError> {
        decode(&response)
    }

    pub fn build_list_patients(&self, opts: Option<&ListPatientsOptions>) -> Result<HttpRequest, ApiError> {
        let query = match opts {
            Some(o) => o.to_params()?,
            None => Params::new(),
        };
        self.get(&["patients"], &query)
    }

    pub fn parse_list_patients(&self, response: HttpResponse) -> Result<ListPatientsResult, ApiError> {
        let out: PatientListResponse = decode(&response)?;
        Ok(ListPatientsResult {
            pagination: PaginationResult::from(&out.page),
            patients: out.patients,
        })
    }

    pub fn build_list_changed_patients(
        &self,
        opts: Option<&ListChangedPatientOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let query = match opts {
            Some(o) => o.to_params()?,
            None => Params::new(),
        };
        self.get(&["patients", "changed"], &query)
    }

    pub fn parse_list_changed_patients(&self, response: HttpResponse) -> Result<Vec<Patient>, ApiError> {
        let out: PatientListResponse = decode(&response)?;
        Ok(out.patients)
    }

    pub fn build_list_patients_matching_custom_field(
        &self,
        opts: &ListPatientsMatchingCustomFieldOptions,
    ) -> Result<HttpRequest, ApiError> {
        opts.validate()?;
        self.get(
            &[
                "patients",
                "customfields",
                &opts.custom_field_id,
                &opts.custom_field_value,
            ],
            &opts.to_params()?,
        )
    }

    pub fn parse_list_patients_matching_custom_field(
        &self,
        response: HttpResponse,
    ) -> Result<ListPatientsMatchingCustomFieldResult, ApiError> {
        self.parse_list_patients(response)
    }

    // -- patient writes -----------------------------------------------------

    pub fn build_create_patient(&self, opts: &CreatePatientOptions) -> Result<HttpRequest, ApiError> {
        opts.validate()?;
        self.form(HttpMethod::Post, &["patients"], &opts.to_params()?)
    }

    /// Returns the new patient id, or the API's own message when it rejects
    /// the record inside a 200 response.
    pub fn parse_create_patient(&self, response: HttpResponse) -> Result<String, ApiError> {
        let created: CreatePatientResponse = exactly_one(decode(&response)?, "create result")?;
        if !created.error_message.is_empty() {
            return Err(ApiError::Remote(created.error_message));
        }
        Ok(created.patient_id)
    }

    pub fn build_update_patient(
        &self,
        patient_id: &str,
        opts: &UpdatePatientOptions,
    ) -> Result<HttpRequest, ApiError> {
        self.form(HttpMethod::Put, &["patients", patient_id], &opts.to_params()?)
    }

    pub fn parse_update_patient(&self, response: HttpResponse) -> Result<UpdatePatientResult, ApiError> {
        let updated: PatientIdResponse = exactly_one(decode(&response)?, "update result")?;
        Ok(UpdatePatientResult {
            patient_id: updated.patient_id,
        })
    }

    pub fn build_update_patient_information_verification_details(
        &self,
        patient_id: &str,
        opts: &UpdatePatientInformationVerificationDetailsOptions,
    ) -> Result<HttpRequest, ApiError> {
        self.form(
            HttpMethod::Post,
            &["patients", patient_id, "privacyinformationverified"],
            &opts.to_params()?,
        )
    }

    pub fn parse_update_patient_information_verification_details(
        &self,
        response: HttpResponse,
    ) -> Result<(), ApiError> {
        let result: VerificationResponse = exactly_one(decode(&response)?, "verification result")?;
        if !result.success {
            return Err(ApiError::UnexpectedResponse(
                "privacy information verification was not accepted".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build_update_patient_medication_history_consent(
        &self,
        patient_id: &str,
        opts: &UpdatePatientMedicationHistoryConsentOptions,
    ) -> Result<HttpRequest, ApiError> {
        self.form(
            HttpMethod::Post,
            &["patients", patient_id, "medicationhistoryconsentverified"],
            &opts.to_params()?,
        )
    }

    pub fn parse_update_patient_medication_history_consent(
        &self,
        response: HttpResponse,
    ) -> Result<(), ApiError> {
        let result: ConsentResponse = exactly_one(decode(&response)?, "consent result")?;
        if result.success == "false" {
            return Err(ApiError::UnexpectedResponse(
                "medication history consent was not accepted".to_string(),
            ));
        }
        Ok(())
    }

    // -- patient custom fields ----------------------------------------------

    pub fn build_get_patient_custom_fields(
        &self,
        patient_id: &str,
        department_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.get(
            &["patients", patient_id, "customfields"],
            &Params::new().text("departmentid", department_id),
        )
    }

    pub fn parse_get_patient_custom_fields(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<CustomFieldValue>, ApiError> {
        decode(&response)
    }

    pub fn build_update_patient_custom_fields(
        &self,
        patient_id: &str,
        department_id: &str,
        custom_fields: &[CustomFieldValue],
    ) -> Result<HttpRequest, ApiError> {
        let form = Params::new()
            .text("departmentid", department_id)
            .json("customfields", custom_fields)?;
        self.form(HttpMethod::Put, &["patients", patient_id, "customfields"], &form)
    }

    pub fn parse_update_patient_custom_fields(
        &self,
        response: HttpResponse,
    ) -> Result<UpdateCustomFieldsResult, ApiError> {
        let out: UpdateCustomFieldsResponse = decode(&response)?;
        if !out.success {
            return Err(ApiError::UnexpectedResponse(
                "custom field update was not accepted".to_string(),
            ));
        }
        Ok(UpdateCustomFieldsResult {
            updated_count: out.updated_count,
            disallowed_count: out.disallowed_count,
        })
    }

    // -- photos -------------------------------------------------------------

    pub fn build_get_patient_photo(
        &self,
        patient_id: &str,
        opts: Option<&GetPatientPhotoOptions>,
    ) -> Result<HttpRequest, ApiError> {
        if opts.is_some_and(|o| o.jpeg_output) {
            return Err(ApiError::Unsupported("JPEG photo output".to_string()));
        }
        self.get(&["patients", patient_id, "photo"], &Params::new())
    }

    /// Returns the base64-encoded image.
    pub fn parse_get_patient_photo(&self, response: HttpResponse) -> Result<String, ApiError> {
        let photo: PatientPhotoResponse = decode(&response)?;
        Ok(photo.image)
    }

    pub fn build_update_patient_photo(&self, patient_id: &str, image: &[u8]) -> Result<HttpRequest, ApiError> {
        self.form(
            HttpMethod::Post,
            &["patients", patient_id, "photo"],
            &Params::new().base64("image", image),
        )
    }

    /// Streaming form of `build_update_patient_photo`: the returned request has
    /// no body, and the returned reader yields the exact bytes the buffered
    /// variant would have put there.
    pub fn build_update_patient_photo_reader<'a, R: Read + 'a>(
        &self,
        patient_id: &str,
        image: R,
    ) -> Result<(HttpRequest, FormReader<'a>), ApiError> {
        let mut request = self.form(
            HttpMethod::Post,
            &["patients", patient_id, "photo"],
            &Params::new(),
        )?;
        request.body = None;
        Ok((request, FormReader::new().add_reader("image", image)))
    }

    pub fn parse_update_patient_photo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    Ok(serde_json::from_str(&response.body)?)
}

fn exactly_one<T>(mut items: Vec<T>, what: &str) -> Result<T, ApiError> {
    if items.len() != 1 {
        return Err(ApiError::UnexpectedResponse(format!(
            "expected exactly one {what}, got {}",
            items.len()
        )));
    }
    Ok(items.remove(0))
}
