//! One-call-per-operation wrapper over `AthenaClient` and a `Transport`.
//!
//! Each method builds the request, performs exactly one transport call and
//! parses the reply. Usage errors are returned before the transport is
//! touched. Nothing is retried.

use std::io::Read;

use tracing::{debug, warn};

use crate::client::AthenaClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::options::{
    CreatePatientOptions, GetPatientOptions, GetPatientPhotoOptions, ListChangedPatientOptions,
    ListPatientsMatchingCustomFieldOptions, ListPatientsOptions,
    UpdatePatientInformationVerificationDetailsOptions,
    UpdatePatientMedicationHistoryConsentOptions, UpdatePatientOptions,
};
use crate::transport::UreqTransport;
use crate::types::{
    CustomField, CustomFieldValue, ListPatientsMatchingCustomFieldResult, ListPatientsResult,
    Patient, UpdateCustomFieldsResult, UpdatePatientResult,
};

pub struct Athena<T> {
    client: AthenaClient,
    transport: T,
}

impl Athena<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(
            AthenaClient::from_config(config)?,
            UreqTransport::from_config(config),
        ))
    }
}

impl<T: Transport> Athena<T> {
    pub fn new(client: AthenaClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &AthenaClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        self.transport.send(request)
    }

    pub fn list_custom_fields(&self) -> Result<Vec<CustomField>, ApiError> {
        logged("list_custom_fields", || {
            let request = self.client.build_list_custom_fields()?;
            self.client.parse_list_custom_fields(self.execute(request)?)
        })
    }

    pub fn get_patient(
        &self,
        patient_id: &str,
        opts: Option<&GetPatientOptions>,
    ) -> Result<Patient, ApiError> {
        logged("get_patient", || {
            let request = self.client.build_get_patient(patient_id, opts)?;
            self.client.parse_get_patient(self.execute(request)?)
        })
    }

    pub fn get_patients(
        &self,
        patient_id: &str,
        opts: Option<&GetPatientOptions>,
    ) -> Result<Vec<Patient>, ApiError> {
        logged("get_patients", || {
            let request = self.client.build_get_patients(patient_id, opts)?;
            self.client.parse_get_patients(self.execute(request)?)
        })
    }

    pub fn list_patients(&self, opts: Option<&ListPatientsOptions>) -> Result<ListPatientsResult, ApiError> {
        logged("list_patients", || {
            let request = self.client.build_list_patients(opts)?;
            self.client.parse_list_patients(self.execute(request)?)
        })
    }

    pub fn update_patient(
        &self,
        patient_id: &str,
        opts: &UpdatePatientOptions,
    ) -> Result<UpdatePatientResult, ApiError> {
        logged("update_patient", || {
            let request = self.client.build_update_patient(patient_id, opts)?;
            self.client.parse_update_patient(self.execute(request)?)
        })
    }

    /// Returns the base64-encoded image.
    pub fn get_patient_photo(
        &self,
        patient_id: &str,
        opts: Option<&GetPatientPhotoOptions>,
    ) -> Result<String, ApiError> {
        logged("get_patient_photo", || {
            let request = self.client.build_get_patient_photo(patient_id, opts)?;
            self.client.parse_get_patient_photo(self.execute(request)?)
        })
    }

    pub fn update_patient_photo(&self, patient_id: &str, image: &[u8]) -> Result<(), ApiError> {
        logged("update_patient_photo", || {
            let request = self.client.build_update_patient_photo(patient_id, image)?;
            self.client.parse_update_patient_photo(self.execute(request)?)
        })
    }

    /// Uploads a photo without reading it fully into memory first.
    pub fn update_patient_photo_reader<R: Read>(&self, patient_id: &str, image: R) -> Result<(), ApiError> {
        logged("update_patient_photo_reader", || {
            let (request, mut body) = self.client.build_update_patient_photo_reader(patient_id, image)?;
            debug!(method = request.method.as_str(), path = %request.path, "streaming request");
            let response = self.transport.send_reader(request, &mut body)?;
            self.client.parse_update_patient_photo(response)
        })
    }

    pub fn list_changed_patients(
        &self,
        opts: Option<&ListChangedPatientOptions>,
    ) -> Result<Vec<Patient>, ApiError> {
        logged("list_changed_patients", || {
            let request = self.client.build_list_changed_patients(opts)?;
            self.client.parse_list_changed_patients(self.execute(request)?)
        })
    }

    pub fn update_patient_information_verification_details(
        &self,
        patient_id: &str,
        opts: &UpdatePatientInformationVerificationDetailsOptions,
    ) -> Result<(), ApiError> {
        logged("update_patient_information_verification_details", || {
            let request = self
                .client
                .build_update_patient_information_verification_details(patient_id, opts)?;
            self.client
                .parse_update_patient_information_verification_details(self.execute(request)?)
        })
    }

    pub fn update_patient_medication_history_consent(
        &self,
        patient_id: &str,
        opts: &UpdatePatientMedicationHistoryConsentOptions,
    ) -> Result<(), ApiError> {
        logged("update_patient_medication_history_consent", || {
            let request = self
                .client
                .build_update_patient_medication_history_consent(patient_id, opts)?;
            self.client
                .parse_update_patient_medication_history_consent(self.execute(request)?)
        })
    }

    pub fn get_patient_custom_fields(
        &self,
        patient_id: &str,
        department_id: &str,
    ) -> Result<Vec<CustomFieldValue>, ApiError> {
        logged("get_patient_custom_fields", || {
            let request = self.client.build_get_patient_custom_fields(patient_id, department_id)?;
            self.client.parse_get_patient_custom_fields(self.execute(request)?)
        })
    }

    pub fn update_patient_custom_fields(
        &self,
        patient_id: &str,
        department_id: &str,
        custom_fields: &[CustomFieldValue],
    ) -> Result<UpdateCustomFieldsResult, ApiError> {
        logged("update_patient_custom_fields", || {
            let request = self.client.build_update_patient_custom_fields(
                patient_id,
                department_id,
                custom_fields,
            )?;
            self.client.parse_update_patient_custom_fields(self.execute(request)?)
        })
    }

    pub fn list_patients_matching_custom_field(
        &self,
        opts: &ListPatientsMatchingCustomFieldOptions,
    ) -> Result<ListPatientsMatchingCustomFieldResult, ApiError> {
        logged("list_patients_matching_custom_field", || {
            let request = self.client.build_list_patients_matching_custom_field(opts)?;
            self.client
                .parse_list_patients_matching_custom_field(self.execute(request)?)
        })
    }

    /// Returns the new patient's id.
    pub fn create_patient(&self, opts: &CreatePatientOptions) -> Result<String, ApiError> {
        logged("create_patient", || {
            let request = self.client.build_create_patient(opts)?;
            self.client.parse_create_patient(self.execute(request)?)
        })
    }
}

fn logged<R>(operation: &str, call: impl FnOnce() -> Result<R, ApiError>) -> Result<R, ApiError> {
    let result = call();
    if let Err(e) = &result {
        warn!(operation, error = %e, "athenahealth call failed");
    }
    result
}
