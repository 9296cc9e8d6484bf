//! Request options for each endpoint and their query/form encoding.
//!
//! Read endpoints use plain `bool` switches that are only sent when true.
//! Update endpoints use `Option` fields: `None` leaves the remote value
//! untouched, `Some` overwrites it (including with an empty string or an
//! explicit `false`).

use chrono::{NaiveDate, NaiveDateTime};

use crate::encode::{Params, ToParams};
use crate::error::ApiError;
use crate::pagination::PaginationOptions;

pub const STATUS_ACTIVE: &str = "a";
pub const STATUS_INACTIVE: &str = "i";
pub const STATUS_PROSPECTIVE: &str = "p";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetPatientOptions {
    pub show_custom_fields: bool,
    pub show_insurance: bool,
    pub show_portal_status: bool,
    pub show_local_patient_id: bool,
    pub department_id: u64,
    pub limit_local_patient_id: bool,
    pub show_all_patient_department_status: bool,
}

impl ToParams for GetPatientOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .flag("showcustomfields", self.show_custom_fields)
            .flag("showinsurance", self.show_insurance)
            .flag("showportalstatus", self.show_portal_status)
            .flag("showlocalpatientid", self.show_local_patient_id)
            .id("departmentid", self.department_id)
            .flag("limitlocalpatientid", self.limit_local_patient_id)
            .flag(
                "showallpatientdepartmentstatus",
                self.show_all_patient_department_status,
            ))
    }
}

/// Search filters for `/patients`. Empty strings are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPatientsOptions {
    pub first_name: String,
    pub last_name: String,
    pub department_id: u64,
    pub status: String,
    pub pagination: Option<PaginationOptions>,
}

impl ToParams for ListPatientsOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .non_empty("firstname", &self.first_name)
            .non_empty("lastname", &self.last_name)
            .id("departmentid", self.department_id)
            .non_empty("status", &self.status)
            .pagination(self.pagination.as_ref()))
    }
}

/// Partial update of a patient record. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePatientOptions {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub alt_first_name: Option<String>,
    pub assigned_sex_at_birth: Option<String>,
    pub city: Option<String>,
    pub consent_to_call: Option<bool>,
    pub consent_to_text: Option<bool>,
    pub contact_home_phone: Option<String>,
    pub contact_mobile_phone: Option<String>,
    pub contact_name: Option<String>,
    pub contact_preference: Option<String>,
    pub contact_relationship: Option<String>,
    pub department_id: Option<String>,
    pub dob: Option<String>,
    pub email: Option<String>,
    pub ethnicity_code: Option<String>,
    pub first_name: Option<String>,
    pub gender_identity: Option<String>,
    pub gender_identity_other: Option<String>,
    pub has_mobile: Option<bool>,
    pub home_phone: Option<String>,
    pub language6392_code: Option<String>,
    pub last_name: Option<String>,
    pub marital_status: Option<String>,
    pub mobile_phone: Option<String>,
    pub notes: Option<String>,
    pub occupation_code: Option<String>,
    pub preferred_name: Option<String>,
    pub preferred_pronouns: Option<String>,
    pub primary_department_id: Option<String>,
    pub race: Option<Vec<String>>,
    pub state: Option<String>,
    /// One of `STATUS_ACTIVE`, `STATUS_INACTIVE`, `STATUS_PROSPECTIVE`.
    pub status: Option<String>,
    pub zip: Option<String>,
}

impl ToParams for UpdatePatientOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .opt_text("address1", self.address1.as_deref())
            .opt_text("address2", self.address2.as_deref())
            .opt_text("altfirstname", self.alt_first_name.as_deref())
            .opt_text("assignedsexatbirth", self.assigned_sex_at_birth.as_deref())
            .opt_bool("consenttocall", self.consent_to_call)
            .opt_bool("consenttotext", self.consent_to_text)
            .opt_text("contactpreference", self.contact_preference.as_deref())
            .opt_text("contactname", self.contact_name.as_deref())
            .opt_text("contactmobilephone", self.contact_mobile_phone.as_deref())
            .opt_bool("hasmobileyn", self.has_mobile)
            .opt_text("contacthomephone", self.contact_home_phone.as_deref())
            .opt_text("contactrelationship", self.contact_relationship.as_deref())
            .opt_text("city", self.city.as_deref())
            .opt_text("departmentid", self.department_id.as_deref())
            .opt_text("dob", self.dob.as_deref())
            .opt_text("email", self.email.as_deref())
            .opt_text("ethnicitycode", self.ethnicity_code.as_deref())
            .opt_text("firstname", self.first_name.as_deref())
            .opt_text("genderidentity", self.gender_identity.as_deref())
            .opt_text("genderidentityother", self.gender_identity_other.as_deref())
            .opt_text("homephone", self.home_phone.as_deref())
            .opt_text("lastname", self.last_name.as_deref())
            .opt_text("language6392code", self.language6392_code.as_deref())
            .opt_text("maritalstatus", self.marital_status.as_deref())
            .opt_text("mobilephone", self.mobile_phone.as_deref())
            .opt_text("notes", self.notes.as_deref())
            .opt_text("occupationcode", self.occupation_code.as_deref())
            .opt_text("preferredname", self.preferred_name.as_deref())
            .opt_text("preferredpronouns", self.preferred_pronouns.as_deref())
            .opt_text("primarydepartmentid", self.primary_department_id.as_deref())
            .list("race", self.race.as_deref())
            .opt_text("state", self.state.as_deref())
            .opt_text("status", self.status.as_deref())
            .opt_text("zip", self.zip.as_deref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetPatientPhotoOptions {
    /// Request the photo as raw JPEG instead of base64. Not supported.
    pub jpeg_output: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChangedPatientOptions {
    pub department_id: String,
    pub ignore_restrictions: bool,
    pub leave_unprocessed: bool,
    pub patient_id: String,
    pub return_global_id: bool,
    pub show_processed_end_datetime: Option<NaiveDateTime>,
    pub show_processed_start_datetime: Option<NaiveDateTime>,
}

impl ToParams for ListChangedPatientOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .non_empty("departmentid", &self.department_id)
            .flag("ignorerestrictions", self.ignore_restrictions)
            .flag("leaveunprocessed", self.leave_unprocessed)
            .non_empty("patientid", &self.patient_id)
            .flag("returnglobalid", self.return_global_id)
            .datetime("showprocessedenddatetime", self.show_processed_end_datetime)
            .datetime("showprocessedstartdatetime", self.show_processed_start_datetime))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePatientInformationVerificationDetailsOptions {
    pub department_id: u64,
    pub expiration_date: Option<NaiveDate>,
    pub insured_signature: Option<String>,
    pub patient_signature: Option<String>,
    pub privacy_notice: Option<String>,
    pub reason_patient_unable_to_sign: Option<String>,
    pub signature_datetime: NaiveDateTime,
    pub signature_name: String,
    pub signer_relationship_to_patient: Option<String>,
}

impl ToParams for UpdatePatientInformationVerificationDetailsOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .id("departmentid", self.department_id)
            .date("expirationdate", self.expiration_date)
            .opt_text("insuredsignature", self.insured_signature.as_deref())
            .opt_text("patientsignature", self.patient_signature.as_deref())
            .opt_text("privacynotice", self.privacy_notice.as_deref())
            .opt_text(
                "reasonpatientunabletosign",
                self.reason_patient_unable_to_sign.as_deref(),
            )
            .datetime("signaturedatetime", Some(self.signature_datetime))
            .text("signaturename", &self.signature_name)
            .opt_text(
                "signerrelationshiptopatientid",
                self.signer_relationship_to_patient.as_deref(),
            ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePatientMedicationHistoryConsentOptions {
    pub department_id: u64,
    pub signature_datetime: NaiveDateTime,
    pub signature_name: String,
}

impl ToParams for UpdatePatientMedicationHistoryConsentOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .id("departmentid", self.department_id)
            .datetime("signaturedatetime", Some(self.signature_datetime))
            .text("signaturename", &self.signature_name))
    }
}

/// Both identifiers form the request path and must be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPatientsMatchingCustomFieldOptions {
    pub custom_field_id: String,
    pub custom_field_value: String,
    pub pagination: Option<PaginationOptions>,
}

impl ListPatientsMatchingCustomFieldOptions {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.custom_field_id.is_empty() {
            return Err(ApiError::InvalidUsage("custom_field_id is required".to_string()));
        }
        if self.custom_field_value.is_empty() {
            return Err(ApiError::InvalidUsage("custom_field_value is required".to_string()));
        }
        Ok(())
    }
}

impl ToParams for ListPatientsMatchingCustomFieldOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new().pagination(self.pagination.as_ref()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePatientOptions {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    /// Required.
    pub department_id: String,
    pub dob: Option<NaiveDate>,
    pub email: Option<String>,
    pub first_name: String,
    pub home_phone: Option<String>,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub mobile_phone: Option<String>,
    pub notes: Option<String>,
    pub sex: Option<String>,
    pub ssn: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub zip: Option<String>,
    pub bypass_patient_matching: bool,
}

impl CreatePatientOptions {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.department_id.is_empty() {
            return Err(ApiError::InvalidUsage("department_id is required".to_string()));
        }
        Ok(())
    }
}

impl ToParams for CreatePatientOptions {
    fn to_params(&self) -> Result<Params, ApiError> {
        Ok(Params::new()
            .opt_text("address1", self.address1.as_deref())
            .opt_text("address2", self.address2.as_deref())
            .opt_text("city", self.city.as_deref())
            .text("departmentid", &self.department_id)
            .date("dob", self.dob)
            .opt_text("email", self.email.as_deref())
            .text("firstname", &self.first_name)
            .opt_text("homephone", self.home_phone.as_deref())
            .text("lastname", &self.last_name)
            .opt_text("middlename", self.middle_name.as_deref())
            .opt_text("mobilephone", self.mobile_phone.as_deref())
            .opt_text("notes", self.notes.as_deref())
            .opt_text("sex", self.sex.as_deref())
            .opt_text("ssn", self.ssn.as_deref())
            .opt_text("state", self.state.as_deref())
            .opt_text("status", self.status.as_deref())
            .opt_text("zip", self.zip.as_deref())
            .flag("bypasspatientmatching", self.bypass_patient_matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(p: &Params) -> Vec<&'static str> {
        p.keys().collect()
    }

    fn signed_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 2)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    #[test]
    fn default_get_patient_options_send_nothing() {
        let p = GetPatientOptions::default().to_params().unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn get_patient_options_send_only_set_switches() {
        let opts = GetPatientOptions {
            show_insurance: true,
            department_id: 12,
            show_all_patient_department_status: true,
            ..Default::default()
        };
        let p = opts.to_params().unwrap();
        assert_eq!(
            p.encode(),
            "showinsurance=true&departmentid=12&showallpatientdepartmentstatus=true"
        );
    }

    #[test]
    fn list_patients_skips_empty_filters_and_zero_pagination() {
        let opts = ListPatientsOptions {
            last_name: "Lee".to_string(),
            pagination: Some(PaginationOptions::new(10, 0)),
            ..Default::default()
        };
        let p = opts.to_params().unwrap();
        assert_eq!(keys(&p), vec!["lastname", "limit"]);
    }

    #[test]
    fn update_patient_sends_exactly_the_set_fields() {
        let opts = UpdatePatientOptions {
            address2: Some(String::new()),
            consent_to_text: Some(false),
            has_mobile: Some(true),
            race: Some(vec!["2106-3".to_string(), "2028-9".to_string()]),
            status: Some(STATUS_INACTIVE.to_string()),
            ..Default::default()
        };
        let p = opts.to_params().unwrap();
        assert_eq!(keys(&p), vec!["address2", "consenttotext", "hasmobileyn", "race", "status"]);
        assert_eq!(p.get("address2"), Some(""));
        assert_eq!(p.get("consenttotext"), Some("false"));
        assert_eq!(p.get("hasmobileyn"), Some("true"));
        assert_eq!(p.get("race"), Some("2106-3\t2028-9"));
        assert_eq!(p.get("status"), Some("i"));
    }

    #[test]
    fn empty_update_sends_nothing() {
        assert!(UpdatePatientOptions::default().to_params().unwrap().is_empty());
    }

    #[test]
    fn changed_patients_datetimes_and_flags() {
        let opts = ListChangedPatientOptions {
            leave_unprocessed: true,
            show_processed_start_datetime: Some(signed_at()),
            ..Default::default()
        };
        let p = opts.to_params().unwrap();
        assert_eq!(keys(&p), vec!["leaveunprocessed", "showprocessedstartdatetime"]);
        assert_eq!(p.get("showprocessedstartdatetime"), Some("11/02/2023 14:30:00"));
    }

    #[test]
    fn verification_details_always_carry_signature() {
        let opts = UpdatePatientInformationVerificationDetailsOptions {
            department_id: 1,
            expiration_date: NaiveDate::from_ymd_opt(2024, 11, 2),
            insured_signature: None,
            patient_signature: Some("Y".to_string()),
            privacy_notice: None,
            reason_patient_unable_to_sign: None,
            signature_datetime: signed_at(),
            signature_name: "Ann Lee".to_string(),
            signer_relationship_to_patient: Some("1".to_string()),
        };
        let p = opts.to_params().unwrap();
        assert_eq!(
            keys(&p),
            vec![
                "departmentid",
                "expirationdate",
                "patientsignature",
                "signaturedatetime",
                "signaturename",
                "signerrelationshiptopatientid",
            ]
        );
        assert_eq!(p.get("expirationdate"), Some("11/02/2024"));
        assert_eq!(p.get("signaturedatetime"), Some("11/02/2023 14:30:00"));
    }

    #[test]
    fn create_patient_omits_unset_optionals() {
        let opts = CreatePatientOptions {
            department_id: "1".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 1, 31),
            zip: Some("02110".to_string()),
            ..Default::default()
        };
        let p = opts.to_params().unwrap();
        assert_eq!(keys(&p), vec!["departmentid", "dob", "firstname", "lastname", "zip"]);
        assert_eq!(p.get("dob"), Some("01/31/1990"));
        assert_eq!(opts.to_params().unwrap(), p);
    }

    #[test]
    fn create_patient_requires_department() {
        let err = CreatePatientOptions::default().validate().unwrap_err();
        assert!(matches!(err, ApiError::InvalidUsage(_)));
    }

    #[test]
    fn custom_field_match_requires_both_path_parts() {
        let opts = ListPatientsMatchingCustomFieldOptions {
            custom_field_id: "101".to_string(),
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(ApiError::InvalidUsage(_))));
    }
}
