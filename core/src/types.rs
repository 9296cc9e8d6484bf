//! Domain DTOs for the patients and custom-fields endpoints.
//!
//! # Design
//! Every attribute is optional: the API omits fields it has no value for and
//! only returns sub-records (insurances, custom fields, portal status) when the
//! matching `show*` option was requested. Wire keys are the API's flat
//! lowercase names; Rust fields are their snake_case spelling.

use serde::{Deserialize, Serialize};

use crate::number::NumberString;
use crate::pagination::PaginationResult;

/// A patient record as returned by `/patients` and `/patients/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    pub address1: Option<String>,
    pub address2: Option<String>,
    #[serde(rename = "agriculturalworker")]
    pub agricultural_worker: Option<String>,
    #[serde(rename = "agriculturalworkertype")]
    pub agricultural_worker_type: Option<String>,
    #[serde(rename = "allpatientstatuses", deserialize_with = "crate::nullable::null_default")]
    pub all_patient_statuses: Vec<PatientStatus>,
    #[serde(rename = "altfirstname")]
    pub alt_first_name: Option<String>,
    #[serde(rename = "assignedsexatbirth")]
    pub assigned_sex_at_birth: Option<String>,
    #[serde(deserialize_with = "crate::nullable::null_default")]
    pub balances: Vec<PatientBalance>,
    #[serde(rename = "caresummarydeliverypreference")]
    pub care_summary_delivery_preference: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "confidentialitycode")]
    pub confidentiality_code: Option<String>,
    #[serde(rename = "consenttocall")]
    pub consent_to_call: Option<bool>,
    #[serde(rename = "consenttotext")]
    pub consent_to_text: Option<bool>,
    #[serde(rename = "contacthomephone")]
    pub contact_home_phone: Option<String>,
    #[serde(rename = "contactmobilephone")]
    pub contact_mobile_phone: Option<String>,
    #[serde(rename = "contactname")]
    pub contact_name: Option<String>,
    #[serde(rename = "contactpreference")]
    pub contact_preference: Option<String>,
    #[serde(rename = "contactpreference_announcement_email")]
    pub contact_preference_announcement_email: Option<bool>,
    #[serde(rename = "contactpreference_announcement_phone")]
    pub contact_preference_announcement_phone: Option<bool>,
    #[serde(rename = "contactpreference_announcement_sms")]
    pub contact_preference_announcement_sms: Option<bool>,
    #[serde(rename = "contactpreference_appointment_email")]
    pub contact_preference_appointment_email: Option<bool>,
    #[serde(rename = "contactpreference_appointment_phone")]
    pub contact_preference_appointment_phone: Option<bool>,
    #[serde(rename = "contactpreference_appointment_sms")]
    pub contact_preference_appointment_sms: Option<bool>,
    #[serde(rename = "contactpreference_billing_email")]
    pub contact_preference_billing_email: Option<bool>,
    #[serde(rename = "contactpreference_billing_phone")]
    pub contact_preference_billing_phone: Option<bool>,
    #[serde(rename = "contactpreference_billing_sms")]
    pub contact_preference_billing_sms: Option<bool>,
    #[serde(rename = "contactpreference_lab_email")]
    pub contact_preference_lab_email: Option<bool>,
    #[serde(rename = "contactpreference_lab_phone")]
    pub contact_preference_lab_phone: Option<bool>,
    #[serde(rename = "contactpreference_lab_sms")]
    pub contact_preference_lab_sms: Option<bool>,
    #[serde(rename = "contactrelationship")]
    pub contact_relationship: Option<String>,
    #[serde(rename = "countrycode")]
    pub country_code: Option<String>,
    #[serde(rename = "countrycode3166")]
    pub country_code3166: Option<String>,
    #[serde(rename = "customfields", deserialize_with = "crate::nullable::null_default")]
    pub custom_fields: Vec<CustomFieldValue>,
    #[serde(rename = "deceaseddate")]
    pub deceased_date: Option<String>,
    #[serde(rename = "defaultpharmacyncpdpid")]
    pub default_pharmacy_ncpdpid: Option<String>,
    #[serde(rename = "departmentid")]
    pub department_id: Option<String>,
    pub dob: Option<String>,
    #[serde(rename = "donotcall")]
    pub do_not_call: Option<bool>,
    #[serde(rename = "driverslicense")]
    pub drivers_license: Option<bool>,
    #[serde(rename = "driverslicenseexpirationdate")]
    pub drivers_license_expiration_date: Option<String>,
    #[serde(rename = "driverslicensenumber")]
    pub drivers_license_number: Option<String>,
    #[serde(rename = "driverslicensestateid")]
    pub drivers_license_state_id: Option<String>,
    #[serde(rename = "driverslicenseurl")]
    pub drivers_license_url: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "emailexistsyn")]
    pub email_exists: Option<String>,
    #[serde(rename = "employeraddress")]
    pub employer_address: Option<String>,
    #[serde(rename = "employercity")]
    pub employer_city: Option<String>,
    #[serde(rename = "employerfax")]
    pub employer_fax: Option<String>,
    #[serde(rename = "employerid")]
    pub employer_id: Option<String>,
    #[serde(rename = "employername")]
    pub employer_name: Option<String>,
    #[serde(rename = "employerphone")]
    pub employer_phone: Option<String>,
    #[serde(rename = "employerstate")]
    pub employer_state: Option<String>,
    #[serde(rename = "employerzip")]
    pub employer_zip: Option<String>,
    #[serde(rename = "ethnicitycodes", deserialize_with = "crate::nullable::null_default")]
    pub ethnicity_codes: Vec<String>,
    #[serde(rename = "ethnicitycode")]
    pub ethnicity_code: Option<String>,
    #[serde(rename = "firstappointment")]
    pub first_appointment: Option<String>,
    #[serde(rename = "firstname")]
    pub first_name: Option<String>,
    #[serde(rename = "genderidentity")]
    pub gender_identity: Option<String>,
    #[serde(rename = "genderidentityother")]
    pub gender_identity_other: Option<String>,
    #[serde(rename = "guarantoraddress1")]
    pub guarantor_address1: Option<String>,
    #[serde(rename = "guarantoraddress2")]
    pub guarantor_address2: Option<String>,
    #[serde(rename = "guarantoraddresssameaspatient")]
    pub guarantor_address_same_as_patient: Option<bool>,
    #[serde(rename = "guarantorcity")]
    pub guarantor_city: Option<String>,
    #[serde(rename = "guarantorcountrycode")]
    pub guarantor_country_code: Option<String>,
    #[serde(rename = "guarantorcountrycode3166")]
    pub guarantor_country_code3166: Option<String>,
    #[serde(rename = "guarantordob")]
    pub guarantor_dob: Option<String>,
    #[serde(rename = "guarantoremail")]
    pub guarantor_email: Option<String>,
    #[serde(rename = "guarantoremployerid")]
    pub guarantor_employer_id: Option<String>,
    #[serde(rename = "guarantorfirstname")]
    pub guarantor_first_name: Option<String>,
    #[serde(rename = "guarantorlastname")]
    pub guarantor_last_name: Option<String>,
    #[serde(rename = "guarantormiddlename")]
    pub guarantor_middle_name: Option<String>,
    #[serde(rename = "guarantorphone")]
    pub guarantor_phone: Option<String>,
    #[serde(rename = "guarantorrelationshiptopatient")]
    pub guarantor_relationship_to_patient: Option<String>,
    #[serde(rename = "guarantorssn")]
    pub guarantor_ssn: Option<String>,
    #[serde(rename = "guarantorstate")]
    pub guarantor_state: Option<String>,
    #[serde(rename = "guarantorsuffix")]
    pub guarantor_suffix: Option<String>,
    #[serde(rename = "guarantorzip")]
    pub guarantor_zip: Option<String>,
    #[serde(rename = "guardianfirstname")]
    pub guardian_first_name: Option<String>,
    #[serde(rename = "guardianlastname")]
    pub guardian_last_name: Option<String>,
    #[serde(rename = "guardianmiddlename")]
    pub guardian_middle_name: Option<String>,
    #[serde(rename = "guardiansuffix")]
    pub guardian_suffix: Option<String>,
    #[serde(rename = "hasmobile")]
    pub has_mobile: Option<bool>,
    pub homebound: Option<bool>,
    pub homeless: Option<String>,
    #[serde(rename = "homelesstype")]
    pub homeless_type: Option<String>,
    #[serde(rename = "homephone")]
    pub home_phone: Option<String>,
    #[serde(rename = "industrycode")]
    pub industry_code: Option<String>,
    #[serde(deserialize_with = "crate::nullable::null_default")]
    pub insurances: Vec<Insurance>,
    #[serde(rename = "language6392code")]
    pub language6392_code: Option<String>,
    #[serde(rename = "lastappointment")]
    pub last_appointment: Option<String>,
    #[serde(rename = "lastemail")]
    pub last_email: Option<String>,
    #[serde(rename = "lastname")]
    pub last_name: Option<String>,
    #[serde(rename = "lastupdated")]
    pub last_updated: Option<String>,
    #[serde(rename = "lastupdatedby")]
    pub last_updated_by: Option<String>,
    #[serde(rename = "localpatientid")]
    pub local_patient_id: Option<String>,
    #[serde(rename = "maritalstatus")]
    pub marital_status: Option<String>,
    #[serde(rename = "maritalstatusname")]
    pub marital_status_name: Option<String>,
    #[serde(rename = "medicationhistoryconsentverified")]
    pub medication_history_consent_verified: Option<bool>,
    #[serde(rename = "middlename")]
    pub middle_name: Option<String>,
    #[serde(rename = "mobilecarrierid")]
    pub mobile_carrier_id: Option<String>,
    #[serde(rename = "mobilephone")]
    pub mobile_phone: Option<String>,
    #[serde(rename = "nextkinname")]
    pub next_kin_name: Option<String>,
    #[serde(rename = "nextkinphone")]
    pub next_kin_phone: Option<String>,
    #[serde(rename = "nextkinrelationship")]
    pub next_kin_relationship: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "occupationcode")]
    pub occupation_code: Option<String>,
    #[serde(rename = "onlinestatementonly")]
    pub online_statement_only: Option<bool>,
    #[serde(rename = "patientid")]
    pub patient_id: Option<String>,
    #[serde(rename = "patientphoto")]
    pub patient_photo: Option<bool>,
    #[serde(rename = "patientphotourl")]
    pub patient_photo_url: Option<String>,
    #[serde(rename = "portalaccessgiven")]
    pub portal_access_given: Option<bool>,
    #[serde(rename = "portalsignatureonfile")]
    pub portal_signature_on_file: Option<String>,
    #[serde(rename = "portalstatus")]
    pub portal_status: Option<PortalStatus>,
    #[serde(rename = "portaltermsonfile")]
    pub portal_terms_on_file: Option<bool>,
    #[serde(rename = "povertylevelcalculated")]
    pub poverty_level_calculated: Option<NumberString>,
    #[serde(rename = "povertylevelfamilysize")]
    pub poverty_level_family_size: Option<String>,
    #[serde(rename = "povertylevelfamilysizedeclined")]
    pub poverty_level_family_size_declined: Option<bool>,
    #[serde(rename = "povertylevelincomedeclined")]
    pub poverty_level_income_declined: Option<bool>,
    #[serde(rename = "povertylevelincomepayperiod")]
    pub poverty_level_income_pay_period: Option<String>,
    #[serde(rename = "povertylevelincomeperpayperiod")]
    pub poverty_level_income_per_pay_period: Option<String>,
    #[serde(rename = "povertylevelincomerangedeclined")]
    pub poverty_level_income_range_declined: Option<bool>,
    #[serde(rename = "preferredname")]
    pub preferred_name: Option<String>,
    #[serde(rename = "preferredpronouns")]
    pub preferred_pronouns: Option<String>,
    #[serde(rename = "primarydepartmentid")]
    pub primary_department_id: Option<String>,
    #[serde(rename = "primaryproviderid")]
    pub primary_provider_id: Option<String>,
    #[serde(rename = "privacyinformationverified")]
    pub privacy_information_verified: Option<bool>,
    #[serde(rename = "publichousing")]
    pub public_housing: Option<String>,
    #[serde(deserialize_with = "crate::nullable::null_default")]
    pub race: Vec<String>,
    #[serde(rename = "racecode")]
    pub race_code: Option<String>,
    #[serde(rename = "racename")]
    pub race_name: Option<String>,
    #[serde(rename = "referralsourceid")]
    pub referral_source_id: Option<String>,
    #[serde(rename = "referralsourceother")]
    pub referral_source_other: Option<String>,
    #[serde(rename = "registrationdate")]
    pub registration_date: Option<String>,
    #[serde(rename = "schoolbasedhealthcenter")]
    pub school_based_health_center: Option<String>,
    pub sex: Option<String>,
    #[serde(rename = "sexualorientation")]
    pub sexual_orientation: Option<String>,
    #[serde(rename = "sexualorientationother")]
    pub sexual_orientation_other: Option<String>,
    #[serde(rename = "smsoptindate")]
    pub sms_opt_in_date: Option<String>,
    pub ssn: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub suffix: Option<String>,
    pub veteran: Option<String>,
    #[serde(rename = "workphone")]
    pub work_phone: Option<String>,
    pub zip: Option<String>,
}

impl Patient {
    /// Value assigned to a custom field, when `showcustomfields` was requested.
    pub fn custom_field(&self, custom_field_id: &str) -> Option<&CustomFieldValue> {
        self.custom_fields
            .iter()
            .find(|f| f.custom_field_id == custom_field_id)
    }

    /// Status in a given department, from `allpatientstatuses`.
    pub fn status_in_department(&self, department_id: i64) -> Option<&PatientStatus> {
        self.all_patient_statuses
            .iter()
            .find(|s| s.department_id == Some(department_id))
    }
}

/// Registration status of a patient in one department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientStatus {
    pub status: Option<String>,
    #[serde(rename = "departmentid")]
    pub department_id: Option<i64>,
    #[serde(rename = "primaryproviderid")]
    pub primary_provider_id: Option<NumberString>,
}

/// Outstanding balance for one provider group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientBalance {
    pub balance: Option<NumberString>,
    #[serde(rename = "departmentlist")]
    pub department_list: Option<String>,
    #[serde(rename = "providergroupid")]
    pub provider_group_id: Option<i64>,
    #[serde(rename = "cleanbalance")]
    pub clean_balance: Option<bool>,
}

/// An insurance policy attached to a patient (`showinsurance=true`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insurance {
    #[serde(rename = "eligibilitylastchecked")]
    pub eligibility_last_checked: Option<String>,
    #[serde(rename = "eligibilityreason")]
    pub eligibility_reason: Option<String>,
    #[serde(rename = "eligibilitystatus")]
    pub eligibility_status: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "insuranceid")]
    pub insurance_id: Option<String>,
    #[serde(rename = "insuranceidnumber")]
    pub insurance_id_number: Option<String>,
    #[serde(rename = "insurancepackageaddress1")]
    pub insurance_package_address1: Option<String>,
    #[serde(rename = "insurancepackagecity")]
    pub insurance_package_city: Option<String>,
    #[serde(rename = "insurancepackageid")]
    pub insurance_package_id: Option<i64>,
    #[serde(rename = "insurancepackagestate")]
    pub insurance_package_state: Option<String>,
    #[serde(rename = "insurancepackagezip")]
    pub insurance_package_zip: Option<String>,
    #[serde(rename = "insurancephone")]
    pub insurance_phone: Option<String>,
    #[serde(rename = "insuranceplandisplayname")]
    pub insurance_plan_display_name: Option<String>,
    #[serde(rename = "insuranceplanname")]
    pub insurance_plan_name: Option<String>,
    #[serde(rename = "insurancepolicyholder")]
    pub insurance_policy_holder: Option<String>,
    #[serde(rename = "insurancepolicyholderaddress1")]
    pub insurance_policy_holder_address1: Option<String>,
    #[serde(rename = "insurancepolicyholdercity")]
    pub insurance_policy_holder_city: Option<String>,
    #[serde(rename = "insurancepolicyholdercountrycode")]
    pub insurance_policy_holder_country_code: Option<String>,
    #[serde(rename = "insurancepolicyholdercountryiso3166")]
    pub insurance_policy_holder_country_iso3166: Option<String>,
    #[serde(rename = "insurancepolicyholderdob")]
    pub insurance_policy_holder_dob: Option<String>,
    #[serde(rename = "insurancepolicyholderfirstname")]
    pub insurance_policy_holder_first_name: Option<String>,
    #[serde(rename = "insurancepolicyholderlastname")]
    pub insurance_policy_holder_last_name: Option<String>,
    #[serde(rename = "insurancepolicyholdersex")]
    pub insurance_policy_holder_sex: Option<String>,
    #[serde(rename = "insurancepolicyholderstate")]
    pub insurance_policy_holder_state: Option<String>,
    #[serde(rename = "insurancepolicyholderzip")]
    pub insurance_policy_holder_zip: Option<String>,
    #[serde(rename = "insurancetype")]
    pub insurance_type: Option<String>,
    #[serde(rename = "insuredaddress")]
    pub insured_address: Option<String>,
    #[serde(rename = "insuredcity")]
    pub insured_city: Option<String>,
    #[serde(rename = "insuredcountrycode")]
    pub insured_country_code: Option<String>,
    #[serde(rename = "insuredcountryiso3166")]
    pub insured_country_iso3166: Option<String>,
    #[serde(rename = "insureddob")]
    pub insured_dob: Option<String>,
    #[serde(rename = "insuredentitytypeid")]
    pub insured_entity_type_id: Option<i64>,
    #[serde(rename = "insuredfirstname")]
    pub insured_first_name: Option<String>,
    #[serde(rename = "insuredlastname")]
    pub insured_last_name: Option<String>,
    #[serde(rename = "insuredsex")]
    pub insured_sex: Option<String>,
    #[serde(rename = "insuredstate")]
    pub insured_state: Option<String>,
    #[serde(rename = "insuredzip")]
    pub insured_zip: Option<String>,
    #[serde(rename = "ircname")]
    pub irc_name: Option<String>,
    #[serde(rename = "relationshiptoinsured")]
    pub relationship_to_insured: Option<String>,
    #[serde(rename = "relationshiptoinsuredid")]
    pub relationship_to_insured_id: Option<i64>,
    #[serde(rename = "sequencenumber")]
    pub sequence_number: Option<i64>,
}

/// Patient portal registration state (`showportalstatus=true`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalStatus {
    #[serde(rename = "blockedfailedlogins")]
    pub blocked_failed_logins: Option<bool>,
    #[serde(rename = "entitytodisplay")]
    pub entity_to_display: Option<String>,
    #[serde(rename = "familyblockedfailedlogins")]
    pub family_blocked_failed_logins: Option<bool>,
    #[serde(rename = "familyregistered")]
    pub family_registered: Option<bool>,
    #[serde(rename = "noportal")]
    pub no_portal: Option<bool>,
    #[serde(rename = "portalregistrationdate")]
    pub portal_registration_date: Option<String>,
    pub registered: Option<bool>,
    pub status: Option<String>,
    #[serde(rename = "termsaccepted")]
    pub terms_accepted: Option<bool>,
}

/// A value assigned to a custom field on a patient.
///
/// Select-list fields are set through `option_id`; free-text fields through
/// `custom_field_value`. Unset members are left out of the JSON entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    #[serde(rename = "customfieldid", default, deserialize_with = "crate::nullable::null_default")]
    pub custom_field_id: String,
    #[serde(
        rename = "customfieldvalue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_field_value: Option<String>,
    #[serde(rename = "optionid", default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
}

impl CustomFieldValue {
    pub fn text(custom_field_id: &str, value: &str) -> Self {
        Self {
            custom_field_id: custom_field_id.to_string(),
            custom_field_value: Some(value.to_string()),
            option_id: None,
        }
    }

    pub fn option(custom_field_id: &str, option_id: &str) -> Self {
        Self {
            custom_field_id: custom_field_id.to_string(),
            custom_field_value: None,
            option_id: Some(option_id.to_string()),
        }
    }
}

/// One entry of a select-list custom field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectOption {
    #[serde(rename = "optionid", deserialize_with = "crate::nullable::null_default")]
    pub option_id: String,
    #[serde(rename = "optionvalue", deserialize_with = "crate::nullable::null_default")]
    pub option_value: String,
}

/// A practice-defined patient field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    #[serde(rename = "casesensitive", deserialize_with = "crate::nullable::null_default")]
    pub case_sensitive: bool,
    #[serde(rename = "customfieldid", deserialize_with = "crate::nullable::null_default")]
    pub custom_field_id: String,
    #[serde(rename = "disallowupdate", deserialize_with = "crate::nullable::null_default")]
    pub disallow_update: bool,
    #[serde(rename = "length")]
    pub max_length: Option<String>,
    #[serde(deserialize_with = "crate::nullable::null_default")]
    pub name: String,
    pub ordering: Option<String>,
    #[serde(deserialize_with = "crate::nullable::null_default")]
    pub searchable: bool,
    #[serde(rename = "selectlist", deserialize_with = "crate::nullable::null_default")]
    pub select_list: Vec<SelectOption>,
    #[serde(deserialize_with = "crate::nullable::null_default")]
    pub select: bool,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
}

impl CustomField {
    /// Looks up a select-list option by its display value.
    pub fn option_by_value(&self, value: &str) -> Option<&SelectOption> {
        self.select_list.iter().find(|o| {
            if self.case_sensitive {
                o.option_value == value
            } else {
                o.option_value.eq_ignore_ascii_case(value)
            }
        })
    }
}

/// One page of patients with its pagination state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPatientsResult {
    pub patients: Vec<Patient>,
    pub pagination: PaginationResult,
}

pub type ListPatientsMatchingCustomFieldResult = ListPatientsResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePatientResult {
    pub patient_id: String,
}

/// Outcome of a custom-field update: fields written, and fields the practice
/// does not allow to be updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCustomFieldsResult {
    pub updated_count: u64,
    pub disallowed_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_decodes_sparse_payload() {
        let patient: Patient = serde_json::from_str(
            r#"{
                "patientid": "1234",
                "firstname": "Ann",
                "lastname": "Lee",
                "emailexistsyn": "Y",
                "contactpreference_lab_sms": true,
                "povertylevelcalculated": "150",
                "race": ["2106-3"],
                "portalstatus": {"registered": true, "status": "REGISTERED"},
                "balances": [{"balance": 12.5, "providergroupid": 1, "cleanbalance": true}],
                "allpatientstatuses": [{"status": "a", "departmentid": 1, "primaryproviderid": "71"}]
            }"#,
        )
        .unwrap();

        assert_eq!(patient.patient_id.as_deref(), Some("1234"));
        assert_eq!(patient.email_exists.as_deref(), Some("Y"));
        assert_eq!(patient.contact_preference_lab_sms, Some(true));
        assert_eq!(patient.poverty_level_calculated, Some(NumberString(150.0)));
        assert_eq!(patient.race, vec!["2106-3".to_string()]);
        assert_eq!(patient.portal_status.as_ref().unwrap().registered, Some(true));
        assert_eq!(patient.balances[0].balance, Some(NumberString(12.5)));
        assert!(patient.insurances.is_empty());
        assert!(patient.middle_name.is_none());

        let status = patient.status_in_department(1).unwrap();
        assert_eq!(status.primary_provider_id.unwrap().as_i64(), Some(71));
    }

    #[test]
    fn poverty_level_decodes_from_number_or_string() {
        let a: Patient = serde_json::from_str(r#"{"povertylevelcalculated": "42"}"#).unwrap();
        let b: Patient = serde_json::from_str(r#"{"povertylevelcalculated": 42}"#).unwrap();
        assert_eq!(a.poverty_level_calculated, b.poverty_level_calculated);
    }

    #[test]
    fn insurance_decodes_integer_fields() {
        let ins: Insurance = serde_json::from_str(
            r#"{"insuranceid":"9","insurancepackageid":4040,"sequencenumber":1,"ircname":"BCBS"}"#,
        )
        .unwrap();
        assert_eq!(ins.insurance_package_id, Some(4040));
        assert_eq!(ins.sequence_number, Some(1));
        assert_eq!(ins.irc_name.as_deref(), Some("BCBS"));
    }

    #[test]
    fn custom_field_value_omits_unset_members() {
        let json = serde_json::to_value(CustomFieldValue::option("101", "7")).unwrap();
        assert_eq!(json, serde_json::json!({"customfieldid": "101", "optionid": "7"}));
    }

    #[test]
    fn custom_field_decodes_select_list() {
        let field: CustomField = serde_json::from_str(
            r#"{"customfieldid":"5","name":"Preferred clinic","select":true,"casesensitive":false,
                "length":"20","type":"SELECTLIST",
                "selectlist":[{"optionid":"1","optionvalue":"North"},{"optionid":"2","optionvalue":"South"}]}"#,
        )
        .unwrap();
        assert_eq!(field.max_length.as_deref(), Some("20"));
        assert_eq!(field.option_by_value("south").unwrap().option_id, "2");
        assert!(field.option_by_value("East").is_none());
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let patient: Patient = serde_json::from_str(
            r#"{"patientid":"7","balances":null,"race":null,"customfields":null,
                "allpatientstatuses":null,"insurances":null,"ethnicitycodes":null}"#,
        )
        .unwrap();
        assert_eq!(patient.patient_id.as_deref(), Some("7"));
        assert!(patient.balances.is_empty());
        assert!(patient.race.is_empty());
        assert!(patient.custom_fields.is_empty());
        assert!(patient.all_patient_statuses.is_empty());
        assert!(patient.insurances.is_empty());
        assert!(patient.ethnicity_codes.is_empty());
    }

    #[test]
    fn null_custom_field_members_take_defaults() {
        let field: CustomField = serde_json::from_str(
            r#"{"customfieldid":"9","name":null,"select":null,"searchable":null,
                "casesensitive":null,"disallowupdate":null,"selectlist":null}"#,
        )
        .unwrap();
        assert_eq!(field.custom_field_id, "9");
        assert_eq!(field.name, "");
        assert!(!field.select && !field.searchable && !field.case_sensitive && !field.disallow_update);
        assert!(field.select_list.is_empty());

        let option: SelectOption = serde_json::from_str(r#"{"optionid":null,"optionvalue":"North"}"#).unwrap();
        assert_eq!(option.option_id, "");
        let value: CustomFieldValue = serde_json::from_str(r#"{"customfieldid":null}"#).unwrap();
        assert_eq!(value.custom_field_id, "");
    }
}
