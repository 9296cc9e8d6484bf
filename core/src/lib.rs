//! Typed client for the athenahealth patients and custom-fields API.
//!
//! # Overview
//! `AthenaClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). `Athena`
//! pairs it with a `Transport` to run one HTTP call per operation;
//! `UreqTransport` is the blocking transport shipped with the crate.
//!
//! # Design
//! - `AthenaClient` is stateless: it holds only the practice base URL.
//! - Every operation is split into `build_*` and `parse_*` so the I/O
//!   boundary is explicit and each half can be tested on plain data.
//! - Options structs encode through `encode::Params`; unset fields never
//!   reach the wire, which is what gives updates their partial semantics.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod encode;
pub mod error;
pub mod http;
pub mod number;
mod nullable;
pub mod options;
pub mod pagination;
pub mod transport;
pub mod types;

pub use api::Athena;
pub use client::AthenaClient;
pub use config::ClientConfig;
pub use encode::{FormReader, Params, ToParams};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use number::NumberString;
pub use options::{
    CreatePatientOptions, GetPatientOptions, GetPatientPhotoOptions, ListChangedPatientOptions,
    ListPatientsMatchingCustomFieldOptions, ListPatientsOptions,
    UpdatePatientInformationVerificationDetailsOptions,
    UpdatePatientMedicationHistoryConsentOptions, UpdatePatientOptions,
};
pub use pagination::{PageCursor, PaginationOptions, PaginationResult};
pub use transport::UreqTransport;
pub use types::{
    CustomField, CustomFieldValue, Insurance, ListPatientsMatchingCustomFieldResult,
    ListPatientsResult, Patient, PatientBalance, PatientStatus, PortalStatus, SelectOption,
    UpdateCustomFieldsResult, UpdatePatientResult,
};
