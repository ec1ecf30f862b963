#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use secrecy::Secret;
use serde_json::{json, Value};
use iqx_dockbooking::config::{
    BackendSettings, BookingSettings, DatabaseSettings, KeepAliveSettings, LoggingSettings, Settings,
};
use iqx_dockbooking::errors::{DockBookingError, DockBookingResult};
use iqx_dockbooking::services::backend::{BackendRequest, BackendResponse, BackendTransport};

pub const SLOT_PATH: &str = "/sap/opu/odata/sap/ZDOCK_APPOINTMENT_SLOT_TIME_SRV/ZDOCK_SLOT_TIMESet";
pub const CARRIER_PATH: &str = "/sap/opu/odata/sap/ZDOCK_APPOINTMENT_CARRIER_LIST_SRV/ZDOCK_SLOT_CARRIERSet";
pub const APPOINTMENT_PATH: &str = "/sap/opu/odata/sap/ZSCWM_DAS_CARRIER_ACCESS_SRV/AppointmentSet";

pub const SESSION_SET_COOKIE: &str =
    "SAP_SESSIONID_S4H_100=ABC123; path=/; secure; HttpOnly, sap-usercontext=sap-client=100; path=/";

pub fn create_mock_settings() -> Settings {
    Settings {
        backend: BackendSettings {
            read_base_url: "https://backend.test:8006".to_string(),
            write_base_url: "https://backend.test:44303".to_string(),
            username: "carrier_bot".to_string(),
            password: Secret::new("hunter2".to_string()),
            accept_invalid_certs: true,
            timeout_ms: 5000,
            token_fetch_attempts: 3,
            retry_delay_ms: 0,
            slot_service_path: "/sap/opu/odata/sap/ZDOCK_APPOINTMENT_SLOT_TIME_SRV".to_string(),
            carrier_service_path: "/sap/opu/odata/sap/ZDOCK_APPOINTMENT_CARRIER_LIST_SRV".to_string(),
            appointment_service_path: "/sap/opu/odata/sap/ZSCWM_DAS_CARRIER_ACCESS_SRV".to_string(),
        },
        booking: BookingSettings {
            reference_date: "23062025".to_string(),
            transport_mode: "TRCK".to_string(),
        },
        logging: LoggingSettings {
            level: "info".to_string(),
            path: None,
            trace_operations: false,
        },
        keep_alive: KeepAliveSettings { url: None, interval_secs: 600, timeout_ms: 10000 },
        database: DatabaseSettings::default(),
    }
}

/// Answers requests from a queue of canned outcomes and records every request it receives
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<DockBookingResult<BackendResponse>>>,
    requests: Mutex<Vec<BackendRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: DockBookingResult<BackendResponse>) -> &Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn respond(&self, response: BackendResponse) -> &Self {
        self.push(Ok(response))
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl BackendTransport for ScriptedTransport {
    async fn send(&self, request: BackendRequest) -> DockBookingResult<BackendResponse> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DockBookingError::Transport("no scripted response left".to_string())))
    }
}

pub fn json_response(status: u16, body: Value) -> BackendResponse {
    BackendResponse {
        status,
        headers: HashMap::new(),
        body: body.to_string(),
    }
}

pub fn text_response(status: u16, body: &str) -> BackendResponse {
    BackendResponse {
        status,
        headers: HashMap::new(),
        body: body.to_string(),
    }
}

pub fn results(rows: Value) -> BackendResponse {
    json_response(200, json!({ "d": { "results": rows } }))
}

pub fn token_response() -> BackendResponse {
    let mut response = results(json!([]));
    response.headers.insert("x-csrf-token".to_string(), "TOKEN-XYZ".to_string());
    response.headers.insert("set-cookie".to_string(), SESSION_SET_COOKIE.to_string());
    response
}

pub fn created_response(key: &str) -> BackendResponse {
    json_response(201, json!({ "d": { "AppointmentKey": key, "Loadpoint": "LP01" } }))
}

pub fn created_entry_response(key: &str) -> BackendResponse {
    text_response(201, &format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices">
  <content type="application/xml">
    <m:properties>
      <d:AppointmentKey>{}</d:AppointmentKey>
      <d:Docno m:null="true"/>
    </m:properties>
  </content>
</entry>"#,
        key
    ))
}

pub fn document_response(docno: &str) -> BackendResponse {
    json_response(200, json!({ "d": { "Docno": docno } }))
}

pub fn document_entry_response(key: &str, docno: &str) -> BackendResponse {
    text_response(200, &format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<entry xml:base="https://backend.test:8006/sap/opu/odata/sap/ZSCWM_DAS_CARRIER_ACCESS_SRV/"
       xmlns="http://www.w3.org/2005/Atom"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices">
  <id>AppointmentSet(guid'{key}')</id>
  <title type="text">AppointmentSet(guid'{key}')</title>
  <content type="application/xml">
    <m:properties>
      <d:AppointmentKey>{key}</d:AppointmentKey>
      <d:Docno>{docno}</d:Docno>
      <d:Loadpoint>LP01</d:Loadpoint>
    </m:properties>
  </content>
</entry>"#,
        key = key,
        docno = docno
    ))
}

pub fn header<'a>(request: &'a BackendRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
