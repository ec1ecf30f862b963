mod common;

use std::sync::Arc;
use serde_json::json;
use iqx_dockbooking::errors::{DockBookingError, ErrorKind};
use iqx_dockbooking::services::backend::{BackendHost, HttpMethod};
use iqx_dockbooking::services::{
    AppointmentBookingService, BackendClient, BackendTransport, CarrierDirectory, SessionNegotiator,
    SlotLookupService,
};
use common::*;

fn client(transport: &Arc<ScriptedTransport>) -> BackendClient {
    BackendClient::new(transport.clone() as Arc<dyn BackendTransport>)
}

fn booking_service(transport: &Arc<ScriptedTransport>) -> AppointmentBookingService {
    let settings = create_mock_settings();
    let client = client(transport);
    let negotiator = SessionNegotiator::new(&settings, client.clone());
    AppointmentBookingService::new(&settings, client, negotiator)
}

#[tokio::test]
async fn slots_keep_backend_order() {
    let transport = ScriptedTransport::new();
    transport.respond(results(json!([
        {"StartTime": "2025062310:00:00.000", "FinishTime": "2025062311:00:00.000", "Capacity": 1, "Loadpoint": "LP02"},
        {"StartTime": "2025062308:00:00.000", "FinishTime": "2025062309:00:00.000", "Capacity": "3", "Loadpoint": "LP01"}
    ])));
    let service = SlotLookupService::new(&create_mock_settings(), client(&transport));

    let slots = service.list_slots("23062025").await.unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start_time, "10:00:00");
    assert_eq!(slots[0].loadpoint, "LP02");
    assert_eq!(slots[1].end_time, "09:00:00");
    assert_eq!(slots[1].capacity, 3);

    let requests = transport.requests();
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].path, SLOT_PATH);
    assert_eq!(
        requests[0].path_and_query(),
        format!("{}?$filter=CurrDate eq '23062025'&$format=json", SLOT_PATH)
    );
}

#[tokio::test]
async fn empty_day_is_not_an_error() {
    let transport = ScriptedTransport::new();
    transport.respond(results(json!([])));
    let service = SlotLookupService::new(&create_mock_settings(), client(&transport));

    assert!(service.list_slots("01012030").await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_dates_never_reach_the_backend() {
    let transport = ScriptedTransport::new();
    let service = SlotLookupService::new(&create_mock_settings(), client(&transport));

    for date in ["2306202", "2025-06-23", "23O62025", ""] {
        let err = service.list_slots(date).await.unwrap_err();
        assert!(matches!(err, DockBookingError::InvalidDate(_)), "{} gave {:?}", date, err);
    }
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn one_malformed_slot_fails_the_lookup() {
    let transport = ScriptedTransport::new();
    transport.respond(results(json!([
        {"StartTime": "2025062308:00:00.000", "FinishTime": "2025062309:00:00.000"},
        {"StartTime": "09:00", "FinishTime": "2025062310:00:00.000"}
    ])));
    let service = SlotLookupService::new(&create_mock_settings(), client(&transport));

    let err = service.list_slots("23062025").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn slot_lookup_reports_upstream_status() {
    let transport = ScriptedTransport::new();
    transport.respond(text_response(503, "Service Unavailable"));
    let service = SlotLookupService::new(&create_mock_settings(), client(&transport));

    let err = service.list_slots("23062025").await.unwrap_err();
    assert!(matches!(err, DockBookingError::Upstream { status: 503, .. }));
}

#[tokio::test]
async fn verification_matches_exact_ids() {
    let transport = ScriptedTransport::new();
    let directory = json!([{"Businesspartner": " 1000123 "}, {"Businesspartner": "1000456"}]);
    transport.respond(results(directory.clone())).respond(results(directory));
    let carriers = CarrierDirectory::new(&create_mock_settings(), client(&transport));

    assert!(carriers.verify("1000123").await);
    assert!(!carriers.verify("100012").await);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path_and_query(), format!("{}?$format=json", CARRIER_PATH));
}

#[tokio::test]
async fn verification_collapses_failures_to_false() {
    let transport = ScriptedTransport::new();
    transport.push(Err(DockBookingError::Transport("connection reset".to_string())));
    transport.push(Err(DockBookingError::Transport("connection reset".to_string())));
    let carriers = CarrierDirectory::new(&create_mock_settings(), client(&transport));

    assert!(!carriers.verify("1000123").await);
    let err = carriers.check("1000123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn blank_partner_ids_are_rejected_locally() {
    let transport = ScriptedTransport::new();
    let carriers = CarrierDirectory::new(&create_mock_settings(), client(&transport));

    assert!(!carriers.verify("   ").await);
    assert!(matches!(carriers.check("").await, Err(DockBookingError::InvalidInput(_))));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn booking_runs_token_creation_and_resolution_in_order() {
    let transport = ScriptedTransport::new();
    transport
        .respond(token_response())
        .respond(created_response("GUID1"))
        .respond(document_response("DOC-001"));
    let service = booking_service(&transport);

    let document = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap();
    assert_eq!(document.as_str(), "DOC-001");

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);

    let token_fetch = &requests[0];
    assert_eq!(token_fetch.method, HttpMethod::Get);
    assert_eq!(token_fetch.host, BackendHost::Read);
    assert_eq!(header(token_fetch, "x-csrf-token"), Some("fetch"));
    assert!(token_fetch.path_and_query().contains("CurrDate eq '23062025'"));

    let creation = &requests[1];
    assert_eq!(creation.method, HttpMethod::Post);
    assert_eq!(creation.host, BackendHost::Write);
    assert_eq!(creation.path, APPOINTMENT_PATH);
    assert_eq!(header(creation, "x-csrf-token"), Some("TOKEN-XYZ"));
    assert_eq!(
        header(creation, "cookie"),
        Some("SAP_SESSIONID_S4H_100=ABC123; sap-usercontext=sap-client=100")
    );
    assert_eq!(
        creation.body,
        Some(json!({
            "Loadpoint": "LP01",
            "Carrier": "1000123",
            "Mtr": "TRCK",
            "ReqStartTime": "2025-06-23T09:00:00Z"
        }))
    );

    let resolution = &requests[2];
    assert_eq!(resolution.method, HttpMethod::Get);
    assert_eq!(resolution.host, BackendHost::Read);
    assert_eq!(resolution.path, format!("{}(guid'GUID1')", APPOINTMENT_PATH));
    assert_eq!(header(resolution, "x-csrf-token"), None);
}

#[tokio::test]
async fn booking_reads_atom_creation_responses() {
    let transport = ScriptedTransport::new();
    transport
        .respond(token_response())
        .respond(created_entry_response("0050569a-1b2c-1edf-a1b2-c3d4e5f60718"))
        .respond(document_entry_response("0050569a-1b2c-1edf-a1b2-c3d4e5f60718", "4711"));
    let service = booking_service(&transport);

    let document = service.book("LP01", "1000123", "2025-06-23T14:00:00Z").await.unwrap();
    assert_eq!(document.to_string(), "4711");

    let resolution = &transport.requests()[2];
    assert!(resolution.path.ends_with("(guid'0050569a-1b2c-1edf-a1b2-c3d4e5f60718')"));
    assert!(resolution.query.is_empty());
}

#[tokio::test]
async fn atom_resolution_without_docno_keeps_the_key() {
    let transport = ScriptedTransport::new();
    transport
        .respond(token_response())
        .respond(created_response("GUID1"))
        .respond(created_entry_response("GUID1"));
    let service = booking_service(&transport);

    let err = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap_err();
    assert!(matches!(err, DockBookingError::ResolutionFailed { ref appointment_key, .. } if appointment_key == "GUID1"));
}

#[tokio::test]
async fn invalid_booking_input_makes_no_network_call() {
    let transport = ScriptedTransport::new();
    let service = booking_service(&transport);

    for (loadpoint, carrier, start) in [
        ("", "1000123", "2025-06-23T09:00:00Z"),
        ("LP01", " ", "2025-06-23T09:00:00Z"),
        ("LP01", "1000123", "2025-06-23T09:30:00Z"),
        ("LP01", "1000123", "2025-06-23T09:00:00+02:00"),
        ("LP01", "1000123", "tomorrow at nine"),
    ] {
        let err = service.book(loadpoint, carrier, start).await.unwrap_err();
        assert!(err.kind().is_caller_fault(), "{:?} was not rejected as input", (loadpoint, carrier, start));
    }
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn creation_failure_skips_resolution() {
    let transport = ScriptedTransport::new();
    transport
        .respond(token_response())
        .respond(text_response(500, "<error><message>boom</message></error>"));
    let service = booking_service(&transport);

    let err = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap_err();
    match err {
        DockBookingError::CreationFailed(cause) => {
            assert!(matches!(*cause, DockBookingError::Upstream { status: 500, .. }))
        }
        other => panic!("expected CreationFailed, got {:?}", other),
    }
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn creation_response_without_key_is_malformed() {
    let transport = ScriptedTransport::new();
    transport
        .respond(token_response())
        .respond(json_response(201, json!({"d": {"Loadpoint": "LP01"}})));
    let service = booking_service(&transport);

    let err = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap_err();
    assert!(matches!(err, DockBookingError::MalformedResponse(_)));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn resolution_failure_keeps_the_appointment_key() {
    let transport = ScriptedTransport::new();
    transport
        .respond(token_response())
        .respond(created_response("GUID1"))
        .respond(text_response(404, "not found"));
    let service = booking_service(&transport);

    let err = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap_err();
    match &err {
        DockBookingError::ResolutionFailed { appointment_key, .. } => assert_eq!(appointment_key, "GUID1"),
        other => panic!("expected ResolutionFailed, got {:?}", other),
    }
    assert!(err.to_string().contains("GUID1"));
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn identical_bookings_create_two_appointments() {
    let transport = ScriptedTransport::new();
    for (key, docno) in [("GUID1", "DOC-001"), ("GUID2", "DOC-002")] {
        transport
            .respond(token_response())
            .respond(created_response(key))
            .respond(document_response(docno));
    }
    let service = booking_service(&transport);

    let first = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap();
    let second = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap();
    assert_eq!(first.as_str(), "DOC-001");
    assert_eq!(second.as_str(), "DOC-002");

    let posts = transport.requests().iter().filter(|r| r.method == HttpMethod::Post).count();
    assert_eq!(posts, 2);
}

#[tokio::test]
async fn token_fetch_retries_server_faults_within_budget() {
    let transport = ScriptedTransport::new();
    transport
        .respond(text_response(503, "busy"))
        .push(Err(DockBookingError::Transport("timed out".to_string())))
        .respond(token_response())
        .respond(created_response("GUID1"))
        .respond(document_response("DOC-001"));
    let service = booking_service(&transport);

    let document = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap();
    assert_eq!(document.as_str(), "DOC-001");
    assert_eq!(transport.request_count(), 5);
}

#[tokio::test]
async fn token_fetch_gives_up_after_budget() {
    let transport = ScriptedTransport::new();
    for _ in 0..3 {
        transport.respond(text_response(502, "bad gateway"));
    }
    let service = booking_service(&transport);

    let err = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap_err();
    match err {
        DockBookingError::SessionUnavailable(cause) => {
            assert!(matches!(*cause, DockBookingError::Upstream { status: 502, .. }))
        }
        other => panic!("expected SessionUnavailable, got {:?}", other),
    }
    // three token attempts, no creation
    assert_eq!(transport.request_count(), 3);
    assert!(transport.requests().iter().all(|r| r.method == HttpMethod::Get));
}

#[tokio::test]
async fn missing_token_is_not_retried() {
    let transport = ScriptedTransport::new();
    let mut no_token = token_response();
    no_token.headers.remove("x-csrf-token");
    transport.respond(no_token);
    let service = booking_service(&transport);

    let err = service.book("LP01", "1000123", "2025-06-23T09:00:00Z").await.unwrap_err();
    match err {
        DockBookingError::SessionUnavailable(cause) => assert!(matches!(*cause, DockBookingError::NoToken)),
        other => panic!("expected SessionUnavailable, got {:?}", other),
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn missing_session_cookie_names_the_key() {
    let transport = ScriptedTransport::new();
    let mut partial = token_response();
    partial.headers.insert("set-cookie".to_string(), "SAP_SESSIONID_S4H_100=ABC123; path=/".to_string());
    transport.respond(partial);
    let settings = create_mock_settings();
    let negotiator = SessionNegotiator::new(&settings, client(&transport));

    let err = negotiator.acquire_session("23062025").await.unwrap_err();
    assert!(matches!(err, DockBookingError::MissingSessionCookie(ref key) if key == "sap-usercontext"));
}

#[tokio::test]
async fn negotiated_session_carries_token_and_cookie() {
    let transport = ScriptedTransport::new();
    transport.respond(token_response());
    let settings = create_mock_settings();
    let negotiator = SessionNegotiator::new(&settings, client(&transport));

    let credential = negotiator.acquire_session("23062025").await.unwrap();
    assert_eq!(credential.csrf_token(), "TOKEN-XYZ");
    assert_eq!(credential.session_cookie(), "SAP_SESSIONID_S4H_100=ABC123; sap-usercontext=sap-client=100");
}
