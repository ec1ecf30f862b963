use std::sync::Arc;
use tracing::info;
use crate::config::Settings;
use crate::errors::DockBookingResult;
use crate::monitoring::KeepAliveWorker;
use crate::services::{
    AppointmentBookingService, BackendClient, BackendTransport, CarrierDirectory, HttpTransport,
    SessionNegotiator, SlotLookupService,
};
use crate::tools::{ToolDispatcher, TracingHook};

pub struct AppContext {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<ToolDispatcher>,
    pub keep_alive: Option<KeepAliveWorker>,
}

/// Wires the services against the real backend
///
/// # Returns
///
/// * `Ok(AppContext)`: The dispatcher serving tool calls plus the optional keep-alive worker
/// * `Err(DockBookingError)`: If the HTTP client or the keep-alive worker could not be built
pub fn initialize(settings: Settings) -> DockBookingResult<AppContext> {
    let transport: Arc<dyn BackendTransport> = Arc::new(HttpTransport::new(&settings.backend)?);
    let dispatcher = Arc::new(build_dispatcher(&settings, transport));
    let keep_alive = KeepAliveWorker::from_settings(&settings.keep_alive)?;

    info!(
        "Booking core ready: reads via {}, writes via {}",
        settings.backend.read_base_url, settings.backend.write_base_url
    );

    Ok(AppContext {
        settings: Arc::new(settings),
        dispatcher,
        keep_alive,
    })
}

/// Builds the tool dispatcher over any transport. All services share one stateless client.
pub fn build_dispatcher(settings: &Settings, transport: Arc<dyn BackendTransport>) -> ToolDispatcher {
    let client = BackendClient::new(transport);
    let negotiator = SessionNegotiator::new(settings, client.clone());

    let dispatcher = ToolDispatcher::new(
        SlotLookupService::new(settings, client.clone()),
        CarrierDirectory::new(settings, client.clone()),
        AppointmentBookingService::new(settings, client, negotiator),
    );

    if settings.logging.trace_operations {
        dispatcher.with_hook(Arc::new(TracingHook))
    } else {
        dispatcher
    }
}
