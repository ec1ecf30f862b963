pub mod backend;
pub mod session;
pub mod slots;
pub mod carriers;
pub mod booking;

pub use backend::{BackendClient, BackendTransport, HttpTransport};
pub use session::SessionNegotiator;
pub use slots::SlotLookupService;
pub use carriers::CarrierDirectory;
pub use booking::AppointmentBookingService;
