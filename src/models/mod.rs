pub mod dock_slot;
pub mod carrier;
pub mod session;
pub mod appointment;
pub mod odata;

pub use dock_slot::*;
pub use carrier::*;
pub use session::*;
pub use appointment::*;
pub use odata::*;
