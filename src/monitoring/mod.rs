pub mod keep_alive;

pub use keep_alive::KeepAliveWorker;
