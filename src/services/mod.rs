pub mod freezer;
pub mod session;
pub mod window_manager;

pub use freezer::Freezer;
pub use window_manager::create_window_manager;
