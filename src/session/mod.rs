pub mod controller;
pub mod poller;
pub mod refresh;
pub mod timers;

pub use controller::SelectionController;
