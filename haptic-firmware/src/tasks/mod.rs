//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod control;
pub mod encoder;
pub mod feedback;
pub mod serial_rx;

pub use control::{control_task, BoardLoop};
pub use encoder::encoder_task;
pub use feedback::{feedback_task, FeedbackConfig};
pub use serial_rx::serial_rx_task;
