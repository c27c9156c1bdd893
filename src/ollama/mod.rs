mod core;
mod relay;

pub use core::completion_stream;
pub use relay::{relay, run_relay};
