pub mod client;

pub use client::{run_call, CallArgs};
