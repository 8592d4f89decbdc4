pub mod client;

pub use client::{Credentials, GraphClient};
