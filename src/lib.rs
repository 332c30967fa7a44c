pub mod config;
pub mod logger;
pub mod session;
pub mod supervisor;

pub use codec;

#[rustfmt::skip]
pub static CLIENT_NAME: &str = concat!(
    "Bedrock Solutions NtripClient/",
    env!("CARGO_PKG_VERSION")
);
