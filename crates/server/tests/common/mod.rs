//! Common test utilities and fixtures.

pub mod multipart;
pub mod server;
pub mod verifier;

#[allow(unused_imports)]
pub use multipart::*;
#[allow(unused_imports)]
pub use server::*;
#[allow(unused_imports)]
pub use verifier::*;
