//! External verification: registry lookup plus simulated or HTTP probes.

pub mod fallback;

#[cfg(feature = "http")]
pub mod http;

pub use fallback::{
    ExternalVerifier, ProbeError, ProbeVerdict, RegistryProbe, RegistryVerifier, SimulatedProbe,
};

#[cfg(feature = "http")]
pub use http::HttpProbe;
