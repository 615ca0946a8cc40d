/// Transport and signing kernel
///
/// The kernel holds the mechanical layers every chat operation is built
/// from, with no knowledge of session semantics:
///
/// - `RestClient` / `ReqwestRest`: POST-only JSON transport to
///   `{base_url}/api/v1/{endpoint}`
/// - `RequestSigner`: SHA-256 digest over the operation's ordered fields
/// - `next_salt`: per-request nonce generation
///
/// All components are trait-based or pure so tests can inject a mock
/// transport and verify exact signed payloads.
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{next_salt, RequestSigner};
