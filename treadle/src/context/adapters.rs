//! Adapter ports for external collaborators.

use std::any::Any;
use std::fmt::Debug;

/// An external collaborator reachable from stages by port name.
///
/// The engine stores adapters opaquely and never inspects them; stages look
/// one up via [`RunContext::adapter`](super::RunContext::adapter) or the
/// typed [`RunContext::adapter_as`](super::RunContext::adapter_as) helper
/// and interact with the concrete type directly.
pub trait Adapter: Send + Sync + Debug {
    /// Returns the adapter as `Any` for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeClient {
        endpoint: String,
    }

    impl Adapter for FakeClient {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_adapter_downcast() {
        let client = FakeClient {
            endpoint: "localhost:9090".to_string(),
        };
        let adapter: &dyn Adapter = &client;

        let concrete = adapter.as_any().downcast_ref::<FakeClient>();
        assert_eq!(concrete.map(|c| c.endpoint.as_str()), Some("localhost:9090"));
    }
}
