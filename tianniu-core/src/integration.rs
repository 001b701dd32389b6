//! This module provides the integration abstraction.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::error::IntegrationError;
use crate::{Host, Transport};

/// Integration abstraction.
///
/// An integration is an independently initialized observer of the page.  It
/// attaches whatever listeners it needs during [`init`](Integration::init)
/// and reports through the shared transport from then on.  The transport
/// never refers back to any integration.
// NOTE: we need `Any` here so that the `TypeId` machinery works correctly.
pub trait Integration: Sync + Send + Any + AsAny {
    /// Name of this integration, used in debug output.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Called once when the monitor initializes.
    ///
    /// A returned error is logged; it neither reaches the host application
    /// nor stops the remaining integrations from initializing.
    fn init(&self, transport: &Arc<dyn Transport>, host: &Arc<dyn Host>)
        -> Result<(), IntegrationError>;
}

// This is needed as a workaround to be able to safely downcast integrations
#[doc(hidden)]
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
