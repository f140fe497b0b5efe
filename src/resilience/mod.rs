//! Resilience module
//!
//! Timeout, cancellation and backoff-based retry around remote calls.

pub mod error;
pub mod invoker;
pub mod observer;
pub mod policy;

pub use error::{FailureClass, InvokeError, RequestError, RetryInfo};
pub use invoker::{Invoked, ResilientInvoker};
pub use observer::{ChannelObserver, RetryEvent, RetryObserver};
pub use policy::RetryConfig;
