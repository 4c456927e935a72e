//! Request derivation from object change notifications.
//!
//! A watch session feeds add/update/delete notifications into an enqueue
//! handler, which admits them through a filter and an ordered predicate
//! chain, then derives a [`Request`](crate::reconcile::Request) keyed either
//! by the object itself or by its controlling owner.

mod enqueue_object;
mod enqueue_owner;
mod object;

pub use enqueue_object::*;
pub use enqueue_owner::*;
pub use object::*;
