//! Target-cluster identity and transport establishment.
//!
//! A [`ClusterDescriptor`] names one remote cluster and carries everything
//! needed to reach it. The [`ClusterConnector`] trait turns a descriptor into
//! a live channel; [`GrpcClusterConnector`] is the shipped implementation.
//! Wiring code that brings its own transport can ignore the connector
//! entirely.

mod connector;
mod descriptor;

pub use connector::*;
pub use descriptor::*;
