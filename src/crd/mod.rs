//! Custom Resource Definitions for the Graph Deployment Operator
//!
//! This module contains all CRD types:
//! - GraphDeployment: workload image plus its persistent storage entries

pub mod graph_deployment;

pub use graph_deployment::*;
