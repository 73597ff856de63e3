//! Kubernetes access for kubedeck
//!
//! Turns kubeconfig contexts into numbered clusters, talks to the API server
//! through kube-rs and describes every supported resource kind as a console.

pub mod catalog;
pub mod client;
pub mod convert;

pub use catalog::open_console;
pub use client::{KubeClient, api_error};
