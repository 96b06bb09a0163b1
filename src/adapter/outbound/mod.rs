//! Outbound adapters: process execution and the platform control plane.

pub mod ibmcloud;
pub mod process;
pub mod retrying;
