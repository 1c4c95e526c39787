//! buildver - build-session version propagation for multi-module projects
//!
//! buildver computes a single version string from repository history at the
//! start of a build and propagates it into every module descriptor read during
//! that build, keeping main and rewritten descriptor copies mutually
//! consistent for the whole build invocation.
//!
//! The crate is organised around one [`session::BuildSession`] per build root:
//! the host build driver opens the session through
//! [`extension::BuildExtension`], descriptors flow through
//! [`descriptor::DescriptorInterceptor`] on every read, and
//! [`descriptor::ReactorRewriter`] eagerly rewrites the discovered module tree
//! to auxiliary files so tooling outside the interceptor path still observes
//! resolved versions.

pub mod calculator;
pub mod config;
pub mod core;
pub mod descriptor;
pub mod extension;
pub mod session;
