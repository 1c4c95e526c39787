//! Descriptor Component
//!
//! Everything that touches module descriptors: the TOML data model, file IO
//! with the auxiliary-sibling convention, scope resolution against the
//! session root, the per-read [`DescriptorInterceptor`], the once-per-build
//! [`ReactorRewriter`] and the root publication strategies.

pub mod error;
pub mod interceptor;
pub mod io;
pub mod model;
pub mod publication;
pub mod rewriter;
pub mod scope;

pub use error::{DescriptorError, DescriptorResult};
pub use interceptor::{DescriptorInterceptor, DescriptorSource};
pub use io::{
    aux_descriptor_path, read_descriptor, write_descriptor, AUX_DESCRIPTOR_FILE_NAME,
    DESCRIPTOR_FILE_NAME,
};
pub use model::{Descriptor, Parent, Plugin, Scm};
pub use rewriter::ReactorRewriter;
