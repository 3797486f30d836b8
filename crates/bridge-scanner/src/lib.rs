//! Bucket Scanner (§4.3): periodically lists the bucket's index objects,
//! runs each through the Index Loader, and grooms the catalog down to what
//! was actually observed.

mod factory;
mod pass;
mod scanner;

pub use factory::{ClientFactory, S3ClientFactory};
pub use pass::scan_pass;
pub use scanner::{Scanner, DEFAULT_SUCCESS_INTERVAL};
