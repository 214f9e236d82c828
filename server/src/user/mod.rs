pub(crate) mod session;
pub(crate) mod session_ref;

pub use session::*;
pub use session_ref::*;
