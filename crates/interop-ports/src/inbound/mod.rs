//! Inbound ports: traits implemented by the root, depended on by callers
//! that live inside the same process (the self-dispatch short-circuit).

mod root_api;

pub use root_api::RootApi;
