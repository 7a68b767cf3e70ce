//! Route gating: the access state machine and the middleware enforcing it.

pub mod gate;
mod policy;
mod state;

pub use gate::{access_gate, evaluate, is_admin_route, is_gated, Verdict};
pub use policy::AdminPolicy;
pub use state::{derive_access_state, AccessState};
