//! End-to-end flows through the public consensus API.

pub mod hybrid_flow;
pub mod pow_flow;
