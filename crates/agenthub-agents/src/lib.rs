//! AgentHub Agents - Reference collaborators for the marketplace
//!
//! - `SimAgent`: a wallet, a skill set priced by reputation, canned work
//! - `RuleValidator`: keyword and length scoring with seeded variance

pub mod sim;
pub mod validator;

pub use sim::*;
pub use validator::*;
