//! Chain order optimization.
//!
//! The order of a plain chain decides which labels can condition on which,
//! so it affects accuracy. [`OrderSearch`] hill-climbs over orders: every
//! step swaps two positions ([`SwapProposal`]), retrains the chain and keeps
//! the swap only if the payoff strictly improves.
//!
//! The search state (order, chain, payoff, trace) is threaded through the
//! loop as a fold accumulator; nothing outside the call is mutated besides
//! the RNG.

mod order;
mod proposal;

pub use order::{search_chain_order, OrderSearch, OrderSearchOutcome, OrderSearchParams};
pub use proposal::{position_weights, SwapProposal, DEFAULT_BETA};
