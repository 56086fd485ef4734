//! Evidence fusion
//!
//! Orders the surviving evidence of one resolution call.

pub mod consensus_ranker;

pub use consensus_ranker::ConsensusRanker;
