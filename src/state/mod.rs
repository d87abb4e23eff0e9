//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `FetchState`: the lifecycle of a single URL fetch under the retry policy
//!   (idle, fetching, retrying, succeeded, failed)

mod fetch_state;

pub use fetch_state::FetchState;
