//! Name search and incremental pagination for user lists.
//!
//! # Invariants
//! - Search never reorders users; results keep registry order.
//! - Pagination only widens until explicitly reset.

pub mod filter;
pub mod page;
