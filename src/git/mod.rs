//! Git commit creation.

pub mod commit;

pub use commit::{CommitOutcome, commit, commit_in};
