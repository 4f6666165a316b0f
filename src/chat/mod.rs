//! Conversation layer: query rewriting, edge function clients, canned
//! replies and the tiered answer composer.

pub mod composer;
pub mod edge;
pub mod intent;
pub mod replies;
pub mod rewriter;

pub use composer::GuataService;
