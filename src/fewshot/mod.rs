//! @acp:module "Fewshot"
//! @acp:summary "Few-shot example selection with fallback matching tiers"
//! @acp:domain fewshot
//! @acp:layer feature

pub mod bank;
pub mod selector;
pub mod types;

pub use bank::ExampleBank;
pub use selector::FewshotSelector;
pub use types::*;
