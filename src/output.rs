//! Output formatters (human and JSONL)

pub mod decorator_list;
pub mod human;
pub mod jsonl;

pub use decorator_list::{DecoratorListHumanFormatter, DecoratorListJsonlFormatter, DecoratorSummary};
pub use human::HumanFormatter;
pub use jsonl::JsonlFormatter;
