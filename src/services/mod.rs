pub mod recommendations;

pub use recommendations::{await_self_test, CallSettings, RecommendationService};
