// Domain layer - Core business logic

pub mod errors;
pub mod filter_graph;
pub mod layout;
pub mod match_result;
pub mod model;
pub mod report;
pub mod rules;
pub mod score;
