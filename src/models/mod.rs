pub mod recommendation;

pub use recommendation::{
    DataValidationError, Recommendation, RecommendationFilter, RecommendationType,
    UnknownRecommendationType,
};
