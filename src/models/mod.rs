pub mod recommendation;

pub use recommendation::{
    parse_recommendations, Action, RecommendationRequest, ServiceStatus, SELF_TEST_USER_ID,
    SELF_TEST_VIDEO_ID,
};
