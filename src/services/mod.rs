pub mod calendar;
pub mod cycle_recommendations;
pub mod holiday_recommendations;
pub mod merge;
pub mod providers;
pub mod recommendations;
pub mod title_numbers;

pub use cycle_recommendations::CycleRecommendationEngine;
pub use holiday_recommendations::HolidayRecommendationEngine;
pub use recommendations::RecommendationService;
pub use title_numbers::extract_numbers;
