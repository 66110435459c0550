//! Built-in tools for the trip dispatcher

mod answer_question;
mod generate_itinerary;
mod plan_trip;
mod trips;
mod update_trip;

pub use answer_question::AnswerQuestionTool;
pub use generate_itinerary::GenerateItineraryTool;
pub use plan_trip::PlanTripTool;
pub(crate) use plan_trip::request_from_input;
pub use trips::{GetTripDetailsTool, GetUserTripsTool};
pub use update_trip::UpdateTripTool;
pub(crate) use update_trip::patch_from_input;
