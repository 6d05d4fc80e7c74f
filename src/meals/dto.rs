use serde::{Deserialize, Serialize};

use crate::ai::RawMeals;

/// Body for analyze and for replacing an existing log. `meals` maps a label
/// (breakfast, lunch, anything the client likes) to the items eaten.
#[derive(Debug, Deserialize)]
pub struct AnalyzeMealsRequest {
    #[serde(default)]
    pub meals: Option<RawMeals>,
}

/// Envelope the client expects around a single log or a list of them.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}
