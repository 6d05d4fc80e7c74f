use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize};

use super::calculator::{GoalType, PlanInput, Sex};

/// Profile submission. Clients may echo back derived numbers they computed
/// locally; those keys are ignored and everything is recomputed server-side.
/// Form clients post the numeric fields as raw input strings, so each one
/// accepts either a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    pub goal_type: GoalType,
    #[serde(default = "default_duration", deserialize_with = "numeric")]
    pub duration_months: u32,
    #[serde(default, deserialize_with = "numeric_opt")]
    pub target_kg: Option<f64>,
    #[serde(deserialize_with = "numeric")]
    pub age: u32,
    pub sex: Sex,
    #[serde(deserialize_with = "numeric")]
    pub height: f64,
    #[serde(deserialize_with = "numeric")]
    pub weight: f64,
    #[serde(deserialize_with = "numeric")]
    pub activity: f64,
}

fn default_duration() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

fn numeric<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

/// Like [`numeric`], with a blank string standing for "not provided" the
/// way an untouched form input submits it.
fn numeric_opt<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse().map(Some).map_err(de::Error::custom)
        }
    }
}

impl MaintenanceRequest {
    pub fn plan_input(&self) -> PlanInput {
        PlanInput {
            goal_type: self.goal_type,
            duration_months: self.duration_months,
            target_kg: self.target_kg,
            age: self.age,
            sex: self.sex,
            height_cm: self.height,
            weight_kg: self.weight,
            activity_factor: self.activity,
        }
    }
}

/// The derived targets, as stored and as returned to the client.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceSummary {
    pub maintenance_calories: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_calories: Option<i32>,
    pub recommended_protein: i32,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub maintenance: MaintenanceSummary,
}
