//! Maintenance-calorie and protein-target math.
//!
//! Pure functions over the user's measurements. Persistence and HTTP live in
//! the sibling modules; nothing here touches the database.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One kilogram of body mass is roughly 7700 kcal of stored energy.
const KCAL_PER_KG: f64 = 7700.0;
const WEEKS_PER_MONTH: f64 = 4.0;
const DAYS_PER_WEEK: f64 = 7.0;

const PROTEIN_PER_KG_MAINTAIN: f64 = 1.2;
const PROTEIN_PER_KG_LOSE: f64 = 1.8;
const PROTEIN_PER_KG_GAIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Maintain,
    Lose,
    Gain,
}

impl GoalType {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Maintain => "maintain",
            GoalType::Lose => "lose",
            GoalType::Gain => "gain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Everything the plan depends on. `target_kg` is only consulted for
/// `lose`/`gain` goals and is read as a magnitude, so clients may send the
/// loss as a negative number.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput {
    pub goal_type: GoalType,
    pub duration_months: u32,
    pub target_kg: Option<f64>,
    pub age: u32,
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_factor: f64,
}

/// Computed daily targets. `goal_calories` is `None` for `maintain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub maintenance_calories: i32,
    pub goal_calories: Option<i32>,
    pub recommended_protein_g: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Age, height, weight and activity factor must be positive")]
    InvalidMeasurements,
    #[error("Target weight change is required for this goal")]
    MissingTarget,
    #[error("Target weight change must be a non-zero number")]
    InvalidTarget,
    #[error("Duration must be at least one month")]
    InvalidDuration,
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Derives the daily calorie and protein targets.
///
/// Basal metabolic rate follows Mifflin-St Jeor:
/// `10*weight + 6.25*height - 5*age + (5 male / -161 female)`.
/// Maintenance is BMR scaled by the activity factor. For `lose`/`gain`
/// goals the energy to move `target_kg` of body mass is spread evenly over
/// the duration (counted as months of four seven-day weeks) and applied as
/// a daily deficit or surplus against the rounded maintenance figure.
pub fn compute(input: PlanInput) -> Result<Plan, PlanError> {
    if input.age == 0
        || !positive(input.height_cm)
        || !positive(input.weight_kg)
        || !positive(input.activity_factor)
    {
        return Err(PlanError::InvalidMeasurements);
    }

    let sex_term = match input.sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
    };
    let bmr =
        10.0 * input.weight_kg + 6.25 * input.height_cm - 5.0 * f64::from(input.age) + sex_term;
    let maintenance = (bmr * input.activity_factor).round();

    let (goal_calories, protein_per_kg) = match input.goal_type {
        GoalType::Maintain => (None, PROTEIN_PER_KG_MAINTAIN),
        GoalType::Lose | GoalType::Gain => {
            let target = input.target_kg.ok_or(PlanError::MissingTarget)?.abs();
            if !positive(target) {
                return Err(PlanError::InvalidTarget);
            }
            if input.duration_months == 0 {
                return Err(PlanError::InvalidDuration);
            }
            let days = f64::from(input.duration_months) * WEEKS_PER_MONTH * DAYS_PER_WEEK;
            let daily_adjustment = KCAL_PER_KG * target / days;
            if input.goal_type == GoalType::Lose {
                (
                    Some((maintenance - daily_adjustment).round() as i32),
                    PROTEIN_PER_KG_LOSE,
                )
            } else {
                (
                    Some((maintenance + daily_adjustment).round() as i32),
                    PROTEIN_PER_KG_GAIN,
                )
            }
        }
    };

    Ok(Plan {
        maintenance_calories: maintenance as i32,
        goal_calories,
        recommended_protein_g: (input.weight_kg * protein_per_kg).round() as i32,
    })
}
