//! Meal-analysis contract shared by the Gemini gateway and the meal log
//! store. The model is told to emit exactly this JSON shape; its replies are
//! normalized field by field so a stored analysis always has the full shape.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use super::AiError;

/// A single logged food item as the user entered it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealItem {
    #[serde(default)]
    pub food: String,
    #[serde(default)]
    pub quantity: String,
}

/// Meal slots (breakfast, lunch, ...) to logged items. A `BTreeMap` keeps
/// the serialized prompt stable across runs.
pub type RawMeals = BTreeMap<String, Vec<MealItem>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiAnalysis {
    #[serde(deserialize_with = "lenient")]
    pub per_item_breakdown: Vec<ItemBreakdown>,
    #[serde(deserialize_with = "lenient")]
    pub totals: NutrientTotals,
    #[serde(deserialize_with = "lenient")]
    pub suggestions: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub motivation: String,
    #[serde(deserialize_with = "lenient")]
    pub workout_plan: WorkoutPlan,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemBreakdown {
    #[serde(deserialize_with = "lenient")]
    pub food: String,
    #[serde(deserialize_with = "lenient")]
    pub quantity: String,
    #[serde(deserialize_with = "lenient")]
    pub estimated_calories: f64,
    #[serde(deserialize_with = "lenient")]
    pub protein: f64,
    #[serde(deserialize_with = "lenient")]
    pub carbs: f64,
    #[serde(deserialize_with = "lenient")]
    pub fats: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientTotals {
    #[serde(deserialize_with = "lenient")]
    pub calories: f64,
    #[serde(deserialize_with = "lenient")]
    pub protein: f64,
    #[serde(deserialize_with = "lenient")]
    pub carbs: f64,
    #[serde(deserialize_with = "lenient")]
    pub fats: f64,
}

/// Six training days; the model is asked for no sunday entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutPlan {
    #[serde(deserialize_with = "lenient")]
    pub monday: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub tuesday: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub wednesday: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub thursday: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub friday: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub saturday: Vec<String>,
}

/// Keep whatever JSON is present; a value of the wrong shape becomes the
/// field's default instead of failing the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl AiAnalysis {
    /// Parse a model reply. Text that is not JSON at all is an error; any
    /// valid JSON normalizes into a fully-shaped record.
    pub fn from_reply(text: &str) -> Result<Self, AiError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(AiError::MalformedReply)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_complete_reply() {
        let reply = json!({
            "perItemBreakdown": [{
                "food": "oats",
                "quantity": "60g",
                "estimatedCalories": 230,
                "protein": 8,
                "carbs": 40,
                "fats": 4.5
            }],
            "totals": { "calories": 230, "protein": 8, "carbs": 40, "fats": 4.5 },
            "suggestions": ["add a protein source at breakfast"],
            "motivation": "solid start, keep logging",
            "workoutPlan": {
                "monday": ["30m brisk walk"],
                "tuesday": [],
                "wednesday": ["full body strength"],
                "thursday": [],
                "friday": ["30m brisk walk"],
                "saturday": []
            }
        });

        let analysis = AiAnalysis::from_reply(&reply.to_string()).expect("valid reply");
        assert_eq!(analysis.per_item_breakdown.len(), 1);
        assert_eq!(analysis.per_item_breakdown[0].food, "oats");
        assert_eq!(analysis.per_item_breakdown[0].estimated_calories, 230.0);
        assert_eq!(analysis.totals.fats, 4.5);
        assert_eq!(analysis.suggestions.len(), 1);
        assert_eq!(analysis.motivation, "solid start, keep logging");
        assert_eq!(analysis.workout_plan.wednesday, vec!["full body strength"]);
    }

    #[test]
    fn missing_fields_become_defaults() {
        let analysis =
            AiAnalysis::from_reply(r#"{"totals":{"calories":1800}}"#).expect("valid reply");
        assert_eq!(analysis.totals.calories, 1800.0);
        assert_eq!(analysis.totals.protein, 0.0);
        assert!(analysis.per_item_breakdown.is_empty());
        assert!(analysis.suggestions.is_empty());
        assert_eq!(analysis.motivation, "");
        assert!(analysis.workout_plan.monday.is_empty());
    }

    #[test]
    fn mis_shaped_fields_collapse_to_defaults() {
        let reply = json!({
            "perItemBreakdown": { "not": "a list" },
            "totals": "high",
            "suggestions": 42,
            "motivation": ["not", "a", "string"],
            "workoutPlan": []
        });

        let analysis = AiAnalysis::from_reply(&reply.to_string()).expect("valid reply");
        assert_eq!(analysis, AiAnalysis::default());
    }

    #[test]
    fn nested_items_normalize_field_by_field() {
        let reply = json!({
            "perItemBreakdown": [{ "food": "eggs", "estimatedCalories": "two hundred" }],
            "totals": { "calories": "1800", "protein": 95 }
        });

        let analysis = AiAnalysis::from_reply(&reply.to_string()).expect("valid reply");
        assert_eq!(analysis.per_item_breakdown[0].food, "eggs");
        assert_eq!(analysis.per_item_breakdown[0].estimated_calories, 0.0);
        assert_eq!(analysis.totals.calories, 0.0);
        assert_eq!(analysis.totals.protein, 95.0);
    }

    #[test]
    fn non_object_json_normalizes_to_an_empty_record() {
        let analysis = AiAnalysis::from_reply("[1, 2, 3]").expect("valid json");
        assert_eq!(analysis, AiAnalysis::default());
    }

    #[test]
    fn prose_reply_is_an_error() {
        let err = AiAnalysis::from_reply("Sure! Here is your analysis:").unwrap_err();
        assert!(matches!(err, AiError::MalformedReply(_)));
    }

    #[test]
    fn serializes_with_camel_case_wire_names() {
        let analysis = AiAnalysis {
            per_item_breakdown: vec![ItemBreakdown {
                food: "rice".into(),
                estimated_calories: 300.0,
                ..ItemBreakdown::default()
            }],
            ..AiAnalysis::default()
        };
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains("\"perItemBreakdown\""));
        assert!(json.contains("\"estimatedCalories\""));
        assert!(json.contains("\"workoutPlan\""));
    }

    #[test]
    fn meal_items_tolerate_missing_fields() {
        let meals: RawMeals =
            serde_json::from_str(r#"{"breakfast":[{"food":"eggs"}]}"#).expect("valid meals");
        assert_eq!(meals["breakfast"][0].food, "eggs");
        assert_eq!(meals["breakfast"][0].quantity, "");
    }
}
