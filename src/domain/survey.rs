use serde::Serialize;

/// The charted subset of a survey submission. All fields are optional;
/// an absent answer simply never triggers its rule.
#[derive(Debug, Clone, Default)]
pub struct SurveyAnswers {
    pub period_regularity: Option<String>,
    pub hair_growth: Option<String>,
    pub acne: Option<String>,
    pub hair_thinning: Option<String>,
    pub weight_gain: Option<String>,
    pub sugar_craving: Option<String>,
    pub family_history: Option<String>,
    pub fertility: Option<String>,
    pub mood_swings: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RiskScore {
    pub category: &'static str,
    pub score: i32,
}

pub const RISK_RULES_VERSION: &str = "2024.1";

struct RiskRule {
    category: &'static str,
    weight: i32,
    trigger: &'static str,
    field: fn(&SurveyAnswers) -> Option<&str>,
}

/// One trigger value and one weight per category. No blending across
/// categories, no normalization, no temporal decay.
static RISK_RULES: [RiskRule; 9] = [
    RiskRule {
        category: "Irregular Periods",
        weight: 70,
        trigger: "No",
        field: |a| a.period_regularity.as_deref(),
    },
    RiskRule {
        category: "Excessive Hair",
        weight: 60,
        trigger: "Yes",
        field: |a| a.hair_growth.as_deref(),
    },
    RiskRule {
        category: "Acne",
        weight: 55,
        trigger: "Yes",
        field: |a| a.acne.as_deref(),
    },
    RiskRule {
        category: "Hair Thinning",
        weight: 45,
        trigger: "Yes",
        field: |a| a.hair_thinning.as_deref(),
    },
    RiskRule {
        category: "Weight Gain",
        weight: 50,
        trigger: "Yes",
        field: |a| a.weight_gain.as_deref(),
    },
    RiskRule {
        category: "Sugar Cravings",
        weight: 65,
        trigger: "Yes",
        field: |a| a.sugar_craving.as_deref(),
    },
    RiskRule {
        category: "Family History",
        weight: 40,
        trigger: "Yes",
        field: |a| a.family_history.as_deref(),
    },
    RiskRule {
        category: "Fertility Issues",
        weight: 35,
        trigger: "Yes",
        field: |a| a.fertility.as_deref(),
    },
    RiskRule {
        category: "Mood Swings",
        weight: 75,
        trigger: "Yes",
        field: |a| a.mood_swings.as_deref(),
    },
];

/// Severity scores for the latest survey, in fixed chart order.
pub fn risk_profile(answers: &SurveyAnswers) -> Vec<RiskScore> {
    RISK_RULES
        .iter()
        .map(|rule| {
            let hit = (rule.field)(answers)
                .map(|answer| answer.trim() == rule.trigger)
                .unwrap_or(false);
            RiskScore {
                category: rule.category,
                score: if hit { rule.weight } else { 0 },
            }
        })
        .collect()
}
