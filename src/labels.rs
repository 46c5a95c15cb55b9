//! Diabetic-retinopathy severity classes produced by the classifier.

use serde::Serialize;

/// Number of outputs the classifier is expected to produce.
pub const CLASS_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    NoDr,
    Mild,
    Moderate,
    Severe,
    Proliferative,
}

impl Severity {
    /// All classes in model output order.
    pub const ALL: [Severity; CLASS_COUNT] = [
        Severity::NoDr,
        Severity::Mild,
        Severity::Moderate,
        Severity::Severe,
        Severity::Proliferative,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn description(self) -> &'static str {
        match self {
            Severity::NoDr => "No DR (No diabetic retinopathy detected)",
            Severity::Mild => {
                "Mild DR (Early signs of diabetic retinopathy, minimal damage to the retina)"
            }
            Severity::Moderate => {
                "Moderate DR (More severe damage, but vision loss is not imminent)"
            }
            Severity::Severe => {
                "Severe DR (Advanced stage with significant damage to the retina and risk of vision loss)"
            }
            Severity::Proliferative => {
                "Proliferative DR (Most severe stage with abnormal blood vessels growing in the retina, leading to potential vision loss)"
            }
        }
    }
}
