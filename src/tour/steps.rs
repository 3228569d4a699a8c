use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TooltipPosition {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourStep {
    pub title: String,
    pub description: String,
    pub target_selector: String,
    pub position: TooltipPosition,
    pub spotlight: bool,
}

impl TourStep {
    pub fn new(
        title: &str,
        description: &str,
        target_selector: &str,
        position: TooltipPosition,
        spotlight: bool,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            target_selector: target_selector.to_string(),
            position,
            spotlight,
        }
    }
}

/// Onboarding walkthrough shown on first visit.
pub fn default_tour() -> Vec<TourStep> {
    vec![
        TourStep::new(
            "Welcome to VitaSignal",
            "A quick walk through the risk dashboard. Use the arrow keys or Enter to move on, Escape to leave.",
            "[data-tour='header']",
            TooltipPosition::Bottom,
            false,
        ),
        TourStep::new(
            "View tabs",
            "Switch between the dashboard, patient cards, risk factors and the clinical workflow. Keys 1 to 4 jump straight there.",
            "[data-tour='view-tabs']",
            TooltipPosition::Bottom,
            true,
        ),
        TourStep::new(
            "Patient risk cards",
            "Each card ranks a patient by predicted deterioration risk, with the trend over the last hours.",
            "[data-tour='risk-cards']",
            TooltipPosition::Right,
            true,
        ),
        TourStep::new(
            "Why this score?",
            "The factor chart breaks a prediction down into the vital signs that drove it.",
            "[data-tour='shap-chart']",
            TooltipPosition::Left,
            true,
        ),
        TourStep::new(
            "Auto demo",
            "Press D to let the dashboard present itself, or L to switch the live feed on.",
            "[data-tour='demo-controls']",
            TooltipPosition::Top,
            true,
        ),
    ]
}
