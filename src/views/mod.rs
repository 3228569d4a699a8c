//! The ordered set of dashboard screens and their render dispatch table.

pub mod render;

pub use render::{RenderContext, RenderFn, RenderTable};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ViewId {
    Dashboard,
    Patients,
    Shap,
    Workflow,
}

impl ViewId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewId::Dashboard => "dashboard",
            ViewId::Patients => "patients",
            ViewId::Shap => "shap",
            ViewId::Workflow => "workflow",
        }
    }

    /// Route recorded in the session log for page views.
    pub fn route(&self) -> String {
        format!("/{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: ViewId,
    pub label: &'static str,
    /// Script read aloud when the view comes up during the auto-demo.
    pub narration: &'static str,
}

/// Immutable, ordered list of views. Index order is the demo order.
#[derive(Debug, Clone)]
pub struct ViewRegistry {
    views: Vec<View>,
}

impl ViewRegistry {
    pub fn new(views: Vec<View>) -> Self {
        Self { views }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            View {
                id: ViewId::Dashboard,
                label: "Risk Dashboard",
                narration: "This is the VitaSignal risk dashboard. Every card is a patient \
                            ranked by predicted deterioration risk.",
            },
            View {
                id: ViewId::Patients,
                label: "Patient Cards",
                narration: "Patient cards show the current risk score, the trend over the last \
                            twelve hours, and the recommended intervention window.",
            },
            View {
                id: ViewId::Shap,
                label: "Risk Factors",
                narration: "The factor chart explains each prediction, showing which vital \
                            signs pushed the risk up or down.",
            },
            View {
                id: ViewId::Workflow,
                label: "Clinical Workflow",
                narration: "The workflow view follows an alert from detection to bedside \
                            response and back into the feedback loop.",
            },
        ])
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&View> {
        self.views.get(index)
    }

    pub fn position(&self, id: ViewId) -> Option<usize> {
        self.views.iter().position(|view| view.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order_matches_demo_order() {
        let registry = ViewRegistry::standard();
        let ids: Vec<ViewId> = registry.iter().map(|view| view.id).collect();
        assert_eq!(
            ids,
            vec![ViewId::Dashboard, ViewId::Patients, ViewId::Shap, ViewId::Workflow]
        );
        assert_eq!(registry.position(ViewId::Shap), Some(2));
        assert!(registry.get(4).is_none());
    }

    #[test]
    fn routes_use_lowercase_ids() {
        assert_eq!(ViewId::Workflow.route(), "/workflow");
        assert_eq!(serde_json::to_string(&ViewId::Shap).unwrap(), "\"shap\"");
    }
}
