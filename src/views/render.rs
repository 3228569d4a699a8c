use std::collections::HashMap;

use crate::live::MockMetrics;

use super::{View, ViewId};

/// Everything a view needs to draw itself.
pub struct RenderContext<'a> {
    pub view: &'a View,
    pub metrics: &'a MockMetrics,
    pub progress: f64,
    pub watermark: &'a str,
}

pub type RenderFn = Box<dyn Fn(&RenderContext<'_>) -> String + Send + Sync>;

/// Id-to-renderer dispatch, built once at startup.
#[derive(Default)]
pub struct RenderTable {
    renderers: HashMap<ViewId, RenderFn>,
}

impl RenderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: ViewId, render: RenderFn) -> Self {
        self.renderers.insert(id, render);
        self
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> Option<String> {
        self.renderers.get(&ctx.view.id).map(|render| render(ctx))
    }

    /// Plain-text panels used by the terminal host.
    pub fn text() -> Self {
        Self::new()
            .with(
                ViewId::Dashboard,
                Box::new(|ctx| {
                    let m = ctx.metrics;
                    format!(
                        "{}\n  monitored: {}  high risk: {}  avg risk: {:.0}%  alerts/h: {}",
                        header(ctx),
                        m.monitored_patients,
                        m.high_risk_count,
                        m.average_risk * 100.0,
                        m.alerts_last_hour
                    )
                }),
            )
            .with(
                ViewId::Patients,
                Box::new(|ctx| {
                    let mut out = header(ctx);
                    for patient in ctx.metrics.patients.iter().take(5) {
                        out.push_str(&format!(
                            "\n  {:<8} {:>5.1}%  {}",
                            patient.id,
                            patient.risk_score * 100.0,
                            patient.tier().as_str()
                        ));
                    }
                    out
                }),
            )
            .with(
                ViewId::Shap,
                Box::new(|ctx| {
                    let mut out = header(ctx);
                    if let Some(top) = ctx.metrics.highest_risk() {
                        out.push_str(&format!("\n  explaining {}", top.id));
                        for factor in &top.factors {
                            let bar = "#".repeat((factor.contribution.abs() * 40.0) as usize);
                            out.push_str(&format!(
                                "\n  {:<14} {:+.2} {}",
                                factor.name, factor.contribution, bar
                            ));
                        }
                    }
                    out
                }),
            )
            .with(
                ViewId::Workflow,
                Box::new(|ctx| {
                    format!(
                        "{}\n  detect -> alert -> assess -> intervene -> feedback\n  active interventions: {}",
                        header(ctx),
                        ctx.metrics.interventions_active
                    )
                }),
            )
    }
}

fn header(ctx: &RenderContext<'_>) -> String {
    format!(
        "== {} [{:>3.0}%] {}",
        ctx.view.label, ctx.progress, ctx.watermark
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::ViewRegistry;

    #[test]
    fn every_standard_view_has_a_text_renderer() {
        let table = RenderTable::text();
        let metrics = MockMetrics::seeded(7);
        for view in ViewRegistry::standard().iter() {
            let ctx = RenderContext {
                view,
                metrics: &metrics,
                progress: 0.0,
                watermark: "",
            };
            let text = table.render(&ctx).expect("renderer registered");
            assert!(text.contains(view.label));
        }
    }

    #[test]
    fn missing_renderer_yields_none() {
        let table = RenderTable::new();
        let registry = ViewRegistry::standard();
        let metrics = MockMetrics::seeded(1);
        let ctx = RenderContext {
            view: registry.get(0).unwrap(),
            metrics: &metrics,
            progress: 0.0,
            watermark: "",
        };
        assert!(table.render(&ctx).is_none());
    }
}
