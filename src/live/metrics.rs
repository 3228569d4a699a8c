//! Synthetic patient-risk feed. None of these numbers mean anything
//! clinically; they only need to move plausibly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const HIGH_RISK_THRESHOLD: f64 = 0.7;
const MODERATE_RISK_THRESHOLD: f64 = 0.4;
const MAX_RISK_STEP: f64 = 0.05;

const FACTOR_NAMES: [&str; 5] = [
    "heart_rate",
    "resp_rate",
    "lactate",
    "systolic_bp",
    "spo2",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if score >= MODERATE_RISK_THRESHOLD {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub name: String,
    /// Signed push on the risk score, in `[-0.5, 0.5]`.
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRisk {
    pub id: String,
    pub risk_score: f64,
    pub factors: Vec<RiskFactor>,
}

impl PatientRisk {
    pub fn tier(&self) -> RiskTier {
        RiskTier::from_score(self.risk_score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MockMetrics {
    pub monitored_patients: u32,
    pub high_risk_count: u32,
    pub average_risk: f64,
    pub alerts_last_hour: u32,
    pub interventions_active: u32,
    pub patients: Vec<PatientRisk>,
}

impl MockMetrics {
    pub fn generate(rng: &mut StdRng, patient_count: usize) -> Self {
        let patients = (0..patient_count)
            .map(|i| PatientRisk {
                id: format!("P-{}", 1001 + i),
                risk_score: rng.gen_range(0.05..0.95),
                factors: FACTOR_NAMES
                    .iter()
                    .map(|name| RiskFactor {
                        name: (*name).to_string(),
                        contribution: rng.gen_range(-0.3..0.3),
                    })
                    .collect(),
            })
            .collect();

        let mut metrics = Self {
            monitored_patients: rng.gen_range(220..280),
            high_risk_count: 0,
            average_risk: 0.0,
            alerts_last_hour: rng.gen_range(2..12),
            interventions_active: rng.gen_range(1..6),
            patients,
        };
        metrics.recompute_aggregates();
        metrics
    }

    pub fn seeded(seed: u64) -> Self {
        Self::generate(&mut StdRng::seed_from_u64(seed), 8)
    }

    /// Nudges every value a little, keeping all of them in range.
    pub fn perturb(&mut self, rng: &mut StdRng) {
        for patient in &mut self.patients {
            let step = rng.gen_range(-MAX_RISK_STEP..MAX_RISK_STEP);
            patient.risk_score = (patient.risk_score + step).clamp(0.0, 1.0);
            for factor in &mut patient.factors {
                let step = rng.gen_range(-0.02..0.02);
                factor.contribution = (factor.contribution + step).clamp(-0.5, 0.5);
            }
        }

        self.monitored_patients = shift(self.monitored_patients, rng.gen_range(-3..=3), 200, 300);
        self.alerts_last_hour = shift(self.alerts_last_hour, rng.gen_range(-1..=2), 0, 40);
        self.interventions_active = shift(self.interventions_active, rng.gen_range(-1..=1), 0, 20);
        self.recompute_aggregates();
    }

    pub fn highest_risk(&self) -> Option<&PatientRisk> {
        self.patients
            .iter()
            .max_by(|a, b| a.risk_score.total_cmp(&b.risk_score))
    }

    fn recompute_aggregates(&mut self) {
        self.high_risk_count = self
            .patients
            .iter()
            .filter(|p| p.tier() == RiskTier::High)
            .count() as u32;
        self.average_risk = if self.patients.is_empty() {
            0.0
        } else {
            self.patients.iter().map(|p| p.risk_score).sum::<f64>() / self.patients.len() as f64
        };
    }
}

fn shift(value: u32, delta: i64, min: u32, max: u32) -> u32 {
    (value as i64 + delta).clamp(min as i64, max as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(RiskTier::from_score(0.1), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.4), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(0.7), RiskTier::High);
    }

    #[test]
    fn seeded_metrics_are_reproducible() {
        assert_eq!(MockMetrics::seeded(42), MockMetrics::seeded(42));
    }

    #[test]
    fn perturb_keeps_values_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut metrics = MockMetrics::generate(&mut rng, 12);
        for _ in 0..500 {
            metrics.perturb(&mut rng);
            assert!((200..=300).contains(&metrics.monitored_patients));
            assert!(metrics.alerts_last_hour <= 40);
            assert!((0.0..=1.0).contains(&metrics.average_risk));
            for patient in &metrics.patients {
                assert!((0.0..=1.0).contains(&patient.risk_score));
                assert!(patient
                    .factors
                    .iter()
                    .all(|f| (-0.5..=0.5).contains(&f.contribution)));
            }
            let expected_high = metrics
                .patients
                .iter()
                .filter(|p| p.risk_score >= HIGH_RISK_THRESHOLD)
                .count() as u32;
            assert_eq!(metrics.high_risk_count, expected_high);
        }
    }
}
