//! Boosted-flag policy
//!
//! The boosted flag marks signals a client may want to re-enter after a
//! loss. Its value is decided by an explicit policy so that tests and
//! replays can pin it down.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Probability used by the default Bernoulli policy
pub const DEFAULT_BOOST_PROBABILITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BoostPolicy {
    Never,
    Always,
    /// Set with a fixed probability, optionally from a seeded generator
    Bernoulli {
        probability: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Set whenever confidence reaches the threshold
    MinConfidence { threshold: u8 },
}

impl Default for BoostPolicy {
    fn default() -> Self {
        BoostPolicy::Bernoulli {
            probability: DEFAULT_BOOST_PROBABILITY,
            seed: None,
        }
    }
}

pub struct BoostSampler {
    policy: BoostPolicy,
    rng: Mutex<fastrand::Rng>,
}

impl BoostSampler {
    pub fn new(policy: BoostPolicy) -> Self {
        let rng = match &policy {
            BoostPolicy::Bernoulli {
                seed: Some(seed), ..
            } => fastrand::Rng::with_seed(*seed),
            _ => fastrand::Rng::new(),
        };
        Self {
            policy,
            rng: Mutex::new(rng),
        }
    }

    pub fn policy(&self) -> &BoostPolicy {
        &self.policy
    }

    pub fn sample(&self, confidence: u8) -> bool {
        match &self.policy {
            BoostPolicy::Never => false,
            BoostPolicy::Always => true,
            BoostPolicy::MinConfidence { threshold } => confidence >= *threshold,
            BoostPolicy::Bernoulli { probability, .. } => {
                let draw = match self.rng.lock() {
                    Ok(mut rng) => rng.f64(),
                    Err(poisoned) => poisoned.into_inner().f64(),
                };
                draw < *probability
            }
        }
    }
}
