//! Static catalog of local model profiles.
//!
//! Built once per selector and never mutated afterwards. Callers that need
//! task-specific decoding parameters get a copy (see
//! [`ModelSelector::get_config`](crate::selector::ModelSelector::get_config)).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const PHI3_5: &str = "phi3.5:3.8b";
pub const LLAMA3_2_1B: &str = "llama3.2:1b";
pub const QWEN2_5_3B: &str = "qwen2.5:3b";
pub const GEMMA2_2B: &str = "gemma2:2b";
pub const LLAMA3_1_8B: &str = "llama3.1:8b";
pub const GRANITE_VISION: &str = "granite3.2-vision";
pub const LLAMA3_1_70B: &str = "llama3.1:70b";

/// Decoding parameters and relative scores for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    /// 1 (slow) to 10 (fast).
    pub speed_score: u8,
    /// 1 (weak) to 10 (strong).
    pub accuracy_score: u8,
}

impl ModelProfile {
    fn new(
        name: &str,
        temperature: f64,
        top_p: f64,
        top_k: u32,
        max_tokens: u32,
        speed_score: u8,
        accuracy_score: u8,
    ) -> Self {
        Self {
            name: name.to_string(),
            temperature,
            top_p,
            top_k,
            max_tokens,
            speed_score,
            accuracy_score,
        }
    }

    /// Arithmetic mean of speed and accuracy scores.
    pub fn balanced_score(&self) -> f64 {
        (f64::from(self.speed_score) + f64::from(self.accuracy_score)) / 2.0
    }
}

/// Read-only model catalog.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    profiles: HashMap<String, ModelProfile>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::from_profiles(vec![
            // Small task-dedicated models
            ModelProfile::new(PHI3_5, 0.1, 0.9, 40, 64, 9, 9),
            ModelProfile::new(LLAMA3_2_1B, 0.05, 0.8, 20, 32, 10, 8),
            ModelProfile::new(QWEN2_5_3B, 0.2, 0.9, 40, 256, 9, 9),
            ModelProfile::new(GEMMA2_2B, 0.05, 0.8, 20, 64, 10, 8),
            // General tiers
            ModelProfile::new(LLAMA3_1_8B, 0.1, 0.9, 40, 256, 7, 7),
            ModelProfile::new(GRANITE_VISION, 0.1, 0.9, 40, 256, 5, 8),
            ModelProfile::new(LLAMA3_1_70B, 0.1, 0.9, 40, 512, 2, 10),
        ])
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry over an explicit profile list. Later duplicates win.
    pub fn from_profiles(profiles: Vec<ModelProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelProfile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let registry = ModelRegistry::new();
        assert_eq!(registry.len(), 7);
        assert!(registry.contains(GRANITE_VISION));
        assert!(!registry.contains("gpt-4o"));

        let phi = registry.get(PHI3_5).unwrap();
        assert_eq!(phi.max_tokens, 64);
        assert_eq!(phi.balanced_score(), 9.0);
    }

    #[test]
    fn test_scores_in_range() {
        let registry = ModelRegistry::new();
        for name in registry.names() {
            let p = registry.get(name).unwrap();
            assert!((1..=10).contains(&p.speed_score), "{name}");
            assert!((1..=10).contains(&p.accuracy_score), "{name}");
        }
    }
}
