//! Discovery from a fixed candidate list.

use std::collections::HashMap;
use async_trait::async_trait;
use crate::config::DiscoveryConfig;
use crate::discovery::{Candidate, DiscoveryClient, DiscoveryError};

/// Returns configured candidates keyed by selector. Unknown selectors yield no candidates.
#[derive(Debug, Default, Clone)]
pub struct StaticDiscovery {
    candidates: HashMap<String, Vec<Candidate>>,
}

impl StaticDiscovery {
    pub fn new(candidates: HashMap<String, Vec<Candidate>>) -> Self {
        Self { candidates }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        let candidates = config
            .candidates
            .iter()
            .map(|(selector, list)| {
                let list = list
                    .iter()
                    .map(|c| Candidate::new(c.address.clone(), c.phase.clone()))
                    .collect();
                (selector.clone(), list)
            })
            .collect();
        Self { candidates }
    }
}

#[async_trait]
impl DiscoveryClient for StaticDiscovery {
    async fn list_candidates(
        &self,
        selector: &str,
        _namespace: &str,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        Ok(self.candidates.get(selector).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCandidate;

    #[tokio::test]
    async fn test_lists_configured_candidates_in_order() {
        let mut config = DiscoveryConfig::default();
        config.candidates.insert(
            "app=a".into(),
            vec![
                StaticCandidate { address: "10.0.0.1".into(), phase: "Running".into() },
                StaticCandidate { address: "10.0.0.3".into(), phase: "Pending".into() },
            ],
        );
        let discovery = StaticDiscovery::from_config(&config);

        let found = discovery.list_candidates("app=a", "default").await.unwrap();
        assert_eq!(
            found,
            vec![Candidate::new("10.0.0.1", "Running"), Candidate::new("10.0.0.3", "Pending")]
        );
        assert!(discovery.list_candidates("app=b", "default").await.unwrap().is_empty());
    }
}
