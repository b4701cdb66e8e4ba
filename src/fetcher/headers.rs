use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Mutex;

use crate::config::HeaderConfig;

pub const USER_AGENT: &str = "User-Agent";

/// Fixed base headers plus a pool of user agents to rotate through.
pub struct HeaderPool {
    base: Vec<(String, String)>,
    user_agents: Vec<String>,
    rng: Mutex<StdRng>,
}

impl HeaderPool {
    /// Build a pool; a `seed` makes the user agent sequence reproducible.
    pub fn new(config: &HeaderConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            base: config
                .base
                .iter()
                .filter(|(key, _)| !key.eq_ignore_ascii_case(USER_AGENT))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            user_agents: config.user_agents.clone(),
            rng: Mutex::new(rng),
        }
    }

    /// Draw one user agent from the pool.
    pub fn pick_user_agent(&self) -> Option<String> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.user_agents.choose(&mut *rng).cloned()
    }

    /// Base headers with a freshly drawn user agent.
    pub fn identity(&self) -> Vec<(String, String)> {
        let mut headers = self.base.clone();
        if let Some(user_agent) = self.pick_user_agent() {
            headers.push((USER_AGENT.to_string(), user_agent));
        }
        headers
    }
}
