//! Fingerprint rotation helpers
//!
//! User-agent rotation and the anti-automation launch flags applied to
//! every browser instance.

use rand::seq::SliceRandom;

/// Pool of modern user agents for rotation
const USER_AGENTS: &[&str] = &[
    // Windows Chrome
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Windows Firefox
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    // Windows Edge
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    // iPhone
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1.2 Mobile/15E148 Safari/604.1",
    // Android
    "Mozilla/5.0 (Linux; Android 14; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36",
];

/// Pick a random user agent from the pool.
pub fn rotate_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Launch flags that suppress the usual automation tells.
pub fn stealth_launch_args() -> Vec<String> {
    [
        "--disable-blink-features=AutomationControlled",
        "--disable-features=IsolateOrigins,site-per-process",
        "--disable-infobars",
        "--no-default-browser-check",
        // Required when running in a container
        "--no-sandbox",
        "--disable-setuid-sandbox",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotated_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&rotate_user_agent()));
        }
    }

    #[test]
    fn stealth_args_disable_automation_signals() {
        let args = stealth_launch_args();
        assert!(args
            .iter()
            .any(|a| a.contains("AutomationControlled")));
        assert!(args.iter().all(|a| a.starts_with("--")));
    }
}
