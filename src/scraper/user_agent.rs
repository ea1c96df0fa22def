use rand::seq::SliceRandom;

const BUILTIN_USER_AGENTS: [&str; 6] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Pick a user agent at random from `pool`, or from the built-in list when
/// `pool` is empty.
pub fn pick(pool: &[String]) -> String {
    let mut rng = rand::thread_rng();
    if let Some(ua) = pool.choose(&mut rng) {
        return ua.clone();
    }
    BUILTIN_USER_AGENTS
        .choose(&mut rng)
        .map(|ua| ua.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_from_builtin_pool() {
        let ua = pick(&[]);
        assert!(BUILTIN_USER_AGENTS.contains(&ua.as_str()));
    }

    #[test]
    fn test_pick_from_configured_pool() {
        let pool = vec!["agent-a".to_string(), "agent-b".to_string()];
        for _ in 0..20 {
            let ua = pick(&pool);
            assert!(pool.contains(&ua));
        }
    }
}
