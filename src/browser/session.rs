//! Network identities used to visit pages.

use std::sync::Mutex;

use log::{info, warn};

/// One network identity: a proxy, or the direct connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable index into the pool
    pub id: usize,
    /// Proxy URL, `None` for a direct connection
    pub proxy: Option<String>,
}

#[derive(Debug)]
struct PoolState {
    next: usize,
    retired: Vec<bool>,
}

/// Round-robin pool of sessions.
///
/// A session that hits a CAPTCHA is retired and skipped. When every session is
/// retired, all of them are revived: a burned identity is still better than
/// stalling the crawl.
#[derive(Debug)]
pub struct SessionPool {
    sessions: Vec<Session>,
    state: Mutex<PoolState>,
}

impl SessionPool {
    /// Builds one session per proxy, or a single direct session if none are given.
    pub fn new(proxies: &[String]) -> Self {
        let sessions: Vec<Session> = if proxies.is_empty() {
            vec![Session { id: 0, proxy: None }]
        } else {
            proxies
                .iter()
                .enumerate()
                .map(|(id, proxy)| Session {
                    id,
                    proxy: Some(proxy.clone()),
                })
                .collect()
        };
        let retired = vec![false; sessions.len()];
        Self {
            sessions,
            state: Mutex::new(PoolState { next: 0, retired }),
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Next active session in round-robin order.
    pub fn acquire(&self) -> Session {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.retired.iter().all(|r| *r) {
            warn!("All {} sessions retired; reviving them", self.sessions.len());
            state.retired.iter_mut().for_each(|r| *r = false);
        }
        let count = self.sessions.len();
        for offset in 0..count {
            let idx = (state.next + offset) % count;
            if !state.retired[idx] {
                state.next = (idx + 1) % count;
                return self.sessions[idx].clone();
            }
        }
        // Unreachable: at least one session is active after the revive above.
        self.sessions[0].clone()
    }

    /// Takes a session out of rotation.
    pub fn retire(&self, id: usize) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(flag) = state.retired.get_mut(id) {
            if !*flag {
                *flag = true;
                info!("Retired session {} after a CAPTCHA challenge", id);
            }
        }
    }

    /// Number of sessions currently in rotation.
    pub fn active_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.retired.iter().filter(|r| !**r).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxies(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("http://p{i}.example:8000")).collect()
    }

    #[test]
    fn test_direct_session_when_no_proxies() {
        let pool = SessionPool::new(&[]);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.acquire(), Session { id: 0, proxy: None });
    }

    #[test]
    fn test_round_robin() {
        let pool = SessionPool::new(&proxies(3));
        let ids: Vec<usize> = (0..6).map(|_| pool.acquire().id).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_retired_session_skipped() {
        let pool = SessionPool::new(&proxies(3));
        pool.retire(1);
        assert_eq!(pool.active_count(), 2);
        let ids: Vec<usize> = (0..4).map(|_| pool.acquire().id).collect();
        assert_eq!(ids, vec![0, 2, 0, 2]);
    }

    #[test]
    fn test_all_retired_revives() {
        let pool = SessionPool::new(&proxies(2));
        pool.retire(0);
        pool.retire(1);
        assert_eq!(pool.active_count(), 0);
        let _ = pool.acquire();
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_retire_unknown_id_ignored() {
        let pool = SessionPool::new(&proxies(1));
        pool.retire(7);
        assert_eq!(pool.active_count(), 1);
    }
}
