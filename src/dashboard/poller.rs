//! Background refresh loops for the dashboard
//!
//! Three independent loops run until [`DashboardPoller::stop`]:
//! - contract data (history + agent state), immediately and then every poll interval
//! - agent runtime load from the status endpoint
//! - cooldown countdown, every tick
//!
//! Contract refreshes are spawned rather than awaited in the loop, so a slow
//! RPC round never delays the next tick; the in-flight guards on
//! [`Dashboard`] drop the overlapping rounds.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::controller::Dashboard;
use crate::config::Config;
use crate::system_status::SystemStatusClient;

#[derive(Debug, Clone)]
pub struct PollIntervals {
    pub data: Duration,
    pub status: Duration,
    pub tick: Duration,
}

impl PollIntervals {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data: Duration::from_millis(config.dashboard.poll_interval_ms),
            status: Duration::from_millis(config.system_status.poll_interval_ms),
            tick: Duration::from_millis(config.dashboard.tick_interval_ms),
        }
    }
}

pub struct DashboardPoller {
    dashboard: Arc<Dashboard>,
    status: Option<Arc<SystemStatusClient>>,
    intervals: PollIntervals,
    shutdown: broadcast::Sender<()>,
}

impl DashboardPoller {
    pub fn new(
        dashboard: Arc<Dashboard>,
        status: Option<SystemStatusClient>,
        intervals: PollIntervals,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            dashboard,
            status: status.map(Arc::new),
            intervals,
            shutdown,
        }
    }

    /// Spawn the refresh loops
    pub fn start(&self) {
        info!(
            "Starting dashboard polling: data every {:?}, cooldown every {:?}",
            self.intervals.data, self.intervals.tick
        );

        self.spawn_data_loop();
        self.spawn_tick_loop();
        if let Some(status) = &self.status {
            self.spawn_status_loop(status.clone());
        }
    }

    /// Stop all loops
    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }

    fn spawn_data_loop(&self) {
        let dashboard = self.dashboard.clone();
        let period = self.intervals.data;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            // First tick completes immediately
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let history = dashboard.clone();
                        tokio::spawn(async move {
                            history.fetch_transactions().await;
                        });
                        let state = dashboard.clone();
                        tokio::spawn(async move {
                            state.load_agent_state().await;
                        });
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Data poll shutting down");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_tick_loop(&self) {
        let dashboard = self.dashboard.clone();
        let period = self.intervals.tick;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => dashboard.tick_cooldown().await,
                    _ = shutdown_rx.recv() => {
                        debug!("Cooldown tick shutting down");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_status_loop(&self, status: Arc<SystemStatusClient>) {
        let dashboard = self.dashboard.clone();
        let period = self.intervals.status;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first status reading waits one full period
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match status.fetch_load().await {
                            Ok(load) => dashboard.set_system_load(load).await,
                            Err(e) => debug!("Failed to fetch system status: {}", e),
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Status poll shutting down");
                        break;
                    }
                }
            }
        });
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::mock::MockVault;
    use crate::contract::AgentInfo;
    use crate::dashboard::controller::DashboardSettings;
    use crate::merchants::MerchantBook;
    use crate::config::SystemStatusConfig;
    use crate::dashboard::cooldown::unix_now;
    use ethers::types::{Address, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn settings(agent: Address) -> DashboardSettings {
        DashboardSettings {
            agent,
            agent_name: "AI-Agent".to_string(),
            cooldown_secs: 60,
            fund_gas_limit: 300_000,
            balance_reserve_eth: 0.001,
            history_preview: 3,
            high_load_pct: 90,
            explorer_tx_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_polls_until_stopped() {
        let agent = Address::from_low_u64_be(1);
        let vault = Arc::new(MockVault::new(
            Address::from_low_u64_be(2),
            Address::from_low_u64_be(3),
        ));
        vault.state.lock().await.agents.insert(
            agent,
            AgentInfo {
                name: "AI-Agent".to_string(),
                remaining_budget: U256::from(5),
                next_allowed_tx_time: 0,
                active: true,
            },
        );

        let (dashboard, _rx) =
            Dashboard::new(vault.clone(), None, settings(agent), MerchantBook::seeded());
        let dashboard = Arc::new(dashboard);

        let poller = DashboardPoller::new(
            dashboard.clone(),
            None,
            PollIntervals {
                data: Duration::from_millis(20),
                status: Duration::from_millis(20),
                tick: Duration::from_millis(10),
            },
        );
        poller.start();

        tokio::time::sleep(Duration::from_millis(110)).await;
        poller.stop();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let loads = vault.agent_info_calls.load(Ordering::SeqCst);
        let queries = vault.event_queries.load(Ordering::SeqCst);
        assert!(loads >= 2, "expected repeated loads, got {}", loads);
        assert!(queries >= 2);
        assert_eq!(dashboard.snapshot().await.remaining_budget, U256::from(5));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(vault.agent_info_calls.load(Ordering::SeqCst), loads);
    }

    fn agent_info(next_allowed_tx_time: u64) -> AgentInfo {
        AgentInfo {
            name: "AI-Agent".to_string(),
            remaining_budget: U256::from(5),
            next_allowed_tx_time,
            active: true,
        }
    }

    /// Serves `{"load":42}` once, then answers 500
    async fn flaky_status_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/status", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let response = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    let body = r#"{"load":42}"#;
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                } else {
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (url, hits)
    }

    #[tokio::test]
    async fn test_status_failure_keeps_last_load() {
        let (url, hits) = flaky_status_server().await;
        let status = SystemStatusClient::new(&SystemStatusConfig {
            enabled: true,
            url,
            poll_interval_ms: 200,
            timeout_ms: 1_000,
        })
        .unwrap();

        let agent = Address::from_low_u64_be(1);
        let vault = Arc::new(MockVault::new(
            Address::from_low_u64_be(2),
            Address::from_low_u64_be(3),
        ));
        vault.state.lock().await.agents.insert(agent, agent_info(0));
        let (dashboard, _rx) =
            Dashboard::new(vault, None, settings(agent), MerchantBook::seeded());
        let dashboard = Arc::new(dashboard);

        let poller = DashboardPoller::new(
            dashboard.clone(),
            Some(status),
            PollIntervals {
                data: Duration::from_secs(10),
                status: Duration::from_millis(200),
                tick: Duration::from_secs(10),
            },
        );
        poller.start();

        // Nothing is read before the first full period
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(dashboard.snapshot().await.system_load, 0);

        tokio::time::sleep(Duration::from_millis(800)).await;
        poller.stop();

        assert!(hits.load(Ordering::SeqCst) >= 2);
        assert_eq!(dashboard.snapshot().await.system_load, 42);
    }

    #[tokio::test]
    async fn test_cooldown_expires_while_polling() {
        let agent = Address::from_low_u64_be(1);
        let vault = Arc::new(MockVault::new(
            Address::from_low_u64_be(2),
            Address::from_low_u64_be(3),
        ));
        vault
            .state
            .lock()
            .await
            .agents
            .insert(agent, agent_info(unix_now() + 2));

        let (dashboard, _rx) =
            Dashboard::new(vault, None, settings(agent), MerchantBook::seeded());
        let dashboard = Arc::new(dashboard);

        // One data load at start; only the tick loop moves the countdown after that
        let poller = DashboardPoller::new(
            dashboard.clone(),
            None,
            PollIntervals {
                data: Duration::from_secs(60),
                status: Duration::from_secs(60),
                tick: Duration::from_millis(50),
            },
        );
        poller.start();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let cooldown = dashboard.snapshot().await.cooldown;
        assert!(cooldown.active);
        assert!(cooldown.label().ends_with("s WAIT"));

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        poller.stop();

        let cooldown = dashboard.snapshot().await.cooldown;
        assert!(!cooldown.active);
        assert_eq!(cooldown.remaining_secs, 0);
        assert_eq!(cooldown.label(), "READY");
    }
}
