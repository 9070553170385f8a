//! Many bots against one server
//!
//! Every bot runs as its own task. Bots join one at a time, `join_delay`
//! apart, and one bot failing never stops the others. A single watch
//! channel carries the shutdown request to all of them.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::client::connection::run_bot;
use crate::client::events::CloseReason;
use crate::config::BotConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SwarmOptions {
    pub count: usize,
    pub join_delay: Duration,
    pub username_prefix: String,
    /// Fixed seed for reproducible movement; bot `n` uses `seed + n`
    pub seed: Option<u64>,
}

impl Default for SwarmOptions {
    fn default() -> Self {
        Self {
            count: 1,
            join_delay: Duration::from_millis(100),
            username_prefix: "Bot".to_string(),
            seed: None,
        }
    }
}

impl SwarmOptions {
    pub fn username(&self, index: usize) -> String {
        format!("{}{}", self.username_prefix, index)
    }
}

#[derive(Debug)]
pub struct BotOutcome {
    pub username: String,
    pub result: Result<CloseReason>,
}

/// Asks every bot of a swarm to disconnect
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

pub struct Swarm {
    config: Arc<BotConfig>,
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Swarm {
    /// Fails with [`crate::Error::InvalidConfig`] before any bot is started.
    pub fn new(config: BotConfig) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = watch::channel(false);
        Ok(Self { config: Arc::new(config), tx: Arc::new(tx), rx })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { tx: self.tx.clone() }
    }

    /// Launch the bots and wait until every one of them has finished.
    ///
    /// Bots not yet launched when shutdown is requested are never started.
    pub async fn run(&self, options: &SwarmOptions) -> Vec<BotOutcome> {
        let mut tasks = JoinSet::new();
        let mut shutdown = self.rx.clone();

        for index in 0..options.count {
            if *shutdown.borrow() {
                break;
            }
            if index > 0 && !options.join_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(options.join_delay) => {}
                    _ = shutdown.changed() => {}
                }
                if *shutdown.borrow() {
                    break;
                }
            }

            let username = options.username(index);
            let rng = match options.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_entropy(),
            };
            let config = self.config.clone();
            let rx = self.rx.clone();
            info!(%username, index, "launching bot");
            tasks.spawn(async move {
                let result = run_bot(config, username.clone(), rng, rx).await;
                BotOutcome { username, result }
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "bot task aborted"),
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::codec::BinaryWriter;
    use crate::error::Error;
    use crate::protocol::frame::FrameCodec;
    use crate::protocol::packet::RawPacket;

    fn rejection() -> BytesMut {
        let mut w = BinaryWriter::default();
        w.write_string("{\"text\":\"server full\"}");
        let packet = RawPacket { id: 0x00, payload: w.into_inner().freeze() };
        let mut out = BytesMut::new();
        FrameCodec::default().encode(&packet, &mut out).unwrap();
        out
    }

    async fn local_config() -> (TcpListener, BotConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = BotConfig { host: "127.0.0.1".into(), port, ..BotConfig::default() };
        (listener, config)
    }

    #[tokio::test]
    async fn test_every_bot_reports_an_outcome() {
        let (listener, config) = local_config().await;
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                tokio::spawn(async move {
                    let mut scratch = [0u8; 256];
                    let _ = socket.read(&mut scratch).await;
                    socket.write_all(&rejection()).await.unwrap();
                });
            }
        });

        let swarm = Swarm::new(config).unwrap();
        let options = SwarmOptions {
            count: 3,
            join_delay: Duration::from_millis(5),
            username_prefix: "Load".into(),
            seed: Some(1),
        };
        let mut outcomes = swarm.run(&options).await;
        outcomes.sort_by(|a, b| a.username.cmp(&b.username));

        let names: Vec<_> = outcomes.iter().map(|o| o.username.as_str()).collect();
        assert_eq!(names, ["Load0", "Load1", "Load2"]);
        for outcome in outcomes {
            let reason = outcome.result.unwrap();
            assert_eq!(reason, CloseReason::LoginRejected("{\"text\":\"server full\"}".into()));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = BotConfig { vertical_continue_chance: 1.5, ..BotConfig::default() };
        assert!(matches!(Swarm::new(config), Err(Error::InvalidConfig(_))));

        let config = BotConfig { speed: f64::NAN, ..BotConfig::default() };
        assert!(Swarm::new(config).is_err());
    }

    #[tokio::test]
    async fn test_bot_with_invalid_config_fails_before_connecting() {
        let (listener, config) = local_config().await;
        let config = Arc::new(BotConfig { redirect_chance: -0.5, ..config });
        let (_tx, rx) = watch::channel(false);

        let result = run_bot(config, "Bot0".into(), StdRng::seed_from_u64(3), rx).await;
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
        let accepted = tokio::time::timeout(Duration::from_millis(50), listener.accept()).await;
        assert!(accepted.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_before_launch_starts_nothing() {
        let (_listener, config) = local_config().await;
        let swarm = Swarm::new(config).unwrap();
        swarm.shutdown_handle().shutdown();

        let options = SwarmOptions { count: 5, ..SwarmOptions::default() };
        assert!(swarm.run(&options).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_each_bot_independently() {
        let (listener, config) = local_config().await;
        drop(listener);

        let swarm = Swarm::new(config).unwrap();
        let options = SwarmOptions { count: 2, join_delay: Duration::ZERO, ..SwarmOptions::default() };
        let outcomes = swarm.run(&options).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.is_err()));
    }
}
