use std::sync::Arc;

use rand::Rng;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn, Instrument};

use crate::bot::session::{Command, Session, Timer};
use crate::client::events::{BotEvent, CloseReason};
use crate::client::timers::{Ticker, Timers};
use crate::config::BotConfig;
use crate::error::Result;
use crate::protocol::transport::Transport;

/// One bot's connection: drives a [`Session`] from socket reads, its
/// deferred timers and the movement tick, all on a single task.
pub struct Connection<S, R> {
    transport: Transport<S>,
    session: Session<R>,
    timers: Timers<Timer>,
    ticker: Ticker,
    config: Arc<BotConfig>,
}

impl<R: Rng> Connection<TcpStream, R> {
    pub async fn connect(config: Arc<BotConfig>, username: impl Into<String>, rng: R) -> Result<Self> {
        config.validate()?;
        let transport = Transport::connect(
            &config.server_addr(),
            config.connect_timeout(),
            config.max_frame_len,
        )
        .await?;
        let session = Session::new(config.clone(), username, rng);
        Ok(Self::new(transport, session, config))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin, R: Rng> Connection<S, R> {
    pub fn new(transport: Transport<S>, session: Session<R>, config: Arc<BotConfig>) -> Self {
        Self {
            transport,
            session,
            timers: Timers::new(),
            ticker: Ticker::idle(),
            config,
        }
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Run until the session ends.
    ///
    /// Server kicks, peer close and local shutdown come back as `Ok` with
    /// the reason; decode and I/O failures come back as `Err`. Either way
    /// every timer and the tick are cancelled before returning.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<CloseReason> {
        let result = self.drive(&mut shutdown).await;

        self.timers.cancel_all();
        self.ticker.stop();
        if let Err(e) = &result {
            if e.is_protocol_fault() {
                warn!(error = %e, "protocol fault, dropping connection");
            } else {
                info!(error = %e, "connection failed");
            }
            self.session.close(CloseReason::Fault(e.to_string()));
        }
        self.log_events();

        if let Some(uuid) = self.session.uuid() {
            info!(%uuid, "{} has disconnected from {}", self.session.username(), self.config.server_addr());
        }
        let _ = self.transport.shutdown().await;

        result.map(|_| {
            self.session
                .close_reason()
                .cloned()
                .unwrap_or(CloseReason::ConnectionLost)
        })
    }

    async fn drive(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
        let commands = self.session.start();
        self.execute(commands).await?;

        while self.session.is_active() {
            tokio::select! {
                packet = self.transport.recv() => match packet? {
                    Some(raw) => {
                        trace!(id = raw.id, len = raw.payload.len(), "packet in");
                        let commands = self.session.handle_packet(raw)?;
                        self.execute(commands).await?;
                    }
                    None => {
                        self.session.close(CloseReason::ConnectionLost);
                    }
                },
                timer = self.timers.next_due() => {
                    debug!(?timer, "timer due");
                    let commands = self.session.on_timer(timer);
                    self.execute(commands).await?;
                }
                _ = self.ticker.tick() => {
                    if !self.session.is_active() {
                        self.ticker.stop();
                    } else if let Some(packet) = self.session.tick() {
                        trace!(?packet, "tick");
                        self.transport.send(&packet).await?;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.session.close(CloseReason::Shutdown);
                    }
                }
            }
            self.log_events();
        }
        Ok(())
    }

    async fn execute(&mut self, commands: Vec<Command>) -> Result<()> {
        for command in commands {
            match command {
                Command::Send(packet) => self.transport.queue(&packet)?,
                Command::EnableCompression(threshold) => self.transport.set_compression(threshold),
                Command::Schedule { timer, delay } => self.timers.schedule(timer, delay),
                Command::StartTicking { interval } => self.ticker.start(interval),
                Command::Close(reason) => debug!(?reason, "session closing"),
            }
        }
        self.transport.flush().await
    }

    fn log_events(&mut self) {
        let username = self.session.username().to_string();
        for event in self.session.drain_events() {
            match event {
                BotEvent::LoggedIn { uuid, username } => {
                    info!("{username} ({uuid}) has logged in");
                }
                BotEvent::CompressionEnabled { threshold } => {
                    debug!(threshold, "compression enabled");
                }
                BotEvent::Teleported { pose, teleport_id } => {
                    if self.config.log_teleports {
                        info!(teleport_id, "Teleporting {username} to {},{},{}", pose.x, pose.y, pose.z);
                    } else {
                        debug!(teleport_id, x = pose.x, y = pose.y, z = pose.z, "teleported");
                    }
                }
                BotEvent::ResourcePackOffered(offer) => {
                    info!(
                        url = %offer.url,
                        hash = %offer.hash,
                        forced = offer.forced,
                        prompt = ?offer.prompt,
                        "resource pack offered"
                    );
                }
                BotEvent::Closed { reason } => match reason {
                    CloseReason::LoginRejected(text) => {
                        info!("{username} was disconnected during login due to {text}");
                    }
                    CloseReason::Kicked(text) => {
                        let uuid = self.session.uuid().map(|u| u.to_string()).unwrap_or_default();
                        info!("{username} ({uuid}) was kicked due to {text}");
                    }
                    other => debug!(reason = ?other, "session closed"),
                },
            }
        }
    }
}

/// Connect one bot and run it to completion inside its own log span
pub async fn run_bot<R: Rng>(
    config: Arc<BotConfig>,
    username: String,
    rng: R,
    shutdown: watch::Receiver<bool>,
) -> Result<CloseReason> {
    let span = tracing::info_span!("bot", name = %username);
    async move {
        let mut connection = Connection::connect(config, username, rng).await?;
        connection.run(shutdown).await
    }
    .instrument(span)
    .await
}
