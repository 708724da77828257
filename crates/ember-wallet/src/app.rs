//! Main application state and update loop

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use alloy::primitives::ChainId;

use ember_wallet_adapters::{
    EmbeddedSessionAdapter, RpcBalanceAdapter, WalletAdapterConfig, WalletClientFactory,
};
use ember_wallet_core::{
    chain_entry, resolve_chain_id, BalanceObserver, ClientKey, ClientManager, ClientState,
    SessionPort, SubmissionController, WalletPort, SUPPORTED_CHAINS,
};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(240, 140, 50);
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(220, 80, 80);
const WARN_YELLOW: egui::Color32 = egui::Color32::from_rgb(220, 180, 50);
const OK_GREEN: egui::Color32 = egui::Color32::from_rgb(90, 200, 120);

/// The main application state
pub struct App {
    runtime: tokio::runtime::Runtime,
    session: EmbeddedSessionAdapter,
    manager: Arc<ClientManager<WalletClientFactory>>,
    submitter: Arc<SubmissionController>,
    balance: Arc<BalanceObserver<RpcBalanceAdapter>>,
    /// Key the balance observer was last pointed at.
    watched_balance_key: Option<ClientKey>,
    /// Most recent failure message from a background operation.
    status: Arc<Mutex<Option<String>>>,
    copied_at: Option<Instant>,
}

impl App {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let config = WalletAdapterConfig::from_env();
        let balance_adapter = if config.session_proxy_url.is_some() {
            RpcBalanceAdapter::live(config.rpc_timeout_ms)?
        } else {
            RpcBalanceAdapter::deterministic(config.deterministic_balance_wei)
        };
        let session = EmbeddedSessionAdapter::new(config)?;

        Ok(Self {
            runtime,
            session,
            manager: Arc::new(ClientManager::new(WalletClientFactory)),
            submitter: Arc::new(SubmissionController::new()),
            balance: Arc::new(BalanceObserver::new(balance_adapter)),
            watched_balance_key: None,
            status: Arc::new(Mutex::new(None)),
            copied_at: None,
        })
    }

    /// The (address, chain) pair the UI is currently looking at, if the
    /// wallet is connected to a registry chain.
    fn wallet_key(&self) -> Option<ClientKey> {
        let wallet = self.session.embedded_wallet()?;
        let chain_id = resolve_chain_id(wallet.chain_identifier().as_deref())?;
        chain_entry(chain_id)?;
        Some(ClientKey {
            address: wallet.address(),
            chain_id,
        })
    }

    /// Point the client manager and balance observer at the current key.
    /// Both dedupe on an unchanged key, so this is cheap to run every frame.
    fn drive_lifecycle(&mut self, ctx: &egui::Context) {
        let key = self.wallet_key();
        if key != self.manager.current_key() {
            let session = self.session.clone();
            let manager = Arc::clone(&self.manager);
            let ctx = ctx.clone();
            self.runtime.spawn(async move {
                manager.refresh(&session).await;
                ctx.request_repaint();
            });
        }
        if key != self.watched_balance_key {
            self.watched_balance_key = key;
            let balance = Arc::clone(&self.balance);
            let ctx = ctx.clone();
            self.runtime.spawn(async move {
                balance.observe(key).await;
                ctx.request_repaint();
            });
        }
    }

    fn spawn_login(&self, ctx: &egui::Context) {
        *lock(&self.status) = None;
        let session = self.session.clone();
        let status = Arc::clone(&self.status);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            if let Err(e) = session.login().await {
                *lock(&status) = Some(format!("Login failed: {e}"));
            }
            ctx.request_repaint();
        });
    }

    fn spawn_logout(&self, ctx: &egui::Context) {
        let session = self.session.clone();
        let status = Arc::clone(&self.status);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            if let Err(e) = session.logout().await {
                *lock(&status) = Some(format!("Logout failed: {e}"));
            }
            ctx.request_repaint();
        });
    }

    fn spawn_switch_chain(&self, ctx: &egui::Context, target: ChainId) {
        *lock(&self.status) = None;
        let session = self.session.clone();
        let submitter = Arc::clone(&self.submitter);
        let status = Arc::clone(&self.status);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            if let Err(e) = submitter.switch_chain(&session, target).await {
                *lock(&status) = Some(format!("Chain switch failed: {e}"));
            }
            ctx.request_repaint();
        });
    }

    fn spawn_balance_refetch(&self, ctx: &egui::Context) {
        let balance = Arc::clone(&self.balance);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            balance.refetch().await;
            ctx.request_repaint();
        });
    }

    fn spawn_transfer(&self, ctx: &egui::Context) {
        *lock(&self.status) = None;
        let session = self.session.clone();
        let submitter = Arc::clone(&self.submitter);
        let status = Arc::clone(&self.status);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            if let Err(e) = submitter.send_self_transfer(&session).await {
                *lock(&status) = Some(format!("Transaction failed: {e}"));
            }
            ctx.request_repaint();
        });
    }

    fn spawn_contract_write(&self, ctx: &egui::Context) {
        *lock(&self.status) = None;
        let manager = Arc::clone(&self.manager);
        let submitter = Arc::clone(&self.submitter);
        let status = Arc::clone(&self.status);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            if let Err(e) = submitter.write_setter_contract(manager.client()).await {
                *lock(&status) = Some(format!("Contract write failed: {e}"));
            }
            ctx.request_repaint();
        });
    }

    fn copy_address(&mut self, address: String) {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(address)) {
            Ok(()) => self.copied_at = Some(Instant::now()),
            Err(e) => tracing::warn!(error = %e, "clipboard copy failed"),
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        self.drive_lifecycle(ctx);

        if !self.session.authenticated() {
            self.render_login(ctx);
            return;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(16.0);
                self.render_header(ui, ctx);
                ui.add_space(10.0);
                self.render_chain_and_balance(ui, ctx);
                ui.add_space(10.0);
                self.render_actions(ui, ctx);
                ui.add_space(10.0);
                if let Some(message) = lock(&self.status).clone() {
                    ui.colored_label(ERROR_RED, message);
                }
                ui.add_space(20.0);
            });
        });
    }
}

impl App {
    fn render_login(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(200.0);
                ui.heading(egui::RichText::new("🔥 Ember Wallet").size(26.0).color(ACCENT));
                ui.label("Embedded wallet demo for the MegaETH and RISE testnets");
                ui.add_space(16.0);
                if ui.button("Log in").clicked() {
                    self.spawn_login(ctx);
                }
                if let Some(message) = lock(&self.status).clone() {
                    ui.add_space(10.0);
                    ui.colored_label(ERROR_RED, message);
                }
            });
        });
    }

    fn render_header(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.vertical_centered(|ui| {
            ui.heading(
                egui::RichText::new("🔥 Ember Wallet Demo")
                    .size(22.0)
                    .color(ACCENT),
            );
        });
        ui.add_space(6.0);
        if let Some(wallet) = self.session.embedded_wallet() {
            let address = wallet.address().to_string();
            ui.horizontal(|ui| {
                ui.label("Connected wallet:");
                ui.monospace(&address);
                let copied = self
                    .copied_at
                    .is_some_and(|at| at.elapsed() < Duration::from_secs(2));
                let label = if copied { "✔ copied" } else { "📋 copy" };
                if ui.small_button(label).clicked() {
                    self.copy_address(address.clone());
                }
            });
        }
        if ui.button("Log out").clicked() {
            self.spawn_logout(ctx);
        }
    }

    fn render_chain_and_balance(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let active = self.wallet_key().map(|key| key.chain_id);
        let active_entry = active.and_then(chain_entry);

        ui.group(|ui| {
            ui.strong("Switch Chain");
            ui.horizontal(|ui| {
                for chain in SUPPORTED_CHAINS {
                    let selected = active == Some(chain.id);
                    if ui.selectable_label(selected, chain.name).clicked() && !selected {
                        self.spawn_switch_chain(ctx, chain.id);
                    }
                }
            });
            ui.add_space(6.0);

            let gate = self.balance.gate();
            let snapshot = self.balance.snapshot();
            ui.horizontal(|ui| {
                ui.label("Balance:");
                match &snapshot {
                    Some(snapshot) => {
                        ui.strong(format!("{} {}", snapshot.formatted, snapshot.symbol));
                    }
                    None => {
                        ui.add(egui::Spinner::new());
                        ui.label("Loading…");
                    }
                }
            });
            if snapshot.is_some() && !gate.allows_submission() {
                ui.colored_label(WARN_YELLOW, "⚠ You need testnet tokens to interact");
                ui.horizontal(|ui| {
                    if ui.button("Get Tokens").clicked() {
                        if let Some(chain) = active_entry {
                            open_url(chain.faucet_url);
                        }
                    }
                    if ui.button("Retry").clicked() {
                        self.spawn_balance_refetch(ctx);
                    }
                });
            }
        });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let active_entry = self.wallet_key().and_then(|key| chain_entry(key.chain_id));
        let funded = self.balance.gate().allows_submission();
        let client_ready = self.manager.state() == ClientState::Ready;
        let transfer = self.submitter.transfer_state();
        let contract = self.submitter.contract_state();

        ui.columns(2, |columns| {
            columns[0].group(|ui| {
                ui.strong("Send Transaction");
                ui.small("Sends 0 ETH to your own address (still requires gas).");
                ui.add_space(6.0);
                let label = if transfer.busy {
                    "Sending…"
                } else {
                    "Send Test Transaction"
                };
                let enabled = funded && !transfer.busy;
                if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                    self.spawn_transfer(ctx);
                }
                if let Some(hash) = transfer.last_result_id {
                    ui.add_space(6.0);
                    ui.colored_label(OK_GREEN, "Last transaction:");
                    if let Some(chain) = active_entry {
                        if ui.link(egui::RichText::new(hash.to_string()).small()).clicked() {
                            open_url(&chain.tx_url(hash));
                        }
                    }
                }
            });

            columns[1].group(|ui| {
                ui.strong("Write to Contract");
                ui.small("Calls setValue(2) on the setter contract.");
                if let Some(chain) = active_entry {
                    ui.small(format!("Contract: {}", chain.setter_address));
                }
                ui.add_space(6.0);
                let label = if contract.busy {
                    "Writing…"
                } else {
                    "Write to Contract"
                };
                let enabled = funded && !contract.busy && client_ready;
                if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                    self.spawn_contract_write(ctx);
                }
                if let Some(hash) = contract.last_result_id {
                    ui.add_space(6.0);
                    ui.colored_label(OK_GREEN, "Last contract call:");
                    if let Some(chain) = active_entry {
                        if ui.link(egui::RichText::new(hash.to_string()).small()).clicked() {
                            open_url(&chain.tx_url(hash));
                        }
                    }
                }
            });
        });
    }
}

fn open_url(url: &str) {
    if let Err(e) = open::that(url) {
        tracing::warn!(error = %e, url, "failed to open browser");
    }
}

fn lock(slot: &Mutex<Option<String>>) -> MutexGuard<'_, Option<String>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
