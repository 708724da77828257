//! Ember Wallet: an embedded-wallet demo for the MegaETH and RISE testnets

use eframe::egui;

mod app;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Ember Wallet");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Ember Wallet")
            .with_inner_size([860.0, 640.0])
            .with_min_inner_size([600.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ember Wallet",
        native_options,
        Box::new(|cc| Ok(Box::new(app::App::new(cc)?))),
    )
    .map_err(|e| eyre::eyre!("failed to run app: {e}"))
}
