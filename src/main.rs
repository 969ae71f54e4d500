use diorama::{DioramaApp, EditorConfig};
use env_logger::Env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = EditorConfig::from_env();
    log::info!("Loading assets from {}", config.asset_root.display());

    DioramaApp::new(config)?.run()
}
