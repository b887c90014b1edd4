//! Path: native/orbit_window/src/main.rs
//! Summary: ウィンドウ版エントリポイント（RUST_LOG でログレベル指定）

use orbit_core::EncounterConfig;
use orbit_window::{run_window, WindowOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::Builder::from_default_env().try_init();

    let config = EncounterConfig::default();
    let options = WindowOptions::for_config(&config);
    log::info!(
        "starting orbit arena: {}x{} radius={} attack cycle={:?}",
        options.width,
        options.height,
        config.motion.orbit_radius,
        config.attack.cycle_period()
    );
    run_window(config, options)?;
    Ok(())
}
