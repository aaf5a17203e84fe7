//! Entry point for the **deskbox** daemon.
//!
//! Reads input events from standard input on a background thread and runs
//! every core operation on the main thread, one event at a time.

use deskbox::command::InputEvent;
use deskbox::config::Config;
use deskbox::dispatch::{Dispatcher, POLL_INTERVAL};
use deskbox::input::LineSource;
use deskbox::session::Session;
use deskbox::traits::{InputSource, WindowSystem};
use log::{error, info};
use std::path::PathBuf;
use std::sync::mpsc;

/// Resolve the config directory: `%APPDATA%\deskbox` on Windows,
/// `$XDG_CONFIG_HOME/deskbox` elsewhere.
fn config_dir() -> PathBuf {
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("deskbox");
    }
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("deskbox")
}

/// Try to load `config.json` from the config directory, falling back to
/// compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn main() {
    env_logger::init();

    #[cfg(windows)]
    run_daemon(deskbox::win32::Win32Desktop::new());

    #[cfg(not(windows))]
    {
        error!("deskbox needs a Win32 desktop");
        std::process::exit(1);
    }
}

#[cfg_attr(not(windows), allow(dead_code))]
fn run_daemon<W: WindowSystem>(ws: W) {
    let config = load_config();
    let session = match Session::new(ws, config) {
        Ok(s) => s,
        Err(e) => {
            error!("initial scan failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut dispatcher = Dispatcher::new(session);
    for binding in dispatcher.hotkeys() {
        info!(
            "hotkey {:#x}+{:#x} runs {}",
            binding.hotkey.modifiers,
            binding.hotkey.key,
            binding.command.name()
        );
    }

    let (tx, rx) = mpsc::channel::<InputEvent>();
    std::thread::spawn(move || {
        let mut source = LineSource::stdin();
        if let Err(e) = source.run(tx) {
            error!("input error: {}", e);
        }
    });

    info!("deskbox running");
    dispatcher.run_loop(&rx, POLL_INTERVAL);

    dispatcher.into_session().shutdown();
    info!("exiting");
}
