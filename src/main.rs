use anyhow::Result;
use auto_thumbnail_selector::config::Config;
use auto_thumbnail_selector::init;
use auto_thumbnail_selector::menu::show_main_menu;
use auto_thumbnail_selector::signal::setup_shutdown_signal;
use console::{Term, style};
use log::{info, warn};
use rust_i18n::t;

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en-US");

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut config = Config::new()?;
    rust_i18n::set_locale(config.settings.language.as_str());

    loop {
        match show_main_menu(&term, &shutdown_signal, &mut config) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style(t!("main_menu.goodbye")).green().bold());
                info!("程式正常結束");
                break;
            }
            Err(e) => {
                warn!("程式錯誤: {e:#}");
                eprintln!("{} {e:#}", style(t!("main_menu.error_prefix")).red().bold());
                break;
            }
        }
    }

    Ok(())
}
