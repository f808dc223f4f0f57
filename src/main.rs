use iced::Application;
use jma_wx::app::{self, WeatherApp};
use jma_wx::config::Config;
use jma_wx::lookup::Lookup;

fn main() -> anyhow::Result<()> {
    jma_wx::init_tracing();

    let config = Config::load()?;
    let lookup = Lookup::direct(&config)?;

    WeatherApp::run(app::settings(&config, lookup))?;
    Ok(())
}
