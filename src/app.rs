use crate::config::Config;
use crate::lookup::{DisplayText, Lookup};
use crate::view;
use crate::weather::{self, JmaClient, Region};
use iced::{window, Application, Command, Element, Settings, Size, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    RegionSelected,
    ResultShown,
}

#[derive(Debug, Clone)]
pub enum Message {
    RegionsLoaded(Vec<Region>),
    RegionSelected(Region),
    FetchPressed,
    ForecastReady(DisplayText),
}

pub struct Flags {
    pub lookup: Lookup,
}

pub struct WeatherApp {
    pub lookup: Lookup,
    pub regions: Vec<Region>,
    pub selected: Option<Region>,
    pub output: Option<DisplayText>,
    pub loading: bool,
}

impl WeatherApp {
    pub fn with_lookup(lookup: Lookup) -> Self {
        Self {
            lookup,
            regions: Vec::new(),
            selected: None,
            output: None,
            loading: false,
        }
    }

    pub fn stage(&self) -> Stage {
        if self.output.is_some() {
            Stage::ResultShown
        } else if self.selected.is_some() {
            Stage::RegionSelected
        } else {
            Stage::Idle
        }
    }

    pub fn output_text(&self) -> String {
        self.output
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Window settings from the config, carrying the lookup into `Application::new`.
pub fn settings(config: &Config, lookup: Lookup) -> Settings<Flags> {
    Settings {
        window: window::Settings {
            size: Size::new(config.window.width as f32, config.window.height as f32),
            ..window::Settings::default()
        },
        ..Settings::with_flags(Flags { lookup })
    }
}

async fn load_regions(client: JmaClient) -> Vec<Region> {
    let regions = weather::regions_from(&client.regions_or_empty().await);
    tracing::info!("Loaded {} regions", regions.len());
    regions
}

impl Application for WeatherApp {
    type Message = Message;
    type Theme = Theme;
    type Executor = iced::executor::Default;
    type Flags = Flags;

    fn new(flags: Flags) -> (WeatherApp, Command<Message>) {
        let app = WeatherApp::with_lookup(flags.lookup);
        let command = Command::perform(
            load_regions(app.lookup.client().clone()),
            Message::RegionsLoaded,
        );
        (app, command)
    }

    fn title(&self) -> String {
        if self.lookup.is_cached() {
            String::from("Weather Forecast (cached)")
        } else {
            String::from("Weather Forecast")
        }
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::RegionsLoaded(regions) => {
                self.regions = regions;
                Command::none()
            }
            Message::RegionSelected(region) => {
                self.selected = Some(region);
                Command::none()
            }
            Message::FetchPressed => {
                if self.loading {
                    return Command::none();
                }
                let Some(region) = &self.selected else {
                    self.output = Some(DisplayText::Prompt);
                    return Command::none();
                };

                self.loading = true;
                let lookup = self.lookup.clone();
                let code = region.code.clone();
                Command::perform(
                    async move { lookup.run(Some(&code)).await },
                    Message::ForecastReady,
                )
            }
            Message::ForecastReady(shown) => {
                self.loading = false;
                self.output = Some(shown);
                Command::none()
            }
        }
    }

    fn view(&self) -> Element<Message> {
        view::view(self)
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}
