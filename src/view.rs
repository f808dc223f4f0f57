use crate::app::{Message, WeatherApp};
use crate::lookup::DisplayText;
use iced::{
    theme,
    widget::{button, column, container, pick_list, text},
    Alignment, Color, Element, Length,
};

pub const REGION_PLACEHOLDER: &str = "select a region";
pub const FETCH_LABEL: &str = "fetch weather";

pub fn view(app: &WeatherApp) -> Element<Message> {
    let heading = text("Weather Forecast").size(30);

    let region_picker = pick_list(
        app.regions.as_slice(),
        app.selected.clone(),
        Message::RegionSelected,
    )
    .placeholder(REGION_PLACEHOLDER)
    .padding(8)
    .width(Length::Fixed(300.0));

    // Disabled while a lookup is in flight
    let fetch_button = button(text(FETCH_LABEL).size(14))
        .padding([8, 16])
        .style(theme::Button::Primary);
    let fetch_button = if app.loading {
        fetch_button
    } else {
        fetch_button.on_press(Message::FetchPressed)
    };

    let content = column![heading, region_picker, fetch_button, create_output(app)]
        .spacing(20)
        .padding(20)
        .align_items(Alignment::Start);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn create_output(app: &WeatherApp) -> Element<Message> {
    if app.loading {
        return text("Loading weather data...")
            .size(18)
            .style(Color::from_rgb(0.5, 0.5, 0.5))
            .into();
    }

    match &app.output {
        Some(DisplayText::Unavailable) => text(app.output_text())
            .size(20)
            .style(Color::from_rgb(0.8, 0.2, 0.2))
            .into(),
        _ => text(app.output_text()).size(20).into(),
    }
}
