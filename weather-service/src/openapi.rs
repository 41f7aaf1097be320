use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{
    Address, AirNow, CityInfo, DailyForecast, DeviceLocation, HourlyForecast, LocationBean,
    LocationUpdate, NewCity, SelectedCity, WeatherModel, WeatherNow,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_weather,
        handlers::current_weather,
        handlers::update_location,
        handlers::list_cities,
        handlers::selected_city,
        handlers::add_city,
        handlers::select_city,
        handlers::delete_city,
        handlers::geo_lookup,
        handlers::geo_top,
    ),
    components(schemas(
        WeatherModel,
        WeatherNow,
        HourlyForecast,
        DailyForecast,
        AirNow,
        LocationBean,
        CityInfo,
        NewCity,
        SelectedCity,
        DeviceLocation,
        Address,
        LocationUpdate,
    )),
    tags(
        (name = "weather", description = "Weather detail"),
        (name = "cities", description = "Saved cities and location updates"),
        (name = "geo", description = "City search"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
