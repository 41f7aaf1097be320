//! State holders behind each screen. Each one owns the observable state of
//! its screen and launches the work that updates it.

pub mod city_list;
pub mod job;
pub mod weather;
pub mod weather_list;

pub use city_list::CityListViewModel;
pub use weather::{WeatherRequest, WeatherViewModel};
pub use weather_list::WeatherListViewModel;
