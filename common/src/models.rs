use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Current conditions as reported by the provider's `now` query
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherNow {
    pub obs_time: String,
    pub temp: String,
    pub feels_like: String,
    pub icon: String,
    pub text: String,
    pub wind360: String,
    pub wind_dir: String,
    pub wind_scale: String,
    pub wind_speed: String,
    pub humidity: String,
    pub precip: String,
    pub pressure: String,
    pub vis: String,
    pub cloud: String,
    pub dew: String,
}

/// One entry of the 24-hour forecast
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HourlyForecast {
    pub fx_time: String,
    pub temp: String,
    pub icon: String,
    pub text: String,
    pub wind360: String,
    pub wind_dir: String,
    pub wind_scale: String,
    pub wind_speed: String,
    pub humidity: String,
    pub pop: String,
    pub precip: String,
    pub pressure: String,
    pub cloud: String,
    pub dew: String,
}

/// One day of the 7-day forecast
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyForecast {
    pub fx_date: String,
    pub sunrise: String,
    pub sunset: String,
    pub moonrise: String,
    pub moonset: String,
    pub moon_phase: String,
    pub temp_max: String,
    pub temp_min: String,
    pub icon_day: String,
    pub text_day: String,
    pub icon_night: String,
    pub text_night: String,
    pub wind_dir_day: String,
    pub wind_scale_day: String,
    pub humidity: String,
    pub precip: String,
    pub pressure: String,
    pub vis: String,
    pub uv_index: String,
}

/// Real-time air quality snapshot
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AirNow {
    pub pub_time: String,
    pub aqi: String,
    pub level: String,
    pub category: String,
    pub primary: String,
    pub pm10: String,
    pub pm2p5: String,
    pub no2: String,
    pub so2: String,
    pub co: String,
    pub o3: String,
}

/// Everything the weather detail screen shows for one location
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherModel {
    pub now: WeatherNow,
    pub hourly: Vec<HourlyForecast>,
    /// Today's entry of `dailyList`, if the provider returned any days
    pub daily: Option<DailyForecast>,
    pub daily_list: Vec<DailyForecast>,
    pub air_now: AirNow,
}

/// City search result from the geo API
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationBean {
    pub name: String,
    pub id: String,
    pub lat: String,
    pub lon: String,
    pub adm2: String,
    pub adm1: String,
    pub country: String,
    pub tz: String,
    pub utc_offset: String,
    pub is_dst: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rank: String,
    pub fx_link: String,
}

/// Cached blob of the top city list
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GeoCache {
    pub list: Vec<LocationBean>,
}

/// Persisted city record
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct CityInfo {
    pub uid: i64,
    pub location_id: String,
    pub name: String,
    pub province: String,
    pub city: String,
    pub is_location: bool,
    pub is_index: bool,
    pub created_at: DateTime<Utc>,
}

/// City insert request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct NewCity {
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
}

impl From<&LocationBean> for NewCity {
    fn from(bean: &LocationBean) -> Self {
        Self {
            location_id: bean.id.clone(),
            name: bean.name.clone(),
            province: bean.adm1.clone(),
            city: bean.adm2.clone(),
        }
    }
}

/// Currently selected city and its position in the list
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectedCity {
    pub index: usize,
    pub city: Option<CityInfo>,
}

/// Device position reported by the platform location service
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, ToSchema)]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl DeviceLocation {
    /// Coordinates in the provider's `lon,lat` form
    pub fn location_id(&self) -> String {
        format!("{:.2},{:.2}", self.longitude, self.latitude)
    }
}

/// Reverse-geocoded address for a device position
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(default)]
pub struct Address {
    pub locality: Option<String>,
    pub sub_locality: Option<String>,
    pub admin_area: Option<String>,
    pub country_name: Option<String>,
    pub feature_name: Option<String>,
}

/// Location update request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LocationUpdate {
    #[serde(flatten)]
    pub location: DeviceLocation,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_id_uses_lon_lat_order() {
        let location = DeviceLocation {
            latitude: 39.904_2,
            longitude: 116.407_4,
        };
        assert_eq!(location.location_id(), "116.41,39.90");
    }

    #[test]
    fn test_location_bean_parses_provider_json() {
        let bean: LocationBean = serde_json::from_str(
            r#"{"name":"北京","id":"101010100","lat":"39.90","lon":"116.40",
                "adm2":"北京","adm1":"北京市","country":"中国","type":"city","rank":"10"}"#,
        )
        .unwrap();
        assert_eq!(bean.kind, "city");
        assert_eq!(bean.tz, "");

        let city = NewCity::from(&bean);
        assert_eq!(city.location_id, "101010100");
        assert_eq!(city.province, "北京市");
    }

    #[test]
    fn test_weather_model_uses_camel_case_throughout() {
        let model = WeatherModel {
            daily_list: vec![DailyForecast {
                fx_date: "2024-05-01".to_string(),
                ..Default::default()
            }],
            air_now: AirNow {
                aqi: "42".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["dailyList"][0]["fxDate"], "2024-05-01");
        assert_eq!(json["airNow"]["aqi"], "42");
        assert!(json["now"].get("obsTime").is_some());
        assert!(json.get("daily_list").is_none());
        assert!(json.get("air_now").is_none());
    }
}
