//! Placeholder weather source.

use std::future::Future;

use gardenhub_app::ports::WeatherProvider;
use gardenhub_domain::advisory::WeatherContext;
use gardenhub_domain::error::GardenHubError;

/// Always reports an unknown forecast for the requested location.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedWeather;

impl WeatherProvider for FixedWeather {
    fn current(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<WeatherContext, GardenHubError>> + Send {
        let context = WeatherContext::unknown(location);
        async move { Ok(context) }
    }
}
