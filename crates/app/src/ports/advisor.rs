//! Advisory ports: the external decision service and the weather source.

use std::future::Future;

use gardenhub_domain::advisory::{AdvisorResponse, AdvisoryRequest, WeatherContext};
use gardenhub_domain::error::GardenHubError;

/// External decision function consulted by the advisory job.
pub trait Advisor {
    /// Ask for a decision about one device.
    fn advise(
        &self,
        request: AdvisoryRequest,
    ) -> impl Future<Output = Result<AdvisorResponse, GardenHubError>> + Send;
}

impl<T: Advisor + Send + Sync> Advisor for std::sync::Arc<T> {
    fn advise(
        &self,
        request: AdvisoryRequest,
    ) -> impl Future<Output = Result<AdvisorResponse, GardenHubError>> + Send {
        (**self).advise(request)
    }
}

/// Source of the weather context passed to the advisor.
pub trait WeatherProvider {
    /// Current conditions and forecast for `location`.
    fn current(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<WeatherContext, GardenHubError>> + Send;
}

impl<T: WeatherProvider + Send + Sync> WeatherProvider for std::sync::Arc<T> {
    fn current(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<WeatherContext, GardenHubError>> + Send {
        (**self).current(location)
    }
}
