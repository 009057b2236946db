//! [Octopus Energy](https://developer.octopus.energy/docs/api/) client.

pub mod account;
pub mod models;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use self::{
    account::{
        ACCOUNT_QUERY,
        Account,
        AccountData,
        AccountVariables,
        OBTAIN_TOKEN_QUERY,
        ObtainTokenData,
        ObtainTokenVariables,
        Request,
        Response,
        STATIC_RATES_ACCOUNT_QUERY,
    },
    models::{Page, Product, RawConsumption, RawStandingCharge},
};
use crate::{
    api::{client, supplier::Supplier},
    core::{
        consumption::Consumption,
        interval::Interval,
        meter::Meter,
        night::{merge_day_night, now_in},
        normalize::{clip_consumption, to_half_hourly},
        rate::{Rate, RawRate, StandingCharge},
        tariff::{Fuel, TariffCode},
    },
    prelude::*,
};

pub struct Api {
    client: Client,
    base_url: Url,
    api_key: String,
    account_query: &'static str,

    /// Local timezone of the traditional Economy 7 meters.
    timezone: Tz,
}

impl Api {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.octopus.energy";

    pub fn try_new(api_key: String, base_url: Url, timezone: Tz) -> Result<Self> {
        ensure!(!api_key.is_empty(), "API key is not set");
        Ok(Self { client: client::try_new()?, base_url, api_key, account_query: ACCOUNT_QUERY, timezone })
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Also query the tariffs' static unit rates and standing charges with the account.
    #[must_use]
    pub const fn with_static_rates(mut self) -> Self {
        self.account_query = STATIC_RATES_ACCOUNT_QUERY;
        self
    }

    #[instrument(skip_all, fields(account_number = account_number))]
    pub async fn get_account(&self, account_number: &str) -> Result<Option<Account>> {
        let url = self.endpoint(&["v1", "graphql", ""])?;

        let request = Request {
            query: OBTAIN_TOKEN_QUERY,
            variables: ObtainTokenVariables { api_key: &self.api_key },
        };
        let Some(token) = self
            .read_json::<Response<ObtainTokenData>>(self.client.post(url.clone()).json(&request), &url)
            .await?
            .and_then(Response::into_data)
        else {
            error!("Failed to retrieve auth token");
            return Ok(None);
        };

        let request = Request { query: self.account_query, variables: AccountVariables { account_number } };
        let request = self
            .client
            .post(url.clone())
            .header("Authorization", format!("JWT {}", token.obtain_kraken_token.token))
            .json(&request);
        let Some(data) =
            self.read_json::<Response<AccountData>>(request, &url).await?.and_then(Response::into_data)
        else {
            error!("Failed to retrieve account");
            return Ok(None);
        };
        let account = Account::from(data.account);
        info!(
            n_electricity_meter_points = account.electricity_meter_points.len(),
            n_gas_meter_points = account.gas_meter_points.len(),
            "Fetched",
        );
        Ok(Some(account))
    }

    #[instrument(skip_all, fields(is_variable = is_variable))]
    pub async fn get_products(&self, is_variable: bool) -> Result<Vec<Product>> {
        let mut url = self.endpoint(&["v1", "products", ""])?;
        url.query_pairs_mut().append_pair("is_variable", &is_variable.to_string());
        Ok(self.get_pages(url).await?.unwrap_or_default())
    }

    /// Fetch the unit rates of the kind (`standard`, `day` or `night`) on the half-hourly grid.
    #[instrument(skip_all, fields(tariff_code = %tariff_code, kind = kind))]
    async fn get_unit_rates(
        &self,
        fuel: Fuel,
        tariff_code: &TariffCode,
        kind: &str,
        period: Interval,
    ) -> Result<Option<Vec<Rate>>> {
        let url = self.tariff_endpoint(fuel, tariff_code, &format!("{kind}-unit-rates"), period)?;
        let Some(raw_rates) = self.get_pages::<RawRate>(url.clone()).await? else {
            return Ok(None);
        };
        to_half_hourly(&raw_rates, period, tariff_code)
            .with_context(|| format!("failed to extract {kind} rates: {url}"))
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(url = %url))]
    async fn get_pages<T: DeserializeOwned>(&self, url: Url) -> Result<Option<Vec<T>>> {
        let mut results = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next {
            let request = self.client.get(url.clone()).basic_auth(&self.api_key, None::<&str>);
            let Some(page) = self.read_json::<Page<T>>(request, &url).await? else {
                return Ok(None);
            };
            results.extend(page.results);
            next = page
                .next
                .map(|next| Url::parse(&next))
                .transpose()
                .with_context(|| format!("invalid next page URL: {url}"))?;
        }
        debug!(n_results = results.len(), "Fetched");
        Ok(Some(results))
    }

    /// Send the request and parse the response body.
    ///
    /// Error statuses are logged and treated as no data.
    async fn read_json<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<Option<R>> {
        let response = request.send().await.with_context(|| format!("failed to call `{url}`"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("failed to read the response: {url}"))?;
        if status.is_client_error() || status.is_server_error() {
            error!(%url, %status, %text, "Request failed");
            return Ok(None);
        }
        trace!(%url, %text, "Received");
        serde_json::from_str(&text)
            .with_context(|| format!("failed to extract response JSON: {url}; {text}"))
            .map(Some)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn tariff_endpoint(
        &self,
        fuel: Fuel,
        tariff_code: &TariffCode,
        resource: &str,
        period: Interval,
    ) -> Result<Url> {
        let mut url = self.endpoint(&[
            "v1",
            "products",
            tariff_code.product_code(),
            fuel.tariffs_segment(),
            tariff_code.as_str(),
            resource,
        ])?;
        url.query_pairs_mut()
            .append_pair("period_from", &format_timestamp(period.start))
            .append_pair("period_to", &format_timestamp(period.end));
        Ok(url)
    }
}

#[async_trait]
impl Supplier for Api {
    async fn get_electricity_rates(
        &self,
        tariff_code: &TariffCode,
        is_smart_meter: bool,
        period: Interval,
    ) -> Result<Option<Vec<Rate>>> {
        if tariff_code.is_single_rate() {
            return self.get_unit_rates(Fuel::Electricity, tariff_code, "standard", period).await;
        }
        let Some(day_rates) =
            self.get_unit_rates(Fuel::Electricity, tariff_code, "day", period).await?
        else {
            return Ok(None);
        };
        let Some(night_rates) =
            self.get_unit_rates(Fuel::Electricity, tariff_code, "night", period).await?
        else {
            return Ok(None);
        };
        let rates = merge_day_night(day_rates, night_rates, is_smart_meter, &now_in(&self.timezone));
        debug!(n_rates = rates.len(), "Combined day and night rates");
        Ok(Some(rates))
    }

    async fn get_gas_rates(
        &self,
        tariff_code: &TariffCode,
        period: Interval,
    ) -> Result<Option<Vec<Rate>>> {
        self.get_unit_rates(Fuel::Gas, tariff_code, "standard", period).await
    }

    #[instrument(skip_all, fields(fuel = ?fuel, tariff_code = %tariff_code))]
    async fn get_standing_charge(
        &self,
        fuel: Fuel,
        tariff_code: &TariffCode,
        period: Interval,
    ) -> Result<Option<StandingCharge>> {
        let url = self.tariff_endpoint(fuel, tariff_code, "standing-charges", period)?;
        let request = self.client.get(url.clone()).basic_auth(&self.api_key, None::<&str>);
        let Some(page) = self.read_json::<Page<RawStandingCharge>>(request, &url).await? else {
            return Ok(None);
        };
        Ok(page.results.into_iter().next().map(StandingCharge::from))
    }

    #[instrument(skip_all, fields(meter = %meter))]
    async fn get_consumption(
        &self,
        meter: &Meter,
        period: Interval,
    ) -> Result<Option<Vec<Consumption>>> {
        let mut url = self.endpoint(&[
            "v1",
            meter.fuel.meter_points_segment(),
            meter.point.as_str(),
            "meters",
            meter.serial_number.as_str(),
            "consumption",
        ])?;
        url.query_pairs_mut()
            .append_pair("period_from", &format_timestamp(period.start))
            .append_pair("period_to", &format_timestamp(period.end));
        let Some(raw) = self.get_pages::<RawConsumption>(url).await? else {
            return Ok(None);
        };
        let consumption = clip_consumption(raw.into_iter().map(Consumption::from).collect(), period);
        info!(n_intervals = consumption.len(), "Fetched");
        Ok(Some(consumption))
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
