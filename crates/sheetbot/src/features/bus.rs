//! Bus arrivals (LTA DataMall) and saved stops

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use sheetcore::params::{get_arg, Parameter};
use sheetcore::utils::{code, escape_markdown_v2};
use sheetcore::{
    AppError, AppResult, Button, Cell, Command, CommandHandler, DispatchContext, Feature, Reply, RowStore,
    SheetBackend,
};

use crate::config;

const USER_COLUMN: usize = 1;

/// Upcoming buses for one service at a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArrival {
    pub service_no: String,
    pub arrivals: Vec<DateTime<FixedOffset>>,
}

/// Where bus arrival times come from.
#[async_trait]
pub trait BusArrivalSource: Send + Sync {
    async fn arrivals(&self, stop_code: &str) -> AppResult<Vec<ServiceArrival>>;
}

#[derive(Debug, Deserialize)]
struct ArrivalResponse {
    #[serde(rename = "Services", default)]
    services: Vec<ServiceResponse>,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(rename = "ServiceNo")]
    service_no: String,
    #[serde(rename = "NextBus")]
    next_bus: Option<NextBus>,
    #[serde(rename = "NextBus2")]
    next_bus_2: Option<NextBus>,
    #[serde(rename = "NextBus3")]
    next_bus_3: Option<NextBus>,
}

#[derive(Debug, Deserialize)]
struct NextBus {
    #[serde(rename = "EstimatedArrival", default)]
    estimated_arrival: String,
}

fn parse_arrivals(body: &str) -> AppResult<Vec<ServiceArrival>> {
    let response: ArrivalResponse = serde_json::from_str(body)?;
    let mut services: Vec<ServiceArrival> = response
        .services
        .into_iter()
        .map(|service| {
            let arrivals = [service.next_bus, service.next_bus_2, service.next_bus_3]
                .into_iter()
                .flatten()
                .filter_map(|bus| DateTime::parse_from_rfc3339(&bus.estimated_arrival).ok())
                .collect();
            ServiceArrival {
                service_no: service.service_no,
                arrivals,
            }
        })
        .collect();
    services.sort_by_key(|s| service_sort_key(&s.service_no));
    Ok(services)
}

/// Numeric part first, then suffix: 2, 10, 10e, 186.
fn service_sort_key(service_no: &str) -> (u32, String) {
    let digits: String = service_no.chars().take_while(char::is_ascii_digit).collect();
    (digits.parse().unwrap_or(u32::MAX), service_no.to_string())
}

/// LTA DataMall `BusArrival` client.
pub struct LtaClient {
    http: reqwest::Client,
    url: String,
    account_key: String,
}

impl LtaClient {
    pub fn new(url: impl Into<String>, account_key: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()
            .map_err(|e| AppError::External(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.into(),
            account_key: account_key.into(),
        })
    }

    pub fn from_env() -> AppResult<Self> {
        if config::LTA_ACCOUNT_KEY.is_empty() {
            log::warn!("LTA_ACCOUNT_KEY is not set, bus arrivals will fail");
        }
        Self::new(config::LTA_API_URL.as_str(), config::LTA_ACCOUNT_KEY.as_str())
    }
}

#[async_trait]
impl BusArrivalSource for LtaClient {
    async fn arrivals(&self, stop_code: &str) -> AppResult<Vec<ServiceArrival>> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("BusStopCode", stop_code)])
            .header("AccountKey", &self.account_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::External(format!("bus arrival request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::External(format!("bus arrival API returned {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::External(format!("bus arrival body unreadable: {}", e)))?;
        parse_arrivals(&body)
    }
}

/// Minutes until each arrival, `Arr` for buses already due.
pub fn format_arrivals(stop_code: &str, services: &[ServiceArrival], now: DateTime<Utc>) -> String {
    if services.is_empty() {
        return format!("No buses are serving stop {} right now", code(stop_code));
    }

    let mut text = format!("*Bus stop* {}\n", code(stop_code));
    for service in services {
        let times: Vec<String> = service
            .arrivals
            .iter()
            .map(|eta| {
                let minutes = eta.with_timezone(&Utc).signed_duration_since(now).num_minutes();
                if minutes <= 0 {
                    "Arr".to_string()
                } else {
                    format!("{} min", minutes)
                }
            })
            .collect();
        let times = if times.is_empty() {
            "no estimate".to_string()
        } else {
            times.join(", ")
        };
        text.push_str(&format!("\n{}  {}", code(&service.service_no), escape_markdown_v2(&times)));
    }
    text
}

fn stop_code(raw: &str) -> Result<String, String> {
    if raw.len() == 5 && raw.chars().all(|c| c.is_ascii_digit()) {
        Ok(raw.to_string())
    } else {
        Err(format!(
            "{} is not a bus stop code\\. A code has 5 digits, e\\.g\\. {}\\. Try again:",
            code(raw),
            code("83139")
        ))
    }
}

fn stop_parameter() -> Parameter<String> {
    Parameter::new("stop_code", "Which bus stop? Send its 5\\-digit code:", stop_code)
}

/// Outcome of saving a stop.
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
    Full,
}

/// Saved stops, one variable-width row per user: `[user_id, code, code, ...]`.
#[derive(Clone)]
pub struct FavouriteStops {
    table: RowStore,
}

impl FavouriteStops {
    pub fn new(backend: Arc<dyn SheetBackend>) -> Self {
        Self {
            table: RowStore::new(backend, config::sheets::BUS_FAVOURITES, config::sheets::BUS_FAVOURITES_HEADERS),
        }
    }

    pub fn list(&self, user_id: i64) -> AppResult<Vec<String>> {
        let row = self.table.read_row(USER_COLUMN, &user_id.to_string())?;
        Ok(row
            .map(|row| {
                row.iter()
                    .skip(1)
                    .map(Cell::to_string)
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn add(&self, user_id: i64, stop_code: &str) -> AppResult<SaveOutcome> {
        let mut codes = self.list(user_id)?;
        if codes.iter().any(|c| c == stop_code) {
            return Ok(SaveOutcome::AlreadySaved);
        }
        if codes.len() >= config::bus::MAX_FAVOURITES {
            return Ok(SaveOutcome::Full);
        }
        codes.push(stop_code.to_string());
        self.write(user_id, &codes)?;
        Ok(SaveOutcome::Saved)
    }

    pub fn remove(&self, user_id: i64, stop_code: &str) -> AppResult<bool> {
        let mut codes = self.list(user_id)?;
        let before = codes.len();
        codes.retain(|c| c != stop_code);
        if codes.len() == before {
            return Ok(false);
        }
        if codes.is_empty() {
            self.table.delete_row(USER_COLUMN, &user_id.to_string())?;
        } else {
            self.write(user_id, &codes)?;
        }
        Ok(true)
    }

    fn write(&self, user_id: i64, codes: &[String]) -> AppResult<()> {
        let mut row = vec![Cell::Int(user_id)];
        row.extend(codes.iter().map(|c| Cell::from(c.as_str())));
        self.table.update_row(USER_COLUMN, &user_id.to_string(), row)?;
        Ok(())
    }
}

pub struct BusStop {
    source: Arc<dyn BusArrivalSource>,
}

#[async_trait]
impl CommandHandler for BusStop {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let Some(stop) = get_arg(command, ctx, &stop_parameter()).await? else {
            return Ok(());
        };

        match self.source.arrivals(&stop).await {
            Ok(services) => {
                let text = format_arrivals(&stop, &services, Utc::now());
                let buttons = vec![
                    Button::new("🔄 Refresh", format!("/bus bus_stop {}", stop)),
                    Button::new("⭐ Save stop", format!("/bus save {}", stop)),
                ];
                ctx.reply(Reply::text(text).with_buttons(buttons)).await
            }
            Err(e) => {
                log::error!("Bus arrivals for {} failed: {}", stop, e);
                ctx.say("Bus arrival times are unavailable right now\\. Please try again later\\.")
                    .await
            }
        }
    }
}

pub struct SaveStop {
    favourites: FavouriteStops,
}

#[async_trait]
impl CommandHandler for SaveStop {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let Some(stop) = get_arg(command, ctx, &stop_parameter()).await? else {
            return Ok(());
        };
        let text = match self.favourites.add(ctx.user.id, &stop)? {
            SaveOutcome::Saved => format!("Saved stop {}", code(&stop)),
            SaveOutcome::AlreadySaved => format!("Stop {} is already saved", code(&stop)),
            SaveOutcome::Full => format!(
                "You can save at most {} stops\\. Remove one with /bus forget first\\.",
                config::bus::MAX_FAVOURITES
            ),
        };
        ctx.say(text).await
    }
}

pub struct ForgetStop {
    favourites: FavouriteStops,
}

#[async_trait]
impl CommandHandler for ForgetStop {
    async fn handle(&self, command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let Some(stop) = get_arg(command, ctx, &stop_parameter()).await? else {
            return Ok(());
        };
        if self.favourites.remove(ctx.user.id, &stop)? {
            ctx.say(format!("Removed stop {}", code(&stop))).await
        } else {
            ctx.say(format!("Stop {} was not saved", code(&stop))).await
        }
    }
}

pub struct SavedStops {
    favourites: FavouriteStops,
}

#[async_trait]
impl CommandHandler for SavedStops {
    async fn handle(&self, _command: &mut Command, ctx: &DispatchContext<'_>) -> AppResult<()> {
        let codes = self.favourites.list(ctx.user.id)?;
        if codes.is_empty() {
            return ctx
                .say("No saved stops yet\\. Save one with /bus save")
                .await;
        }
        let buttons = codes
            .iter()
            .map(|c| Button::new(format!("🚏 {}", c), format!("/bus bus_stop {}", c)))
            .collect();
        ctx.reply(Reply::text("*Saved stops*\nTap one for arrivals:").with_buttons(buttons))
            .await
    }
}

pub fn feature(source: Arc<dyn BusArrivalSource>, favourites: FavouriteStops) -> Feature {
    Feature::branch(
        "bus",
        "Bus arrivals",
        vec![
            Feature::leaf(
                "bus_stop",
                "Arrival times at a stop",
                "/bus bus_stop <5-digit stop code>",
                Arc::new(BusStop { source }),
            )
            .with_button("🚏 Arrivals", "/bus bus_stop"),
            Feature::leaf(
                "saved",
                "Your saved stops",
                "/bus saved",
                Arc::new(SavedStops {
                    favourites: favourites.clone(),
                }),
            )
            .with_button("⭐ Saved stops", "/bus saved"),
            Feature::leaf(
                "save",
                "Save a stop",
                "/bus save <stop code>",
                Arc::new(SaveStop {
                    favourites: favourites.clone(),
                }),
            ),
            Feature::leaf(
                "forget",
                "Remove a saved stop",
                "/bus forget <stop code>",
                Arc::new(ForgetStop { favourites }),
            ),
        ],
    )
    .with_button("🚌 Bus", "/bus")
}
