use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::Config;
use crate::exchange::{ExchangeGateway, OrderRequest, OrderResult, OrderSide};
use crate::models::PriceSeries;

const BASE_URL: &str = "https://www.okx.com";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(100);
const PRICE_FETCH_RETRIES: usize = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct OkxResponse<T> {
    code: String,
    msg: String,
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    last: String,
}

#[derive(Debug, Deserialize)]
struct BalanceData {
    details: Vec<BalanceDetail>,
}

#[derive(Debug, Deserialize)]
struct BalanceDetail {
    ccy: String,
    #[serde(rename = "availBal")]
    avail_bal: String,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    #[serde(rename = "ordId")]
    ord_id: String,
    #[serde(rename = "sCode")]
    s_code: String,
    #[serde(rename = "sMsg", default)]
    s_msg: String,
}

/// OKX v5 REST client for one spot pair. Private endpoints are signed
/// with HMAC-SHA256 over `timestamp + method + path + body`, base64
/// encoded; market-data endpoints go unsigned.
pub struct OkxClient {
    client: Client,
    api_key: String,
    api_secret: String,
    passphrase: String,
    symbol: String,
    simulated: bool,
    last_request: Option<Instant>,
    cache: HashMap<String, (Instant, PriceSeries)>,
    cache_ttl: Duration,
}

impl OkxClient {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: cfg.okx_api_key.clone(),
            api_secret: cfg.okx_api_secret.clone(),
            passphrase: cfg.okx_passphrase.clone(),
            symbol: cfg.symbol.clone(),
            simulated: cfg.simulated_trading,
            last_request: None,
            cache: HashMap::new(),
            cache_ttl: Duration::from_secs(5),
        }
    }

    fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String> {
        let prehash = format!("{timestamp}{method}{path}{body}");
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes())
            .context("invalid API secret")?;
        mac.update(prehash.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    fn auth_headers(
        &self,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let sign = self.sign(&timestamp, method, path, body)?;

        let mut headers = vec![
            ("OK-ACCESS-KEY", self.api_key.clone()),
            ("OK-ACCESS-SIGN", sign),
            ("OK-ACCESS-TIMESTAMP", timestamp),
            ("OK-ACCESS-PASSPHRASE", self.passphrase.clone()),
        ];
        if self.simulated {
            headers.push(("x-simulated-trading", "1".to_string()));
        }
        Ok(headers)
    }

    async fn rate_limit(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    async fn fetch_ticker(&mut self) -> Result<f64> {
        self.rate_limit().await;

        let resp = self
            .client
            .get(format!("{}/api/v5/market/ticker", BASE_URL))
            .query(&[("instId", self.symbol.as_str())])
            .send()
            .await
            .context("failed to fetch ticker")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("OKX ticker error {}: {}", status, body);
        }

        let data: OkxResponse<TickerData> =
            resp.json().await.context("failed to parse ticker")?;
        if data.code != "0" {
            bail!("OKX ticker rejected: {} {}", data.code, data.msg);
        }

        data.data
            .first()
            .and_then(|t| t.last.parse::<f64>().ok())
            .context("no last price in ticker response")
    }

    async fn fetch_candles(&mut self, hours: usize) -> Result<PriceSeries> {
        let cache_key = format!("{}_{}", self.symbol, hours);
        if let Some((cached_at, series)) = self.cache.get(&cache_key) {
            if cached_at.elapsed() < self.cache_ttl {
                return Ok(series.clone());
            }
        }

        self.rate_limit().await;

        let limit = hours.to_string();
        let resp = self
            .client
            .get(format!("{}/api/v5/market/candles", BASE_URL))
            .query(&[
                ("instId", self.symbol.as_str()),
                ("bar", "1H"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("failed to fetch candles")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("OKX candle error {}: {}", status, body);
        }

        // Rows are [ts, o, h, l, c, vol, ...], newest first.
        let data: OkxResponse<Vec<String>> =
            resp.json().await.context("failed to parse candles")?;
        if data.code != "0" {
            bail!("OKX candles rejected: {} {}", data.code, data.msg);
        }

        let mut rows: Vec<(i64, f64)> = data
            .data
            .iter()
            .filter_map(|row| {
                let ts = row.first()?.parse::<i64>().ok()?;
                let close = row.get(4)?.parse::<f64>().ok()?;
                Some((ts, close))
            })
            .collect();
        rows.sort_by_key(|(ts, _)| *ts);

        let series = PriceSeries::new(rows.into_iter().map(|(_, c)| c).collect());
        self.cache
            .insert(cache_key, (Instant::now(), series.clone()));
        Ok(series)
    }
}

#[async_trait]
impl ExchangeGateway for OkxClient {
    async fn get_current_price(&mut self) -> Result<f64> {
        let mut delay = RETRY_BASE_DELAY;
        let mut last_err = None;

        for attempt in 1..=PRICE_FETCH_RETRIES {
            match self.fetch_ticker().await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    warn!(
                        "Price fetch failed (attempt {}/{}): {}",
                        attempt, PRICE_FETCH_RETRIES, e
                    );
                    last_err = Some(e);
                    if attempt < PRICE_FETCH_RETRIES {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_err.unwrap()).context("price fetch exhausted retries")
    }

    async fn get_price_history(&mut self, hours: usize) -> Result<PriceSeries> {
        self.fetch_candles(hours).await
    }

    async fn get_balance(&mut self) -> Result<f64> {
        self.rate_limit().await;

        let quote_ccy = self
            .symbol
            .split('-')
            .nth(1)
            .unwrap_or("USDT")
            .to_string();
        let path = format!("/api/v5/account/balance?ccy={quote_ccy}");
        let headers = self.auth_headers("GET", &path, "")?;

        let mut req = self.client.get(format!("{BASE_URL}{path}"));
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let resp = req.send().await.context("failed to fetch balance")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("OKX balance error {}: {}", status, body);
        }

        let data: OkxResponse<BalanceData> =
            resp.json().await.context("failed to parse balance")?;
        if data.code != "0" {
            bail!("OKX balance rejected: {} {}", data.code, data.msg);
        }

        data.data
            .first()
            .and_then(|b| b.details.iter().find(|d| d.ccy == quote_ccy))
            .and_then(|d| d.avail_bal.parse::<f64>().ok())
            .context("no quote balance in response")
    }

    async fn place_order(&mut self, order: &OrderRequest) -> Result<OrderResult> {
        self.rate_limit().await;

        let path = "/api/v5/trade/order";
        let body = serde_json::json!({
            "instId": self.symbol,
            "tdMode": "cash",
            "side": match order.side {
                OrderSide::Buy => "buy",
                OrderSide::Sell => "sell",
            },
            "ordType": "market",
            "sz": format!("{:.8}", order.size),
        })
        .to_string();

        let headers = self.auth_headers("POST", path, &body)?;
        let mut req = self
            .client
            .post(format!("{BASE_URL}{path}"))
            .header("Content-Type", "application/json")
            .body(body);
        for (name, value) in headers {
            req = req.header(name, value);
        }

        let resp = req.send().await.context("failed to place order")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("OKX order error {}: {}", status, body);
        }

        let data: OkxResponse<OrderData> =
            resp.json().await.context("failed to parse order response")?;
        let first = data
            .data
            .first()
            .context("empty order response")?;
        if data.code != "0" || first.s_code != "0" {
            bail!(
                "OKX order rejected: {} {} {}",
                data.code,
                first.s_code,
                first.s_msg
            );
        }

        debug!(
            "Order placed: {} {} {} @ ref {:.2}",
            order.side, order.size, self.symbol, order.reference_price
        );
        Ok(OrderResult {
            order_id: first.ord_id.clone(),
        })
    }
}
