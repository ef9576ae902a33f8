use anyhow::Context;
use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::{error::AppError, state::AppState};

/// Business counters exported at `/metrics`.
pub struct Metrics {
    registry: Registry,
    pub magic_links: IntCounter,
    pub logins: IntCounter,
    pub reservations: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let magic_links = IntCounter::new("istore_magic_links_total", "Magic links issued")?;
        let logins = IntCounter::new("istore_logins_total", "Magic links redeemed for a session")?;
        let reservations = IntCounterVec::new(
            Opts::new("istore_reservations_total", "Reservation attempts by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(magic_links.clone()))?;
        registry.register(Box::new(logins.clone()))?;
        registry.register(Box::new(reservations.clone()))?;

        Ok(Self { registry, magic_links, logins, reservations })
    }

    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("encoding metrics")?;
        String::from_utf8(buffer).context("metrics are not utf-8")
    }
}

pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
