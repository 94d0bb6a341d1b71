use anyhow::Result;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use pattern_trading_bot::config::SharedConfig;
use pattern_trading_bot::core::stop_loss::{self, DEFAULT_VOLATILITY};
use pattern_trading_bot::exchange::{ExchangeGateway, OrderRequest, OrderSide};
use pattern_trading_bot::models::{DayOfWeek, Direction, ExitReason, Position};
use pattern_trading_bot::stats::{PatternStats, StatsRepository, VolatilityMap};
use pattern_trading_bot::strategies::{DecisionEngine, SkipReason, TradeDecision};
use pattern_trading_bot::trading::{summarize, ExitCheck, PositionManager, PositionUpdate};

pub struct PatternBot {
    config: SharedConfig,
    market: Box<dyn ExchangeGateway>,
    stats_repo: Box<dyn StatsRepository>,
    engine: DecisionEngine,
    positions: PositionManager,

    pattern_stats: PatternStats,
    volatility: VolatilityMap,
    last_stats_refresh: Instant,
}

impl PatternBot {
    pub async fn new(
        config: SharedConfig,
        market: Box<dyn ExchangeGateway>,
        stats_repo: Box<dyn StatsRepository>,
    ) -> Result<Self> {
        let cfg = config.read().await;

        info!("{}", "=".repeat(60));
        info!("Pattern trading bot starting up");
        info!(
            "Mode: {}",
            if cfg.simulated_trading {
                "SIMULATED TRADING"
            } else {
                "LIVE TRADING"
            }
        );
        info!("Symbol: {}", cfg.symbol);
        info!("Risk level: {}", cfg.risk_level);
        info!("Trading day zone: {}", cfg.timezone);
        for (day, pattern) in &cfg.deny_list {
            info!("  Deny: {} observed on {}", pattern, day);
        }
        info!("{}", "=".repeat(60));

        let engine = DecisionEngine::with_deny_list(cfg.risk_level, cfg.deny_list.clone());
        drop(cfg);

        let pattern_stats = stats_repo.get_pattern_stats().await?;
        let volatility = stats_repo.get_volatility().await?;
        if pattern_stats.is_empty() {
            anyhow::bail!("pattern stats unavailable, refusing to start");
        }
        info!(
            "Model loaded: {} pattern cells, days covered: {:?}",
            pattern_stats.len(),
            pattern_stats
                .days_covered()
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            config,
            market,
            stats_repo,
            engine,
            positions: PositionManager::new(),
            pattern_stats,
            volatility,
            last_stats_refresh: Instant::now(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Bot is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.shutdown().await;
                    return Ok(());
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&mut self) {
        let (poll_interval, backoff) = {
            let cfg = self.config.read().await;
            (cfg.poll_interval_secs, cfg.error_backoff_secs)
        };

        if let Err(e) = self.cycle().await {
            error!("Trading cycle error: {e:#}");
            tokio::time::sleep(tokio::time::Duration::from_secs(backoff)).await;
            return;
        }

        tokio::time::sleep(tokio::time::Duration::from_secs(poll_interval)).await;
    }

    /// One decision or lifecycle step. Opening and managing are mutually
    /// exclusive per cycle, which serializes them by construction.
    async fn cycle(&mut self) -> Result<()> {
        self.maybe_refresh_stats().await;

        let current_price = self.market.get_current_price().await?;

        if self.positions.has_position() {
            self.manage_position(current_price).await?;
        } else {
            self.try_open(current_price).await?;
        }

        Ok(())
    }

    async fn maybe_refresh_stats(&mut self) {
        let refresh_secs = self.config.read().await.stats_refresh_secs;
        if self.last_stats_refresh.elapsed().as_secs() < refresh_secs {
            return;
        }
        self.last_stats_refresh = Instant::now();

        match self.stats_repo.get_pattern_stats().await {
            Ok(stats) if !stats.is_empty() => {
                self.pattern_stats = stats;
                info!("Model refreshed: {} pattern cells", self.pattern_stats.len());
            }
            Ok(_) => warn!("Model refresh returned an empty table, keeping previous"),
            Err(e) => warn!("Model refresh failed: {e:#}"),
        }
        if let Ok(vol) = self.stats_repo.get_volatility().await {
            self.volatility = vol;
        }
    }

    async fn try_open(&mut self, current_price: f64) -> Result<()> {
        let (hours, tz, default_balance) = {
            let cfg = self.config.read().await;
            (cfg.price_history_hours, cfg.timezone, cfg.default_balance)
        };

        let history = self.market.get_price_history(hours).await?;
        let day = DayOfWeek::today_in(tz);

        let decision = self
            .engine
            .should_trade(&history, day, &self.pattern_stats);

        let (direction, size_fraction, pattern, sizing) = match decision {
            TradeDecision::Open {
                direction,
                size_fraction,
                pattern,
                sizing,
            } => (direction, size_fraction, pattern, sizing),
            TradeDecision::Skip { pattern, reason } => {
                let detail = match reason {
                    SkipReason::InsufficientData => "price history too short",
                    SkipReason::Denied => "deny-listed combination",
                    SkipReason::NoStatisticalData => "no stats for day/pattern",
                    SkipReason::WeakEdge => "win rate below threshold",
                };
                debug!("{} on {}: no trade ({detail})", pattern, day);
                return Ok(());
            }
        };

        let balance = match self.market.get_balance().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Balance fetch failed, using configured default: {e:#}");
                default_balance
            }
        };

        let trade_amount = balance * size_fraction;
        if trade_amount <= 0.0 {
            debug!("Sized to zero, skipping open");
            return Ok(());
        }

        let day_volatility = self
            .volatility
            .get(&day)
            .copied()
            .unwrap_or(DEFAULT_VOLATILITY);
        let plan = stop_loss::plan(current_price, day_volatility, direction)?;

        let order = OrderRequest {
            side: match direction {
                Direction::Long => OrderSide::Buy,
                Direction::Short => OrderSide::Sell,
            },
            size: trade_amount / current_price,
            reference_price: current_price,
        };
        let order_result = self.market.place_order(&order).await?;

        let position = Position {
            direction,
            entry_price: current_price,
            size: trade_amount,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            entry_time: Utc::now(),
            pattern,
            day,
        };
        let pos = self.positions.open(position)?;

        info!("{}", "=".repeat(60));
        info!("OPEN {}: {} on {}", pos.direction, pos.pattern, pos.day);
        info!("  Entry: ${:.2} | Size: ${:.2}", pos.entry_price, pos.size);
        info!(
            "  Stop: ${:.2} ({:.2}%, x{:.1}) | Target: ${:.2}",
            pos.stop_loss,
            plan.stop_pct * 100.0,
            plan.multiplier,
            pos.take_profit
        );
        info!(
            "  Kelly: full {:.4}, applied {:.4} (win rate {:.1}%, {})",
            sizing.full_kelly,
            sizing.applied_fraction,
            sizing.win_rate * 100.0,
            sizing.risk_level
        );
        info!("  Order id: {}", order_result.order_id);
        info!("{}", "=".repeat(60));

        Ok(())
    }

    async fn manage_position(&mut self, current_price: f64) -> Result<()> {
        if let PositionUpdate::Updated {
            profit_pct,
            stop_loss,
            raised,
        } = self.positions.update(current_price)
        {
            if raised {
                info!(
                    "Stop raised to ${:.2} (profit {:.2}%)",
                    stop_loss,
                    profit_pct * 100.0
                );
            }
        }

        let reason = match self.positions.check_exit(current_price) {
            ExitCheck::Exit(reason) => reason,
            ExitCheck::Hold | ExitCheck::NoPosition => return Ok(()),
        };

        self.close_position(current_price, reason).await
    }

    async fn close_position(&mut self, exit_price: f64, reason: ExitReason) -> Result<()> {
        let pos = match self.positions.position() {
            Some(p) => p.clone(),
            None => return Ok(()),
        };

        let order = OrderRequest {
            side: match pos.direction {
                Direction::Long => OrderSide::Sell,
                Direction::Short => OrderSide::Buy,
            },
            size: pos.size / pos.entry_price,
            reference_price: exit_price,
        };
        self.market.place_order(&order).await?;

        let result = match self.positions.close(exit_price, reason) {
            Some(r) => r,
            None => return Ok(()),
        };

        let outcome = if result.profit_amount > 0.0 { "WIN" } else { "LOSS" };
        info!(
            "CLOSED ({reason}) {outcome}: ${:.2} -> ${:.2} | PnL ${:+.2} ({:+.2}%)",
            result.entry_price,
            result.exit_price,
            result.profit_amount,
            result.profit_pct * 100.0
        );

        if let Err(e) = self.stats_repo.record_trade(&result).await {
            warn!("Failed to record trade: {e:#}");
        }

        Ok(())
    }

    async fn shutdown(&mut self) {
        info!("Shutting down...");
        match self.stats_repo.get_trade_history().await {
            Ok(history) => {
                let summary = summarize(&history);
                info!(
                    "Trades: {} | Win rate: {}% | PnL ${:+.2}",
                    summary.total_trades, summary.win_rate, summary.total_pnl
                );
            }
            Err(e) => warn!("Could not load trade history: {e:#}"),
        }
        info!("Bot stopped.");
    }
}
