use std::collections::HashMap;

use super::layer_trait::{EvaluationContext, LayerVerdict, RiskLayer};
use crate::domain::errors::RiskError;
use crate::domain::risk::risk_config::CorrelationConfig;
use crate::domain::trading::types::TradeProposal;

const QUOTE_SUFFIXES: [&str; 4] = ["USDT", "USDC", "BUSD", "USD"];

/// Base asset of a trading symbol: `BTC/USDT`, `BTC-USDT`, `BTC:USDT` and
/// `BTCUSDT` all give `BTC`.
pub fn base_asset(symbol: &str) -> String {
    let upper = symbol.trim().to_ascii_uppercase();
    if let Some((base, _)) = upper.split_once(['/', '-', ':']) {
        return base.to_string();
    }
    for quote in QUOTE_SUFFIXES {
        if let Some(base) = upper.strip_suffix(quote)
            && !base.is_empty()
        {
            return base.to_string();
        }
    }
    upper
}

/// Static group-membership check: caps open positions per correlation
/// group and overall. Assets outside every group only correlate with
/// themselves.
pub struct CorrelationRiskLayer {
    config: CorrelationConfig,
    group_of: HashMap<String, usize>,
}

impl CorrelationRiskLayer {
    pub const NAME: &'static str = "CorrelationRisk";

    pub fn new(config: CorrelationConfig) -> Self {
        let group_of = config
            .groups
            .iter()
            .enumerate()
            .flat_map(|(index, group)| {
                group
                    .iter()
                    .map(move |asset| (asset.trim().to_ascii_uppercase(), index))
            })
            .collect();
        Self { config, group_of }
    }

    fn correlated(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match (self.group_of.get(a), self.group_of.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    fn group_label(&self, base: &str) -> String {
        match self.group_of.get(base) {
            Some(index) => self.config.groups[*index].join(":"),
            None => base.to_string(),
        }
    }
}

impl RiskLayer for CorrelationRiskLayer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        proposal: TradeProposal,
        ctx: &EvaluationContext<'_>,
    ) -> Result<LayerVerdict, RiskError> {
        let open = ctx.snapshot.open_position_count;
        if open >= self.config.max_open_positions {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "{} open positions, maximum is {}",
                    open, self.config.max_open_positions
                ),
            ));
        }

        let base = base_asset(&proposal.symbol);
        let correlated = ctx
            .snapshot
            .open_symbols()
            .filter(|symbol| self.correlated(&base, &base_asset(symbol)))
            .count();

        if correlated + 1 > self.config.max_correlated_positions {
            return Ok(ctx.reject(
                Self::NAME,
                &proposal,
                format!(
                    "{} open positions already in correlation group {}, maximum is {}",
                    correlated,
                    self.group_label(&base),
                    self.config.max_correlated_positions
                ),
            ));
        }

        Ok(LayerVerdict::Approve(proposal))
    }
}
