use rocket_prometheus::prometheus::{IntCounterVec, Opts, Registry};

/// Domain counters exported next to the HTTP metrics.
#[derive(Clone)]
pub struct TrackerMetrics {
    actions: IntCounterVec,
    promotions: IntCounterVec,
    achievements: IntCounterVec,
    redemptions: IntCounterVec,
}

impl TrackerMetrics {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            actions: IntCounterVec::new(
                Opts::new("green_league_actions_total", "Green actions recorded"),
                &["action"],
            )?,
            promotions: IntCounterVec::new(
                Opts::new("green_league_promotions_total", "League promotions"),
                &["league"],
            )?,
            achievements: IntCounterVec::new(
                Opts::new("green_league_achievements_total", "Achievements awarded"),
                &["achievement"],
            )?,
            redemptions: IntCounterVec::new(
                Opts::new("green_league_redemptions_total", "Vouchers redeemed"),
                &["voucher"],
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> anyhow::Result<()> {
        registry.register(Box::new(self.actions.clone()))?;
        registry.register(Box::new(self.promotions.clone()))?;
        registry.register(Box::new(self.achievements.clone()))?;
        registry.register(Box::new(self.redemptions.clone()))?;
        Ok(())
    }

    pub fn action_recorded(&self, action: &str) {
        self.actions.with_label_values(&[action]).inc();
    }

    pub fn promoted(&self, league: &str) {
        self.promotions.with_label_values(&[league]).inc();
    }

    pub fn achievement_awarded(&self, achievement: &str) {
        self.achievements.with_label_values(&[achievement]).inc();
    }

    pub fn voucher_redeemed(&self, voucher: &str) {
        self.redemptions.with_label_values(&[voucher]).inc();
    }

    #[cfg(test)]
    pub fn actions_count(&self, action: &str) -> u64 {
        self.actions.with_label_values(&[action]).get()
    }
}
