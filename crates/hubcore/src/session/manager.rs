use crate::core::config::HubConfig;
use crate::features::account::WalletFlow;
use crate::features::games::connect_four::ConnectFour;
use crate::features::games::cointoss::CoinToss;
use crate::features::games::rps::RockPaperScissors;
use crate::features::games::GameTable;
use crate::features::pfp::PfpDraft;

use super::registry::SessionRegistry;

/// Every session registry of the hub, one namespace per feature.
///
/// Owned by the [`crate::hub::Hub`] and reached through the per-event
/// context; nothing here is process-global.
pub struct SessionManager {
    pub wallets: SessionRegistry<i64, WalletFlow>,
    pub pfp_drafts: SessionRegistry<i64, PfpDraft>,
    pub cointoss: GameTable<CoinToss>,
    pub rps: GameTable<RockPaperScissors>,
    pub connect_four: GameTable<ConnectFour>,
}

impl SessionManager {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            wallets: SessionRegistry::new("wallets", config.session_ttl),
            pfp_drafts: SessionRegistry::new("pfp drafts", config.session_ttl),
            cointoss: SessionRegistry::new("cointoss", config.cointoss_ttl),
            rps: SessionRegistry::new("rock paper scissors", config.rps_ttl),
            connect_four: SessionRegistry::new("connect four", config.connect_four_ttl),
        }
    }

    /// Sweeps every registry. Returns the number of sessions dropped.
    pub fn sweep(&self) -> usize {
        self.wallets.sweep()
            + self.pfp_drafts.sweep()
            + self.cointoss.sweep()
            + self.rps.sweep()
            + self.connect_four.sweep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_registries_take_ttls_from_config() {
        let config = HubConfig {
            connect_four_ttl: Duration::from_secs(60),
            ..HubConfig::default()
        };
        let sessions = SessionManager::new(&config);
        assert_eq!(sessions.connect_four.ttl(), Duration::from_secs(60));
        assert_eq!(sessions.cointoss.ttl(), Duration::from_secs(300));
        assert_eq!(sessions.wallets.name(), "wallets");
        assert_eq!(sessions.sweep(), 0);
    }
}
