use std::sync::Arc;

use smting_core::clock::Clock;
use smting_core::config::{DiscoveryDefaults, Economy};
use smting_core::gate::ConversationGate;
use smting_core::inbox::Inbox;
use smting_core::reward::RewardPoster;
use smting_core::wallet::KaneWallet;
use smting_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub clock: Arc<dyn Clock>,
    pub discovery: DiscoveryDefaults,
    pub gate: ConversationGate,
    pub poster: RewardPoster,
    pub wallet: KaneWallet,
    pub inbox: Inbox,
}

impl AppStateInner {
    /// Wire every service to the one database.
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
        economy: Economy,
        discovery: DiscoveryDefaults,
    ) -> Self {
        Self {
            gate: ConversationGate::new(
                db.clone(),
                db.clone(),
                db.clone(),
                clock.clone(),
                economy,
            ),
            poster: RewardPoster::new(db.clone(), db.clone(), db.clone(), clock.clone(), economy),
            wallet: KaneWallet::new(db.clone(), db.clone(), clock.clone()),
            inbox: Inbox::new(db.clone(), clock.clone()),
            db,
            jwt_secret,
            clock,
            discovery,
        }
    }
}
