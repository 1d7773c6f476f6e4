use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::sync::atomic::{AtomicU64, Ordering};

type HmacSha256 = Hmac<Sha256>;

/// Mints the capability tokens carried by card instances.
///
/// A token authorizes exactly one "play this card" action and is bound to
/// the card's current (owner, zone) state: every transition mints a new
/// token, so a stale client-held token can never replay an action after the
/// card has moved. The monotonic nonce keeps tokens unique even when a card
/// revisits the same state.
#[derive(Debug)]
pub struct TokenForge {
    key: [u8; 32],
    nonce: AtomicU64,
}

impl TokenForge {
    /// Key comes from `CARD_TOKEN_KEY` (hex, 32 bytes) when set, otherwise
    /// a process-local random key is generated.
    pub fn from_env() -> Self {
        let key = std::env::var("CARD_TOKEN_KEY")
            .ok()
            .and_then(|hex_key| hex::decode(hex_key).ok())
            .and_then(|v| v.try_into().ok())
            .unwrap_or_else(|| {
                let mut kb = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut kb);
                kb
            });
        Self::with_key(key)
    }

    pub fn with_key(key: [u8; 32]) -> Self {
        TokenForge {
            key,
            nonce: AtomicU64::new(0),
        }
    }

    pub fn mint(&self, card_id: u64, zone_tag: &str, owner: Option<&str>) -> String {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let payload = format!("{card_id}.{zone_tag}.{}.{nonce}", owner.unwrap_or("-"));
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
