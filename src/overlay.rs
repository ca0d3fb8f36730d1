//! Damage numbers and card shake. Purely cosmetic: derived from the same damage, attack
//! and roll values the engine uses, never fed back into match state.

use serde::Serialize;

use crate::combat::Side;

pub const STAGGER_STEP_MS: u64 = 120;
pub const MAX_STAGGER_MS: u64 = 360;
pub const FADE_DURATION_MS: u64 = 2000;

/// Damage-number size, largest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontTier {
    Huge,
    ExtraLarge,
    Large,
    Medium,
    Small,
    Tiny,
}

impl FontTier {
    pub const fn px(self) -> u32 {
        match self {
            Self::Huge => 72,
            Self::ExtraLarge => 60,
            Self::Large => 48,
            Self::Medium => 40,
            Self::Small => 32,
            Self::Tiny => 24,
        }
    }
}

/// Bucket `damage` as a share of the attacker's `attack`: >=90, >=70, >=50, >=30, >=10 %,
/// and everything below.
pub fn font_tier(damage: u32, attack: u32) -> FontTier {
    if attack == 0 {
        return FontTier::Tiny;
    }
    let percent = u64::from(damage) * 100 / u64::from(attack);
    match percent {
        90.. => FontTier::Huge,
        70..=89 => FontTier::ExtraLarge,
        50..=69 => FontTier::Large,
        30..=49 => FontTier::Medium,
        10..=29 => FontTier::Small,
        _ => FontTier::Tiny,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShakeProfile {
    pub distance_px: u32,
    pub iterations: u32,
    pub duration_ms: u32,
}

impl ShakeProfile {
    pub const STILL: Self = Self {
        distance_px: 0,
        iterations: 0,
        duration_ms: 0,
    };
}

/// Indexed by roll - 1. Intensity falls as the roll rises, like damage does.
pub const SHAKE_TABLE: [ShakeProfile; 6] = [
    ShakeProfile {
        distance_px: 14,
        iterations: 8,
        duration_ms: 600,
    },
    ShakeProfile {
        distance_px: 11,
        iterations: 7,
        duration_ms: 520,
    },
    ShakeProfile {
        distance_px: 8,
        iterations: 6,
        duration_ms: 440,
    },
    ShakeProfile {
        distance_px: 6,
        iterations: 5,
        duration_ms: 360,
    },
    ShakeProfile {
        distance_px: 4,
        iterations: 4,
        duration_ms: 280,
    },
    ShakeProfile {
        distance_px: 2,
        iterations: 3,
        duration_ms: 200,
    },
];

/// Shake for a roll; out-of-range rolls clamp to the nearest face.
pub fn shake_profile(roll: u8) -> ShakeProfile {
    SHAKE_TABLE[usize::from(roll.clamp(1, 6) - 1)]
}

/// Presentation switches, injected once instead of checked ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresentationPolicy {
    /// Off: every shake is [ShakeProfile::STILL].
    pub animate: bool,
    /// Off: damage numbers stay until cleared.
    pub fade_out: bool,
}

impl Default for PresentationPolicy {
    fn default() -> Self {
        Self {
            animate: true,
            fade_out: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageInstance {
    pub recipient: Side,
    pub value: u32,
    pub tier: FontTier,
    pub stagger_ms: u64,
    pub created_at_ms: u64,
    pub expires_at_ms: Option<u64>,
}

impl DamageInstance {
    pub fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at_ms.map_or(true, |expiry| now_ms < expiry)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DamageOverlay {
    policy: PresentationPolicy,
    instances: Vec<DamageInstance>,
}

impl DamageOverlay {
    pub fn new(policy: PresentationPolicy) -> Self {
        Self {
            policy,
            instances: Vec::new(),
        }
    }

    pub fn set_policy(&mut self, policy: PresentationPolicy) {
        self.policy = policy;
    }

    /// Add a damage number for one applied hit. Existing numbers on the same card push the
    /// new one's stagger back; nothing is merged or replaced.
    pub fn record_hit(
        &mut self,
        recipient: Side,
        damage: u32,
        attack: u32,
        now_ms: u64,
    ) -> &DamageInstance {
        self.expire(now_ms);
        let concurrent = self
            .instances
            .iter()
            .filter(|instance| instance.recipient == recipient)
            .count() as u64;
        let stagger_ms = (concurrent * STAGGER_STEP_MS).min(MAX_STAGGER_MS);
        let expires_at_ms = self
            .policy
            .fade_out
            .then(|| now_ms + FADE_DURATION_MS + stagger_ms);
        self.instances.push(DamageInstance {
            recipient,
            value: damage,
            tier: font_tier(damage, attack),
            stagger_ms,
            created_at_ms: now_ms,
            expires_at_ms,
        });
        &self.instances[self.instances.len() - 1]
    }

    pub fn shake_for(&self, roll: u8) -> ShakeProfile {
        if self.policy.animate {
            shake_profile(roll)
        } else {
            ShakeProfile::STILL
        }
    }

    pub fn expire(&mut self, now_ms: u64) {
        self.instances.retain(|instance| instance.is_live(now_ms));
    }

    pub fn active(&self) -> &[DamageInstance] {
        &self.instances
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(font_tier(900, 1000), FontTier::Huge);
        assert_eq!(font_tier(899, 1000), FontTier::ExtraLarge);
        assert_eq!(font_tier(700, 1000), FontTier::ExtraLarge);
        assert_eq!(font_tier(500, 1000), FontTier::Large);
        assert_eq!(font_tier(300, 1000), FontTier::Medium);
        assert_eq!(font_tier(100, 1000), FontTier::Small);
        assert_eq!(font_tier(99, 1000), FontTier::Tiny);
        assert_eq!(font_tier(5, 0), FontTier::Tiny);
    }

    #[test]
    fn shake_weakens_as_roll_rises() {
        for pair in SHAKE_TABLE.windows(2) {
            assert!(pair[0].distance_px > pair[1].distance_px);
            assert!(pair[0].iterations > pair[1].iterations);
            assert!(pair[0].duration_ms > pair[1].duration_ms);
        }
        assert_eq!(shake_profile(0), SHAKE_TABLE[0]);
        assert_eq!(shake_profile(9), SHAKE_TABLE[5]);
    }

    #[test]
    fn stagger_grows_per_concurrent_number_and_caps() {
        let mut overlay = DamageOverlay::default();
        let staggers: Vec<u64> = (0..5)
            .map(|_| overlay.record_hit(Side::Enemy, 100, 1000, 0).stagger_ms)
            .collect();
        assert_eq!(staggers, vec![0, 120, 240, 360, 360]);
        assert_eq!(overlay.record_hit(Side::Player, 100, 1000, 0).stagger_ms, 0);
        assert_eq!(overlay.active().len(), 6);
    }

    #[test]
    fn instances_expire_individually() {
        let mut overlay = DamageOverlay::default();
        overlay.record_hit(Side::Enemy, 700, 700, 0);
        overlay.record_hit(Side::Enemy, 700, 700, 200);
        assert_eq!(overlay.active()[1].expires_at_ms, Some(200 + 2000 + 120));

        overlay.expire(2000);
        assert_eq!(overlay.active().len(), 1);
        overlay.expire(2320);
        assert!(overlay.active().is_empty());
    }

    #[test]
    fn policy_disables_fade_and_shake() {
        let mut overlay = DamageOverlay::new(PresentationPolicy {
            animate: false,
            fade_out: false,
        });
        overlay.record_hit(Side::Player, 10, 10, 0);
        overlay.expire(1_000_000);
        assert_eq!(overlay.active().len(), 1);
        assert_eq!(overlay.shake_for(1), ShakeProfile::STILL);
        overlay.clear();
        assert!(overlay.active().is_empty());
    }
}
