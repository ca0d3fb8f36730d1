//! Built-in card roster.

use crate::catalog::{BodyClass, CardDefinition, WeaponType};

fn card(
    id: u32,
    name: &str,
    image: &str,
    health: u32,
    attack: u32,
    body_class: BodyClass,
    weapon_type: WeaponType,
) -> CardDefinition {
    CardDefinition {
        id,
        name: name.to_string(),
        image: image.to_string(),
        health,
        attack,
        attacks_per_turn: 1,
        body_class,
        weapon_type,
    }
}

/// The default roster, in registration order. Lookup keys are registered in this order,
/// so earlier cards win key collisions.
pub fn builtin_cards() -> Vec<CardDefinition> {
    vec![
        card(29, "Pearl", "bs_pearl.png", 3900, 1560, BodyClass::Normal, WeaponType::Burst),
        card(41, "Gale", "bs_gale.png", 3800, 1680, BodyClass::Normal, WeaponType::Burst),
        card(44, "Jessie", "bs_jessie.png", 3000, 1060, BodyClass::Normal, WeaponType::Burst),
        card(60, "Nani", "bs_nani.png", 2400, 2220, BodyClass::Glass, WeaponType::Sniper),
        card(66, "Darryl", "bs_darryl.png", 5300, 2400, BodyClass::Tank, WeaponType::Shotgun),
        card(67, "Draco", "bs_draco.png", 5500, 600, BodyClass::Tank, WeaponType::Melee),
        CardDefinition {
            attacks_per_turn: 2,
            ..card(
                71,
                "Larry & Lawrie",
                "bs_larry_lawrie.png",
                3000,
                700,
                BodyClass::Normal,
                WeaponType::MultiHit,
            )
        },
        card(86, "Max", "bs_max.png", 3300, 1280, BodyClass::Normal, WeaponType::Rapid),
        card(87, "Pam", "bs_pam.png", 4800, 2340, BodyClass::Tank, WeaponType::Spray),
        card(94, "Fang", "bs_fang.png", 4300, 1360, BodyClass::Normal, WeaponType::Melee),
        card(99, "Mico", "bs_mico.png", 3000, 1090, BodyClass::Normal, WeaponType::Melee),
    ]
}
