//! The built-in catalog: generated upgrade and shop rosters plus the
//! fixed companion and achievement tables.

use crate::{
    AchievementDef, AchievementId, Catalog, CompanionDef, CompanionId, EffectBundle, Rarity,
    ShopItemDef, ShopItemId, ShopItemKind, UpgradeDef, UpgradeId, UpgradeEffect,
};

/// Number of generated upgrades.
pub const UPGRADE_COUNT: usize = 60;
/// Number of generated shop items.
pub const SHOP_ITEM_COUNT: usize = 60;
/// The first `THEME_COUNT` shop items are themes; the rest are decor.
pub const THEME_COUNT: usize = 40;

const ADJECTIVES: [&str; 20] = [
    "Golden", "Mossy", "Shimmer", "Lunar", "Cosmic", "Silent", "Breezy", "Velvet", "Neon",
    "Crystal", "Aurora", "Twilight", "Solar", "Nimbus", "Echo", "Radiant", "Verdant", "Opal",
    "Coral", "Ivory",
];
const NOUNS: [&str; 15] = [
    "Meadow", "Dawn", "Synth", "Haven", "Vista", "Grove", "Skyscape", "Portal", "Cascade",
    "Plume", "Arcade", "Harbor", "Isle", "Prairie", "Field",
];

fn generated_name(prefix: &str, i: usize) -> String {
    format!(
        "{} {} {}",
        ADJECTIVES[i % ADJECTIVES.len()],
        NOUNS[i % NOUNS.len()],
        prefix
    )
}

fn generated_upgrade(i: usize) -> UpgradeDef {
    // Prices climb a 1.5x ladder that restarts every 12 entries, with a
    // linear late-catalog surcharge. Effects cycle click/passive/multi.
    let base_price =
        (10.0 * 1.5_f64.powi((i % 12) as i32) * (1.0 + (i / 12) as f64)).round() as u64;
    let effect = match i % 3 {
        0 => UpgradeEffect::ClickBoost(1.35_f64.powi((i % 10) as i32).round().max(1.0)),
        1 => UpgradeEffect::PassiveBoost(
            ((10.0 * 1.18_f64.powi((i % 10) as i32)).round() / 10.0).max(0.2),
        ),
        _ => UpgradeEffect::Multiplier(1.08 + (i % 5) as f64 * 0.12),
    };
    UpgradeDef {
        id: UpgradeId(format!("u{i}")),
        name: generated_name("Upgrade", i + 1),
        effect,
        base_price,
    }
}

fn generated_shop_item(i: usize) -> ShopItemDef {
    let (kind, prefix) = if i < THEME_COUNT {
        (ShopItemKind::Theme { palette_index: i }, "Theme")
    } else {
        (ShopItemKind::Decor, "Decor")
    };
    ShopItemDef {
        id: ShopItemId(format!("s{i}")),
        name: generated_name(prefix, i),
        price: (80.0 * 1.18_f64.powi(i as i32)).round() as u64,
        kind,
    }
}

fn companion(
    id: &str,
    name: &str,
    rarity: Rarity,
    per_action: f64,
    per_second: f64,
    click_bonus: f64,
) -> CompanionDef {
    CompanionDef {
        id: CompanionId(id.to_string()),
        name: name.to_string(),
        rarity,
        effect: EffectBundle {
            per_action,
            per_second,
            click_bonus,
        },
    }
}

fn achievement(id: &str, name: &str, desc: &str) -> AchievementDef {
    AchievementDef {
        id: AchievementId(id.to_string()),
        name: name.to_string(),
        desc: desc.to_string(),
    }
}

impl Catalog {
    /// The full built-in catalog shipped with the game.
    pub fn builtin() -> Self {
        Self {
            upgrades: (0..UPGRADE_COUNT).map(generated_upgrade).collect(),
            shop_items: (0..SHOP_ITEM_COUNT).map(generated_shop_item).collect(),
            companions: vec![
                companion("c1", "Clucky", Rarity::Common, 0.2, 0.0, 0.0),
                companion("c2", "Peep", Rarity::Common, 0.0, 0.2, 0.0),
                companion("c3", "Sunny", Rarity::Rare, 1.0, 0.0, 0.0),
                companion("c4", "Bolt", Rarity::Rare, 0.0, 1.0, 0.0),
                companion("c5", "Aurora", Rarity::Epic, 3.0, 0.5, 0.0),
                companion("c6", "Goldcrest", Rarity::Legendary, 10.0, 0.0, 0.0),
                companion("c7", "Nimbus", Rarity::Epic, 0.0, 3.0, 0.0),
                companion("c8", "Echo", Rarity::Rare, 0.0, 0.0, 2.0),
                companion("c9", "Sable", Rarity::Common, 0.5, 0.0, 0.0),
                companion("c10", "Comet", Rarity::Legendary, 5.0, 10.0, 0.0),
                companion("c11", "Twinkle", Rarity::Epic, 2.0, 2.0, 0.0),
                companion("c12", "Voyager", Rarity::Rare, 1.0, 3.0, 0.0),
            ],
            achievements: vec![
                achievement("a1", "First Crack", "Earn 100 eggs"),
                achievement("a2", "Hatchling", "Buy 1 chicken"),
                achievement("a3", "Collector", "Own 5 chickens"),
                achievement("a4", "Upgrader", "Buy 10 upgrades"),
                achievement("a5", "Idle Farmer", "Gain 1,000 eggs while offline"),
                achievement("a6", "Legend Hunter", "Obtain a legendary chicken"),
                achievement("a7", "Theme Hoarder", "Own 10 themes"),
                achievement("a8", "Million Egg", "Earn 1,000,000 eggs"),
            ],
        }
    }
}
