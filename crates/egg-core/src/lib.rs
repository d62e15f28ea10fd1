#![deny(warnings)]

//! Core domain models and invariants for Egg Clicker.
//!
//! This crate defines the immutable catalog (upgrades, shop items,
//! companions, achievements), the mutable save-state aggregate, the
//! notification events, and validation helpers that guarantee basic
//! invariants. All behavior lives in `egg-econ`; this crate is data.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::warn;

mod builtin;
pub use builtin::{SHOP_ITEM_COUNT, THEME_COUNT, UPGRADE_COUNT};

/// Unique identifier for an upgrade, e.g. "u0", "u17".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpgradeId(pub String);

/// Unique identifier for a shop item, e.g. "s3".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShopItemId(pub String);

/// Unique identifier for a companion, e.g. "c6".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanionId(pub String);

/// Unique identifier for an achievement, e.g. "a5".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AchievementId(pub String);

/// What an upgrade does when applied during rate replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UpgradeEffect {
    /// Adds the value to the per-action rate.
    ClickBoost(f64),
    /// Adds the value to the per-second rate.
    PassiveBoost(f64),
    /// Multiplies both rates by the value.
    Multiplier(f64),
}

/// A purchasable upgrade. Repeatable; the price inflates with owned count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpgradeDef {
    /// Upgrade identifier.
    pub id: UpgradeId,
    /// Display name.
    pub name: String,
    /// Effect applied once per owned unit during replay.
    pub effect: UpgradeEffect,
    /// Price of the first unit, in eggs.
    pub base_price: u64,
}

/// Shop item category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShopItemKind {
    /// A background theme; owning one adds its palette index to the
    /// theme inventory.
    Theme {
        /// Index into the presentation layer's theme palette.
        palette_index: usize,
    },
    /// Pure decoration with no mechanical effect.
    Decor,
}

/// A one-time shop purchase (theme or decor).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShopItemDef {
    /// Shop item identifier.
    pub id: ShopItemId,
    /// Display name.
    pub name: String,
    /// Fixed price, in eggs.
    pub price: u64,
    /// Category.
    pub kind: ShopItemKind,
}

/// Companion rarity tier. Governs the fixed purchase price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Price multiplier over the companion base price.
    pub fn price_multiplier(self) -> u64 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 6,
            Rarity::Epic => 30,
            Rarity::Legendary => 150,
        }
    }
}

/// Additive rate bonuses granted per owned companion unit. Any subset
/// may be present in catalog data; absent fields read as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectBundle {
    /// Added to the per-action rate.
    #[serde(default)]
    pub per_action: f64,
    /// Added to the per-second rate.
    #[serde(default)]
    pub per_second: f64,
    /// Added to the per-action rate, on top of `per_action`.
    #[serde(default)]
    pub click_bonus: f64,
}

/// A purchasable companion ("chicken"). Repeatable at a fixed price.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompanionDef {
    /// Companion identifier.
    pub id: CompanionId,
    /// Display name.
    pub name: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Bonuses applied once per owned unit during replay.
    pub effect: EffectBundle,
}

/// A one-shot achievement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Achievement identifier.
    pub id: AchievementId,
    /// Display name, carried in unlock notifications.
    pub name: String,
    /// Human-readable unlock condition.
    pub desc: String,
}

/// The full immutable catalog, fixed at startup.
///
/// Rate replay walks `upgrades` and `companions` in vector order; that
/// order decides which additive bonuses a multiplier compounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    /// Purchasable upgrades, in definition order.
    pub upgrades: Vec<UpgradeDef>,
    /// One-time shop items, in definition order.
    pub shop_items: Vec<ShopItemDef>,
    /// Purchasable companions, in definition order.
    pub companions: Vec<CompanionDef>,
    /// Achievement roster.
    pub achievements: Vec<AchievementDef>,
}

impl Catalog {
    /// Look up an upgrade by id.
    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| u.id.0 == id)
    }

    /// Look up a shop item by id.
    pub fn shop_item(&self, id: &str) -> Option<&ShopItemDef> {
        self.shop_items.iter().find(|s| s.id.0 == id)
    }

    /// Look up a companion by id.
    pub fn companion(&self, id: &str) -> Option<&CompanionDef> {
        self.companions.iter().find(|c| c.id.0 == id)
    }

    /// Look up an achievement by id.
    pub fn achievement(&self, id: &str) -> Option<&AchievementDef> {
        self.achievements.iter().find(|a| a.id.0 == id)
    }

    /// Palette indices of all theme shop items.
    pub fn theme_palette_indices(&self) -> BTreeSet<usize> {
        self.shop_items
            .iter()
            .filter_map(|s| match s.kind {
                ShopItemKind::Theme { palette_index } => Some(palette_index),
                ShopItemKind::Decor => None,
            })
            .collect()
    }
}

/// Eggs granted to a brand-new save.
pub const STARTING_BALANCE: f64 = 20.0;

/// The single mutable save aggregate. Owned by the engine; every field
/// is persisted wholesale on save.
///
/// `per_action_rate` and `per_second_rate` are derived: they must always
/// equal what a full replay of the owned counts against the baseline
/// produces. Loaders recompute them before trusting them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    /// Current egg balance. Never negative.
    pub balance: f64,
    /// Eggs gained per discrete click action. Derived.
    pub per_action_rate: f64,
    /// Eggs gained per elapsed second. Derived.
    pub per_second_rate: f64,
    /// Owned unit count per upgrade.
    pub upgrades: BTreeMap<UpgradeId, u32>,
    /// Owned flag per shop item.
    pub shop_items: BTreeMap<ShopItemId, bool>,
    /// Owned theme palette indices, in purchase order. No duplicates.
    pub themes: Vec<usize>,
    /// Equipped theme palette index; always an element of `themes`.
    pub equipped_theme: Option<usize>,
    /// Owned unit count per companion.
    pub companions: BTreeMap<CompanionId, u32>,
    /// Unlocked flag per achievement. Transitions false to true at most
    /// once and never reverts.
    pub achievements: BTreeMap<AchievementId, bool>,
    /// Wall-clock milliseconds of the last observed tick or save.
    pub last_tick_ms: i64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            balance: 0.0,
            per_action_rate: 1.0,
            per_second_rate: 0.0,
            upgrades: BTreeMap::new(),
            shop_items: BTreeMap::new(),
            themes: Vec::new(),
            equipped_theme: None,
            companions: BTreeMap::new(),
            achievements: BTreeMap::new(),
            last_tick_ms: 0,
        }
    }
}

impl GameState {
    /// Fresh state: every catalog key pre-filled with 0/false, the
    /// starting grant on the balance, rates at the baseline.
    pub fn new(catalog: &Catalog, now_ms: i64) -> Self {
        let mut state = Self {
            balance: STARTING_BALANCE,
            last_tick_ms: now_ms,
            ..Self::default()
        };
        state.fill_catalog_defaults(catalog);
        state
    }

    /// Total owned upgrade units across all upgrade kinds.
    pub fn total_upgrade_units(&self) -> u64 {
        self.upgrades.values().map(|&n| u64::from(n)).sum()
    }

    /// Total owned companions across all rarities.
    pub fn total_companions(&self) -> u64 {
        self.companions.values().map(|&n| u64::from(n)).sum()
    }

    /// Whether the given theme palette index is owned.
    pub fn owns_theme(&self, palette_index: usize) -> bool {
        self.themes.contains(&palette_index)
    }

    /// Enforce load-time invariants against the current catalog: drop
    /// keys the catalog no longer defines, default keys it added, keep
    /// the theme inventory duplicate-free and the equipped theme owned.
    ///
    /// Derived rates are not touched here; callers recompute them.
    pub fn sanitize(&mut self, catalog: &Catalog) {
        let before = self.upgrades.len()
            + self.shop_items.len()
            + self.companions.len()
            + self.achievements.len();
        self.upgrades.retain(|id, _| catalog.upgrade(&id.0).is_some());
        self.shop_items.retain(|id, _| catalog.shop_item(&id.0).is_some());
        self.companions.retain(|id, _| catalog.companion(&id.0).is_some());
        self.achievements.retain(|id, _| catalog.achievement(&id.0).is_some());
        let after = self.upgrades.len()
            + self.shop_items.len()
            + self.companions.len()
            + self.achievements.len();
        if after < before {
            warn!(dropped = before - after, "discarded save keys unknown to the catalog");
        }

        self.fill_catalog_defaults(catalog);

        let valid = catalog.theme_palette_indices();
        let mut seen = BTreeSet::new();
        self.themes.retain(|idx| valid.contains(idx) && seen.insert(*idx));
        if let Some(idx) = self.equipped_theme {
            if !self.themes.contains(&idx) {
                self.equipped_theme = None;
            }
        }

        if !self.balance.is_finite() || self.balance < 0.0 {
            warn!(balance = self.balance, "clamping invalid balance to zero");
            self.balance = 0.0;
        }
    }

    fn fill_catalog_defaults(&mut self, catalog: &Catalog) {
        for def in &catalog.upgrades {
            self.upgrades.entry(def.id.clone()).or_insert(0);
        }
        for def in &catalog.shop_items {
            self.shop_items.entry(def.id.clone()).or_insert(false);
        }
        for def in &catalog.companions {
            self.companions.entry(def.id.clone()).or_insert(0);
        }
        for def in &catalog.achievements {
            self.achievements.entry(def.id.clone()).or_insert(false);
        }
    }
}

/// Discrete notification events for the presentation layer. The engine
/// returns them from each operation; it has no opinion on display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Passive yield granted for time spent away.
    OfflineEarnings {
        /// Whole seconds covered by the grant.
        elapsed_seconds: u64,
        /// Eggs credited.
        amount: f64,
    },
    /// An achievement unlocked for the first time.
    AchievementUnlocked {
        /// Achievement identifier.
        id: AchievementId,
        /// Display name from the catalog.
        name: String,
    },
    /// A purchase was refused; the state is unchanged.
    PurchaseRejected {
        /// Human-readable rejection reason.
        reason: String,
    },
    /// A purchase committed.
    PurchaseCompleted {
        /// Identifier of the purchased item.
        item_id: String,
    },
}

/// Millisecond clock collaborator. The engine takes timestamps as plain
/// arguments; this seam lets the application shell choose the source.
pub trait Clock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall-clock implementation backed by chrono.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Validation errors for catalog invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The same id appears twice within a catalog section.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// An id is empty or blank.
    #[error("empty id in catalog")]
    EmptyId,
    /// A price must be strictly positive.
    #[error("price must be > 0 for {0}")]
    NonPositivePrice(String),
    /// An effect value must be finite and strictly positive.
    #[error("invalid effect value for {0}")]
    InvalidEffect(String),
    /// A companion bonus must be finite and non-negative.
    #[error("invalid companion bonus for {0}")]
    InvalidBonus(String),
    /// Two themes share a palette index; theme ownership bookkeeping
    /// requires indices to be unique.
    #[error("theme palette index {0} is used twice")]
    DuplicatePaletteIndex(usize),
}

/// Validate a single upgrade definition.
pub fn validate_upgrade(def: &UpgradeDef) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if def.base_price == 0 {
        return Err(ValidationError::NonPositivePrice(def.id.0.clone()));
    }
    let value = match def.effect {
        UpgradeEffect::ClickBoost(v) | UpgradeEffect::PassiveBoost(v) => v,
        UpgradeEffect::Multiplier(v) => v,
    };
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidEffect(def.id.0.clone()));
    }
    Ok(())
}

/// Validate a single shop item definition.
pub fn validate_shop_item(def: &ShopItemDef) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if def.price == 0 {
        return Err(ValidationError::NonPositivePrice(def.id.0.clone()));
    }
    Ok(())
}

/// Validate a single companion definition.
pub fn validate_companion(def: &CompanionDef) -> Result<(), ValidationError> {
    if def.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyId);
    }
    for bonus in [def.effect.per_action, def.effect.per_second, def.effect.click_bonus] {
        if !bonus.is_finite() || bonus < 0.0 {
            return Err(ValidationError::InvalidBonus(def.id.0.clone()));
        }
    }
    Ok(())
}

/// Validate the whole catalog, including cross-entry rules like id
/// uniqueness and theme palette uniqueness.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    let mut ids: BTreeSet<&str> = BTreeSet::new();
    for def in &catalog.upgrades {
        validate_upgrade(def)?;
        if !ids.insert(&def.id.0) {
            return Err(ValidationError::DuplicateId(def.id.0.clone()));
        }
    }

    ids.clear();
    let mut palette: BTreeSet<usize> = BTreeSet::new();
    for def in &catalog.shop_items {
        validate_shop_item(def)?;
        if !ids.insert(&def.id.0) {
            return Err(ValidationError::DuplicateId(def.id.0.clone()));
        }
        if let ShopItemKind::Theme { palette_index } = def.kind {
            if !palette.insert(palette_index) {
                return Err(ValidationError::DuplicatePaletteIndex(palette_index));
            }
        }
    }

    ids.clear();
    for def in &catalog.companions {
        validate_companion(def)?;
        if !ids.insert(&def.id.0) {
            return Err(ValidationError::DuplicateId(def.id.0.clone()));
        }
    }

    ids.clear();
    for def in &catalog.achievements {
        if def.id.0.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !ids.insert(&def.id.0) {
            return Err(ValidationError::DuplicateId(def.id.0.clone()));
        }
    }
    Ok(())
}
