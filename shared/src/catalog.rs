use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::Points;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub enum GreenAction {
    WaterReuse,
    Recycle,
    Donate,
    PublicTransport,
    Plant,
    ReduceWaste,
}

impl GreenAction {
    pub const fn points(&self) -> Points {
        match self {
            Self::WaterReuse => 10,
            Self::Recycle => 5,
            Self::Donate => 15,
            Self::PublicTransport => 8,
            Self::Plant => 20,
            Self::ReduceWaste => 12,
        }
    }

    pub const fn title(&self) -> &'static str {
        match self {
            Self::WaterReuse => "Water Reuse",
            Self::Recycle => "Recycling",
            Self::Donate => "Donate Items",
            Self::PublicTransport => "Public Transport",
            Self::Plant => "Plant Something",
            Self::ReduceWaste => "Reduce Food Waste",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::WaterReuse => "Reuse water for plants or cleaning",
            Self::Recycle => "Recycle plastic, paper, or glass",
            Self::Donate => "Donate clothes or household items",
            Self::PublicTransport => "Use public transportation",
            Self::Plant => "Plant trees, flowers, or vegetables",
            Self::ReduceWaste => "Minimize food wastage",
        }
    }

    // Every action is verified with a photo for now.
    pub const fn requires_photo(&self) -> bool {
        true
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub enum VoucherCategory {
    Restaurant,
    Supermarket,
    Retail,
}

/// Vouchers offered by local partners in exchange for points.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub enum Voucher {
    #[serde(rename = "v1")]
    #[strum(serialize = "v1")]
    WholeFoods,
    #[serde(rename = "v2")]
    #[strum(serialize = "v2")]
    GreenEarth,
    #[serde(rename = "v3")]
    #[strum(serialize = "v3")]
    EcoStore,
}

impl Voucher {
    pub const fn cost(&self) -> Points {
        match self {
            Self::WholeFoods => 200,
            Self::GreenEarth => 300,
            Self::EcoStore => 150,
        }
    }

    /// Face value in dollars.
    pub const fn value(&self) -> u32 {
        match self {
            Self::WholeFoods => 20,
            Self::GreenEarth => 30,
            Self::EcoStore => 15,
        }
    }

    pub const fn title(&self) -> &'static str {
        match self {
            Self::WholeFoods => "Whole Foods Market",
            Self::GreenEarth => "Green Earth Restaurant",
            Self::EcoStore => "Eco Store",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            Self::WholeFoods => "$20 off your next purchase",
            Self::GreenEarth => "$30 dining voucher",
            Self::EcoStore => "$15 off sustainable products",
        }
    }

    pub const fn merchant(&self) -> &'static str {
        match self {
            Self::WholeFoods => "Whole Foods",
            Self::GreenEarth => "Green Earth",
            Self::EcoStore => "Eco Store",
        }
    }

    pub const fn category(&self) -> VoucherCategory {
        match self {
            Self::WholeFoods => VoucherCategory::Supermarket,
            Self::GreenEarth => VoucherCategory::Restaurant,
            Self::EcoStore => VoucherCategory::Retail,
        }
    }

    pub const fn expiry_days(&self) -> u32 {
        match self {
            Self::WholeFoods => 30,
            Self::GreenEarth => 60,
            Self::EcoStore => 45,
        }
    }

    /// Returns the amount of points still missing, `None` if the balance covers the cost.
    pub fn missing_points(&self, balance: Points) -> Option<Points> {
        let cost = self.cost();
        (balance < cost).then(|| cost - balance)
    }
}
