/// The fixed shop catalog. Everything except gifts is an economy sink whose
/// cost feeds the raffle pool; gift margins are burned instead so the pool
/// cannot be inflated by passing Vibe back and forth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CosmeticSlot {
    Icon,
    Flair,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Sets one cosmetic slot to `value`.
    Cosmetic { slot: CosmeticSlot, value: &'static str },
    /// One raffle ticket; the buyer joins the holder multiset.
    RaffleTicket,
    /// Credits `gift_amount` Vibe to a named recipient.
    Gift { gift_amount: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: u64,
    pub kind: ItemKind,
    /// Whether the cost lands in the raffle pool.
    pub pool_contribution: bool,
}

pub const CATALOG: &[ShopItem] = &[
    ShopItem {
        id: "icon_househeart",
        name: "House Heart icon",
        cost: 200,
        kind: ItemKind::Cosmetic {
            slot: CosmeticSlot::Icon,
            value: "househeart",
        },
        pool_contribution: true,
    },
    ShopItem {
        id: "icon_blockparty",
        name: "Block Party icon",
        cost: 350,
        kind: ItemKind::Cosmetic {
            slot: CosmeticSlot::Icon,
            value: "blockparty",
        },
        pool_contribution: true,
    },
    ShopItem {
        id: "flair_goodneighbor",
        name: "Good Neighbor flair",
        cost: 150,
        kind: ItemKind::Cosmetic {
            slot: CosmeticSlot::Flair,
            value: "Good Neighbor",
        },
        pool_contribution: true,
    },
    ShopItem {
        id: "color_sunset",
        name: "Sunset name color",
        cost: 300,
        kind: ItemKind::Cosmetic {
            slot: CosmeticSlot::Color,
            value: "#e67e22",
        },
        pool_contribution: true,
    },
    ShopItem {
        id: "raffle_ticket",
        name: "Raffle ticket",
        cost: 100,
        kind: ItemKind::RaffleTicket,
        pool_contribution: true,
    },
    ShopItem {
        id: "gift_vibe",
        name: "Vibe gift basket",
        cost: 150,
        kind: ItemKind::Gift { gift_amount: 100 },
        pool_contribution: false,
    },
];

pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id == id)
}
