use serde::Serialize;

/// Catalog entry offered to the recommendation model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub name: &'static str,
    pub brand: &'static str,
    /// Price in rupees
    pub price: u32,
    pub camera_mp: u32,
    pub battery_mah: u32,
    pub storage_gb: u32,
    pub features: &'static [&'static str],
}

const CATALOG: &[Product] = &[
    Product {
        name: "Redmi Note 13 5G",
        brand: "Xiaomi",
        price: 17999,
        camera_mp: 108,
        battery_mah: 5000,
        storage_gb: 128,
        features: &["amoled", "5g", "fast charging"],
    },
    Product {
        name: "Samsung Galaxy M34",
        brand: "Samsung",
        price: 15999,
        camera_mp: 50,
        battery_mah: 6000,
        storage_gb: 128,
        features: &["amoled", "5g", "long battery"],
    },
    Product {
        name: "Realme Narzo 70 Pro",
        brand: "Realme",
        price: 19999,
        camera_mp: 50,
        battery_mah: 5000,
        storage_gb: 128,
        features: &["amoled", "5g", "air gestures"],
    },
    Product {
        name: "iQOO Z9",
        brand: "iQOO",
        price: 19999,
        camera_mp: 50,
        battery_mah: 5000,
        storage_gb: 128,
        features: &["gaming", "5g", "ois"],
    },
    Product {
        name: "Motorola G54",
        brand: "Motorola",
        price: 13999,
        camera_mp: 50,
        battery_mah: 6000,
        storage_gb: 128,
        features: &["clean android", "5g", "long battery"],
    },
    Product {
        name: "Nothing Phone (2a)",
        brand: "Nothing",
        price: 23999,
        camera_mp: 50,
        battery_mah: 5000,
        storage_gb: 128,
        features: &["glyph lights", "5g", "clean android"],
    },
    Product {
        name: "OnePlus Nord CE 4",
        brand: "OnePlus",
        price: 24999,
        camera_mp: 50,
        battery_mah: 5500,
        storage_gb: 128,
        features: &["fast charging", "5g", "amoled"],
    },
    Product {
        name: "Google Pixel 8a",
        brand: "Google",
        price: 39999,
        camera_mp: 64,
        battery_mah: 4492,
        storage_gb: 128,
        features: &["best camera", "5g", "7 years updates"],
    },
    Product {
        name: "Samsung Galaxy S23 FE",
        brand: "Samsung",
        price: 34999,
        camera_mp: 50,
        battery_mah: 4500,
        storage_gb: 128,
        features: &["flagship chip", "5g", "wireless charging"],
    },
    Product {
        name: "Apple iPhone 13",
        brand: "Apple",
        price: 49999,
        camera_mp: 12,
        battery_mah: 3240,
        storage_gb: 128,
        features: &["ios", "5g", "compact"],
    },
];

/// The static in-memory product list.
pub fn catalog() -> &'static [Product] {
    CATALOG
}
