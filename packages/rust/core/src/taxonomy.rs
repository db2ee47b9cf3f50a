//! Built-in licensing category taxonomy.
//!
//! Order matters: ties in category scoring keep this order.

/// Known licensing categories, in scoring tie-break order.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Accessories",
    "Sunglasses",
    "Scarves",
    "Belts",
    "Baseball Caps",
    "Beanies",
    "Tote Bags",
    "Backpacks",
    "Clutches",
    "Crossbody Bags",
    "Bags",
    "Mini Backpacks",
    "Wallets",
    "Lunch Bags / Lunch Kits",
    "Hair Accessories",
    "Hats",
    "Keychains",
    "Jewelry",
    "Temporary Tattoos",
    "Body Jewelry",
    "Buckles & Accessories",
    "Ties / Bowties",
    "Gloves",
    "Kids Socks",
    "Adults Socks",
    "Optical Glasses",
    "Kids Underwear",
    "Adult Underwear",
    "Kids Watches",
    "Adult Watches",
    "Watch Accessories",
    "Kids Luggage",
    "Adult Luggage",
    "Travel Accessories",
    "Pins",
    "Umbrellas",
    "Iron-On Patches",
    "Apparel",
    "Men's T-Shirts",
    "Men's Shirts",
    "Men's Jeans",
    "Men's Jackets",
    "Men's Suits",
    "Men's Activewear",
    "Women's Dresses",
    "Women's Tops",
    "Women's Skirts",
    "Women's Leggings",
    "Women's Blazers",
    "Women's Maternity Wear",
    "Boys' Apparel",
    "Girls' Apparel",
    "School Uniforms",
    "Kids Activewear",
    "Women's Activewear",
    "Boy's Pajamas",
    "Girl's Pajamas",
    "Women's Pajamas",
    "Men's Pajamas",
    "Kids Jackets",
    "Kids Onesies",
    "Adult Onesies",
    "Women's Jackets",
    "Men's Pants",
    "Kids Sweaters",
    "Adult Sweaters",
    "Kids Hoodies",
    "Adult Hoodies",
    "Boy's Swimwear",
    "Girl's Swimwear",
    "Women's Swimwear",
    "Men's Swimwear",
    "Kids Bathrobes",
    "Adult Bathrobes",
    "Kids Raincoats",
    "Adult Raincoats",
    "Scrubs",
    "Domestics",
    "Bed Sheets",
    "Duvet Covers",
    "Pillowcases",
    "Comforters",
    "Bath Towels",
    "Hand Towels",
    "Beach Towels",
    "Bath Mats",
    "Outdoor Rugs",
    "Bedding Sets",
    "Blankets / Throws",
    "Weighted Blankets",
    "Throw Pillows",
    "Body Pillows",
    "Shower Curtains",
    "Cushions",
    "Bathroom Accessories",
    "Indoor Rugs",
    "Curtains",
    "Electronics & Accessories",
    "Phone cases",
    "Wall Chargers",
    "Wireless Chargers",
    "Car Chargers",
    "Portable chargers",
    "Backpack",
    "Messenger Bags",
    "Briefcases",
    "Rolling Laptop Bags",
    "Tablet Cases & Sleeves",
    "Laptop Cases & Sleeves",
    "Laptop Accessories",
    "Laptop Bags",
    "Kids Tablets",
    "Smartwatches",
    "Fitness Trackers",
    "Wearable Tech",
    "Speakers",
    "Gaming Accessories",
    "Gaming Controllers",
    "USB Memory Sticks",
    "Headphones",
    "Electronic Cables",
    "Footwear",
    "Men's Sneakers",
    "Men's Dress Shoes",
    "Men's Boots",
    "Men's Sandals",
    "Women's Flats",
    "Women's Heels",
    "Women's Sandals",
    "Women's Athletic Shoes",
    "Kids Sneakers",
    "Kids School Shoes",
    "Kids Boots",
    "Kids Sandals",
    "Women's Sneakers",
    "Men's Athletic Shoes",
    "Women's Boots",
    "Kids Athletic Shoes",
    "Men's Slippers",
    "Women's Slippers",
    "Kids Slippers",
    "Men's Flipflops",
    "Women's Flipflops",
    "Kids Flipflops",
    "Kids Rain Boots",
    "Adult Rain Boots",
];

/// The built-in taxonomy as owned strings.
pub fn default_taxonomy() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| (*c).to_string()).collect()
}

/// `configured` when non-empty, otherwise the built-in taxonomy.
pub fn resolve_taxonomy(configured: &[String]) -> Vec<String> {
    if configured.is_empty() {
        default_taxonomy()
    } else {
        configured.to_vec()
    }
}
