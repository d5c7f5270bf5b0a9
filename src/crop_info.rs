//! Static crop reference panel: a description and an image per crop.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Image shown when no crop is chosen.
pub const PLACEHOLDER_IMAGE: &str = "placeholder.jpg";

/// Crops that have a reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crop {
    Cassava,
    Maize,
    PlantainsAndOthers,
    Potatoes,
    RicePaddy,
    Sorghum,
    Soybeans,
    SweetPotatoes,
    Wheat,
    Yams,
}

impl Crop {
    pub const ALL: [Self; 10] = [
        Self::Cassava,
        Self::Maize,
        Self::PlantainsAndOthers,
        Self::Potatoes,
        Self::RicePaddy,
        Self::Sorghum,
        Self::Soybeans,
        Self::SweetPotatoes,
        Self::Wheat,
        Self::Yams,
    ];

    /// Name as it appears in the item column of the yield table.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cassava => "Cassava",
            Self::Maize => "Maize",
            Self::PlantainsAndOthers => "Plantains and others",
            Self::Potatoes => "Potatoes",
            Self::RicePaddy => "Rice, paddy",
            Self::Sorghum => "Sorghum",
            Self::Soybeans => "Soybeans",
            Self::SweetPotatoes => "Sweet potatoes",
            Self::Wheat => "Wheat",
            Self::Yams => "Yams",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Cassava => "cassava",
            Self::Maize => "maize",
            Self::PlantainsAndOthers => "plantains",
            Self::Potatoes => "potatoes",
            Self::RicePaddy => "rice",
            Self::Sorghum => "sorghum",
            Self::Soybeans => "soybeans",
            Self::SweetPotatoes => "sweet-potatoes",
            Self::Wheat => "wheat",
            Self::Yams => "yams",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Cassava => {
                "Cassava is a drought-tolerant root crop grown across the tropics. \
                 Its starchy tubers are a staple for hundreds of millions of people \
                 and it yields on poor soils where cereals struggle."
            }
            Self::Maize => {
                "Maize is the most widely produced cereal in the world, used for food, \
                 feed and fuel. It is sensitive to heat and drought during flowering, \
                 which makes its yield closely tied to temperature."
            }
            Self::PlantainsAndOthers => {
                "Plantains and other cooking bananas are perennial crops of humid \
                 tropical regions, eaten boiled, fried or roasted and traded mostly \
                 in local markets."
            }
            Self::Potatoes => {
                "Potatoes are a cool-season tuber crop with very high yields per \
                 hectare. They grow best in temperate climates and highlands and \
                 suffer when temperatures rise above their optimum."
            }
            Self::RicePaddy => {
                "Rice is grown mostly in flooded paddies in Asia and feeds more than \
                 half of the world's population. Paddy yields are reported before \
                 milling."
            }
            Self::Sorghum => {
                "Sorghum is a hardy cereal suited to hot and dry regions of Africa and \
                 Asia. It tolerates heat and water stress better than maize."
            }
            Self::Soybeans => {
                "Soybeans are a legume grown for protein-rich meal and oil. They fix \
                 their own nitrogen and are a major export crop of the Americas."
            }
            Self::SweetPotatoes => {
                "Sweet potatoes are a resilient root crop with nutritious, often \
                 orange-fleshed tubers. They are important for food security in \
                 sub-Saharan Africa and East Asia."
            }
            Self::Wheat => {
                "Wheat is a temperate cereal grown on more land than any other food \
                 crop. It is a key source of calories and protein and is sensitive to \
                 heat during grain filling."
            }
            Self::Yams => {
                "Yams are large starchy tubers cultivated mainly in West Africa, where \
                 they hold cultural as well as dietary importance."
            }
        }
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Crop {
    type Err = String;

    /// Case-insensitive match on the display name or the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name().to_lowercase() == needle || c.slug() == needle)
            .ok_or_else(|| format!("Unknown crop: {}", s))
    }
}

/// Content of the crop information panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CropInfo {
    pub crop: Option<Crop>,
    pub title: String,
    pub description: String,
    pub image: PathBuf,
}

/// Look up the panel for a crop, or the placeholder when none is chosen.
pub fn lookup(crop: Option<Crop>, image_dir: &Path) -> CropInfo {
    match crop {
        Some(crop) => CropInfo {
            crop: Some(crop),
            title: crop.name().to_string(),
            description: crop.description().to_string(),
            image: image_dir.join(format!("{}.jpg", crop.slug())),
        },
        None => CropInfo {
            crop: None,
            title: "Crop information".to_string(),
            description: "Choose a crop to see its description.".to_string(),
            image: image_dir.join(PLACEHOLDER_IMAGE),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name_and_slug() {
        assert_eq!("maize".parse::<Crop>(), Ok(Crop::Maize));
        assert_eq!("Rice, paddy".parse::<Crop>(), Ok(Crop::RicePaddy));
        assert_eq!("sweet-potatoes".parse::<Crop>(), Ok(Crop::SweetPotatoes));
        assert!("barley".parse::<Crop>().is_err());
    }

    #[test]
    fn test_lookup_known_crop() {
        let info = lookup(Some(Crop::Wheat), Path::new("images"));
        assert_eq!(info.title, "Wheat");
        assert_eq!(info.image, PathBuf::from("images/wheat.jpg"));
        assert!(info.description.contains("cereal"));
    }

    #[test]
    fn test_lookup_placeholder() {
        let info = lookup(None, Path::new("images"));
        assert_eq!(info.crop, None);
        assert_eq!(info.image, PathBuf::from("images").join(PLACEHOLDER_IMAGE));
    }

    #[test]
    fn test_every_crop_has_unique_slug() {
        let mut slugs: Vec<&str> = Crop::ALL.iter().map(|c| c.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Crop::ALL.len());
    }
}
