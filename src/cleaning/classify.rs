//! Commodity categories and name-based classifiers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Words to look for, and the label they select.
type Rule = (&'static [&'static str], &'static str);

fn contains_any(name: &str, words: &[&str]) -> bool {
    words.iter().any(|w| name.contains(w))
}

/// Label of the first rule with a word in `name`, else `fallback`.
fn first_match(name: &str, rules: &[Rule], fallback: &'static str) -> &'static str {
    rules
        .iter()
        .find(|(words, _)| contains_any(name, words))
        .map(|(_, label)| *label)
        .unwrap_or(fallback)
}

/// A commodity the pipeline knows how to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GulaAren,
    BriketKelapa,
    CoconutSugar,
    VirginCoconutOil,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::GulaAren,
        Category::BriketKelapa,
        Category::CoconutSugar,
        Category::VirginCoconutOil,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::GulaAren => "gula_aren",
            Category::BriketKelapa => "briket_kelapa",
            Category::CoconutSugar => "coconut_sugar",
            Category::VirginCoconutOil => "virgin_coconut_oil",
        }
    }

    /// A product is relevant when its lowercased name contains any of these.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::GulaAren => &["aren", "gula", "semut", "cair"],
            Category::BriketKelapa => &["briket", "arang", "kelapa"],
            Category::CoconutSugar => &["coconut", "sugar", "kelapa"],
            Category::VirginCoconutOil => &["vco", "minyak", "coconut", "kelapa"],
        }
    }

    pub fn is_relevant(&self, product_name: &str) -> bool {
        let name = product_name.to_lowercase();
        self.keywords().iter().any(|k| name.contains(k))
    }

    /// Coarse product subtype from the name.
    pub fn subtype(&self, product_name: &str) -> &'static str {
        let name = product_name.to_lowercase();
        let has = |words: &[&str]| contains_any(&name, words);

        match self {
            Category::GulaAren => {
                if has(&["cair", "liquid"]) {
                    "cair"
                } else if has(&["semut", "bubuk", "powder"]) {
                    "bubuk"
                } else {
                    "blok"
                }
            }
            Category::CoconutSugar => {
                if has(&["organik"]) {
                    "organik"
                } else if has(&["repack"]) {
                    "repack"
                } else {
                    "lainnya"
                }
            }
            Category::BriketKelapa => {
                if has(&["bbq"]) {
                    "bbq"
                } else if has(&["shisha"]) {
                    "shisha"
                } else {
                    "umum"
                }
            }
            Category::VirginCoconutOil => {
                if has(&["mpasi"]) {
                    "mpasi"
                } else if has(&["kulit", "skincare"]) {
                    "kosmetik"
                } else {
                    "makanan"
                }
            }
        }
    }

    /// Finer attributes (shape, use, grade, kind) read from the name.
    pub fn attributes(&self, product_name: &str) -> BTreeMap<String, String> {
        let name = product_name.to_lowercase();
        let pick = |rules: &[Rule], fallback: &'static str| first_match(&name, rules, fallback);

        let pairs: Vec<(&str, &str)> = match self {
            Category::BriketKelapa => vec![
                ("bentuk", pick(&[(&["hex"], "hexagonal"), (&["cube", "kotak"], "cube")], "lain")),
                ("kegunaan", pick(&[(&["shisha"], "shisha"), (&["bbq"], "bbq")], "lain")),
                ("kualitas", pick(&[(&["export", "ekspor"], "export")], "lokal")),
            ],
            Category::GulaAren | Category::CoconutSugar => vec![
                ("bentuk", pick(&[(&["cair", "syrup"], "cair"), (&["bubuk", "semut"], "bubuk")], "lain")),
                ("kualitas", pick(&[(&["organik"], "organik"), (&["murni"], "murni")], "umum")),
            ],
            Category::VirginCoconutOil => vec![
                (
                    "kegunaan",
                    pick(
                        &[
                            (&["mpasi"], "mpasi"),
                            (&["kucing", "anjing"], "hewan"),
                            (&["rambut"], "rambut"),
                        ],
                        "umum",
                    ),
                ),
                ("jenis", pick(&[(&["evco"], "evco"), (&["vco"], "vco")], "lain")),
            ],
        };

        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Category whose slug ends a collection key such as
    /// `products_tokopedia_gula_aren`.
    pub fn from_collection(collection: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| collection == c.slug() || collection.ends_with(&format!("_{}", c.slug())))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = crate::utils::slugify(s);
        match slug.as_str() {
            "gula_aren" | "aren" => Ok(Category::GulaAren),
            "briket_kelapa" | "briket" => Ok(Category::BriketKelapa),
            "coconut_sugar" => Ok(Category::CoconutSugar),
            "virgin_coconut_oil" | "vco" => Ok(Category::VirginCoconutOil),
            _ => Err(format!(
                "unknown category '{}' (expected one of: gula_aren, briket_kelapa, coconut_sugar, virgin_coconut_oil)",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtypes() {
        assert_eq!(Category::GulaAren.subtype("Gula Aren Cair 500ml"), "cair");
        assert_eq!(Category::GulaAren.subtype("Gula Semut Organik"), "bubuk");
        assert_eq!(Category::GulaAren.subtype("Gula Aren Batok 1kg"), "blok");
        assert_eq!(Category::CoconutSugar.subtype("Coconut Sugar Repack 250g"), "repack");
        assert_eq!(Category::BriketKelapa.subtype("Briket Shisha Premium"), "shisha");
        assert_eq!(Category::VirginCoconutOil.subtype("VCO untuk MPASI"), "mpasi");
        assert_eq!(Category::VirginCoconutOil.subtype("VCO Skincare"), "kosmetik");
        assert_eq!(Category::VirginCoconutOil.subtype("VCO 1 liter"), "makanan");
    }

    #[test]
    fn attributes_follow_first_matching_rule() {
        let attrs = Category::BriketKelapa.attributes("Briket Hexagonal Shisha Export Quality");
        assert_eq!(attrs["bentuk"], "hexagonal");
        assert_eq!(attrs["kegunaan"], "shisha");
        assert_eq!(attrs["kualitas"], "export");

        let attrs = Category::VirginCoconutOil.attributes("EVCO minyak rambut");
        assert_eq!(attrs["kegunaan"], "rambut");
        assert_eq!(attrs["jenis"], "evco");

        let attrs = Category::CoconutSugar.attributes("Coconut sugar murni");
        assert_eq!(attrs["bentuk"], "lain");
        assert_eq!(attrs["kualitas"], "murni");
    }

    #[test]
    fn relevance_is_keyword_containment() {
        assert!(Category::GulaAren.is_relevant("GULA MERAH"));
        assert!(!Category::GulaAren.is_relevant("Kopi Bubuk"));
    }

    #[test]
    fn category_from_collection_and_name() {
        assert_eq!(
            Category::from_collection("products_tokopedia_virgin_coconut_oil"),
            Some(Category::VirginCoconutOil)
        );
        assert_eq!(Category::from_collection("products_tokopedia_kopi"), None);
        assert_eq!("Gula Aren".parse::<Category>(), Ok(Category::GulaAren));
        assert_eq!("vco".parse::<Category>(), Ok(Category::VirginCoconutOil));
        assert!("kopi".parse::<Category>().is_err());
    }
}
