use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::OTHER_CATEGORY;
use crate::error::{PenniesError, Result};
use crate::store::Ledger;

/// Category id used when not even "Other" exists in the datastore.
pub const DEFAULT_CATEGORY_ID: i64 = 1;

// Category order is priority order: the first category with a matching
// keyword wins, so broad keywords (e.g. "CAR", "BAR") only apply when an
// earlier category has not already claimed the description.
const BUILTIN_RULES: &[(&str, &[&str])] = &[
    (
        "Groceries",
        &[
            "TESCO", "SAINSBURY", "ASDA", "MORRISONS", "ALDI", "LIDL", "WAITROSE", "M&S",
            "MARKS & SPENCER", "MARKS&SPENCER", "CO-OP", "ICELAND", "SUPERMARKET", "GROCERY",
            "WH SMITH", "WHSMITH", "SPAR", "CONVENIENCE",
        ],
    ),
    (
        "Transport",
        &[
            "UBER", "TFL", "TRANSPORT", "TRAINLINE", "NATIONAL RAIL", "OYSTER", "PETROL",
            "SHELL", "BP", "ESSO", "PARKING", "BUS", "TUBE", "TAXI", "CAR", "HEATHROW",
            "AIRPORT",
        ],
    ),
    (
        "Eating Out",
        &[
            "RESTAURANT", "CAFE", "COFFEE", "STARBUCKS", "COSTA", "PRET", "LEON", "MCDONALD",
            "KFC", "SUBWAY", "PIZZA", "NANDO", "BURGER", "GREGGS", "DELIVEROO", "JUST EAT",
            "UBER EATS", "TENPERCENTCOFFEE", "BOOCHON", "SEOULDIJAINJ", "TOTT", "MADDON",
            "SEONGSU", "CHICKEN", "BAR", "GROCER", "EATERY", "EATS", "TERRACE", "JACKS BAR",
            "JONES THE GROCER", "BEANBERRY", "ANTHRAC", "IJOOMAK", "GAMSUNG", "KOOKLIBJOONGA",
            "YO ", "ZETTLE", "STARFIELD", "MALL", "FOOD", "DINING",
        ],
    ),
    (
        "Bills",
        &[
            "COUNCIL TAX", "WATER", "ELECTRIC", "GAS", "INTERNET", "BROADBAND", "PHONE",
            "MOBILE", "TV LICENCE", "SKY", "NETFLIX", "SPOTIFY", "AMAZON PRIME", "GYM",
            "THE GYM", "DATACAMP", "COURSERA", "GITHUB", "MEDIUM", "SUBSCRIPTION",
        ],
    ),
    ("Rent", &["RENT", "MORTGAGE", "ESTATE", "LETTING", "PROPERTY"]),
    (
        "Travel",
        &[
            "HOTEL", "AIRBNB", "BOOKING.COM", "EXPEDIA", "AIRLINE", "RYANAIR", "EASYJET",
            "BRITISH AIRWAYS", "HOLIDAY", "KICC_HAEOI", "EXIMBAY", "HYUNDAI", "DEPARTMENT",
        ],
    ),
    (
        "Fun",
        &[
            "CINEMA", "THEATRE", "GAME", "STEAM", "PLAYSTATION", "XBOX", "NINTENDO",
            "APPLE MUSIC", "GOOGLE PLAY", "PLAY APPS", "TATE", "MUSEUM", "GALLERY",
            "KYOBO BOOKS", "BOOKS", "ENTERTAINMENT",
        ],
    ),
];

/// One entry of the rule table: every keyword maps to `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

pub fn builtin_rules() -> Vec<CategoryRule> {
    BUILTIN_RULES
        .iter()
        .map(|(category, keywords)| CategoryRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        })
        .collect()
}

/// Load a replacement rule table from a JSON array of
/// `{"category": "...", "keywords": [...]}` objects. Array order is priority.
pub fn load_rules(path: &Path) -> Result<Vec<CategoryRule>> {
    if !path.is_file() {
        return Err(PenniesError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| PenniesError::Settings(format!("invalid rules file {}: {e}", path.display())))
}

/// Keyword classifier compiled once from a rule table. Keywords are
/// uppercased at construction; descriptions are trimmed and uppercased per call.
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<(String, Vec<String>)>,
}

impl Categorizer {
    pub fn new(rules: &[CategoryRule]) -> Self {
        let rules = rules
            .iter()
            .map(|r| {
                (
                    r.category.clone(),
                    r.keywords.iter().map(|k| k.to_uppercase()).collect(),
                )
            })
            .collect();
        Self { rules }
    }

    /// Categories with at least one keyword occurring in `description`, in
    /// priority order. Does not consult the datastore.
    pub fn matching_rules<'a>(&'a self, description: &str) -> impl Iterator<Item = &'a str> + 'a {
        let desc = description.trim().to_uppercase();
        self.rules
            .iter()
            .filter(move |(_, keywords)| keywords.iter().any(|k| desc.contains(k.as_str())))
            .map(|(category, _)| category.as_str())
    }

    /// Resolve `description` to a category id. A keyword whose category is
    /// missing from the datastore is passed over and the scan continues.
    pub fn categorize(&self, store: &impl Ledger, description: &str) -> Result<i64> {
        for category in self.matching_rules(description) {
            if let Some(id) = store.find_category_by_name(category)? {
                tracing::debug!(description, category, "matched category rule");
                return Ok(id);
            }
        }

        match store.find_category_by_name(OTHER_CATEGORY)? {
            Some(id) => Ok(id),
            None => {
                tracing::warn!(
                    description,
                    fallback = DEFAULT_CATEGORY_ID,
                    "no Other category, using default id"
                );
                Ok(DEFAULT_CATEGORY_ID)
            }
        }
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(&builtin_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use rusqlite::Connection;

    fn category_id(conn: &Connection, name: &str) -> i64 {
        conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_tesco_is_groceries() {
        let (_dir, conn) = test_db();
        let categorizer = Categorizer::default();
        let groceries = category_id(&conn, "Groceries");
        for _ in 0..3 {
            assert_eq!(categorizer.categorize(&conn, "TESCO EXPRESS").unwrap(), groceries);
        }
    }

    #[test]
    fn test_matching_is_case_insensitive_and_trimmed() {
        let (_dir, conn) = test_db();
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.categorize(&conn, "  spotify premium  ").unwrap(),
            category_id(&conn, "Bills")
        );
    }

    #[test]
    fn test_unmatched_falls_back_to_other() {
        let (_dir, conn) = test_db();
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.categorize(&conn, "ZZZ UNKNOWN VENDOR").unwrap(),
            category_id(&conn, "Other")
        );
    }

    #[test]
    fn test_earlier_category_wins() {
        let (_dir, conn) = test_db();
        let categorizer = Categorizer::default();
        // "UBER EATS" is an Eating Out keyword, but "UBER" in Transport comes first.
        assert_eq!(
            categorizer.categorize(&conn, "UBER EATS LONDON").unwrap(),
            category_id(&conn, "Transport")
        );
        // "SCAR" contains "CAR" (Transport) before "BAR" (Eating Out) is considered.
        assert_eq!(
            categorizer.categorize(&conn, "SCARLET BAR").unwrap(),
            category_id(&conn, "Transport")
        );
    }

    #[test]
    fn test_missing_category_continues_scan() {
        let (_dir, conn) = test_db();
        conn.execute("DELETE FROM categories WHERE name = 'Groceries'", []).unwrap();
        let categorizer = Categorizer::default();
        // TESCO (Groceries) is skipped, CAFE (Eating Out) still matches.
        assert_eq!(
            categorizer.categorize(&conn, "TESCO CAFE").unwrap(),
            category_id(&conn, "Eating Out")
        );
    }

    #[test]
    fn test_missing_other_uses_default_id() {
        let (_dir, conn) = test_db();
        conn.execute("DELETE FROM categories WHERE name = 'Other'", []).unwrap();
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.categorize(&conn, "NOTHING MATCHES HERE").unwrap(),
            DEFAULT_CATEGORY_ID
        );
    }

    #[test]
    fn test_custom_rules_lowercase_keywords() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO categories (name) VALUES ('Work Income')", []).unwrap();
        let categorizer = Categorizer::new(&[CategoryRule {
            category: "Work Income".to_string(),
            keywords: vec!["deel".to_string()],
        }]);
        assert_eq!(
            categorizer.categorize(&conn, "DEEL INC PAYROLL").unwrap(),
            category_id(&conn, "Work Income")
        );
        // Built-in keywords are gone once a custom table is in use.
        assert_eq!(
            categorizer.categorize(&conn, "TESCO").unwrap(),
            category_id(&conn, "Other")
        );
    }

    #[test]
    fn test_load_rules_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"category": "Fun", "keywords": ["KARAOKE"]}, {"category": "Bills", "keywords": ["EDF"]}]"#,
        )
        .unwrap();
        let rules = load_rules(&path).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].category, "Fun");
        assert_eq!(rules[1].keywords, vec!["EDF".to_string()]);
    }

    #[test]
    fn test_load_rules_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rules(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PenniesError::FileNotFound(_)));
    }

    #[test]
    fn test_builtin_rule_order() {
        let names: Vec<String> = builtin_rules().into_iter().map(|r| r.category).collect();
        assert_eq!(
            names,
            vec!["Groceries", "Transport", "Eating Out", "Bills", "Rent", "Travel", "Fun"]
        );
    }
}
