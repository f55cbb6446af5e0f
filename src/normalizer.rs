use crate::config::NicheConfig;
use crate::model::MarketEntry;

pub fn normalize_all(entries: &mut [MarketEntry], niches: &[NicheConfig]) {
    for entry in entries.iter_mut() {
        normalize_entry(entry, niches);
    }
}

fn normalize_entry(entry: &mut MarketEntry, niches: &[NicheConfig]) {
    let haystack = format!("{} {}", entry.name, entry.category).to_lowercase();

    for niche in niches {
        for keyword in &niche.match_keywords {
            if haystack.contains(&keyword.to_lowercase()) {
                entry.niche = niche.niche.clone();
                return;
            }
        }
    }

    entry.niche = "unknown".to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(name: &str, category: &str) -> MarketEntry {
        MarketEntry {
            id: name.to_string(),
            name: name.to_string(),
            vendor: String::new(),
            category: category.to_string(),
            price: 49.0,
            listed_at: Utc::now(),
            niche: String::new(),
        }
    }

    fn niche(name: &str, keywords: &[&str]) -> NicheConfig {
        NicheConfig {
            niche: name.to_string(),
            match_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            min_price: 0.0,
            max_price: 1000.0,
            supply_drop_ratio: 0.5,
            min_gap_score: 0.0,
        }
    }

    #[test]
    fn test_tags_by_name_or_category() {
        let niches = vec![niche("crm", &["CRM"]), niche("invoicing", &["invoice"])];
        let mut entries = vec![
            entry("Acme CRM", "sales"),
            entry("PaperTrail", "invoice automation"),
            entry("Timeboxer", "productivity"),
        ];

        normalize_all(&mut entries, &niches);

        assert_eq!(entries[0].niche, "crm");
        assert_eq!(entries[1].niche, "invoicing");
        assert_eq!(entries[2].niche, "unknown");
    }

    #[test]
    fn test_first_matching_niche_wins() {
        let niches = vec![niche("crm", &["sales"]), niche("analytics", &["sales"])];
        let mut entries = vec![entry("SalesBoard", "sales analytics")];

        normalize_all(&mut entries, &niches);

        assert_eq!(entries[0].niche, "crm");
    }
}
