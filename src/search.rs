use crate::dataset::FishRecord;

/// Records whose scientific or common name contains `term`, ignoring case.
///
/// A blank term matches nothing.
pub fn search<'a>(records: &'a [FishRecord], term: &str) -> Vec<&'a FishRecord> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|record| {
            [record.scientific_name(), record.common_name()]
                .into_iter()
                .flatten()
                .any(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Renders hits the way the `search` command prints them.
pub fn format_results(term: &str, hits: &[&FishRecord]) -> String {
    if hits.is_empty() {
        return format!("No fish found for '{}'\n", term);
    }

    let mut out = format!("--- {} results for '{}' ---\n", hits.len(), term);
    for record in hits {
        out.push_str(&format!("\nName: {}\n", record.common_name().unwrap_or("-")));
        out.push_str(&format!(
            "Scientific name: {}\n",
            record.scientific_name().unwrap_or("-")
        ));
        out.push_str(&format!("Image: {}\n", record.image().unwrap_or("-")));
        out.push_str(&format!(
            "Description: {}\n",
            record.description().unwrap_or("-")
        ));
        out.push_str(&"-".repeat(30));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Vec<FishRecord> {
        [
            json!({"name": "Goldfish", "scientificName": "Carassius auratus", "image": "/images/goldfish.png"}),
            json!({"name": "Guppy", "scientificName": "Poecilia reticulata", "description": "Livebearer"}),
            json!({"name": "Crucian carp", "scientificName": "Carassius carassius"}),
            json!({"id": 9}),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap())
        .collect()
    }

    #[test]
    fn matches_scientific_name_case_insensitively() {
        let records = dataset();
        let hits = search(&records, "carassius");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].common_name(), Some("Goldfish"));
        assert_eq!(hits[1].common_name(), Some("Crucian carp"));
    }

    #[test]
    fn matches_common_name() {
        let records = dataset();
        let hits = search(&records, "GUPPY");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].scientific_name(), Some("Poecilia reticulata"));
    }

    #[test]
    fn blank_term_matches_nothing() {
        let records = dataset();
        assert!(search(&records, "   ").is_empty());
    }

    #[test]
    fn formats_hits_with_placeholders() {
        let records = dataset();
        let hits = search(&records, "guppy");
        let text = format_results("guppy", &hits);
        assert!(text.starts_with("--- 1 results for 'guppy' ---\n"));
        assert!(text.contains("Image: -\n"));
        assert!(text.contains("Description: Livebearer\n"));
    }

    #[test]
    fn formats_empty_result() {
        assert_eq!(format_results("shark", &[]), "No fish found for 'shark'\n");
    }
}
