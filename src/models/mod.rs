use serde::{Deserialize, Serialize};

/// Timestamp pattern stamped on every extracted product
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// One product block from a search listing page.
///
/// Field order is the order keys appear in the output JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Stars Ranking")]
    pub stars_ranking: String,
    #[serde(rename = "Total reviews")]
    pub total_reviews: String,
    #[serde(rename = "Last Month Sold")]
    pub last_month_sold: String,
    #[serde(rename = "Discounted Price")]
    pub discounted_price: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Delivery")]
    pub delivery: String,
    #[serde(rename = "Image URL")]
    pub image_url: String,
    #[serde(rename = "Product URL")]
    pub product_url: String,
    #[serde(rename = "Timestamps")]
    pub timestamp: String,
}

impl ProductRecord {
    /// Records without a title are never persisted
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// A search keyword together with the request built for it
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub url: url::Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_display_keys_in_order() {
        let record = ProductRecord {
            title: "Mouse".to_string(),
            price: "$19.99".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        let title_pos = json.find("\"Title\"").unwrap();
        let price_pos = json.find("\"Price\"").unwrap();
        let stamp_pos = json.find("\"Timestamps\"").unwrap();

        assert!(title_pos < price_pos && price_pos < stamp_pos);
        assert!(json.contains("\"Discounted Price\":\"\""));
        assert!(json.contains("\"Image URL\""));
    }

    #[test]
    fn blank_title_is_not_a_title() {
        let record = ProductRecord {
            title: "   ".to_string(),
            ..Default::default()
        };
        assert!(!record.has_title());
    }
}
