//! Search criteria pre-filter applied before any listing is scored.

use clap::Args;
use listing_eval::Listing;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, Args, Serialize)]
pub struct SearchCriteria {
    #[arg(long)]
    pub min_beds: Option<i64>,

    #[arg(long)]
    pub max_beds: Option<i64>,

    #[arg(long)]
    pub min_baths: Option<f64>,

    #[arg(long)]
    pub min_price: Option<i64>,

    #[arg(long)]
    pub max_price: Option<i64>,
}

impl SearchCriteria {
    /// Why `listing` fails the criteria, if it does.
    ///
    /// A listing missing a field fails a minimum on that field but passes a
    /// maximum.
    pub fn rejection(&self, listing: &Listing) -> Option<String> {
        if let Some(min) = self.min_beds {
            match listing.beds {
                Some(beds) if beds >= min => {}
                beds => return Some(format!("{} beds (need {min}+)", display(beds))),
            }
        }
        if let (Some(max), Some(beds)) = (self.max_beds, listing.beds) {
            if beds > max {
                return Some(format!("{beds} beds (max {max})"));
            }
        }
        if let Some(min) = self.min_baths {
            match listing.baths {
                Some(baths) if baths >= min => {}
                baths => return Some(format!("{} baths (need {min}+)", display(baths))),
            }
        }
        if let (Some(max), Some(price)) = (self.max_price, listing.price) {
            if price > max {
                return Some(format!("${price} (max ${max})"));
            }
        }
        if let Some(min) = self.min_price {
            match listing.price {
                Some(price) if price >= min => {}
                price => return Some(format!("${} (min ${min})", display(price))),
            }
        }
        None
    }

    pub fn filter(&self, listings: Vec<Listing>) -> Vec<Listing> {
        let before = listings.len();
        let kept: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| match self.rejection(listing) {
                Some(why) => {
                    info!(listing = %short_name(listing), reason = %why, "Filtered out");
                    false
                }
                None => true,
            })
            .collect();

        if kept.len() < before {
            info!(before, after = kept.len(), "Criteria filter applied");
        }
        kept
    }
}

fn display<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

fn short_name(listing: &Listing) -> String {
    listing.display_name().chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(beds: Option<i64>, baths: Option<f64>, price: Option<i64>) -> Listing {
        let mut listing = Listing::new(1, "https://rentals.example.com/1");
        listing.beds = beds;
        listing.baths = baths;
        listing.price = price;
        listing
    }

    #[test]
    fn test_no_criteria_keeps_everything() {
        let criteria = SearchCriteria::default();
        assert!(criteria.rejection(&listing(None, None, None)).is_none());
    }

    #[test]
    fn test_minimums_reject_missing_values() {
        let criteria = SearchCriteria {
            min_beds: Some(2),
            ..Default::default()
        };
        assert_eq!(
            criteria.rejection(&listing(None, None, None)).as_deref(),
            Some("unknown beds (need 2+)")
        );
        assert!(criteria.rejection(&listing(Some(2), None, None)).is_none());
        assert!(criteria.rejection(&listing(Some(1), None, None)).is_some());
    }

    #[test]
    fn test_maximums_allow_missing_values() {
        let criteria = SearchCriteria {
            max_beds: Some(3),
            max_price: Some(4000),
            ..Default::default()
        };
        assert!(criteria.rejection(&listing(None, None, None)).is_none());
        assert_eq!(
            criteria.rejection(&listing(Some(2), None, Some(4500))).as_deref(),
            Some("$4500 (max $4000)")
        );
        assert!(criteria.rejection(&listing(Some(4), None, Some(3000))).is_some());
    }

    #[test]
    fn test_filter_keeps_order() {
        let criteria = SearchCriteria {
            min_baths: Some(1.5),
            ..Default::default()
        };
        let mut a = listing(Some(2), Some(2.0), None);
        a.id = 1;
        let mut b = listing(Some(2), Some(1.0), None);
        b.id = 2;
        let mut c = listing(Some(2), Some(1.5), None);
        c.id = 3;

        let kept: Vec<i64> = criteria.filter(vec![a, b, c]).iter().map(|l| l.id).collect();
        assert_eq!(kept, vec![1, 3]);
    }
}
